//! Windowed boolean scorer
//!
//! Scores a top-level disjunction a window of [`WINDOW_SIZE`] docs at a time.
//! Every sub-scorer is drained up to the window bound into a bucket table
//! addressed by the low doc bits, then the touched buckets are emitted. Docs
//! reach the collector in no particular order within a window, so this scorer
//! is only usable as the root of a search and never nests inside another
//! combinator.

use crate::{DocId, Result, Score, TERMINATED};

use super::{Collector, CoordTable, Scorer};

/// Docs per window
pub const WINDOW_SIZE: usize = 2048;
const WINDOW_MASK: DocId = (WINDOW_SIZE - 1) as DocId;

/// Reserved bit set by prohibited clauses
const PROHIBITED_MASK: u32 = 1;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    /// TERMINATED until first touched
    doc: DocId,
    score: Score,
    bits: u32,
    /// Number of clauses that hit this doc
    coord: u32,
    /// Next bucket on the valid list
    next: Option<usize>,
}

impl Default for Bucket {
    fn default() -> Self {
        Self {
            doc: TERMINATED,
            score: 0.0,
            bits: 0,
            coord: 0,
            next: None,
        }
    }
}

struct BucketTable {
    buckets: Vec<Bucket>,
    /// Head of the valid list
    first: Option<usize>,
}

impl BucketTable {
    fn new() -> Self {
        Self {
            buckets: vec![Bucket::default(); WINDOW_SIZE],
            first: None,
        }
    }

    #[inline]
    fn add(&mut self, doc: DocId, score: Score, mask: u32) {
        let slot = (doc & WINDOW_MASK) as usize;
        let bucket = &mut self.buckets[slot];
        if bucket.doc != doc {
            *bucket = Bucket {
                doc,
                score,
                bits: mask,
                coord: 1,
                next: self.first,
            };
            self.first = Some(slot);
        } else {
            bucket.score += score;
            bucket.bits |= mask;
            bucket.coord += 1;
        }
    }
}

struct SubScorer<'a> {
    scorer: Box<dyn Scorer + 'a>,
    mask: u32,
}

impl SubScorer<'_> {
    /// Feed every doc below `end` into the table; true when docs remain
    fn fill(&mut self, table: &mut BucketTable, end: DocId) -> Result<bool> {
        let mut doc = self.scorer.doc();
        while doc < end {
            let score = self.scorer.score()?;
            table.add(doc, score, self.mask);
            doc = self.scorer.advance()?;
        }
        Ok(doc != TERMINATED)
    }
}

/// Bucket-at-a-time scorer for optional and prohibited clauses
pub struct WindowedBooleanScorer<'a> {
    subs: Vec<SubScorer<'a>>,
    table: BucketTable,
    /// Buckets still to be walked in the current window
    current: Option<usize>,
    /// Exclusive bound of the last filled window
    end: DocId,
    min_nr_should_match: u32,
    coord: CoordTable,
}

impl<'a> WindowedBooleanScorer<'a> {
    /// `coord` should hold `optional.len() + 1` factors.
    pub fn new(
        optional: Vec<Box<dyn Scorer + 'a>>,
        prohibited: Vec<Box<dyn Scorer + 'a>>,
        min_nr_should_match: u32,
        coord: CoordTable,
    ) -> Self {
        let optional = optional.into_iter().map(|scorer| SubScorer { scorer, mask: 0 });
        let prohibited = prohibited.into_iter().map(|scorer| SubScorer {
            scorer,
            mask: PROHIBITED_MASK,
        });
        let subs = optional
            .chain(prohibited)
            .filter(|sub| sub.scorer.doc() != TERMINATED)
            .collect();
        Self {
            subs,
            table: BucketTable::new(),
            current: None,
            end: 0,
            min_nr_should_match,
            coord,
        }
    }

    /// Emit every matching doc to `collector`.
    pub fn score_all<C: Collector + ?Sized>(&mut self, collector: &mut C) -> Result<()> {
        while self.score_until(collector, TERMINATED)? {}
        Ok(())
    }

    /// Emit matching docs below `max`.
    ///
    /// Returns true while docs at or past `max` are still pending; call
    /// again with a larger bound to continue.
    pub fn score_until<C: Collector + ?Sized>(
        &mut self,
        collector: &mut C,
        max: DocId,
    ) -> Result<bool> {
        loop {
            self.table.first = None;
            while let Some(slot) = self.current {
                let bucket = &mut self.table.buckets[slot];
                let next = bucket.next;
                if bucket.bits & PROHIBITED_MASK == 0 {
                    if bucket.doc >= max {
                        // requeue for the next call
                        bucket.next = self.table.first;
                        self.table.first = Some(slot);
                        self.current = next;
                        continue;
                    }
                    if bucket.coord >= self.min_nr_should_match {
                        collector.collect(bucket.doc, bucket.score * self.coord.get(bucket.coord));
                    }
                }
                self.current = next;
            }

            if let Some(first) = self.table.first.take() {
                self.current = Some(first);
                return Ok(true);
            }

            let Some(next_doc) = self.subs.iter().map(|s| s.scorer.doc()).min() else {
                return Ok(false);
            };
            if next_doc == TERMINATED {
                return Ok(false);
            }
            // skip empty windows
            let start = self.end.max(next_doc & !WINDOW_MASK);
            self.end = start.saturating_add(WINDOW_SIZE as DocId);
            log::trace!("windowed: filling [{}, {})", start, self.end);

            let mut more = false;
            for sub in &mut self.subs {
                more |= sub.fill(&mut self.table, self.end)?;
            }
            self.current = self.table.first;
            if self.current.is_none() && !more {
                return Ok(false);
            }
        }
    }
}
