//! Disjunction (OR) with a minimum-number-of-matchers threshold

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::binary_heap::PeekMut;

use crate::{DocId, Error, Result, Score, TERMINATED};

use super::{DocSet, Scorer};

/// Heap entry: a sub-scorer with its cached current doc
struct HeapedScorer<'a> {
    doc: DocId,
    scorer: Box<dyn Scorer + 'a>,
}

impl PartialEq for HeapedScorer<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.doc == other.doc
    }
}

impl Eq for HeapedScorer<'_> {}

impl Ord for HeapedScorer<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on doc: lowest doc at the top
        other.doc.cmp(&self.doc)
    }
}

impl PartialOrd for HeapedScorer<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue of scorers ordered by their current doc
pub(crate) struct DocQueue<'a> {
    heap: BinaryHeap<HeapedScorer<'a>>,
}

impl<'a> DocQueue<'a> {
    /// Build a queue from positioned scorers, dropping exhausted ones
    pub fn new(scorers: Vec<Box<dyn Scorer + 'a>>) -> Self {
        let heap = scorers
            .into_iter()
            .filter(|s| s.doc() != TERMINATED)
            .map(|scorer| HeapedScorer {
                doc: scorer.doc(),
                scorer,
            })
            .collect();
        Self { heap }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Doc of the top scorer, or TERMINATED when empty
    #[inline]
    pub fn top_doc(&self) -> DocId {
        self.heap.peek().map(|e| e.doc).unwrap_or(TERMINATED)
    }

    /// Score of the top scorer on its current doc
    pub fn top_score(&mut self) -> Result<Score> {
        match self.heap.peek_mut() {
            Some(mut top) => top.scorer.score(),
            None => Ok(0.0),
        }
    }

    /// Advance the top scorer and restore heap order, popping it when exhausted.
    ///
    /// Returns false if the top was popped (or the queue was empty).
    pub fn top_advance_and_adjust_else_pop(&mut self) -> Result<bool> {
        let Some(mut top) = self.heap.peek_mut() else {
            return Ok(false);
        };
        let doc = top.scorer.advance()?;
        if doc == TERMINATED {
            PeekMut::pop(top);
            Ok(false)
        } else {
            top.doc = doc;
            Ok(true)
        }
    }

    /// Seek the top scorer to `target` and restore heap order, popping it when exhausted.
    pub fn top_seek_and_adjust_else_pop(&mut self, target: DocId) -> Result<bool> {
        let Some(mut top) = self.heap.peek_mut() else {
            return Ok(false);
        };
        let doc = top.scorer.seek(target)?;
        if doc == TERMINATED {
            PeekMut::pop(top);
            Ok(false)
        } else {
            top.doc = doc;
            Ok(true)
        }
    }

    fn size_hint(&self) -> u32 {
        self.heap
            .iter()
            .map(|e| e.scorer.size_hint())
            .fold(0u32, |acc, n| acc.saturating_add(n))
    }
}

/// Scorer over docs matched by at least `min_matchers` of its children.
///
/// The score of a doc is the sum of the scores of the children that matched it.
pub struct DisjunctionScorer<'a> {
    queue: DocQueue<'a>,
    min_matchers: u32,
    doc: DocId,
    score: Score,
    nr_matchers: u32,
}

impl<'a> DisjunctionScorer<'a> {
    pub fn new(children: Vec<Box<dyn Scorer + 'a>>, min_matchers: u32) -> Result<Self> {
        if min_matchers == 0 {
            return Err(Error::InvalidArgument(
                "min_matchers must be at least 1".to_string(),
            ));
        }
        if children.len() < 2 {
            return Err(Error::InvalidArgument(format!(
                "disjunction requires at least 2 children, got {}",
                children.len()
            )));
        }
        let mut scorer = Self {
            queue: DocQueue::new(children),
            min_matchers,
            doc: 0,
            score: 0.0,
            nr_matchers: 0,
        };
        if !scorer.enough_left() || !scorer.advance_after_current()? {
            scorer.doc = TERMINATED;
        }
        Ok(scorer)
    }

    /// Number of children matching the current doc
    #[inline]
    pub fn nr_matchers(&self) -> u32 {
        self.nr_matchers
    }

    #[inline]
    fn enough_left(&self) -> bool {
        self.queue.len() as u32 >= self.min_matchers
    }

    /// Gather the next batch of children sharing the lowest doc.
    ///
    /// Loops until a batch reaches `min_matchers` (true) or too few children
    /// remain for any further doc to qualify (false).
    fn advance_after_current(&mut self) -> Result<bool> {
        loop {
            self.doc = self.queue.top_doc();
            self.score = self.queue.top_score()?;
            self.nr_matchers = 1;
            loop {
                if !self.queue.top_advance_and_adjust_else_pop()? && self.queue.is_empty() {
                    break;
                }
                if self.queue.top_doc() != self.doc {
                    break;
                }
                self.score += self.queue.top_score()?;
                self.nr_matchers += 1;
            }

            if self.nr_matchers >= self.min_matchers {
                return Ok(true);
            }
            if !self.enough_left() {
                return Ok(false);
            }
        }
    }
}

impl DocSet for DisjunctionScorer<'_> {
    fn doc(&self) -> DocId {
        self.doc
    }

    fn advance(&mut self) -> Result<DocId> {
        if self.doc == TERMINATED {
            return Ok(TERMINATED);
        }
        if !self.enough_left() || !self.advance_after_current()? {
            self.doc = TERMINATED;
        }
        Ok(self.doc)
    }

    fn seek(&mut self, target: DocId) -> Result<DocId> {
        if self.doc == TERMINATED || target <= self.doc {
            return Ok(self.doc);
        }
        loop {
            if !self.enough_left() {
                self.doc = TERMINATED;
                return Ok(TERMINATED);
            }
            if self.queue.top_doc() >= target {
                if !self.advance_after_current()? {
                    self.doc = TERMINATED;
                }
                return Ok(self.doc);
            }
            self.queue.top_seek_and_adjust_else_pop(target)?;
        }
    }

    fn size_hint(&self) -> u32 {
        self.queue.size_hint()
    }
}

impl Scorer for DisjunctionScorer<'_> {
    fn score(&mut self) -> Result<Score> {
        Ok(self.score)
    }

    fn freq(&self) -> u32 {
        self.nr_matchers
    }

    fn matching_clauses(&mut self) -> Result<u32> {
        Ok(self.nr_matchers)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::query::{VecScorer, collect_docs};

    fn scorer(docs: &[DocId]) -> Box<dyn Scorer + 'static> {
        Box::new(VecScorer::with_constant(docs, 1.0))
    }

    fn drain(s: &mut DisjunctionScorer<'_>) -> Vec<(DocId, u32, Score)> {
        let mut out = Vec::new();
        while s.doc() != TERMINATED {
            out.push((s.doc(), s.nr_matchers(), s.score().unwrap()));
            s.advance().unwrap();
        }
        out
    }

    #[test]
    fn test_union() {
        let mut disj =
            DisjunctionScorer::new(vec![scorer(&[1, 4, 7]), scorer(&[2, 4, 9])], 1).unwrap();
        assert_eq!(
            drain(&mut disj),
            vec![
                (1, 1, 1.0),
                (2, 1, 1.0),
                (4, 2, 2.0),
                (7, 1, 1.0),
                (9, 1, 1.0)
            ]
        );
        assert_eq!(disj.advance().unwrap(), TERMINATED);
    }

    #[test]
    fn test_min_should_match_two_of_three() {
        let mut disj = DisjunctionScorer::new(
            vec![scorer(&[1, 3, 5]), scorer(&[3, 4, 5]), scorer(&[5])],
            2,
        )
        .unwrap();
        assert_eq!(drain(&mut disj), vec![(3, 2, 2.0), (5, 3, 3.0)]);
    }

    #[test]
    fn test_too_few_live_children() {
        let disj = DisjunctionScorer::new(vec![scorer(&[1, 2]), scorer(&[])], 2).unwrap();
        assert_eq!(disj.doc(), TERMINATED);
    }

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            DisjunctionScorer::new(vec![scorer(&[1]), scorer(&[2])], 0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            DisjunctionScorer::new(vec![scorer(&[1])], 1),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_seek() {
        let mut disj = DisjunctionScorer::new(
            vec![scorer(&[1, 10, 20]), scorer(&[5, 10, 30]), scorer(&[10, 25])],
            2,
        )
        .unwrap();
        assert_eq!(disj.doc(), 10);
        assert_eq!(disj.nr_matchers(), 3);
        assert_eq!(disj.seek(10).unwrap(), 10);
        assert_eq!(disj.seek(11).unwrap(), TERMINATED);

        let mut disj =
            DisjunctionScorer::new(vec![scorer(&[1, 10, 20]), scorer(&[5, 10, 30])], 1).unwrap();
        assert_eq!(disj.seek(6).unwrap(), 10);
        assert_eq!(disj.nr_matchers(), 2);
        assert_eq!(disj.seek(21).unwrap(), 30);
        assert_eq!(disj.advance().unwrap(), TERMINATED);
    }

    #[test]
    fn test_scores_sum_matching_children() {
        let a: Box<dyn Scorer> = Box::new(VecScorer::new(vec![(1, 0.25), (2, 1.0)]));
        let b: Box<dyn Scorer> = Box::new(VecScorer::new(vec![(2, 2.0)]));
        let mut disj = DisjunctionScorer::new(vec![a, b], 1).unwrap();
        assert_eq!(drain(&mut disj), vec![(1, 1, 0.25), (2, 2, 3.0)]);
    }

    #[test]
    fn test_matches_overlap_counts_randomized() {
        let mut rng = StdRng::seed_from_u64(1234);
        for _ in 0..50 {
            let num_children = rng.random_range(2..6);
            let sets: Vec<BTreeSet<DocId>> = (0..num_children)
                .map(|_| (0..200).filter(|_| rng.random_bool(0.3)).collect())
                .collect();
            let min = rng.random_range(1..=num_children as u32);

            let mut overlap: BTreeMap<DocId, u32> = BTreeMap::new();
            for set in &sets {
                for &doc in set {
                    *overlap.entry(doc).or_default() += 1;
                }
            }
            let expected: Vec<(DocId, u32)> = overlap
                .into_iter()
                .filter(|&(_, count)| count >= min)
                .collect();

            let children = sets
                .iter()
                .map(|s| scorer(&s.iter().copied().collect::<Vec<_>>()))
                .collect();
            let mut disj = DisjunctionScorer::new(children, min).unwrap();
            let got: Vec<(DocId, u32)> = drain(&mut disj)
                .into_iter()
                .map(|(doc, count, _)| (doc, count))
                .collect();
            assert_eq!(got, expected, "min_matchers = {}", min);
        }
    }

    #[test]
    fn test_seek_randomized() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..30 {
            let sets: Vec<BTreeSet<DocId>> = (0..3)
                .map(|_| (0..400).filter(|_| rng.random_bool(0.2)).collect())
                .collect();
            let expected: Vec<DocId> = sets
                .iter()
                .flatten()
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            let children = sets
                .iter()
                .map(|s| scorer(&s.iter().copied().collect::<Vec<_>>()))
                .collect();
            let mut disj = DisjunctionScorer::new(children, 1).unwrap();

            let mut target = 0;
            loop {
                let doc = disj.seek(target).unwrap();
                let want = expected
                    .iter()
                    .copied()
                    .find(|&d| d >= target)
                    .unwrap_or(TERMINATED);
                assert_eq!(doc, want);
                if doc == TERMINATED {
                    break;
                }
                target = doc + rng.random_range(1..15);
            }
        }
    }

    #[test]
    fn test_collect_docs_union_of_three() {
        let mut disj = DisjunctionScorer::new(
            vec![scorer(&[0, 8]), scorer(&[3]), scorer(&[8, 100])],
            1,
        )
        .unwrap();
        assert_eq!(collect_docs(&mut disj).unwrap(), vec![0, 3, 8, 100]);
    }
}
