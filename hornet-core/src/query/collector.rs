//! Search result collection

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::{DocId, Score};

use super::sanitize_score;

/// Search result with doc_id and score
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchResult {
    pub doc_id: DocId,
    pub score: Score,
}

impl PartialEq for SearchResult {
    fn eq(&self, other: &Self) -> bool {
        self.doc_id == other.doc_id
    }
}

impl Eq for SearchResult {}

impl PartialOrd for SearchResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchResult {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the heap top is the weakest hit
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

/// Trait for search result collectors
///
/// Implement this trait to create custom collectors that can be
/// combined and passed to query execution. Doc IDs are global.
pub trait Collector {
    /// Called for each matching document
    fn collect(&mut self, doc_id: DocId, score: Score);
}

/// Collector for top-k results
pub struct TopKCollector {
    heap: BinaryHeap<SearchResult>,
    k: usize,
    /// Total documents seen by this collector
    total_seen: u32,
}

impl TopKCollector {
    pub fn new(k: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(k.saturating_add(1)),
            k,
            total_seen: 0,
        }
    }

    /// Get the total number of documents seen (scored) by this collector
    pub fn total_seen(&self) -> u32 {
        self.total_seen
    }

    pub fn into_sorted_results(self) -> Vec<SearchResult> {
        let mut results: Vec<_> = self.heap.into_vec();
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        results
    }

    /// Consume collector and return (sorted_results, total_seen)
    pub fn into_results_with_count(self) -> (Vec<SearchResult>, u32) {
        let total = self.total_seen;
        (self.into_sorted_results(), total)
    }
}

impl Collector for TopKCollector {
    fn collect(&mut self, doc_id: DocId, score: Score) {
        self.total_seen += 1;
        if self.k == 0 {
            return;
        }
        let score = sanitize_score(score);

        if self.heap.len() < self.k {
            self.heap.push(SearchResult { doc_id, score });
        } else if let Some(min) = self.heap.peek()
            && (score > min.score || (score == min.score && doc_id < min.doc_id))
        {
            self.heap.pop();
            self.heap.push(SearchResult { doc_id, score });
        }
    }
}

/// Collector that counts all matching documents
#[derive(Default)]
pub struct CountCollector {
    count: u64,
}

impl CountCollector {
    pub fn new() -> Self {
        Self { count: 0 }
    }

    /// Get the total count
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Collector for CountCollector {
    #[inline]
    fn collect(&mut self, _doc_id: DocId, _score: Score) {
        self.count += 1;
    }
}

/// Collects every hit in arrival order
#[derive(Debug, Default)]
pub struct VecCollector {
    pub hits: Vec<(DocId, Score)>,
}

impl Collector for VecCollector {
    fn collect(&mut self, doc_id: DocId, score: Score) {
        self.hits.push((doc_id, score));
    }
}

impl<C: Collector + ?Sized> Collector for &mut C {
    #[inline]
    fn collect(&mut self, doc_id: DocId, score: Score) {
        (**self).collect(doc_id, score);
    }
}

/// Shifts segment-local doc IDs into the searcher's global space
pub(crate) struct RebasedCollector<'c, C: ?Sized> {
    pub inner: &'c mut C,
    pub doc_base: DocId,
}

impl<C: Collector + ?Sized> Collector for RebasedCollector<'_, C> {
    #[inline]
    fn collect(&mut self, doc_id: DocId, score: Score) {
        self.inner.collect(doc_id + self.doc_base, score);
    }
}
