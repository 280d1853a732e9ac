//! DocSet trait and concrete implementations for document iteration.
//!
//! `DocSet` is the base abstraction for forward-only cursors over sorted document IDs.
//! Postings, filter results, and scorers all implement this trait. Every
//! movement returns a `Result` so postings I/O failures reach the driver loop.

use std::sync::Arc;

use crate::segment::{AcceptDocs, Postings};
use crate::{DocId, Result, Score, TERMINATED, TermFreq};

use super::Scorer;

// ── DocSet trait ─────────────────────────────────────────────────────────

/// Forward-only cursor over sorted document IDs.
///
/// A freshly constructed cursor is already positioned on its first document
/// (or on [`TERMINATED`]). Doc IDs returned by successive `advance`/`seek`
/// calls are strictly increasing until [`TERMINATED`], after which every call
/// returns [`TERMINATED`] again.
pub trait DocSet {
    /// Current document ID, or [`TERMINATED`] if exhausted.
    fn doc(&self) -> DocId;

    /// Advance to the next document. Returns the new doc ID or [`TERMINATED`].
    fn advance(&mut self) -> Result<DocId>;

    /// Seek to the first document >= `target`. Returns doc ID or [`TERMINATED`].
    ///
    /// Never moves backwards: if the cursor already sits on or past `target`
    /// the current doc is returned unchanged.
    fn seek(&mut self, target: DocId) -> Result<DocId> {
        let mut doc = self.doc();
        while doc < target {
            doc = self.advance()?;
        }
        Ok(doc)
    }

    /// Estimated number of remaining documents.
    fn size_hint(&self) -> u32;
}

// ── DocSet for Box<dyn DocSet> ───────────────────────────────────────────

impl DocSet for Box<dyn DocSet + '_> {
    #[inline]
    fn doc(&self) -> DocId {
        (**self).doc()
    }
    #[inline]
    fn advance(&mut self) -> Result<DocId> {
        (**self).advance()
    }
    #[inline]
    fn seek(&mut self, target: DocId) -> Result<DocId> {
        (**self).seek(target)
    }
    #[inline]
    fn size_hint(&self) -> u32 {
        (**self).size_hint()
    }
}

// ── VecPostings ──────────────────────────────────────────────────────────

/// Postings backed by a sorted `Vec<(doc, freq)>`. Binary search for seek.
#[derive(Debug, Clone)]
pub struct VecPostings {
    postings: Arc<Vec<(DocId, TermFreq)>>,
    pos: usize,
}

impl VecPostings {
    /// Wrap already-sorted postings. Doc IDs must be strictly increasing.
    pub fn new(postings: Arc<Vec<(DocId, TermFreq)>>) -> Self {
        debug_assert!(postings.windows(2).all(|w| w[0].0 < w[1].0));
        Self { postings, pos: 0 }
    }

    /// Postings with a term frequency of 1 for every doc.
    pub fn from_docs(docs: &[DocId]) -> Self {
        Self::new(Arc::new(docs.iter().map(|&d| (d, 1)).collect()))
    }
}

impl DocSet for VecPostings {
    #[inline]
    fn doc(&self) -> DocId {
        self.postings
            .get(self.pos)
            .map(|&(doc, _)| doc)
            .unwrap_or(TERMINATED)
    }

    #[inline]
    fn advance(&mut self) -> Result<DocId> {
        if self.pos < self.postings.len() {
            self.pos += 1;
        }
        Ok(self.doc())
    }

    fn seek(&mut self, target: DocId) -> Result<DocId> {
        if self.pos >= self.postings.len() {
            return Ok(TERMINATED);
        }
        let remaining = &self.postings[self.pos..];
        let offset = remaining.partition_point(|&(doc, _)| doc < target);
        self.pos += offset;
        Ok(self.doc())
    }

    fn size_hint(&self) -> u32 {
        self.postings.len().saturating_sub(self.pos) as u32
    }
}

impl Postings for VecPostings {
    #[inline]
    fn freq(&self) -> TermFreq {
        self.postings.get(self.pos).map(|&(_, f)| f).unwrap_or(0)
    }
}

// ── VecScorer ────────────────────────────────────────────────────────────

/// Scorer over precomputed `(doc, score)` pairs.
///
/// Useful for plugging externally scored candidates (or test fixtures)
/// straight into the combinators.
#[derive(Debug, Clone)]
pub struct VecScorer {
    entries: Arc<Vec<(DocId, Score)>>,
    pos: usize,
}

impl VecScorer {
    pub fn new(mut entries: Vec<(DocId, Score)>) -> Self {
        entries.sort_by_key(|&(doc, _)| doc);
        entries.dedup_by_key(|&mut (doc, _)| doc);
        Self {
            entries: Arc::new(entries),
            pos: 0,
        }
    }

    /// Every doc scores `score`.
    pub fn with_constant(docs: &[DocId], score: Score) -> Self {
        Self::new(docs.iter().map(|&d| (d, score)).collect())
    }
}

impl DocSet for VecScorer {
    #[inline]
    fn doc(&self) -> DocId {
        self.entries
            .get(self.pos)
            .map(|&(doc, _)| doc)
            .unwrap_or(TERMINATED)
    }

    #[inline]
    fn advance(&mut self) -> Result<DocId> {
        if self.pos < self.entries.len() {
            self.pos += 1;
        }
        Ok(self.doc())
    }

    fn seek(&mut self, target: DocId) -> Result<DocId> {
        let remaining = &self.entries[self.pos.min(self.entries.len())..];
        self.pos += remaining.partition_point(|&(doc, _)| doc < target);
        Ok(self.doc())
    }

    fn size_hint(&self) -> u32 {
        self.entries.len().saturating_sub(self.pos) as u32
    }
}

impl Scorer for VecScorer {
    fn score(&mut self) -> Result<Score> {
        Ok(self.entries.get(self.pos).map(|&(_, s)| s).unwrap_or(0.0))
    }
}

// ── AllDocSet ────────────────────────────────────────────────────────────

/// DocSet that yields all accepted documents in `0..max_doc`.
pub struct AllDocSet<'a> {
    current: DocId,
    max_doc: DocId,
    accept_docs: Option<&'a dyn AcceptDocs>,
}

impl<'a> AllDocSet<'a> {
    pub fn new(max_doc: DocId, accept_docs: Option<&'a dyn AcceptDocs>) -> Self {
        let mut docs = Self {
            current: 0,
            max_doc,
            accept_docs,
        };
        docs.current = docs.next_accepted(0);
        docs
    }

    fn next_accepted(&self, from: DocId) -> DocId {
        let mut doc = from;
        while doc < self.max_doc {
            match self.accept_docs {
                Some(accept) if !accept.accept(doc) => doc += 1,
                _ => return doc,
            }
        }
        TERMINATED
    }
}

impl DocSet for AllDocSet<'_> {
    #[inline]
    fn doc(&self) -> DocId {
        self.current
    }

    #[inline]
    fn advance(&mut self) -> Result<DocId> {
        if self.current != TERMINATED {
            self.current = self.next_accepted(self.current + 1);
        }
        Ok(self.current)
    }

    fn seek(&mut self, target: DocId) -> Result<DocId> {
        if target > self.current {
            self.current = self.next_accepted(target);
        }
        Ok(self.current)
    }

    fn size_hint(&self) -> u32 {
        self.max_doc.saturating_sub(self.current.min(self.max_doc))
    }
}

/// Drain a DocSet into a vector of doc IDs, starting from its current position.
pub fn collect_docs<D: DocSet + ?Sized>(docs: &mut D) -> Result<Vec<DocId>> {
    let mut out = Vec::new();
    let mut doc = docs.doc();
    while doc != TERMINATED {
        out.push(doc);
        doc = docs.advance()?;
    }
    Ok(out)
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_postings_basic() {
        let mut ds = VecPostings::from_docs(&[1, 3, 5, 7, 9]);

        assert_eq!(ds.doc(), 1);
        assert_eq!(ds.advance().unwrap(), 3);
        assert_eq!(ds.advance().unwrap(), 5);
        assert_eq!(ds.seek(7).unwrap(), 7);
        assert_eq!(ds.advance().unwrap(), 9);
        assert_eq!(ds.advance().unwrap(), TERMINATED);
        assert_eq!(ds.doc(), TERMINATED);
        assert_eq!(ds.advance().unwrap(), TERMINATED);
    }

    #[test]
    fn test_vec_postings_seek_past() {
        let mut ds = VecPostings::from_docs(&[1, 5, 10, 20]);

        assert_eq!(ds.seek(3).unwrap(), 5);
        // seeking backwards stays put
        assert_eq!(ds.seek(2).unwrap(), 5);
        assert_eq!(ds.seek(15).unwrap(), 20);
        assert_eq!(ds.seek(21).unwrap(), TERMINATED);
    }

    #[test]
    fn test_vec_postings_freq() {
        let mut ds = VecPostings::new(Arc::new(vec![(2, 4), (6, 1)]));
        assert_eq!(ds.freq(), 4);
        ds.advance().unwrap();
        assert_eq!(ds.freq(), 1);
        ds.advance().unwrap();
        assert_eq!(ds.freq(), 0);
    }

    #[test]
    fn test_vec_postings_empty() {
        let ds = VecPostings::from_docs(&[]);
        assert_eq!(ds.doc(), TERMINATED);
        assert_eq!(ds.size_hint(), 0);
    }

    #[test]
    fn test_vec_scorer_sorts_and_scores() {
        let mut s = VecScorer::new(vec![(4, 2.0), (1, 0.5), (4, 9.0)]);
        assert_eq!(s.doc(), 1);
        assert_eq!(s.score().unwrap(), 0.5);
        assert_eq!(s.advance().unwrap(), 4);
        assert_eq!(s.score().unwrap(), 2.0);
        assert_eq!(s.advance().unwrap(), TERMINATED);
    }

    #[test]
    fn test_all_docset() {
        let mut ds = AllDocSet::new(3, None);
        assert_eq!(ds.doc(), 0);
        assert_eq!(ds.advance().unwrap(), 1);
        assert_eq!(ds.advance().unwrap(), 2);
        assert_eq!(ds.advance().unwrap(), TERMINATED);
        assert_eq!(ds.advance().unwrap(), TERMINATED);
    }

    #[test]
    fn test_all_docset_skips_rejected() {
        let odd_only = |doc: DocId| doc % 2 == 1;
        let mut ds = AllDocSet::new(6, Some(&odd_only));
        assert_eq!(collect_docs(&mut ds).unwrap(), vec![1, 3, 5]);
    }

    #[test]
    fn test_all_docset_seek() {
        let mut ds = AllDocSet::new(10, None);
        assert_eq!(ds.seek(5).unwrap(), 5);
        assert_eq!(ds.seek(9).unwrap(), 9);
        assert_eq!(ds.seek(10).unwrap(), TERMINATED);
    }

    #[test]
    fn test_size_hint() {
        let mut ds = VecPostings::from_docs(&[1, 2, 3, 4, 5]);
        assert_eq!(ds.size_hint(), 5);
        ds.advance().unwrap();
        assert_eq!(ds.size_hint(), 4);
        ds.seek(4).unwrap();
        assert_eq!(ds.size_hint(), 2); // pos=3, remaining: [4, 5]
    }
}
