//! Segment access: the seam between the scoring core and a postings provider
//!
//! Term dictionaries and postings storage live outside this crate. A provider
//! implements [`SegmentReader`] and hands out [`Postings`] cursors; the
//! scoring core never stores postings itself. [`MemorySegment`] is a small
//! in-memory reader for embedding and tests.

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::query::{DocSet, VecPostings};
use crate::{DocId, Result, TermFreq};

/// A postings cursor for one term in one segment
pub trait Postings: DocSet {
    /// Term frequency in the current document
    fn freq(&self) -> TermFreq;
}

impl DocSet for Box<dyn Postings + '_> {
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

impl Postings for Box<dyn Postings + '_> {
    #[inline]
    fn freq(&self) -> TermFreq {
        (**self).freq()
    }
}

/// Per-document acceptance filter (live docs, pushed-down filters)
pub trait AcceptDocs {
    fn accept(&self, doc: DocId) -> bool;
}

impl<F: Fn(DocId) -> bool> AcceptDocs for F {
    #[inline]
    fn accept(&self, doc: DocId) -> bool {
        self(doc)
    }
}

/// Read-only view of one index segment
pub trait SegmentReader {
    /// One past the largest doc ID in this segment
    fn max_doc(&self) -> DocId;

    /// Live docs filter, `None` when the segment has no deletions
    fn live_docs(&self) -> Option<&dyn AcceptDocs>;

    /// Number of live documents
    fn num_docs(&self) -> DocId {
        self.max_doc()
    }

    /// Number of documents containing `term`
    fn doc_freq(&self, field: &str, term: &[u8]) -> Result<u32>;

    /// Postings cursor for `term`, `None` when the term is absent
    fn postings(&self, field: &str, term: &[u8]) -> Result<Option<Box<dyn Postings + '_>>>;

    /// Indexed length of `field` in `doc`, when the provider keeps norms
    fn field_length(&self, _field: &str, _doc: DocId) -> Option<u32> {
        None
    }

    /// Average indexed length of `field`
    fn avg_field_len(&self, _field: &str) -> f32 {
        1.0
    }

    /// Dense per-document float values for `field`, if stored
    fn float_column(&self, _field: &str) -> Option<&[f32]> {
        None
    }
}

/// One segment bound inside a searcher
#[derive(Clone, Copy)]
pub struct SegmentContext<'a> {
    pub reader: &'a dyn SegmentReader,
    /// Position of this segment in the searcher
    pub ord: usize,
    /// Offset turning segment-local doc IDs into global ones
    pub doc_base: DocId,
}

impl<'a> SegmentContext<'a> {
    pub fn new(reader: &'a dyn SegmentReader, ord: usize, doc_base: DocId) -> Self {
        Self {
            reader,
            ord,
            doc_base,
        }
    }

    #[inline]
    pub fn max_doc(&self) -> DocId {
        self.reader.max_doc()
    }
}

impl fmt::Debug for SegmentContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentContext")
            .field("ord", &self.ord)
            .field("doc_base", &self.doc_base)
            .field("max_doc", &self.reader.max_doc())
            .finish()
    }
}

// ── MemorySegment ────────────────────────────────────────────────────────

/// Deleted-document set acting as a live-docs filter
#[derive(Debug, Default, Clone)]
pub struct DeletedDocs(FxHashSet<DocId>);

impl AcceptDocs for DeletedDocs {
    #[inline]
    fn accept(&self, doc: DocId) -> bool {
        !self.0.contains(&doc)
    }
}

/// In-memory segment reader
///
/// Holds fully materialized postings keyed by `(field, term)`.
#[derive(Debug, Default, Clone)]
pub struct MemorySegment {
    max_doc: DocId,
    postings: FxHashMap<(String, Vec<u8>), Arc<Vec<(DocId, TermFreq)>>>,
    field_lengths: FxHashMap<String, Vec<u32>>,
    float_columns: FxHashMap<String, Vec<f32>>,
    deleted: Option<DeletedDocs>,
}

impl MemorySegment {
    pub fn new(max_doc: DocId) -> Self {
        Self {
            max_doc,
            ..Default::default()
        }
    }

    /// Attach postings for a term. Entries are sorted and deduplicated by doc.
    pub fn with_postings(
        mut self,
        field: &str,
        term: impl AsRef<[u8]>,
        postings: &[(DocId, TermFreq)],
    ) -> Self {
        let mut postings = postings.to_vec();
        postings.sort_by_key(|&(doc, _)| doc);
        postings.dedup_by_key(|&mut (doc, _)| doc);
        postings.retain(|&(doc, _)| doc < self.max_doc);
        self.postings.insert(
            (field.to_string(), term.as_ref().to_vec()),
            Arc::new(postings),
        );
        self
    }

    /// Attach postings with a term frequency of 1 for every doc
    pub fn with_docs(self, field: &str, term: impl AsRef<[u8]>, docs: &[DocId]) -> Self {
        let postings: Vec<_> = docs.iter().map(|&d| (d, 1)).collect();
        self.with_postings(field, term, &postings)
    }

    pub fn with_field_lengths(mut self, field: &str, lengths: Vec<u32>) -> Self {
        self.field_lengths.insert(field.to_string(), lengths);
        self
    }

    pub fn with_float_column(mut self, field: &str, values: Vec<f32>) -> Self {
        self.float_columns.insert(field.to_string(), values);
        self
    }

    /// Mark documents as deleted
    pub fn with_deleted(mut self, docs: &[DocId]) -> Self {
        let deleted = self.deleted.get_or_insert_with(DeletedDocs::default);
        deleted.0.extend(docs.iter().copied());
        self
    }
}

impl SegmentReader for MemorySegment {
    fn max_doc(&self) -> DocId {
        self.max_doc
    }

    fn live_docs(&self) -> Option<&dyn AcceptDocs> {
        self.deleted.as_ref().map(|d| d as &dyn AcceptDocs)
    }

    fn num_docs(&self) -> DocId {
        let deleted = self
            .deleted
            .as_ref()
            .map(|d| d.0.iter().filter(|&&doc| doc < self.max_doc).count())
            .unwrap_or(0);
        self.max_doc - deleted as DocId
    }

    fn doc_freq(&self, field: &str, term: &[u8]) -> Result<u32> {
        Ok(self
            .postings
            .get(&(field.to_string(), term.to_vec()))
            .map(|p| p.len() as u32)
            .unwrap_or(0))
    }

    fn postings(&self, field: &str, term: &[u8]) -> Result<Option<Box<dyn Postings + '_>>> {
        Ok(self
            .postings
            .get(&(field.to_string(), term.to_vec()))
            .map(|p| Box::new(VecPostings::new(Arc::clone(p))) as Box<dyn Postings + '_>))
    }

    fn field_length(&self, field: &str, doc: DocId) -> Option<u32> {
        self.field_lengths
            .get(field)
            .and_then(|lengths| lengths.get(doc as usize).copied())
    }

    fn avg_field_len(&self, field: &str) -> f32 {
        match self.field_lengths.get(field) {
            Some(lengths) if !lengths.is_empty() => {
                lengths.iter().map(|&l| l as f64).sum::<f64>() as f32 / lengths.len() as f32
            }
            _ => 1.0,
        }
    }

    fn float_column(&self, field: &str) -> Option<&[f32]> {
        self.float_columns.get(field).map(|v| v.as_slice())
    }
}
