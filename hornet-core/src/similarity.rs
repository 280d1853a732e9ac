//! Similarity: the per-term scoring seam
//!
//! The scoring core treats relevance as opaque. A [`Similarity`] turns term
//! statistics into a per-segment [`SimScorer`] that maps `(doc, freq)` to a
//! float, and supplies the coordination factor used by boolean queries.
//! [`Bm25Similarity`] is the default.

use crate::query::Explanation;
use crate::segment::SegmentContext;
use crate::{DocId, Score, TermFreq};

/// BM25 k1 parameter - controls term frequency saturation
pub const BM25_K1: f32 = 1.2;

/// BM25 b parameter - controls length normalization
pub const BM25_B: f32 = 0.75;

/// Collection statistics for one term
#[derive(Debug, Clone, PartialEq)]
pub struct TermStats {
    pub field: String,
    pub term: Vec<u8>,
    /// Documents containing the term across all segments
    pub doc_freq: u64,
    /// Live documents across all segments
    pub num_docs: u64,
}

/// Scores one term's matches inside one segment
pub trait SimScorer {
    fn score(&self, doc: DocId, freq: TermFreq) -> Score;

    fn explain(&self, doc: DocId, freq: TermFreq) -> Explanation {
        Explanation::new(
            self.score(doc, freq),
            format!("score(doc={}, freq={})", doc, freq),
        )
    }
}

impl<F: Fn(DocId, TermFreq) -> Score> SimScorer for F {
    fn score(&self, doc: DocId, freq: TermFreq) -> Score {
        self(doc, freq)
    }
}

/// Relevance model plugged into term and boolean queries
pub trait Similarity {
    /// Factor applied when `overlap` of `max_overlap` clauses matched
    fn coord(&self, overlap: u32, max_overlap: u32) -> f32 {
        if max_overlap == 0 {
            1.0
        } else {
            overlap as f32 / max_overlap as f32
        }
    }

    /// Build the per-segment scorer for a term
    fn sim_scorer<'a>(&self, stats: &TermStats, segment: SegmentContext<'a>)
    -> Box<dyn SimScorer + 'a>;
}

/// Compute IDF (Inverse Document Frequency) using BM25 variant
#[inline]
pub fn bm25_idf(doc_freq: f32, total_docs: f32) -> f32 {
    ((total_docs - doc_freq + 0.5) / (doc_freq + 0.5) + 1.0).ln()
}

/// Compute BM25 score for a term occurrence
#[inline]
pub fn bm25_score(tf: f32, idf: f32, doc_len: f32, avg_doc_len: f32, k1: f32, b: f32) -> f32 {
    let length_norm = 1.0 - b + b * (doc_len / avg_doc_len.max(1.0));
    let tf_norm = (tf * (k1 + 1.0)) / (tf + k1 * length_norm);
    idf * tf_norm
}

/// Okapi BM25 with optional per-document length normalization
#[derive(Debug, Clone, Copy)]
pub struct Bm25Similarity {
    /// Term frequency saturation parameter (typically 1.2-2.0)
    pub k1: f32,
    /// Length normalization parameter (typically 0.75)
    pub b: f32,
}

impl Default for Bm25Similarity {
    fn default() -> Self {
        Self {
            k1: BM25_K1,
            b: BM25_B,
        }
    }
}

impl Similarity for Bm25Similarity {
    fn sim_scorer<'a>(
        &self,
        stats: &TermStats,
        segment: SegmentContext<'a>,
    ) -> Box<dyn SimScorer + 'a> {
        let idf = bm25_idf(stats.doc_freq as f32, stats.num_docs as f32);
        Box::new(Bm25Scorer {
            segment,
            field: stats.field.clone(),
            idf,
            avg_field_len: segment.reader.avg_field_len(&stats.field),
            k1: self.k1,
            b: self.b,
        })
    }
}

struct Bm25Scorer<'a> {
    segment: SegmentContext<'a>,
    field: String,
    idf: f32,
    avg_field_len: f32,
    k1: f32,
    b: f32,
}

impl Bm25Scorer<'_> {
    /// Documents without stored lengths are treated as average length
    fn doc_len(&self, doc: DocId) -> f32 {
        self.segment
            .reader
            .field_length(&self.field, doc)
            .map(|l| l as f32)
            .unwrap_or(self.avg_field_len)
    }
}

impl SimScorer for Bm25Scorer<'_> {
    fn score(&self, doc: DocId, freq: TermFreq) -> Score {
        bm25_score(
            freq as f32,
            self.idf,
            self.doc_len(doc),
            self.avg_field_len,
            self.k1,
            self.b,
        )
    }

    fn explain(&self, doc: DocId, freq: TermFreq) -> Explanation {
        let doc_len = self.doc_len(doc);
        Explanation::new(
            self.score(doc, freq),
            format!("bm25(doc={}, freq={})", doc, freq),
        )
        .with_detail(Explanation::new(self.idf, "idf"))
        .with_detail(Explanation::new(freq as f32, "termFreq"))
        .with_detail(Explanation::new(doc_len, "fieldLength"))
        .with_detail(Explanation::new(self.avg_field_len, "avgFieldLength"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::MemorySegment;

    #[test]
    fn test_default_coord() {
        let sim = Bm25Similarity::default();
        assert_eq!(sim.coord(0, 4), 0.0);
        assert_eq!(sim.coord(2, 4), 0.5);
        assert_eq!(sim.coord(4, 4), 1.0);
        assert_eq!(sim.coord(0, 0), 1.0);
    }

    #[test]
    fn test_bm25_higher_tf_scores_higher() {
        let segment = MemorySegment::new(4);
        let ctx = SegmentContext::new(&segment, 0, 0);
        let stats = TermStats {
            field: "body".into(),
            term: b"rust".to_vec(),
            doc_freq: 2,
            num_docs: 4,
        };
        let scorer = Bm25Similarity::default().sim_scorer(&stats, ctx);
        assert!(scorer.score(0, 3) > scorer.score(0, 1));
        assert!(scorer.score(0, 1) > 0.0);
    }

    #[test]
    fn test_bm25_shorter_field_scores_higher() {
        let segment = MemorySegment::new(2).with_field_lengths("body", vec![2, 20]);
        let ctx = SegmentContext::new(&segment, 0, 0);
        let stats = TermStats {
            field: "body".into(),
            term: b"rust".to_vec(),
            doc_freq: 1,
            num_docs: 2,
        };
        let scorer = Bm25Similarity::default().sim_scorer(&stats, ctx);
        assert!(scorer.score(0, 1) > scorer.score(1, 1));
        assert_eq!(scorer.explain(0, 1).details.len(), 4);
    }

    #[test]
    fn test_closure_sim_scorer() {
        let by_freq = |_doc: DocId, freq: TermFreq| freq as f32 * 2.0;
        assert_eq!(by_freq.score(3, 2), 4.0);
        assert_eq!(SimScorer::explain(&by_freq, 3, 2).value, 4.0);
    }
}
