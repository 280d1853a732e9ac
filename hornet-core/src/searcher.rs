//! Searcher - runs queries over a fixed list of segments
//!
//! `IndexSearcher` owns the one collection loop: it compiles a query into a
//! [`Weight`] once, asks it for a scorer per segment, and feeds global
//! `(doc, score)` pairs to a [`Collector`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::query::{
    Collector, CountCollector, Explanation, Query, RebasedCollector, SearchResult, TopKCollector,
    Weight,
};
use crate::segment::{SegmentContext, SegmentReader};
use crate::similarity::{Bm25Similarity, Similarity};
use crate::{DocId, TERMINATED};

/// How a weight's matches are enumerated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// Doc-at-a-time cursor tree, docs in increasing order
    #[default]
    Tree,
    /// Bucket-at-a-time over 2048-doc windows; boolean disjunctions only
    Windowed,
}

/// Searcher - provides search over loaded segments
pub struct IndexSearcher {
    segments: Vec<Arc<dyn SegmentReader>>,
    similarity: Arc<dyn Similarity>,
    config: SearchConfig,
}

impl IndexSearcher {
    /// Searcher over `segments` with BM25 and the default configuration
    pub fn new(segments: Vec<Arc<dyn SegmentReader>>) -> Self {
        Self {
            segments,
            similarity: Arc::new(Bm25Similarity::default()),
            config: SearchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_similarity(mut self, similarity: Arc<dyn Similarity>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn similarity(&self) -> &Arc<dyn Similarity> {
        &self.similarity
    }

    /// Segments with their global doc offsets
    pub fn segments(&self) -> impl Iterator<Item = SegmentContext<'_>> + '_ {
        let mut doc_base: DocId = 0;
        self.segments.iter().enumerate().map(move |(ord, reader)| {
            let ctx = SegmentContext::new(reader.as_ref(), ord, doc_base);
            doc_base += reader.max_doc();
            ctx
        })
    }

    /// Get number of segments
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Get total live document count across all segments
    pub fn num_docs(&self) -> u64 {
        self.segments.iter().map(|s| s.num_docs() as u64).sum()
    }

    /// Compile `query` for one execution against this searcher
    pub fn create_weight(&self, query: &dyn Query) -> Result<Box<dyn Weight>> {
        query.create_weight(self)
    }

    /// Top hits using the configured `default_top_k`
    pub fn search(&self, query: &dyn Query) -> Result<Vec<SearchResult>> {
        self.search_top(query, self.config.default_top_k)
    }

    /// Top `limit` hits, best first
    pub fn search_top(&self, query: &dyn Query, limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with(query, limit, ScoringStrategy::Tree)
    }

    /// Top `limit` hits using an explicit scoring strategy
    pub fn search_with(
        &self,
        query: &dyn Query,
        limit: usize,
        strategy: ScoringStrategy,
    ) -> Result<Vec<SearchResult>> {
        log::debug!("search {} limit={} strategy={:?}", query, limit, strategy);
        let weight = self.create_weight(query)?;
        let mut collector = TopKCollector::new(limit);
        match strategy {
            ScoringStrategy::Tree => self.collect(weight.as_ref(), &mut collector)?,
            ScoringStrategy::Windowed => self.collect_windowed(weight.as_ref(), &mut collector)?,
        }
        let (results, total_seen) = collector.into_results_with_count();
        log::debug!("search {} matched {} docs", query, total_seen);
        Ok(results)
    }

    /// Count all documents matching `query`
    pub fn count(&self, query: &dyn Query) -> Result<u64> {
        let weight = self.create_weight(query)?;
        let mut collector = CountCollector::new();
        self.collect(weight.as_ref(), &mut collector)?;
        Ok(collector.count())
    }

    /// Run `weight` over every segment, feeding global doc IDs to `collector`
    pub fn collect<C: Collector + ?Sized>(
        &self,
        weight: &dyn Weight,
        collector: &mut C,
    ) -> Result<()> {
        for segment in self.segments() {
            let Some(mut scorer) = weight.scorer(segment, segment.reader.live_docs())? else {
                continue;
            };
            let mut doc = scorer.doc();
            while doc != TERMINATED {
                let score = scorer.score()?;
                collector.collect(doc + segment.doc_base, score);
                doc = scorer.advance()?;
            }
        }
        Ok(())
    }

    /// Like [`collect`](Self::collect) with the windowed boolean scorer.
    ///
    /// Docs arrive out of order within each 2048-doc window.
    pub fn collect_windowed<C: Collector + ?Sized>(
        &self,
        weight: &dyn Weight,
        collector: &mut C,
    ) -> Result<()> {
        for segment in self.segments() {
            let Some(mut scorer) = weight.windowed_scorer(segment, segment.reader.live_docs())?
            else {
                continue;
            };
            let mut rebased = RebasedCollector {
                inner: &mut *collector,
                doc_base: segment.doc_base,
            };
            scorer.score_all(&mut rebased)?;
        }
        Ok(())
    }

    /// Explain how `doc` (a global doc ID) scores against `query`
    pub fn explain(&self, query: &dyn Query, doc: DocId) -> Result<Explanation> {
        let segment = self
            .segments()
            .find(|s| doc >= s.doc_base && doc - s.doc_base < s.max_doc())
            .ok_or_else(|| {
                Error::InvalidArgument(format!("doc {} is outside the searcher", doc))
            })?;
        let weight = self.create_weight(query)?;
        weight.explain(segment, doc - segment.doc_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{BooleanQuery, TermQuery, VecCollector};
    use crate::segment::MemorySegment;

    fn two_segments() -> IndexSearcher {
        IndexSearcher::new(vec![
            Arc::new(MemorySegment::new(5).with_docs("body", "rust", &[1, 4])),
            Arc::new(
                MemorySegment::new(5)
                    .with_docs("body", "rust", &[0, 2, 3])
                    .with_deleted(&[2]),
            ),
        ])
    }

    #[test]
    fn test_segments_have_doc_bases() {
        let searcher = two_segments();
        let bases: Vec<_> = searcher.segments().map(|s| (s.ord, s.doc_base)).collect();
        assert_eq!(bases, vec![(0, 0), (1, 5)]);
        assert_eq!(searcher.num_docs(), 9);
    }

    #[test]
    fn test_collect_global_ids_skips_deleted() {
        let searcher = two_segments();
        let weight = searcher
            .create_weight(&TermQuery::new("body", "rust"))
            .unwrap();
        let mut hits = VecCollector::default();
        searcher.collect(weight.as_ref(), &mut hits).unwrap();
        let docs: Vec<_> = hits.hits.iter().map(|&(d, _)| d).collect();
        assert_eq!(docs, vec![1, 4, 5, 8]);
        assert_eq!(searcher.count(&TermQuery::new("body", "rust")).unwrap(), 4);
    }

    #[test]
    fn test_search_uses_default_top_k() {
        let searcher = two_segments().with_config(SearchConfig {
            default_top_k: 2,
            ..SearchConfig::default()
        });
        assert_eq!(
            searcher
                .search(&TermQuery::new("body", "rust"))
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_windowed_requires_boolean() {
        let searcher = two_segments();
        let err = searcher
            .search_with(&TermQuery::new("body", "rust"), 10, ScoringStrategy::Windowed)
            .unwrap_err();
        assert!(matches!(err, Error::Query(_)));

        let q = BooleanQuery::new()
            .should(TermQuery::new("body", "rust"))
            .should(TermQuery::new("body", "go"));
        let hits = searcher
            .search_with(&q, 10, ScoringStrategy::Windowed)
            .unwrap();
        assert_eq!(hits.len(), 4);
    }

    #[test]
    fn test_explain_out_of_range() {
        let searcher = two_segments();
        assert!(matches!(
            searcher.explain(&TermQuery::new("body", "rust"), 10),
            Err(Error::InvalidArgument(_))
        ));
        assert!(
            searcher
                .explain(&TermQuery::new("body", "rust"), 8)
                .unwrap()
                .is_match
        );
    }

    #[test]
    fn test_strategy_serde() {
        let s: ScoringStrategy = serde_json::from_str(r#""windowed""#).unwrap();
        assert_eq!(s, ScoringStrategy::Windowed);
        assert_eq!(ScoringStrategy::default(), ScoringStrategy::Tree);
    }
}
