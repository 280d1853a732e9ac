//! Boosted query - multiplies a query's score by a value source

use std::fmt;
use std::sync::Arc;

use crate::query::{DocSet, Explanation, Query, Scorer, Weight, sanitize_score};
use crate::searcher::IndexSearcher;
use crate::segment::{AcceptDocs, SegmentContext};
use crate::{DocId, Result, Score};

use super::{FunctionValues, ValueContext, ValueSource};

/// Matches what `query` matches, scoring `query score * source(doc)`
#[derive(Debug, Clone)]
pub struct BoostedQuery {
    pub query: Arc<dyn Query>,
    pub source: Arc<dyn ValueSource>,
}

impl BoostedQuery {
    pub fn new(query: impl Query + 'static, source: impl ValueSource + 'static) -> Self {
        Self {
            query: Arc::new(query),
            source: Arc::new(source),
        }
    }

    pub fn from_arcs(query: Arc<dyn Query>, source: Arc<dyn ValueSource>) -> Self {
        Self { query, source }
    }
}

impl fmt::Display for BoostedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "boost({},{})", self.query, self.source)
    }
}

impl Query for BoostedQuery {
    fn create_weight(&self, searcher: &IndexSearcher) -> Result<Box<dyn Weight>> {
        let inner = self.query.create_weight(searcher)?;
        let mut ctx = ValueContext::new();
        self.source.create_weight(&mut ctx, searcher)?;
        Ok(Box::new(BoostedWeight {
            inner,
            source: Arc::clone(&self.source),
            ctx,
        }))
    }
}

struct BoostedWeight {
    inner: Box<dyn Weight>,
    source: Arc<dyn ValueSource>,
    ctx: ValueContext,
}

impl Weight for BoostedWeight {
    fn scorer<'a>(
        &'a self,
        segment: SegmentContext<'a>,
        accept_docs: Option<&'a dyn AcceptDocs>,
    ) -> Result<Option<Box<dyn Scorer + 'a>>> {
        let Some(inner) = self.inner.scorer(segment, accept_docs)? else {
            return Ok(None);
        };
        let values = self.source.values(&self.ctx, segment)?;
        Ok(Some(Box::new(BoostedScorer { inner, values })))
    }

    fn explain(&self, segment: SegmentContext<'_>, doc: DocId) -> Result<Explanation> {
        let inner = self.inner.explain(segment, doc)?;
        if !inner.is_match {
            return Ok(inner);
        }
        let value = self.source.values(&self.ctx, segment)?.explain(doc)?;
        Ok(Explanation::new(
            sanitize_score(inner.value * value.value),
            format!("boosted by {}, product of:", self.source),
        )
        .with_detail(inner)
        .with_detail(value))
    }
}

struct BoostedScorer<'a> {
    inner: Box<dyn Scorer + 'a>,
    values: Box<dyn FunctionValues + 'a>,
}

impl DocSet for BoostedScorer<'_> {
    fn doc(&self) -> DocId {
        self.inner.doc()
    }

    fn advance(&mut self) -> Result<DocId> {
        self.inner.advance()
    }

    fn seek(&mut self, target: DocId) -> Result<DocId> {
        self.inner.seek(target)
    }

    fn size_hint(&self) -> u32 {
        self.inner.size_hint()
    }
}

impl Scorer for BoostedScorer<'_> {
    fn score(&mut self) -> Result<Score> {
        let doc = self.inner.doc();
        let factor = self.values.float_val(doc)?;
        Ok(sanitize_score(self.inner.score()? * factor))
    }

    fn freq(&self) -> u32 {
        self.inner.freq()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{ColumnValueSource, ConstValueSource};
    use crate::query::TermQuery;
    use crate::segment::MemorySegment;

    fn searcher() -> IndexSearcher {
        IndexSearcher::new(vec![Arc::new(
            MemorySegment::new(4)
                .with_docs("body", "rust", &[0, 2, 3])
                .with_float_column("pop", vec![1.0, 9.0, 3.0, f32::NAN]),
        )])
    }

    #[test]
    fn test_scales_inner_scores() {
        let searcher = searcher();
        let plain = searcher
            .search_top(&TermQuery::new("body", "rust"), 10)
            .unwrap();
        let boosted = searcher
            .search_top(
                &BoostedQuery::new(TermQuery::new("body", "rust"), ColumnValueSource::new("pop")),
                10,
            )
            .unwrap();

        // same match set, doc 1 never appears
        assert_eq!(boosted.len(), 3);
        assert_eq!(boosted[0].doc_id, 2);
        let base = plain[0].score;
        assert!((boosted[0].score - base * 3.0).abs() < 1e-5);
        assert_eq!(boosted[1].doc_id, 0);
        // NaN factor is clamped
        assert_eq!(boosted[2].doc_id, 3);
        assert_eq!(boosted[2].score, f32::MIN);
    }

    #[test]
    fn test_no_inner_scorer_means_no_matches() {
        let searcher = searcher();
        let query = BoostedQuery::new(TermQuery::new("body", "go"), ConstValueSource::new(2.0));
        assert!(searcher.search_top(&query, 10).unwrap().is_empty());
    }

    #[test]
    fn test_explain() {
        let searcher = searcher();
        let query = BoostedQuery::new(TermQuery::new("body", "rust"), ConstValueSource::new(2.0));
        let hits = searcher.search_top(&query, 10).unwrap();
        let expl = searcher.explain(&query, 2).unwrap();
        assert!((expl.value - hits[0].score).abs() < 1e-6);
        assert_eq!(expl.details[1].value, 2.0);
        assert!(!searcher.explain(&query, 1).unwrap().is_match);
    }
}
