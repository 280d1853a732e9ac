//! Boost query - multiplies the score of the inner query

use std::fmt;
use std::sync::Arc;

use crate::searcher::IndexSearcher;
use crate::segment::{AcceptDocs, SegmentContext};
use crate::{DocId, Result, Score};

use super::{DocSet, Explanation, Query, Scorer, Weight};

/// Boost query - multiplies the score of the inner query
#[derive(Clone)]
pub struct BoostQuery {
    pub inner: Arc<dyn Query>,
    pub boost: f32,
}

impl fmt::Debug for BoostQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoostQuery")
            .field("inner", &self.inner)
            .field("boost", &self.boost)
            .finish()
    }
}

impl fmt::Display for BoostQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})^{}", self.inner, self.boost)
    }
}

impl BoostQuery {
    pub fn new(query: impl Query + 'static, boost: f32) -> Self {
        Self {
            inner: Arc::new(query),
            boost,
        }
    }
}

impl Query for BoostQuery {
    fn create_weight(&self, searcher: &IndexSearcher) -> Result<Box<dyn Weight>> {
        Ok(Box::new(BoostWeight {
            inner: self.inner.create_weight(searcher)?,
            boost: self.boost,
        }))
    }
}

struct BoostWeight {
    inner: Box<dyn Weight>,
    boost: f32,
}

impl Weight for BoostWeight {
    fn scorer<'a>(
        &'a self,
        segment: SegmentContext<'a>,
        accept_docs: Option<&'a dyn AcceptDocs>,
    ) -> Result<Option<Box<dyn Scorer + 'a>>> {
        Ok(self.inner.scorer(segment, accept_docs)?.map(|inner| {
            Box::new(BoostScorer {
                inner,
                boost: self.boost,
            }) as Box<dyn Scorer + 'a>
        }))
    }

    fn explain(&self, segment: SegmentContext<'_>, doc: DocId) -> Result<Explanation> {
        let inner = self.inner.explain(segment, doc)?;
        if !inner.is_match || self.boost == 1.0 {
            return Ok(inner);
        }
        Ok(Explanation::new(inner.value * self.boost, "product of:")
            .with_detail(inner)
            .with_detail(Explanation::new(self.boost, "boost")))
    }
}

struct BoostScorer<'a> {
    inner: Box<dyn Scorer + 'a>,
    boost: f32,
}

impl DocSet for BoostScorer<'_> {
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

impl Scorer for BoostScorer<'_> {
    fn score(&mut self) -> Result<Score> {
        Ok(self.inner.score()? * self.boost)
    }

    fn freq(&self) -> u32 {
        self.inner.freq()
    }
}
