//! Function query - scores every live document by a value source

use std::fmt;
use std::sync::Arc;

use crate::query::{AllDocSet, DocSet, Explanation, Query, Scorer, Weight, sanitize_score};
use crate::searcher::IndexSearcher;
use crate::segment::{AcceptDocs, SegmentContext};
use crate::{DocId, Result, Score, TERMINATED};

use super::{FunctionValues, ValueContext, ValueSource};

/// Matches every live document with score `boost * source(doc)`
#[derive(Debug, Clone)]
pub struct FunctionQuery {
    pub source: Arc<dyn ValueSource>,
    pub boost: f32,
}

impl FunctionQuery {
    pub fn new(source: impl ValueSource + 'static) -> Self {
        Self::from_arc(Arc::new(source))
    }

    pub fn from_arc(source: Arc<dyn ValueSource>) -> Self {
        Self { source, boost: 1.0 }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

impl fmt::Display for FunctionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        if self.boost != 1.0 {
            write!(f, "^{}", self.boost)?;
        }
        Ok(())
    }
}

impl Query for FunctionQuery {
    fn create_weight(&self, searcher: &IndexSearcher) -> Result<Box<dyn Weight>> {
        let mut ctx = ValueContext::new();
        self.source.create_weight(&mut ctx, searcher)?;
        Ok(Box::new(FunctionWeight {
            source: Arc::clone(&self.source),
            ctx,
            boost: self.boost,
        }))
    }
}

struct FunctionWeight {
    source: Arc<dyn ValueSource>,
    ctx: ValueContext,
    boost: f32,
}

impl Weight for FunctionWeight {
    fn scorer<'a>(
        &'a self,
        segment: SegmentContext<'a>,
        accept_docs: Option<&'a dyn AcceptDocs>,
    ) -> Result<Option<Box<dyn Scorer + 'a>>> {
        let values = self.source.values(&self.ctx, segment)?;
        Ok(Some(Box::new(AllScorer {
            docs: AllDocSet::new(segment.max_doc(), accept_docs),
            values,
            boost: self.boost,
        })))
    }

    fn explain(&self, segment: SegmentContext<'_>, doc: DocId) -> Result<Explanation> {
        if doc >= segment.max_doc() {
            return Ok(Explanation::no_match(format!("doc {} out of range", doc)));
        }
        if let Some(live) = segment.reader.live_docs()
            && !live.accept(doc)
        {
            return Ok(Explanation::no_match(format!("doc {} is deleted", doc)));
        }
        let value = self.source.values(&self.ctx, segment)?.explain(doc)?;
        let score = sanitize_score(self.boost * value.value);
        Ok(
            Explanation::new(score, format!("FunctionQuery({}), product of:", self.source))
                .with_detail(value)
                .with_detail(Explanation::new(self.boost, "boost")),
        )
    }
}

/// Scorer over every accepted doc of a segment
struct AllScorer<'a> {
    docs: AllDocSet<'a>,
    values: Box<dyn FunctionValues + 'a>,
    boost: f32,
}

impl DocSet for AllScorer<'_> {
    fn doc(&self) -> DocId {
        self.docs.doc()
    }

    fn advance(&mut self) -> Result<DocId> {
        self.docs.advance()
    }

    fn seek(&mut self, target: DocId) -> Result<DocId> {
        self.docs.seek(target)
    }

    fn size_hint(&self) -> u32 {
        self.docs.size_hint()
    }
}

impl Scorer for AllScorer<'_> {
    fn score(&mut self) -> Result<Score> {
        let doc = self.docs.doc();
        if doc == TERMINATED {
            return Ok(0.0);
        }
        Ok(sanitize_score(self.boost * self.values.float_val(doc)?))
    }
}
