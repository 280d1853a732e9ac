//! Query scores exposed as a value source

use std::fmt;
use std::sync::Arc;

use crate::query::{Explanation, Query, Scorer, Weight};
use crate::searcher::IndexSearcher;
use crate::segment::{AcceptDocs, SegmentContext};
use crate::{DocId, Error, Result};

use super::{ContextValue, FunctionValues, SourceId, ValueContext, ValueSource};

/// Scores of `query`, or `default` for documents it does not match
#[derive(Debug)]
pub struct QueryValueSource {
    id: SourceId,
    query: Arc<dyn Query>,
    default: f32,
}

impl QueryValueSource {
    pub fn new(query: impl Query + 'static, default: f32) -> Self {
        Self::from_arc(Arc::new(query), default)
    }

    pub fn from_arc(query: Arc<dyn Query>, default: f32) -> Self {
        Self {
            id: SourceId::next(),
            query,
            default,
        }
    }

    pub fn query(&self) -> &Arc<dyn Query> {
        &self.query
    }

    pub fn default_value(&self) -> f32 {
        self.default
    }
}

impl fmt::Display for QueryValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query({},def={})", self.query, self.default)
    }
}

impl ValueSource for QueryValueSource {
    fn id(&self) -> SourceId {
        self.id
    }

    fn create_weight(&self, ctx: &mut ValueContext, searcher: &IndexSearcher) -> Result<()> {
        let weight = self.query.create_weight(searcher)?;
        ctx.put(self.id, ContextValue::Weight(weight));
        Ok(())
    }

    fn values<'a>(
        &'a self,
        ctx: &'a ValueContext,
        segment: SegmentContext<'a>,
    ) -> Result<Box<dyn FunctionValues + 'a>> {
        let weight = ctx.weight(self.id).ok_or_else(|| {
            Error::InvalidArgument(format!("{}: weight was not created", self))
        })?;
        Ok(Box::new(QueryDocValues::new(
            weight,
            segment,
            segment.reader.live_docs(),
            self.default,
        )))
    }
}

/// Per-segment view of an inner query's scores.
///
/// The inner scorer is created on first use and only ever moved forward as
/// far as the requested doc. Asking for an earlier doc than the previous
/// request rebuilds it. Once the segment is known to have no matches every
/// lookup returns the default without touching the weight again.
pub struct QueryDocValues<'a> {
    weight: &'a dyn Weight,
    segment: SegmentContext<'a>,
    accept_docs: Option<&'a dyn AcceptDocs>,
    default: f32,
    scorer: Option<Box<dyn Scorer + 'a>>,
    last_doc: Option<DocId>,
    no_matches: bool,
}

impl<'a> QueryDocValues<'a> {
    pub fn new(
        weight: &'a dyn Weight,
        segment: SegmentContext<'a>,
        accept_docs: Option<&'a dyn AcceptDocs>,
        default: f32,
    ) -> Self {
        Self {
            weight,
            segment,
            accept_docs,
            default,
            scorer: None,
            last_doc: None,
            no_matches: false,
        }
    }

    /// Move the inner scorer to `doc`, returning whether it matches there
    fn position(&mut self, doc: DocId) -> Result<bool> {
        if self.no_matches {
            return Ok(false);
        }
        let rewind = self.last_doc.is_some_and(|last| doc < last);
        if self.scorer.is_none() || rewind {
            self.scorer = self.weight.scorer(self.segment, self.accept_docs)?;
            if self.scorer.is_none() {
                log::trace!(
                    "segment {}: inner query has no scorer, using default",
                    self.segment.ord
                );
                self.no_matches = true;
                return Ok(false);
            }
        }
        self.last_doc = Some(doc);

        let Some(scorer) = self.scorer.as_mut() else {
            return Ok(false);
        };
        let mut current = scorer.doc();
        if current < doc {
            current = scorer.seek(doc)?;
        }
        Ok(current == doc)
    }
}

impl FunctionValues for QueryDocValues<'_> {
    fn float_val(&mut self, doc: DocId) -> Result<f32> {
        if !self.position(doc)? {
            return Ok(self.default);
        }
        match self.scorer.as_mut() {
            Some(scorer) => scorer.score(),
            None => Ok(self.default),
        }
    }

    fn int_val(&mut self, doc: DocId) -> Result<i32> {
        Ok(self.float_val(doc)? as i32)
    }

    fn exists(&mut self, doc: DocId) -> Result<bool> {
        self.position(doc)
    }

    fn explain(&mut self, doc: DocId) -> Result<Explanation> {
        let value = self.float_val(doc)?;
        let inner = self.weight.explain(self.segment, doc)?;
        if !inner.is_match {
            return Ok(Explanation::new(value, "query default").with_detail(inner));
        }
        Ok(Explanation::new(value, "query score").with_detail(inner))
    }
}
