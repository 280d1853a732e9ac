//! Query, Weight and Scorer traits
//!
//! Provides the core abstractions for search queries and document scoring.
//! A [`Query`] is compiled once per execution into a [`Weight`], which then
//! hands out one [`Scorer`] per segment.

use std::fmt;

use crate::searcher::IndexSearcher;
use crate::segment::{AcceptDocs, SegmentContext};
use crate::{DocId, Error, Result, Score};

use super::{DocSet, Explanation, WindowedBooleanScorer};

/// A search query
pub trait Query: fmt::Debug + fmt::Display {
    /// Compile this query into a per-execution weight
    fn create_weight(&self, searcher: &IndexSearcher) -> Result<Box<dyn Weight>>;
}

/// Per-execution factory that produces scorers bound to one segment
pub trait Weight {
    /// Build a scorer for `segment`, or `None` when nothing can match there.
    ///
    /// Documents rejected by `accept_docs` must never be returned.
    fn scorer<'a>(
        &'a self,
        segment: SegmentContext<'a>,
        accept_docs: Option<&'a dyn AcceptDocs>,
    ) -> Result<Option<Box<dyn Scorer + 'a>>>;

    /// Bucket-at-a-time scorer for a top-level disjunction.
    ///
    /// Only boolean weights without required clauses support this.
    fn windowed_scorer<'a>(
        &'a self,
        _segment: SegmentContext<'a>,
        _accept_docs: Option<&'a dyn AcceptDocs>,
    ) -> Result<Option<WindowedBooleanScorer<'a>>> {
        Err(Error::Query(
            "windowed scoring requires a boolean query".to_string(),
        ))
    }

    /// Structured breakdown of how `doc` (segment-local) was scored
    fn explain(&self, segment: SegmentContext<'_>, doc: DocId) -> Result<Explanation>;
}

/// Scorer that iterates over matching documents and computes scores
pub trait Scorer: DocSet {
    /// Score for current document
    fn score(&mut self) -> Result<Score>;

    /// Within-document frequency of the current match
    fn freq(&self) -> u32 {
        1
    }

    /// Number of coordinated clauses matching the current document.
    ///
    /// Leaves count as one clause. Combinators report the sum over the
    /// children that matched so the boolean coordinator can pick a
    /// coordination factor.
    fn matching_clauses(&mut self) -> Result<u32> {
        Ok(1)
    }
}

impl DocSet for Box<dyn Scorer + '_> {
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

impl Scorer for Box<dyn Scorer + '_> {
    #[inline]
    fn score(&mut self) -> Result<Score> {
        (**self).score()
    }
    #[inline]
    fn freq(&self) -> u32 {
        (**self).freq()
    }
    #[inline]
    fn matching_clauses(&mut self) -> Result<u32> {
        (**self).matching_clauses()
    }
}

/// Replace scores that would break heap ordering.
///
/// NaN compares unordered and -inf collapses every candidate to the same
/// bottom, so both are mapped to the most negative finite float.
#[inline]
pub fn sanitize_score(score: Score) -> Score {
    if score > Score::NEG_INFINITY {
        score
    } else {
        Score::MIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_score() {
        assert_eq!(sanitize_score(1.5), 1.5);
        assert_eq!(sanitize_score(-3.0), -3.0);
        assert_eq!(sanitize_score(f32::NAN), f32::MIN);
        assert_eq!(sanitize_score(f32::NEG_INFINITY), f32::MIN);
        assert_eq!(sanitize_score(f32::INFINITY), f32::INFINITY);
    }
}
