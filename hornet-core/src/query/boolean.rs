//! Boolean query with MUST, SHOULD, and MUST_NOT clauses

use std::fmt;
use std::sync::Arc;

use crate::searcher::IndexSearcher;
use crate::segment::{AcceptDocs, SegmentContext};
use crate::similarity::Similarity;
use crate::{DocId, Error, Result};

use super::{BooleanScorer, CoordTable, Explanation, Query, Scorer, Weight, WindowedBooleanScorer};

/// How a clause takes part in a boolean match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occur {
    /// The clause must match
    Must,
    /// The clause may match and adds to the score when it does
    Should,
    /// Documents matching the clause are rejected
    MustNot,
}

impl Occur {
    fn prefix(self) -> &'static str {
        match self {
            Occur::Must => "+",
            Occur::Should => "",
            Occur::MustNot => "-",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BooleanClause {
    pub query: Arc<dyn Query>,
    pub occur: Occur,
}

impl BooleanClause {
    pub fn new(query: Arc<dyn Query>, occur: Occur) -> Self {
        Self { query, occur }
    }
}

impl fmt::Display for BooleanClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.occur.prefix(), self.query)
    }
}

/// Boolean query with MUST, SHOULD, and MUST_NOT clauses
#[derive(Clone)]
pub struct BooleanQuery {
    clauses: Vec<BooleanClause>,
    min_nr_should_match: u32,
    /// `None` defers to the searcher's configuration
    disable_coord: Option<bool>,
    /// `None` defers to the searcher's configuration
    max_clause_count: Option<usize>,
}

impl Default for BooleanQuery {
    fn default() -> Self {
        Self {
            clauses: Vec::new(),
            min_nr_should_match: 0,
            disable_coord: None,
            max_clause_count: None,
        }
    }
}

impl fmt::Debug for BooleanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = |occur| self.clauses.iter().filter(|c| c.occur == occur).count();
        f.debug_struct("BooleanQuery")
            .field("must_count", &count(Occur::Must))
            .field("should_count", &count(Occur::Should))
            .field("must_not_count", &count(Occur::MustNot))
            .field("min_nr_should_match", &self.min_nr_should_match)
            .field("disable_coord", &self.disable_coord)
            .finish()
    }
}

impl fmt::Display for BooleanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Boolean(")?;
        let mut first = true;
        for clause in &self.clauses {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}", clause)?;
            first = false;
        }
        write!(f, ")")?;
        if self.min_nr_should_match > 0 {
            write!(f, "~{}", self.min_nr_should_match)?;
        }
        Ok(())
    }
}

impl BooleanQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a clause, failing once this query's own clause limit is reached.
    ///
    /// Without a query-level limit the searcher's limit is checked when the
    /// weight is created.
    pub fn add(&mut self, query: Arc<dyn Query>, occur: Occur) -> Result<()> {
        if let Some(limit) = self.max_clause_count
            && self.clauses.len() >= limit
        {
            return Err(Error::TooManyClauses {
                count: self.clauses.len() + 1,
                limit,
            });
        }
        self.clauses.push(BooleanClause::new(query, occur));
        Ok(())
    }

    pub fn must(mut self, query: impl Query + 'static) -> Self {
        self.clauses
            .push(BooleanClause::new(Arc::new(query), Occur::Must));
        self
    }

    pub fn should(mut self, query: impl Query + 'static) -> Self {
        self.clauses
            .push(BooleanClause::new(Arc::new(query), Occur::Should));
        self
    }

    pub fn must_not(mut self, query: impl Query + 'static) -> Self {
        self.clauses
            .push(BooleanClause::new(Arc::new(query), Occur::MustNot));
        self
    }

    /// Require at least `n` SHOULD clauses to match
    pub fn with_min_should_match(mut self, n: u32) -> Self {
        self.min_nr_should_match = n;
        self
    }

    /// Score without the coordination factor
    pub fn with_disable_coord(mut self, disable: bool) -> Self {
        self.disable_coord = Some(disable);
        self
    }

    /// Clause limit for this query, overriding the searcher's
    pub fn with_max_clause_count(mut self, limit: usize) -> Self {
        self.max_clause_count = Some(limit);
        self
    }

    pub fn clauses(&self) -> &[BooleanClause] {
        &self.clauses
    }

    pub fn min_nr_should_match(&self) -> u32 {
        self.min_nr_should_match
    }
}

impl Query for BooleanQuery {
    fn create_weight(&self, searcher: &IndexSearcher) -> Result<Box<dyn Weight>> {
        let limit = self
            .max_clause_count
            .unwrap_or(searcher.config().max_clause_count);
        if self.clauses.len() > limit {
            return Err(Error::TooManyClauses {
                count: self.clauses.len(),
                limit,
            });
        }

        let mut clauses = Vec::with_capacity(self.clauses.len());
        let mut max_coord = 0;
        for clause in &self.clauses {
            if clause.occur != Occur::MustNot {
                max_coord += 1;
            }
            clauses.push(WeightClause {
                weight: clause.query.create_weight(searcher)?,
                occur: clause.occur,
                description: clause.query.to_string(),
            });
        }

        Ok(Box::new(BooleanWeight {
            clauses,
            similarity: Arc::clone(searcher.similarity()),
            min_nr_should_match: self.min_nr_should_match,
            disable_coord: self
                .disable_coord
                .unwrap_or(searcher.config().disable_coord),
            max_coord,
        }))
    }
}

struct WeightClause {
    weight: Box<dyn Weight>,
    occur: Occur,
    description: String,
}

/// Sub-scorers of one segment, split by occurrence
struct ClauseScorers<'a> {
    required: Vec<Box<dyn Scorer + 'a>>,
    optional: Vec<Box<dyn Scorer + 'a>>,
    prohibited: Vec<Box<dyn Scorer + 'a>>,
}

/// Weight of a [`BooleanQuery`]
pub struct BooleanWeight {
    clauses: Vec<WeightClause>,
    similarity: Arc<dyn Similarity>,
    min_nr_should_match: u32,
    disable_coord: bool,
    /// Number of non-prohibited clauses
    max_coord: u32,
}

impl BooleanWeight {
    fn coord(&self, overlap: u32) -> f32 {
        if self.disable_coord {
            1.0
        } else {
            self.similarity.coord(overlap, self.max_coord)
        }
    }

    /// `None` when a required clause has no scorer in this segment
    fn clause_scorers<'a>(
        &'a self,
        segment: SegmentContext<'a>,
        accept_docs: Option<&'a dyn AcceptDocs>,
    ) -> Result<Option<ClauseScorers<'a>>> {
        let mut scorers = ClauseScorers {
            required: Vec::new(),
            optional: Vec::new(),
            prohibited: Vec::new(),
        };
        for clause in &self.clauses {
            let sub = clause.weight.scorer(segment, accept_docs)?;
            match (clause.occur, sub) {
                (Occur::Must, None) => return Ok(None),
                (_, None) => {}
                (Occur::Must, Some(s)) => scorers.required.push(s),
                (Occur::Should, Some(s)) => scorers.optional.push(s),
                (Occur::MustNot, Some(s)) => scorers.prohibited.push(s),
            }
        }
        Ok(Some(scorers))
    }
}

impl Weight for BooleanWeight {
    fn scorer<'a>(
        &'a self,
        segment: SegmentContext<'a>,
        accept_docs: Option<&'a dyn AcceptDocs>,
    ) -> Result<Option<Box<dyn Scorer + 'a>>> {
        let Some(scorers) = self.clause_scorers(segment, accept_docs)? else {
            return Ok(None);
        };
        if scorers.required.is_empty() && scorers.optional.is_empty() {
            return Ok(None);
        }
        if (scorers.optional.len() as u32) < self.min_nr_should_match {
            return Ok(None);
        }
        let coord = CoordTable::new(
            self.similarity.as_ref(),
            scorers.required.len() + scorers.optional.len(),
            self.max_coord,
            self.disable_coord,
        );
        Ok(Some(Box::new(BooleanScorer::new(
            scorers.required,
            scorers.optional,
            scorers.prohibited,
            self.min_nr_should_match,
            coord,
        )?)))
    }

    /// Bucket-at-a-time scorer for a query without required clauses.
    ///
    /// Fails when the query has required clauses; `None` when nothing in
    /// this segment can match.
    fn windowed_scorer<'a>(
        &'a self,
        segment: SegmentContext<'a>,
        accept_docs: Option<&'a dyn AcceptDocs>,
    ) -> Result<Option<WindowedBooleanScorer<'a>>> {
        if self.clauses.iter().any(|c| c.occur == Occur::Must) {
            return Err(Error::InvalidArgument(
                "windowed scoring does not support required clauses".to_string(),
            ));
        }
        let Some(scorers) = self.clause_scorers(segment, accept_docs)? else {
            return Ok(None);
        };
        if scorers.optional.is_empty()
            || (scorers.optional.len() as u32) < self.min_nr_should_match
        {
            return Ok(None);
        }
        let coord = CoordTable::new(
            self.similarity.as_ref(),
            scorers.optional.len(),
            self.max_coord,
            self.disable_coord,
        );
        Ok(Some(WindowedBooleanScorer::new(
            scorers.optional,
            scorers.prohibited,
            self.min_nr_should_match,
            coord,
        )))
    }

    fn explain(&self, segment: SegmentContext<'_>, doc: DocId) -> Result<Explanation> {
        let mut sum = Explanation::new(0.0, "sum of:");
        let mut coord = 0;
        let mut should_matches = 0;
        let mut fail = false;

        for clause in &self.clauses {
            let expl = clause.weight.explain(segment, doc)?;
            match (clause.occur, expl.is_match) {
                (Occur::MustNot, true) => {
                    sum.add_detail(Explanation::no_match(format!(
                        "match on prohibited clause ({})",
                        clause.description
                    )));
                    fail = true;
                }
                (Occur::MustNot, false) => {}
                (occur, true) => {
                    sum.value += expl.value;
                    sum.add_detail(expl);
                    coord += 1;
                    if occur == Occur::Should {
                        should_matches += 1;
                    }
                }
                (Occur::Must, false) => {
                    sum.add_detail(Explanation::no_match(format!(
                        "no match on required clause ({})",
                        clause.description
                    )));
                    fail = true;
                }
                (Occur::Should, false) => {}
            }
        }

        let reason = if fail {
            Some("failure to meet condition(s) of required/prohibited clause(s)".to_string())
        } else if should_matches < self.min_nr_should_match {
            Some(format!(
                "failure to match minimum number of optional clauses: {}",
                self.min_nr_should_match
            ))
        } else if coord == 0 {
            Some("no matching clauses".to_string())
        } else {
            None
        };
        if let Some(reason) = reason {
            let mut failed = Explanation::no_match(reason);
            failed.details = sum.details;
            return Ok(failed);
        }

        let factor = self.coord(coord);
        if factor == 1.0 {
            return Ok(sum);
        }
        Ok(Explanation::new(sum.value * factor, "product of:")
            .with_detail(sum)
            .with_detail(Explanation::new(
                factor,
                format!("coord({}/{})", coord, self.max_coord),
            )))
    }
}
