//! Boolean coordinator: picks the combinator shape for a clause list and
//! applies the coordination factor to the final score

use crate::similarity::Similarity;
use crate::{DocId, Error, Result, Score};

use super::{ConjunctionScorer, DisjunctionScorer, DocSet, ReqExclScorer, ReqOptScorer, Scorer};

/// Coordination factors indexed by the number of matching clauses
#[derive(Debug, Clone, PartialEq)]
pub struct CoordTable {
    factors: Vec<f32>,
}

impl CoordTable {
    /// Factors for 0..=`max_matchers` matching clauses out of `max_coord`.
    pub fn new(
        similarity: &dyn Similarity,
        max_matchers: usize,
        max_coord: u32,
        disable_coord: bool,
    ) -> Self {
        let factors = (0..=max_matchers)
            .map(|i| {
                if disable_coord {
                    1.0
                } else {
                    similarity.coord(i as u32, max_coord)
                }
            })
            .collect();
        Self { factors }
    }

    /// Factor for `matchers` matching clauses, clamped to the table
    #[inline]
    pub fn get(&self, matchers: u32) -> f32 {
        let last = self.factors.len() - 1;
        self.factors[(matchers as usize).min(last)]
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

/// Root of a boolean cursor tree.
///
/// Delegates iteration to the composed combinator and scales its score by
/// the coordination factor for the number of clauses that matched.
pub struct BooleanScorer<'a> {
    inner: Box<dyn Scorer + 'a>,
    coord: CoordTable,
}

impl<'a> BooleanScorer<'a> {
    /// Compose scorers for a clause list.
    ///
    /// At least one required or optional scorer must be present, and there
    /// must be at least `min_nr_should_match` optional scorers.
    pub fn new(
        required: Vec<Box<dyn Scorer + 'a>>,
        optional: Vec<Box<dyn Scorer + 'a>>,
        prohibited: Vec<Box<dyn Scorer + 'a>>,
        min_nr_should_match: u32,
        coord: CoordTable,
    ) -> Result<Self> {
        if required.is_empty() && optional.is_empty() {
            return Err(Error::InvalidArgument(
                "boolean scorer needs a required or optional clause".to_string(),
            ));
        }
        if (optional.len() as u32) < min_nr_should_match {
            return Err(Error::InvalidArgument(format!(
                "{} optional clauses cannot satisfy min_nr_should_match {}",
                optional.len(),
                min_nr_should_match
            )));
        }
        let inner = if required.is_empty() {
            make_no_req(optional, prohibited, min_nr_should_match)?
        } else {
            make_some_req(required, optional, prohibited, min_nr_should_match)?
        };
        Ok(Self { inner, coord })
    }
}

/// Lone scorers pass through; two or more are intersected
fn conjunction<'a>(mut scorers: Vec<Box<dyn Scorer + 'a>>) -> Result<Box<dyn Scorer + 'a>> {
    if scorers.len() == 1
        && let Some(only) = scorers.pop()
    {
        return Ok(only);
    }
    Ok(Box::new(ConjunctionScorer::new(scorers, 1.0)?))
}

fn add_prohibited<'a>(
    scorer: Box<dyn Scorer + 'a>,
    mut prohibited: Vec<Box<dyn Scorer + 'a>>,
) -> Result<Box<dyn Scorer + 'a>> {
    let excl: Box<dyn Scorer + 'a> = match prohibited.len() {
        0 => return Ok(scorer),
        1 => match prohibited.pop() {
            Some(only) => only,
            None => return Ok(scorer),
        },
        _ => Box::new(DisjunctionScorer::new(prohibited, 1)?),
    };
    Ok(Box::new(ReqExclScorer::new(scorer, excl)?))
}

fn make_no_req<'a>(
    optional: Vec<Box<dyn Scorer + 'a>>,
    prohibited: Vec<Box<dyn Scorer + 'a>>,
    min_nr_should_match: u32,
) -> Result<Box<dyn Scorer + 'a>> {
    let nr_opt_required = min_nr_should_match.max(1);
    let scorer: Box<dyn Scorer + 'a> = if optional.len() as u32 > nr_opt_required {
        log::debug!(
            "boolean: disjunction over {} optional clauses, min {}",
            optional.len(),
            nr_opt_required
        );
        Box::new(DisjunctionScorer::new(optional, nr_opt_required)?)
    } else {
        log::debug!(
            "boolean: all {} optional clauses required",
            optional.len()
        );
        conjunction(optional)?
    };
    add_prohibited(scorer, prohibited)
}

fn make_some_req<'a>(
    mut required: Vec<Box<dyn Scorer + 'a>>,
    optional: Vec<Box<dyn Scorer + 'a>>,
    prohibited: Vec<Box<dyn Scorer + 'a>>,
    min_nr_should_match: u32,
) -> Result<Box<dyn Scorer + 'a>> {
    if optional.len() as u32 == min_nr_should_match {
        log::debug!(
            "boolean: conjunction over {} required and {} optional clauses",
            required.len(),
            optional.len()
        );
        required.extend(optional);
        return add_prohibited(conjunction(required)?, prohibited);
    }

    let required = conjunction(required)?;
    if min_nr_should_match > 0 {
        log::debug!(
            "boolean: required AND {} of {} optional clauses",
            min_nr_should_match,
            optional.len()
        );
        let disj: Box<dyn Scorer + 'a> =
            Box::new(DisjunctionScorer::new(optional, min_nr_should_match)?);
        let both: Box<dyn Scorer + 'a> = Box::new(ConjunctionScorer::new(vec![required, disj], 1.0)?);
        return add_prohibited(both, prohibited);
    }

    log::debug!(
        "boolean: required with {} optional clauses",
        optional.len()
    );
    let optional: Box<dyn Scorer + 'a> = if optional.len() == 1 {
        conjunction(optional)?
    } else {
        Box::new(DisjunctionScorer::new(optional, 1)?)
    };
    Ok(Box::new(ReqOptScorer::new(
        add_prohibited(required, prohibited)?,
        optional,
    )))
}

impl DocSet for BooleanScorer<'_> {
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

impl Scorer for BooleanScorer<'_> {
    fn score(&mut self) -> Result<Score> {
        let raw = self.inner.score()?;
        let matchers = self.inner.matching_clauses()?;
        Ok(raw * self.coord.get(matchers))
    }

    fn freq(&self) -> u32 {
        self.inner.freq()
    }

    // A nested boolean counts as one clause of its parent, so
    // matching_clauses keeps the default.
}
