//! Required minus prohibited (MUST_NOT)

use crate::{DocId, Result, Score, TERMINATED};

use super::{DocSet, Scorer};

/// Scorer over the required docs that the prohibited scorer does not match.
///
/// Only the required side contributes to the score. Once the prohibited side
/// is exhausted it is dropped and the required side passes through unfiltered.
pub struct ReqExclScorer<'a> {
    req: Box<dyn Scorer + 'a>,
    excl: Option<Box<dyn Scorer + 'a>>,
    doc: DocId,
}

impl<'a> ReqExclScorer<'a> {
    pub fn new(req: Box<dyn Scorer + 'a>, excl: Box<dyn Scorer + 'a>) -> Result<Self> {
        let excl = (excl.doc() != TERMINATED).then_some(excl);
        let mut scorer = Self {
            doc: req.doc(),
            req,
            excl,
        };
        scorer.doc = scorer.to_non_excluded()?;
        Ok(scorer)
    }

    /// Move the required side forward until it sits on a doc the prohibited
    /// side does not match.
    fn to_non_excluded(&mut self) -> Result<DocId> {
        let mut req_doc = self.req.doc();
        loop {
            if req_doc == TERMINATED {
                return Ok(TERMINATED);
            }
            let Some(excl) = self.excl.as_mut() else {
                return Ok(req_doc);
            };
            let excl_doc = excl.doc();
            if req_doc < excl_doc {
                return Ok(req_doc);
            }
            if req_doc > excl_doc {
                let excl_doc = excl.seek(req_doc)?;
                if excl_doc == TERMINATED {
                    self.excl = None;
                    return Ok(req_doc);
                }
                if excl_doc > req_doc {
                    return Ok(req_doc);
                }
            }
            // excluded: required and prohibited agree on req_doc
            req_doc = self.req.advance()?;
        }
    }
}

impl DocSet for ReqExclScorer<'_> {
    fn doc(&self) -> DocId {
        self.doc
    }

    fn advance(&mut self) -> Result<DocId> {
        if self.doc == TERMINATED {
            return Ok(TERMINATED);
        }
        self.req.advance()?;
        self.doc = self.to_non_excluded()?;
        Ok(self.doc)
    }

    fn seek(&mut self, target: DocId) -> Result<DocId> {
        if self.doc == TERMINATED || target <= self.doc {
            return Ok(self.doc);
        }
        self.req.seek(target)?;
        self.doc = self.to_non_excluded()?;
        Ok(self.doc)
    }

    fn size_hint(&self) -> u32 {
        self.req.size_hint()
    }
}

impl Scorer for ReqExclScorer<'_> {
    fn score(&mut self) -> Result<Score> {
        self.req.score()
    }

    fn freq(&self) -> u32 {
        self.req.freq()
    }

    fn matching_clauses(&mut self) -> Result<u32> {
        self.req.matching_clauses()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::query::{VecScorer, collect_docs};

    fn scorer(docs: &[DocId]) -> Box<dyn Scorer + 'static> {
        Box::new(VecScorer::with_constant(docs, 1.0))
    }

    #[test]
    fn test_excludes_prohibited() {
        let mut s = ReqExclScorer::new(scorer(&[1, 2, 3]), scorer(&[2])).unwrap();
        assert_eq!(collect_docs(&mut s).unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_prohibited_exhausted_passes_through() {
        let mut s = ReqExclScorer::new(scorer(&[4, 5, 6, 7]), scorer(&[1, 5])).unwrap();
        assert_eq!(s.doc(), 4);
        assert_eq!(s.advance().unwrap(), 6);
        assert!(s.excl.is_none());
        assert_eq!(s.advance().unwrap(), 7);
        assert_eq!(s.advance().unwrap(), TERMINATED);
    }

    #[test]
    fn test_everything_excluded() {
        let s = ReqExclScorer::new(scorer(&[1, 2]), scorer(&[1, 2, 3])).unwrap();
        assert_eq!(s.doc(), TERMINATED);
    }

    #[test]
    fn test_empty_sides() {
        let mut s = ReqExclScorer::new(scorer(&[1, 2]), scorer(&[])).unwrap();
        assert_eq!(collect_docs(&mut s).unwrap(), vec![1, 2]);
        let s = ReqExclScorer::new(scorer(&[]), scorer(&[1])).unwrap();
        assert_eq!(s.doc(), TERMINATED);
    }

    #[test]
    fn test_score_from_required_only() {
        let req: Box<dyn Scorer> = Box::new(VecScorer::new(vec![(1, 2.5), (3, 4.0)]));
        let excl: Box<dyn Scorer> = Box::new(VecScorer::new(vec![(1, 100.0), (2, 100.0)]));
        let mut s = ReqExclScorer::new(req, excl).unwrap();
        assert_eq!(s.doc(), 3);
        assert_eq!(s.score().unwrap(), 4.0);
    }

    #[test]
    fn test_random_interleaving_of_advance_and_seek() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..40 {
            let req: BTreeSet<DocId> = (0..300).filter(|_| rng.random_bool(0.4)).collect();
            let excl: BTreeSet<DocId> = (0..300).filter(|_| rng.random_bool(0.4)).collect();
            let expected: Vec<DocId> = req.difference(&excl).copied().collect();

            let mut s = ReqExclScorer::new(
                scorer(&req.iter().copied().collect::<Vec<_>>()),
                scorer(&excl.iter().copied().collect::<Vec<_>>()),
            )
            .unwrap();

            let next_expected = |from: DocId| {
                expected
                    .iter()
                    .copied()
                    .find(|&d| d >= from)
                    .unwrap_or(TERMINATED)
            };
            let mut doc = s.doc();
            assert_eq!(doc, next_expected(0));
            while doc != TERMINATED {
                let (got, target) = if rng.random_bool(0.5) {
                    (s.advance().unwrap(), doc + 1)
                } else {
                    let target = doc + rng.random_range(1..10);
                    (s.seek(target).unwrap(), target)
                };
                assert_eq!(got, next_expected(target));
                doc = got;
            }
        }
    }
}
