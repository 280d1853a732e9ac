//! Required scorer boosted, but not gated, by an optional scorer

use crate::{DocId, Result, Score, TERMINATED};

use super::{DocSet, Scorer};

/// Matches exactly the required side's docs.
///
/// The optional side is only advanced when a score (or clause count) is
/// requested, and is dropped for good once it runs out.
pub struct ReqOptScorer<'a> {
    req: Box<dyn Scorer + 'a>,
    opt: Option<Box<dyn Scorer + 'a>>,
}

impl<'a> ReqOptScorer<'a> {
    pub fn new(req: Box<dyn Scorer + 'a>, opt: Box<dyn Scorer + 'a>) -> Self {
        let opt = (opt.doc() != TERMINATED).then_some(opt);
        Self { req, opt }
    }

    /// Bring the optional side up to the required doc; true when it lands on it.
    fn optional_matches(&mut self) -> Result<bool> {
        let doc = self.req.doc();
        if doc == TERMINATED {
            return Ok(false);
        }
        let Some(opt) = self.opt.as_mut() else {
            return Ok(false);
        };
        let mut opt_doc = opt.doc();
        if opt_doc < doc {
            opt_doc = opt.seek(doc)?;
            if opt_doc == TERMINATED {
                self.opt = None;
                return Ok(false);
            }
        }
        Ok(opt_doc == doc)
    }
}

impl DocSet for ReqOptScorer<'_> {
    fn doc(&self) -> DocId {
        self.req.doc()
    }

    fn advance(&mut self) -> Result<DocId> {
        self.req.advance()
    }

    fn seek(&mut self, target: DocId) -> Result<DocId> {
        self.req.seek(target)
    }

    fn size_hint(&self) -> u32 {
        self.req.size_hint()
    }
}

impl Scorer for ReqOptScorer<'_> {
    fn score(&mut self) -> Result<Score> {
        let req_score = self.req.score()?;
        if !self.optional_matches()? {
            return Ok(req_score);
        }
        match self.opt.as_mut() {
            Some(opt) => Ok(req_score + opt.score()?),
            None => Ok(req_score),
        }
    }

    fn freq(&self) -> u32 {
        self.req.freq()
    }

    fn matching_clauses(&mut self) -> Result<u32> {
        let req = self.req.matching_clauses()?;
        if !self.optional_matches()? {
            return Ok(req);
        }
        match self.opt.as_mut() {
            Some(opt) => Ok(req + opt.matching_clauses()?),
            None => Ok(req),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{DisjunctionScorer, VecScorer, collect_docs};

    fn scored(entries: &[(DocId, Score)]) -> Box<dyn Scorer + 'static> {
        Box::new(VecScorer::new(entries.to_vec()))
    }

    fn drain(s: &mut ReqOptScorer<'_>) -> Vec<(DocId, Score)> {
        let mut out = Vec::new();
        while s.doc() != TERMINATED {
            out.push((s.doc(), s.score().unwrap()));
            s.advance().unwrap();
        }
        out
    }

    #[test]
    fn test_optional_adds_score_only() {
        let mut s = ReqOptScorer::new(
            scored(&[(1, 1.0), (2, 1.0), (3, 1.0)]),
            scored(&[(2, 5.0)]),
        );
        assert_eq!(drain(&mut s), vec![(1, 1.0), (2, 6.0), (3, 1.0)]);
    }

    #[test]
    fn test_optional_never_gates() {
        let mut s = ReqOptScorer::new(scored(&[(4, 1.0), (8, 1.0)]), scored(&[(0, 3.0), (6, 3.0)]));
        assert_eq!(collect_docs(&mut s).unwrap(), vec![4, 8]);
    }

    #[test]
    fn test_optional_dropped_when_exhausted() {
        let mut s = ReqOptScorer::new(scored(&[(5, 1.0), (9, 1.0)]), scored(&[(1, 3.0)]));
        assert_eq!(s.score().unwrap(), 1.0);
        assert!(s.opt.is_none());
        s.advance().unwrap();
        assert_eq!(s.score().unwrap(), 1.0);
    }

    #[test]
    fn test_lazy_optional_survives_skipped_scores() {
        // score() is never asked for doc 2; the optional side catches up at doc 3
        let mut s = ReqOptScorer::new(
            scored(&[(1, 1.0), (2, 1.0), (3, 1.0)]),
            scored(&[(2, 5.0), (3, 7.0)]),
        );
        s.seek(3).unwrap();
        assert_eq!(s.score().unwrap(), 8.0);
    }

    #[test]
    fn test_matching_clauses_counts_optional() {
        let opt = DisjunctionScorer::new(
            vec![scored(&[(2, 1.0), (3, 1.0)]), scored(&[(2, 1.0)])],
            1,
        )
        .unwrap();
        let mut s = ReqOptScorer::new(scored(&[(1, 1.0), (2, 1.0), (3, 1.0)]), Box::new(opt));
        assert_eq!(s.matching_clauses().unwrap(), 1);
        s.advance().unwrap();
        assert_eq!(s.matching_clauses().unwrap(), 3);
        s.advance().unwrap();
        assert_eq!(s.matching_clauses().unwrap(), 2);
    }
}
