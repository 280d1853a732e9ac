//! Conjunction (AND) over any number of scorers

use crate::{DocId, Error, Result, Score, TERMINATED};

use super::{DocSet, Scorer};

/// Scorer over the intersection of its children's doc sets.
///
/// Uses leapfrog alignment: the last child proposes a target, every lagging
/// child seeks to it, and any overshoot becomes the new target. The score is
/// the children's score sum times a coordination constant fixed at
/// construction.
pub struct ConjunctionScorer<'a> {
    children: Vec<Box<dyn Scorer + 'a>>,
    coord: f32,
    doc: DocId,
}

impl<'a> ConjunctionScorer<'a> {
    /// Intersect `children`, which must already be positioned.
    pub fn new(mut children: Vec<Box<dyn Scorer + 'a>>, coord: f32) -> Result<Self> {
        if children.is_empty() {
            return Err(Error::InvalidArgument(
                "conjunction requires at least one child".to_string(),
            ));
        }
        if children.iter().any(|c| c.doc() == TERMINATED) {
            return Ok(Self {
                children,
                coord,
                doc: TERMINATED,
            });
        }

        children.sort_by_key(|c| c.doc());
        let mut scorer = Self {
            children,
            coord,
            doc: TERMINATED,
        };
        scorer.doc = scorer.align()?;

        if scorer.doc != TERMINATED {
            // Children that lagged furthest in the first round tend to skip
            // furthest later; try them first.
            let end = scorer.children.len() - 1;
            scorer.children[..end].reverse();
        }
        Ok(scorer)
    }

    /// Leapfrog all children onto a common doc, or TERMINATED.
    fn align(&mut self) -> Result<DocId> {
        let last = self.children.len() - 1;
        let mut target = self.children[last].doc();
        'restart: loop {
            if target == TERMINATED {
                return Ok(TERMINATED);
            }
            for child in self.children.iter_mut() {
                if child.doc() < target {
                    let doc = child.seek(target)?;
                    if doc > target {
                        target = doc;
                        continue 'restart;
                    }
                }
            }
            return Ok(target);
        }
    }
}

impl DocSet for ConjunctionScorer<'_> {
    fn doc(&self) -> DocId {
        self.doc
    }

    fn advance(&mut self) -> Result<DocId> {
        if self.doc == TERMINATED {
            return Ok(TERMINATED);
        }
        let last = self.children.len() - 1;
        self.children[last].advance()?;
        self.doc = self.align()?;
        Ok(self.doc)
    }

    fn seek(&mut self, target: DocId) -> Result<DocId> {
        if self.doc == TERMINATED || target <= self.doc {
            return Ok(self.doc);
        }
        let last = self.children.len() - 1;
        if self.children[last].doc() < target {
            self.children[last].seek(target)?;
        }
        self.doc = self.align()?;
        Ok(self.doc)
    }

    fn size_hint(&self) -> u32 {
        self.children
            .iter()
            .map(|c| c.size_hint())
            .min()
            .unwrap_or(0)
    }
}

impl Scorer for ConjunctionScorer<'_> {
    fn score(&mut self) -> Result<Score> {
        let mut sum = 0.0;
        for child in &mut self.children {
            sum += child.score()?;
        }
        Ok(sum * self.coord)
    }

    fn freq(&self) -> u32 {
        self.children.len() as u32
    }

    fn matching_clauses(&mut self) -> Result<u32> {
        let mut total = 0;
        for child in &mut self.children {
            total += child.matching_clauses()?;
        }
        Ok(total)
    }
}
