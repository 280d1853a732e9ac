//! Term query - matches documents containing a specific term

use std::fmt;
use std::sync::Arc;

use crate::searcher::IndexSearcher;
use crate::segment::{AcceptDocs, Postings, SegmentContext};
use crate::similarity::{SimScorer, Similarity, TermStats};
use crate::{DocId, Result, Score, TERMINATED};

use super::{DocSet, Explanation, Query, Scorer, Weight};

/// Term query - matches documents containing a specific term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermQuery {
    pub field: String,
    pub term: Vec<u8>,
}

impl TermQuery {
    pub fn new(field: impl Into<String>, term: impl Into<Vec<u8>>) -> Self {
        Self {
            field: field.into(),
            term: term.into(),
        }
    }
}

impl fmt::Display for TermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, String::from_utf8_lossy(&self.term))
    }
}

impl Query for TermQuery {
    fn create_weight(&self, searcher: &IndexSearcher) -> Result<Box<dyn Weight>> {
        let mut doc_freq = 0u64;
        let mut num_docs = 0u64;
        for segment in searcher.segments() {
            doc_freq += segment.reader.doc_freq(&self.field, &self.term)? as u64;
            num_docs += segment.reader.num_docs() as u64;
        }
        let stats = TermStats {
            field: self.field.clone(),
            term: self.term.clone(),
            doc_freq,
            num_docs,
        };
        Ok(Box::new(TermWeight {
            description: self.to_string(),
            stats,
            similarity: Arc::clone(searcher.similarity()),
        }))
    }
}

struct TermWeight {
    description: String,
    stats: TermStats,
    similarity: Arc<dyn Similarity>,
}

impl Weight for TermWeight {
    fn scorer<'a>(
        &'a self,
        segment: SegmentContext<'a>,
        accept_docs: Option<&'a dyn AcceptDocs>,
    ) -> Result<Option<Box<dyn Scorer + 'a>>> {
        let Some(postings) = segment
            .reader
            .postings(&self.stats.field, &self.stats.term)?
        else {
            return Ok(None);
        };
        let sim = self.similarity.sim_scorer(&self.stats, segment);
        Ok(Some(Box::new(TermScorer::new(postings, sim, accept_docs)?)))
    }

    fn explain(&self, segment: SegmentContext<'_>, doc: DocId) -> Result<Explanation> {
        let no_match = || Explanation::no_match(format!("no matching term {}", self.description));
        if let Some(live) = segment.reader.live_docs()
            && !live.accept(doc)
        {
            return Ok(no_match());
        }
        let Some(mut postings) = segment
            .reader
            .postings(&self.stats.field, &self.stats.term)?
        else {
            return Ok(no_match());
        };
        if postings.seek(doc)? != doc {
            return Ok(no_match());
        }
        let sim = self.similarity.sim_scorer(&self.stats, segment);
        let detail = sim.explain(doc, postings.freq());
        Ok(Explanation::new(
            detail.value,
            format!("weight({} in {})", self.description, doc),
        )
        .with_detail(detail))
    }
}

/// Leaf scorer over one term's postings
pub struct TermScorer<'a> {
    postings: Box<dyn Postings + 'a>,
    sim: Box<dyn SimScorer + 'a>,
    accept_docs: Option<&'a dyn AcceptDocs>,
}

impl<'a> TermScorer<'a> {
    pub fn new(
        postings: Box<dyn Postings + 'a>,
        sim: Box<dyn SimScorer + 'a>,
        accept_docs: Option<&'a dyn AcceptDocs>,
    ) -> Result<Self> {
        let mut scorer = Self {
            postings,
            sim,
            accept_docs,
        };
        let doc = scorer.postings.doc();
        scorer.skip_rejected(doc)?;
        Ok(scorer)
    }

    /// Step past docs the accept filter rejects, starting at `doc`
    fn skip_rejected(&mut self, mut doc: DocId) -> Result<DocId> {
        if let Some(accept) = self.accept_docs {
            while doc != TERMINATED && !accept.accept(doc) {
                doc = self.postings.advance()?;
            }
        }
        Ok(doc)
    }
}

impl DocSet for TermScorer<'_> {
    fn doc(&self) -> DocId {
        self.postings.doc()
    }

    fn advance(&mut self) -> Result<DocId> {
        let doc = self.postings.advance()?;
        self.skip_rejected(doc)
    }

    fn seek(&mut self, target: DocId) -> Result<DocId> {
        let doc = self.postings.seek(target)?;
        self.skip_rejected(doc)
    }

    fn size_hint(&self) -> u32 {
        self.postings.size_hint()
    }
}

impl Scorer for TermScorer<'_> {
    fn score(&mut self) -> Result<Score> {
        Ok(self.sim.score(self.postings.doc(), self.postings.freq()))
    }

    fn freq(&self) -> u32 {
        self.postings.freq()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{VecPostings, collect_docs};
    use crate::segment::MemorySegment;

    fn by_freq(_doc: DocId, freq: u32) -> Score {
        freq as Score
    }

    #[test]
    fn test_term_scorer_uses_sim() {
        let postings = Box::new(VecPostings::new(Arc::new(vec![(1, 2), (4, 3)])));
        let mut scorer = TermScorer::new(postings, Box::new(by_freq), None).unwrap();
        assert_eq!(scorer.doc(), 1);
        assert_eq!(scorer.score().unwrap(), 2.0);
        assert_eq!(scorer.advance().unwrap(), 4);
        assert_eq!(scorer.freq(), 3);
        assert_eq!(scorer.score().unwrap(), 3.0);
    }

    #[test]
    fn test_term_scorer_skips_rejected_docs() {
        let even = |doc: DocId| doc % 2 == 0;
        let postings = Box::new(VecPostings::from_docs(&[1, 2, 3, 4, 5, 7]));
        let mut scorer = TermScorer::new(postings, Box::new(by_freq), Some(&even)).unwrap();
        assert_eq!(scorer.doc(), 2);
        assert_eq!(scorer.seek(3).unwrap(), 4);
        assert_eq!(scorer.advance().unwrap(), TERMINATED);
    }

    #[test]
    fn test_term_weight_across_segments() {
        let searcher = IndexSearcher::new(vec![
            Arc::new(MemorySegment::new(4).with_docs("body", "rust", &[0, 2])),
            Arc::new(MemorySegment::new(4).with_docs("body", "go", &[1])),
        ]);
        let weight = TermQuery::new("body", "rust")
            .create_weight(&searcher)
            .unwrap();

        let mut segments = searcher.segments();
        let first = segments.next().unwrap();
        let mut scorer = weight.scorer(first, None).unwrap().unwrap();
        assert_eq!(collect_docs(&mut scorer).unwrap(), vec![0, 2]);

        let second = segments.next().unwrap();
        assert!(weight.scorer(second, None).unwrap().is_none());
    }

    #[test]
    fn test_term_explain() {
        let searcher = IndexSearcher::new(vec![Arc::new(
            MemorySegment::new(4)
                .with_docs("body", "rust", &[0, 2])
                .with_deleted(&[2]),
        )]);
        let query = TermQuery::new("body", "rust");
        let weight = query.create_weight(&searcher).unwrap();
        let segment = searcher.segments().next().unwrap();

        let hit = weight.explain(segment, 0).unwrap();
        assert!(hit.is_match);
        assert_eq!(hit.description, "weight(body:rust in 0)");
        assert!(hit.value > 0.0);

        assert!(!weight.explain(segment, 1).unwrap().is_match);
        // deleted
        assert!(!weight.explain(segment, 2).unwrap().is_match);
    }

    #[test]
    fn test_display() {
        assert_eq!(TermQuery::new("title", "rust").to_string(), "title:rust");
    }
}
