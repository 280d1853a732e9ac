//! Hornet - boolean query scoring core
//!
//! This crate provides the cursor machinery that sits between a postings
//! provider and a result collector:
//! - Forward-only match cursors (`DocSet` / `Scorer`) over sorted document IDs
//! - Conjunction, disjunction, exclusion and required+optional combinators
//! - A boolean coordinator with coordination-factor scoring
//! - A windowed (bucket) boolean scorer for top-level disjunctions
//! - Value sources and function queries for custom scoring
//!
//! Postings storage, term dictionaries and query parsing live outside this
//! crate and plug in through [`SegmentReader`] and [`Query`].

pub mod config;
pub mod error;
pub mod function;
pub mod query;
pub mod searcher;
pub mod segment;
pub mod similarity;

pub use config::SearchConfig;
pub use error::{Error, Result};
pub use searcher::{IndexSearcher, ScoringStrategy};
pub use segment::{AcceptDocs, MemorySegment, Postings, SegmentContext, SegmentReader};
pub use similarity::{Bm25Similarity, SimScorer, Similarity, TermStats};

// Re-exports from query
pub use query::{
    BooleanClause, BooleanQuery, BoostQuery, Collector, CountCollector, DocSet, Explanation,
    Occur, Query, Scorer, SearchResult, TermQuery, TopKCollector, Weight,
};

// Re-exports from function
pub use function::{
    BoostedQuery, ConstValueSource, FunctionQuery, FunctionValues, QueryValueSource, SourceId,
    ValueContext, ValueSource,
};

pub type DocId = u32;
pub type TermFreq = u32;
pub type Score = f32;

/// Sentinel doc ID returned by exhausted cursors.
pub const TERMINATED: DocId = u32::MAX;
