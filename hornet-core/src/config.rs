//! Search configuration

use serde::{Deserialize, Serialize};

/// Default upper bound on the number of clauses in one boolean query
pub const DEFAULT_MAX_CLAUSE_COUNT: usize = 1024;

/// Configuration for an [`IndexSearcher`](crate::IndexSearcher)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of clauses a `BooleanQuery` may hold unless it sets its own limit
    pub max_clause_count: usize,
    /// Number of hits returned by `IndexSearcher::search` when no limit is given
    pub default_top_k: usize,
    /// Coordination default for boolean queries that do not set it themselves
    pub disable_coord: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_clause_count: DEFAULT_MAX_CLAUSE_COUNT,
            default_top_k: 10,
            disable_coord: false,
        }
    }
}
