//! Error types for hornet

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Too many clauses: {count} exceeds the limit of {limit}")]
    TooManyClauses { count: usize, limit: usize },

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Query error: {0}")]
    Query(String),
}

pub type Result<T> = std::result::Result<T, Error>;
