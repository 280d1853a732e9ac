//! Value sources and function-based scoring
//!
//! A [`ValueSource`] maps documents to numbers. It is bound per segment into
//! [`FunctionValues`], and can drive scoring directly ([`FunctionQuery`]) or
//! rescale another query ([`BoostedQuery`]).

mod boosted;
mod function_query;
mod query_values;
mod sources;
mod values;

pub use boosted::*;
pub use function_query::*;
pub use query_values::*;
pub use sources::*;
pub use values::*;
