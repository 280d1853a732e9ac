//! Query types, scoring cursors and result collection

mod boolean;
mod boost;
mod collector;
mod conjunction;
mod coordinator;
mod disjunction;
mod docset;
mod exclusion;
mod explanation;
mod req_opt;
mod term;
mod traits;
mod windowed;

pub use boolean::*;
pub use boost::*;
pub use collector::*;
pub use conjunction::*;
pub use coordinator::*;
pub use disjunction::*;
pub use docset::*;
pub use exclusion::*;
pub use explanation::*;
pub use req_opt::*;
pub use term::*;
pub use traits::*;
pub use windowed::*;
