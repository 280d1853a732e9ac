//! Value sources, per-segment function values and the execution context

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

use crate::query::{Explanation, Weight};
use crate::searcher::IndexSearcher;
use crate::segment::SegmentContext;
use crate::{DocId, Error, Result};

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a value source, used as its key in a [`ValueContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    /// A process-wide unique id
    pub fn next() -> Self {
        Self(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// State a source registers during weight creation
pub enum ContextValue {
    /// Compiled inner query
    Weight(Box<dyn Weight>),
    /// Value range observed across all segments
    Range { min: f32, max: f32 },
}

impl fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Weight(_) => f.write_str("Weight(..)"),
            ContextValue::Range { min, max } => f
                .debug_struct("Range")
                .field("min", min)
                .field("max", max)
                .finish(),
        }
    }
}

/// Per-execution state shared by the value sources of one weight
#[derive(Debug, Default)]
pub struct ValueContext {
    entries: FxHashMap<SourceId, ContextValue>,
}

impl ValueContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SourceId) -> Option<&ContextValue> {
        self.entries.get(&id)
    }

    pub fn put(&mut self, id: SourceId, value: ContextValue) {
        self.entries.insert(id, value);
    }

    /// Weight registered under `id`
    pub fn weight(&self, id: SourceId) -> Option<&dyn Weight> {
        match self.entries.get(&id) {
            Some(ContextValue::Weight(weight)) => Some(&**weight),
            _ => None,
        }
    }

    /// Range registered under `id`
    pub fn range(&self, id: SourceId) -> Option<(f32, f32)> {
        match self.entries.get(&id) {
            Some(&ContextValue::Range { min, max }) => Some((min, max)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn unsupported(accessor: &str) -> Error {
    Error::Unsupported(format!("{} is not supported by this value source", accessor))
}

/// Per-segment view of a value source.
///
/// Accessors take `&mut self` because some implementations advance an
/// internal cursor; callers should request docs in increasing order.
pub trait FunctionValues {
    fn float_val(&mut self, _doc: DocId) -> Result<f32> {
        Err(unsupported("float_val"))
    }

    fn int_val(&mut self, _doc: DocId) -> Result<i32> {
        Err(unsupported("int_val"))
    }

    fn long_val(&mut self, doc: DocId) -> Result<i64> {
        self.int_val(doc).map(i64::from)
    }

    fn double_val(&mut self, doc: DocId) -> Result<f64> {
        self.float_val(doc).map(f64::from)
    }

    fn bool_val(&mut self, doc: DocId) -> Result<bool> {
        Ok(self.int_val(doc)? != 0)
    }

    fn str_val(&mut self, doc: DocId) -> Result<String> {
        Ok(self.float_val(doc)?.to_string())
    }

    /// Whether `doc` has a value at all
    fn exists(&mut self, _doc: DocId) -> Result<bool> {
        Ok(true)
    }

    fn explain(&mut self, doc: DocId) -> Result<Explanation> {
        let value = self.float_val(doc)?;
        Ok(Explanation::new(value, format!("value({})", doc)))
    }
}

/// A function from documents to values
pub trait ValueSource: fmt::Debug + fmt::Display {
    fn id(&self) -> SourceId;

    /// Register per-execution state in `ctx` before any segment is read
    fn create_weight(&self, _ctx: &mut ValueContext, _searcher: &IndexSearcher) -> Result<()> {
        Ok(())
    }

    /// Values for one segment
    fn values<'a>(
        &'a self,
        ctx: &'a ValueContext,
        segment: SegmentContext<'a>,
    ) -> Result<Box<dyn FunctionValues + 'a>>;
}
