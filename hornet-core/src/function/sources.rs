//! Built-in value sources: constants, stored columns and float arithmetic

use std::fmt;
use std::sync::Arc;

use crate::query::Explanation;
use crate::searcher::IndexSearcher;
use crate::segment::SegmentContext;
use crate::{DocId, Error, Result};

use super::{ContextValue, FunctionValues, SourceId, ValueContext, ValueSource};

// ── Constant ─────────────────────────────────────────────────────────────

/// The same value for every document
#[derive(Debug)]
pub struct ConstValueSource {
    id: SourceId,
    value: f32,
}

impl ConstValueSource {
    pub fn new(value: f32) -> Self {
        Self {
            id: SourceId::next(),
            value,
        }
    }
}

impl fmt::Display for ConstValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "const({})", self.value)
    }
}

impl ValueSource for ConstValueSource {
    fn id(&self) -> SourceId {
        self.id
    }

    fn values<'a>(
        &'a self,
        _ctx: &'a ValueContext,
        _segment: SegmentContext<'a>,
    ) -> Result<Box<dyn FunctionValues + 'a>> {
        Ok(Box::new(ConstValues(self.value)))
    }
}

struct ConstValues(f32);

impl FunctionValues for ConstValues {
    fn float_val(&mut self, _doc: DocId) -> Result<f32> {
        Ok(self.0)
    }

    fn int_val(&mut self, _doc: DocId) -> Result<i32> {
        Ok(self.0 as i32)
    }

    fn long_val(&mut self, _doc: DocId) -> Result<i64> {
        Ok(self.0 as i64)
    }

    fn explain(&mut self, _doc: DocId) -> Result<Explanation> {
        Ok(Explanation::new(self.0, format!("const({})", self.0)))
    }
}

// ── Column ───────────────────────────────────────────────────────────────

/// Per-document floats stored by the segment under `field`.
///
/// Documents past the end of the column, or in segments without it, read as
/// 0 and do not exist.
#[derive(Debug)]
pub struct ColumnValueSource {
    id: SourceId,
    field: String,
}

impl ColumnValueSource {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            id: SourceId::next(),
            field: field.into(),
        }
    }
}

impl fmt::Display for ColumnValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "float({})", self.field)
    }
}

impl ValueSource for ColumnValueSource {
    fn id(&self) -> SourceId {
        self.id
    }

    fn create_weight(&self, _ctx: &mut ValueContext, searcher: &IndexSearcher) -> Result<()> {
        let mut segments = searcher.segments().peekable();
        if segments.peek().is_some()
            && !segments.any(|s| s.reader.float_column(&self.field).is_some())
        {
            return Err(Error::FieldNotFound(self.field.clone()));
        }
        Ok(())
    }

    fn values<'a>(
        &'a self,
        _ctx: &'a ValueContext,
        segment: SegmentContext<'a>,
    ) -> Result<Box<dyn FunctionValues + 'a>> {
        Ok(Box::new(ColumnValues {
            field: &self.field,
            column: segment.reader.float_column(&self.field).unwrap_or(&[]),
        }))
    }
}

struct ColumnValues<'a> {
    field: &'a str,
    column: &'a [f32],
}

impl FunctionValues for ColumnValues<'_> {
    fn float_val(&mut self, doc: DocId) -> Result<f32> {
        Ok(self.column.get(doc as usize).copied().unwrap_or(0.0))
    }

    fn int_val(&mut self, doc: DocId) -> Result<i32> {
        Ok(self.float_val(doc)? as i32)
    }

    fn exists(&mut self, doc: DocId) -> Result<bool> {
        Ok((doc as usize) < self.column.len())
    }

    fn explain(&mut self, doc: DocId) -> Result<Explanation> {
        let value = self.float_val(doc)?;
        Ok(Explanation::new(
            value,
            format!("float({})={}", self.field, value),
        ))
    }
}

// ── Linear ───────────────────────────────────────────────────────────────

/// `slope * source + intercept`
#[derive(Debug)]
pub struct LinearFloatFunction {
    id: SourceId,
    source: Arc<dyn ValueSource>,
    slope: f32,
    intercept: f32,
}

impl LinearFloatFunction {
    pub fn new(source: Arc<dyn ValueSource>, slope: f32, intercept: f32) -> Self {
        Self {
            id: SourceId::next(),
            source,
            slope,
            intercept,
        }
    }
}

impl fmt::Display for LinearFloatFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*{}+{}", self.slope, self.source, self.intercept)
    }
}

impl ValueSource for LinearFloatFunction {
    fn id(&self) -> SourceId {
        self.id
    }

    fn create_weight(&self, ctx: &mut ValueContext, searcher: &IndexSearcher) -> Result<()> {
        self.source.create_weight(ctx, searcher)
    }

    fn values<'a>(
        &'a self,
        ctx: &'a ValueContext,
        segment: SegmentContext<'a>,
    ) -> Result<Box<dyn FunctionValues + 'a>> {
        Ok(Box::new(LinearValues {
            inner: self.source.values(ctx, segment)?,
            slope: self.slope,
            intercept: self.intercept,
        }))
    }
}

struct LinearValues<'a> {
    inner: Box<dyn FunctionValues + 'a>,
    slope: f32,
    intercept: f32,
}

impl FunctionValues for LinearValues<'_> {
    fn float_val(&mut self, doc: DocId) -> Result<f32> {
        Ok(self.inner.float_val(doc)? * self.slope + self.intercept)
    }

    fn int_val(&mut self, doc: DocId) -> Result<i32> {
        Ok(self.float_val(doc)? as i32)
    }

    fn exists(&mut self, doc: DocId) -> Result<bool> {
        self.inner.exists(doc)
    }

    fn explain(&mut self, doc: DocId) -> Result<Explanation> {
        let inner = self.inner.explain(doc)?;
        Ok(Explanation::new(
            inner.value * self.slope + self.intercept,
            format!("{}*x+{}", self.slope, self.intercept),
        )
        .with_detail(inner))
    }
}

// ── Sum / Product ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Combine {
    Sum,
    Product,
}

impl Combine {
    fn name(self) -> &'static str {
        match self {
            Combine::Sum => "sum",
            Combine::Product => "product",
        }
    }

    fn identity(self) -> f32 {
        match self {
            Combine::Sum => 0.0,
            Combine::Product => 1.0,
        }
    }

    fn apply(self, acc: f32, value: f32) -> f32 {
        match self {
            Combine::Sum => acc + value,
            Combine::Product => acc * value,
        }
    }
}

fn fmt_multi(f: &mut fmt::Formatter<'_>, op: Combine, sources: &[Arc<dyn ValueSource>]) -> fmt::Result {
    write!(f, "{}(", op.name())?;
    for (i, source) in sources.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", source)?;
    }
    write!(f, ")")
}

fn create_all(
    sources: &[Arc<dyn ValueSource>],
    ctx: &mut ValueContext,
    searcher: &IndexSearcher,
) -> Result<()> {
    for source in sources {
        source.create_weight(ctx, searcher)?;
    }
    Ok(())
}

fn multi_values<'a>(
    op: Combine,
    sources: &'a [Arc<dyn ValueSource>],
    ctx: &'a ValueContext,
    segment: SegmentContext<'a>,
) -> Result<Box<dyn FunctionValues + 'a>> {
    let inner = sources
        .iter()
        .map(|s| s.values(ctx, segment))
        .collect::<Result<Vec<_>>>()?;
    Ok(Box::new(MultiValues { op, inner }))
}

struct MultiValues<'a> {
    op: Combine,
    inner: Vec<Box<dyn FunctionValues + 'a>>,
}

impl FunctionValues for MultiValues<'_> {
    fn float_val(&mut self, doc: DocId) -> Result<f32> {
        let mut acc = self.op.identity();
        for values in &mut self.inner {
            acc = self.op.apply(acc, values.float_val(doc)?);
        }
        Ok(acc)
    }

    fn int_val(&mut self, doc: DocId) -> Result<i32> {
        Ok(self.float_val(doc)? as i32)
    }

    /// A combined value exists only where every input does
    fn exists(&mut self, doc: DocId) -> Result<bool> {
        for values in &mut self.inner {
            if !values.exists(doc)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn explain(&mut self, doc: DocId) -> Result<Explanation> {
        let mut expl = Explanation::new(self.op.identity(), format!("{} of:", self.op.name()));
        for values in &mut self.inner {
            let detail = values.explain(doc)?;
            expl.value = self.op.apply(expl.value, detail.value);
            expl.add_detail(detail);
        }
        Ok(expl)
    }
}

/// Sum of several sources
#[derive(Debug)]
pub struct SumFloatFunction {
    id: SourceId,
    sources: Vec<Arc<dyn ValueSource>>,
}

impl SumFloatFunction {
    pub fn new(sources: Vec<Arc<dyn ValueSource>>) -> Self {
        Self {
            id: SourceId::next(),
            sources,
        }
    }
}

impl fmt::Display for SumFloatFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_multi(f, Combine::Sum, &self.sources)
    }
}

impl ValueSource for SumFloatFunction {
    fn id(&self) -> SourceId {
        self.id
    }

    fn create_weight(&self, ctx: &mut ValueContext, searcher: &IndexSearcher) -> Result<()> {
        create_all(&self.sources, ctx, searcher)
    }

    fn values<'a>(
        &'a self,
        ctx: &'a ValueContext,
        segment: SegmentContext<'a>,
    ) -> Result<Box<dyn FunctionValues + 'a>> {
        multi_values(Combine::Sum, &self.sources, ctx, segment)
    }
}

/// Product of several sources
#[derive(Debug)]
pub struct ProductFloatFunction {
    id: SourceId,
    sources: Vec<Arc<dyn ValueSource>>,
}

impl ProductFloatFunction {
    pub fn new(sources: Vec<Arc<dyn ValueSource>>) -> Self {
        Self {
            id: SourceId::next(),
            sources,
        }
    }
}

impl fmt::Display for ProductFloatFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_multi(f, Combine::Product, &self.sources)
    }
}

impl ValueSource for ProductFloatFunction {
    fn id(&self) -> SourceId {
        self.id
    }

    fn create_weight(&self, ctx: &mut ValueContext, searcher: &IndexSearcher) -> Result<()> {
        create_all(&self.sources, ctx, searcher)
    }

    fn values<'a>(
        &'a self,
        ctx: &'a ValueContext,
        segment: SegmentContext<'a>,
    ) -> Result<Box<dyn FunctionValues + 'a>> {
        multi_values(Combine::Product, &self.sources, ctx, segment)
    }
}

// ── Scale ────────────────────────────────────────────────────────────────

/// Maps a source linearly onto `[min, max]`.
///
/// The source's own range is measured over every live document of every
/// segment when the weight is created, skipping infinities and NaN. A
/// constant source maps to `min`.
#[derive(Debug)]
pub struct ScaleFloatFunction {
    id: SourceId,
    source: Arc<dyn ValueSource>,
    min: f32,
    max: f32,
}

impl ScaleFloatFunction {
    pub fn new(source: Arc<dyn ValueSource>, min: f32, max: f32) -> Self {
        Self {
            id: SourceId::next(),
            source,
            min,
            max,
        }
    }
}

impl fmt::Display for ScaleFloatFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scale({},{},{})", self.source, self.min, self.max)
    }
}

impl ValueSource for ScaleFloatFunction {
    fn id(&self) -> SourceId {
        self.id
    }

    fn create_weight(&self, ctx: &mut ValueContext, searcher: &IndexSearcher) -> Result<()> {
        self.source.create_weight(ctx, searcher)?;

        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for segment in searcher.segments() {
            let live = segment.reader.live_docs();
            let mut values = self.source.values(ctx, segment)?;
            for doc in 0..segment.max_doc() {
                if live.is_some_and(|l| !l.accept(doc)) {
                    continue;
                }
                let value = values.float_val(doc)?;
                if !value.is_finite() {
                    continue;
                }
                min = min.min(value);
                max = max.max(value);
            }
        }
        if min > max {
            // no documents
            min = 0.0;
            max = 0.0;
        }
        log::debug!("{}: source range [{}, {}]", self, min, max);
        ctx.put(self.id, ContextValue::Range { min, max });
        Ok(())
    }

    fn values<'a>(
        &'a self,
        ctx: &'a ValueContext,
        segment: SegmentContext<'a>,
    ) -> Result<Box<dyn FunctionValues + 'a>> {
        let (source_min, source_max) = ctx.range(self.id).ok_or_else(|| {
            Error::InvalidArgument(format!("{}: range was not computed", self))
        })?;
        let spread = source_max - source_min;
        let scale = if spread == 0.0 {
            0.0
        } else {
            (self.max - self.min) / spread
        };
        Ok(Box::new(ScaleValues {
            inner: self.source.values(ctx, segment)?,
            source_min,
            scale,
            min: self.min,
        }))
    }
}

struct ScaleValues<'a> {
    inner: Box<dyn FunctionValues + 'a>,
    source_min: f32,
    scale: f32,
    min: f32,
}

impl FunctionValues for ScaleValues<'_> {
    fn float_val(&mut self, doc: DocId) -> Result<f32> {
        Ok((self.inner.float_val(doc)? - self.source_min) * self.scale + self.min)
    }

    fn int_val(&mut self, doc: DocId) -> Result<i32> {
        Ok(self.float_val(doc)? as i32)
    }

    fn exists(&mut self, doc: DocId) -> Result<bool> {
        self.inner.exists(doc)
    }

    fn explain(&mut self, doc: DocId) -> Result<Explanation> {
        let value = self.float_val(doc)?;
        let inner = self.inner.explain(doc)?;
        Ok(Explanation::new(
            value,
            format!("scale(x - {})*{}+{}", self.source_min, self.scale, self.min),
        )
        .with_detail(inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::MemorySegment;

    fn searcher() -> IndexSearcher {
        IndexSearcher::new(vec![
            Arc::new(MemorySegment::new(3).with_float_column("price", vec![2.0, 4.0, 6.0])),
            Arc::new(
                MemorySegment::new(3)
                    .with_float_column("price", vec![10.0, 100.0])
                    .with_deleted(&[1]),
            ),
        ])
    }

    /// Float values of every doc of every segment after weight setup
    fn eval(source: &dyn ValueSource, searcher: &IndexSearcher) -> Vec<Vec<f32>> {
        let mut ctx = ValueContext::new();
        source.create_weight(&mut ctx, searcher).unwrap();
        searcher
            .segments()
            .map(|segment| {
                let mut values = source.values(&ctx, segment).unwrap();
                (0..segment.max_doc())
                    .map(|doc| values.float_val(doc).unwrap())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_const() {
        let searcher = searcher();
        let source = ConstValueSource::new(2.5);
        assert_eq!(eval(&source, &searcher), vec![vec![2.5; 3], vec![2.5; 3]]);
        assert_eq!(source.to_string(), "const(2.5)");
    }

    #[test]
    fn test_column_missing_values() {
        let searcher = searcher();
        let source = ColumnValueSource::new("price");
        assert_eq!(
            eval(&source, &searcher),
            vec![vec![2.0, 4.0, 6.0], vec![10.0, 100.0, 0.0]]
        );

        let ctx = ValueContext::new();
        let segment = searcher.segments().nth(1).unwrap();
        let mut values = source.values(&ctx, segment).unwrap();
        assert!(values.exists(1).unwrap());
        assert!(!values.exists(2).unwrap());
        assert_eq!(values.int_val(1).unwrap(), 100);
    }

    #[test]
    fn test_column_unknown_field() {
        let searcher = searcher();
        let mut ctx = ValueContext::new();
        assert!(matches!(
            ColumnValueSource::new("weight").create_weight(&mut ctx, &searcher),
            Err(Error::FieldNotFound(_))
        ));
    }

    #[test]
    fn test_linear() {
        let searcher = searcher();
        let source = LinearFloatFunction::new(Arc::new(ColumnValueSource::new("price")), 2.0, 1.0);
        assert_eq!(eval(&source, &searcher)[0], vec![5.0, 9.0, 13.0]);
    }

    #[test]
    fn test_sum_and_product() {
        let searcher = searcher();
        let price: Arc<dyn ValueSource> = Arc::new(ColumnValueSource::new("price"));
        let two: Arc<dyn ValueSource> = Arc::new(ConstValueSource::new(2.0));

        let sum = SumFloatFunction::new(vec![Arc::clone(&price), Arc::clone(&two)]);
        assert_eq!(eval(&sum, &searcher)[0], vec![4.0, 6.0, 8.0]);
        assert_eq!(sum.to_string(), "sum(float(price),const(2))");

        let product = ProductFloatFunction::new(vec![price, two]);
        assert_eq!(eval(&product, &searcher)[1], vec![20.0, 200.0, 0.0]);

        let ctx = ValueContext::new();
        let segment = searcher.segments().nth(1).unwrap();
        let mut values = product.values(&ctx, segment).unwrap();
        assert!(!values.exists(2).unwrap());
        let expl = values.explain(0).unwrap();
        assert_eq!(expl.value, 20.0);
        assert_eq!(expl.details.len(), 2);
    }

    #[test]
    fn test_scale_uses_live_docs_across_segments() {
        let searcher = searcher();
        // doc 1 of the second segment (100.0) is deleted; doc 2 reads 0.0
        let source = ScaleFloatFunction::new(Arc::new(ColumnValueSource::new("price")), 0.0, 1.0);
        let values = eval(&source, &searcher);
        for (got, want) in values[0].iter().zip([0.2, 0.4, 0.6]) {
            assert!((got - want).abs() < 1e-6, "{} != {}", got, want);
        }
        assert!((values[1][0] - 1.0).abs() < 1e-6);
        assert_eq!(values[1][2], 0.0);
    }

    #[test]
    fn test_scale_constant_source_maps_to_min() {
        let searcher = searcher();
        let source = ScaleFloatFunction::new(Arc::new(ConstValueSource::new(7.0)), 3.0, 9.0);
        assert_eq!(eval(&source, &searcher)[0], vec![3.0; 3]);
    }

    #[test]
    fn test_scale_without_setup_fails() {
        let searcher = searcher();
        let source = ScaleFloatFunction::new(Arc::new(ConstValueSource::new(7.0)), 0.0, 1.0);
        let ctx = ValueContext::new();
        let segment = searcher.segments().next().unwrap();
        assert!(matches!(
            source.values(&ctx, segment),
            Err(Error::InvalidArgument(_))
        ));
    }
}
