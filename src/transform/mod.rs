//! Stateless preprocessing steps over [`crate::types::DataSet`].
//!
//! Every step implements [`Step`]: it is configured once at construction, `fit` learns
//! nothing, and `transform` builds a new dataset without touching its input.
//!
//! Currently implemented:
//!
//! - [`ValueMapper`]: substitutes values of one column from a mapping, reporting mapping/data
//!   drift as [`Diagnostic`]s
//! - [`ColumnRenamer`]: bulk column rename; unknown source columns are fatal
//! - [`OneHotEncoder`]: expands one categorical column into boolean indicator columns
//!
//! ## Example: map → rename → encode
//!
//! ```rust
//! use rust_data_transforms::transform::{ColumnRenamer, OneHotEncoder, Step, ValueMapper};
//! use rust_data_transforms::types::{DataSet, DataType, Field, Schema, Value};
//!
//! # fn main() -> Result<(), rust_data_transforms::TransformError> {
//! let ds = DataSet::new(
//!     Schema::new(vec![
//!         Field::new("size", DataType::Utf8),
//!         Field::new("colour", DataType::Utf8),
//!     ]),
//!     vec![
//!         vec![Value::from("S"), Value::from("red")],
//!         vec![Value::from("L"), Value::Null],
//!     ],
//! );
//!
//! let sizes = ValueMapper::new("size", [("S", 1_i64), ("M", 2), ("L", 3)])?;
//! let rename = ColumnRenamer::new([("colour", "color")])?;
//! let encode = OneHotEncoder::new("color")?.include_null_indicator(true);
//!
//! // "M" never occurs, so a keys-not-found diagnostic is reported (not an error).
//! let out = sizes.transform(&ds)?;
//! let out = rename.transform(&out)?;
//! let out = encode.transform(&out)?;
//!
//! let names: Vec<&str> = out.schema.field_names().collect();
//! assert_eq!(names, ["size", "color_red", "color_nan"]);
//! assert_eq!(out.rows[1], vec![Value::Int64(3), Value::Bool(false), Value::Bool(true)]);
//! # Ok(())
//! # }
//! ```
//!
//! Chaining steps is the caller's job; each step's output is the next step's input.

pub mod map_values;
pub mod observability;
pub mod one_hot;
pub mod rename;

use rayon::prelude::*;

use crate::error::TransformResult;
use crate::types::{DataSet, Value};

pub use map_values::{MismatchPolicy, Reconciliation, ValueMapper};
pub use observability::{
    CompositeObserver, Diagnostic, DiagnosticSeverity, FileObserver, MismatchKind, NullObserver,
    StdErrObserver, StepObserver, TracingObserver, default_observer,
};
pub use one_hot::OneHotEncoder;
pub use rename::ColumnRenamer;

/// The contract shared by every preprocessing step.
///
/// Steps hold only their construction-time configuration. `transform` is a pure function of
/// that configuration and its input, so one step may be used from several threads at once.
pub trait Step: Send + Sync {
    /// Short name used in errors and diagnostics.
    fn name(&self) -> &'static str;

    /// Where this step reports diagnostics.
    fn observer(&self) -> &dyn StepObserver;

    /// Apply the step, returning a new dataset. `data` is never modified.
    fn transform(&self, data: &DataSet) -> TransformResult<DataSet>;

    /// No-op: nothing is learned from `data` or `labels`.
    ///
    /// Reports [`Diagnostic::FitIsNoOp`] so callers do not expect learned state.
    fn fit(&self, _data: &DataSet, _labels: Option<&[Value]>) -> &Self
    where
        Self: Sized,
    {
        self.observer()
            .on_diagnostic(&Diagnostic::FitIsNoOp { step: self.name() });
        self
    }

    /// Same result as `fit` followed by `transform`; `fit` is skipped since it does nothing.
    fn fit_transform(&self, data: &DataSet, _labels: Option<&[Value]>) -> TransformResult<DataSet> {
        self.transform(data)
    }

    /// Transform independent datasets in parallel, one result per input, in input order.
    fn transform_batch(&self, datasets: &[DataSet]) -> Vec<TransformResult<DataSet>> {
        datasets.par_iter().map(|ds| self.transform(ds)).collect()
    }
}

impl Step for Box<dyn Step> {
    fn name(&self) -> &'static str {
        self.as_ref().name()
    }

    fn observer(&self) -> &dyn StepObserver {
        self.as_ref().observer()
    }

    fn transform(&self, data: &DataSet) -> TransformResult<DataSet> {
        self.as_ref().transform(data)
    }
}
