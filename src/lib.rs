//! `rust-data-transforms` is a small set of composable preprocessing steps over the
//! in-memory [`types::DataSet`].
//!
//! Each step performs one structural edit and returns a new dataset, leaving its input
//! untouched:
//!
//! - [`transform::ValueMapper`]: remaps the values of one column, reporting mapping keys that
//!   never occur and column values that have no key
//! - [`transform::ColumnRenamer`]: renames columns; naming an absent column is an error
//! - [`transform::OneHotEncoder`]: expands one categorical column into boolean indicator columns
//!
//! All steps implement [`transform::Step`]: construct once with configuration, `fit` is a
//! no-op, `transform` is pure. Sequencing steps is left to the caller (or whatever pipeline
//! driver holds them).
//!
//! ## Nulls
//!
//! [`types::Value::Null`] is the missing-value marker. When a step compares sets of values
//! it uses [`types::ValueKey`], in which every null is one and the same member, so a mapping
//! may use `Null` as a key and mismatch reports list `null` at most once.
//!
//! ## Quick example
//!
//! ```rust
//! use rust_data_transforms::transform::{Step, ValueMapper};
//! use rust_data_transforms::types::{DataSet, DataType, Field, Schema, Value};
//!
//! # fn main() -> Result<(), rust_data_transforms::TransformError> {
//! let ds = DataSet::new(
//!     Schema::new(vec![Field::new("size", DataType::Utf8)]),
//!     vec![
//!         vec![Value::from("S")],
//!         vec![Value::from("M")],
//!         vec![Value::from("L")],
//!         vec![Value::Null],
//!     ],
//! );
//!
//! let mapper = ValueMapper::new("size", [("S", 1_i64), ("M", 2), ("L", 3)])?;
//!
//! // The null entry has no key: a "values unmapped" diagnostic is emitted and it passes through.
//! let out = mapper.transform(&ds)?;
//! let sizes: Vec<Value> = out.column_values(0).cloned().collect();
//! assert_eq!(sizes, vec![Value::Int64(1), Value::Int64(2), Value::Int64(3), Value::Null]);
//! assert_eq!(ds.rows[0][0], Value::from("S"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Diagnostics
//!
//! Mismatches and `fit` calls are reported as [`transform::Diagnostic`]s to the step's
//! [`transform::StepObserver`]. The default observer emits `tracing` events; swap it with
//! `with_observer` (e.g. [`transform::StdErrObserver`], [`transform::FileObserver`], or
//! your own collector). A [`transform::MismatchPolicy::Error`] turns a mismatch class into
//! a [`TransformError::MappingMismatch`].
//!
//! ## Modules
//!
//! - [`transform`]: the step contract, the three steps, and diagnostics
//! - [`types`]: schema, values and the dataset primitives the steps build on
//! - [`config`]: JSON step configuration
//! - [`error`]: error type shared across the crate

pub mod config;
pub mod error;
pub mod transform;
pub mod types;

pub use error::{TransformError, TransformResult};
