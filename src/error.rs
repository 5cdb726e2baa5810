use thiserror::Error;

use crate::transform::observability::{MismatchKind, ValueSet};
use crate::types::Value;

/// Convenience result type for step construction and transforms.
pub type TransformResult<T> = Result<T, TransformError>;

/// Error type returned by steps, the dataset primitives and configuration loading.
///
/// Every variant is fatal. Non-fatal findings are reported as
/// [`crate::transform::Diagnostic`]s instead.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A step was constructed with an unusable configuration.
    #[error("{step}: invalid configuration: {message}")]
    Config { step: &'static str, message: String },

    /// A column the step targets does not exist in the input.
    #[error("{step}.transform unknown column \"{column}\"")]
    UnknownColumn { step: &'static str, column: String },

    /// One or more configured rename sources are absent from the input.
    #[error("ColumnRenamer: cannot rename unknown columns: {columns:?}")]
    RenameTargetsMissing { columns: Vec<String> },

    /// The edit would leave two columns with the same name.
    #[error("{step}: duplicate column name \"{column}\"")]
    DuplicateColumn { step: &'static str, column: String },

    /// A mapping mismatch configured as fatal ([`crate::transform::MismatchPolicy::Error`]).
    #[error("ValueMapper[{column}] {kind}: {}", ValueSet(.values))]
    MappingMismatch {
        column: String,
        kind: MismatchKind,
        values: Vec<Value>,
    },

    /// Row storage disagrees with the schema.
    #[error("malformed dataset: {message}")]
    MalformedDataSet { message: String },

    /// Step configuration could not be parsed.
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Underlying I/O error while reading a configuration file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransformError {
    /// Attribute a column-level error raised by a [`crate::types::DataSet`] primitive to `step`.
    pub(crate) fn in_step(self, step: &'static str) -> Self {
        match self {
            TransformError::UnknownColumn { column, .. } => TransformError::UnknownColumn { step, column },
            TransformError::DuplicateColumn { column, .. } => TransformError::DuplicateColumn { step, column },
            other => other,
        }
    }
}
