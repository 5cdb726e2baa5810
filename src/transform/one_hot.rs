//! Indicator (one-hot) encoding of a single column.

use std::fmt;
use std::sync::Arc;

use crate::error::{TransformError, TransformResult};
use crate::types::{DataSet, DummyOptions};

use super::Step;
use super::observability::{StepObserver, default_observer};

const STEP: &str = "OneHotEncoder";

/// Replaces one categorical column with a boolean indicator column per observed category.
///
/// Indicators are named `{column}_{label}` and appended after the remaining columns; see
/// [`DataSet::to_dummies`] for labelling and null handling.
pub struct OneHotEncoder {
    column: String,
    include_null_indicator: bool,
    drop_first_level: bool,
    observer: Arc<dyn StepObserver>,
}

impl OneHotEncoder {
    /// Create an encoder for `column` with both flags off.
    pub fn new(column: impl Into<String>) -> TransformResult<Self> {
        let column = column.into();
        if column.is_empty() {
            return Err(TransformError::Config {
                step: STEP,
                message: "target column name is empty".to_string(),
            });
        }
        Ok(Self {
            column,
            include_null_indicator: false,
            drop_first_level: false,
            observer: default_observer(),
        })
    }

    /// Also emit a `{column}_nan` indicator for null entries.
    pub fn include_null_indicator(mut self, yes: bool) -> Self {
        self.include_null_indicator = yes;
        self
    }

    /// Omit the first category's indicator.
    pub fn drop_first_level(mut self, yes: bool) -> Self {
        self.drop_first_level = yes;
        self
    }

    /// Report diagnostics to `observer` instead of the default `tracing` observer.
    pub fn with_observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Target column name.
    pub fn column(&self) -> &str {
        &self.column
    }
}

impl fmt::Debug for OneHotEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneHotEncoder")
            .field("column", &self.column)
            .field("include_null_indicator", &self.include_null_indicator)
            .field("drop_first_level", &self.drop_first_level)
            .finish()
    }
}

impl Step for OneHotEncoder {
    fn name(&self) -> &'static str {
        STEP
    }

    fn observer(&self) -> &dyn StepObserver {
        self.observer.as_ref()
    }

    fn transform(&self, data: &DataSet) -> TransformResult<DataSet> {
        data.validate().map_err(|e| e.in_step(STEP))?;
        if !data.schema.contains(&self.column) {
            return Err(TransformError::UnknownColumn {
                step: STEP,
                column: self.column.clone(),
            });
        }

        let options = DummyOptions {
            prefix: Some(self.column.clone()),
            dummy_na: self.include_null_indicator,
            drop_first: self.drop_first_level,
            ..DummyOptions::default()
        };
        data.to_dummies(&self.column, &options).map_err(|e| e.in_step(STEP))
    }
}

#[cfg(test)]
mod tests {
    use super::OneHotEncoder;
    use crate::error::TransformError;
    use crate::transform::Step;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn pets_dataset() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("pet", DataType::Utf8),
            Field::new("age", DataType::Int64),
        ]);
        let rows = vec![
            vec![Value::from("dog"), Value::Int64(3)],
            vec![Value::from("cat"), Value::Int64(5)],
            vec![Value::from("bird"), Value::Int64(1)],
            vec![Value::from("dog"), Value::Int64(7)],
        ];
        DataSet::new(schema, rows)
    }

    fn names(ds: &DataSet) -> Vec<&str> {
        ds.schema.field_names().collect()
    }

    #[test]
    fn one_indicator_per_category() {
        let ds = pets_dataset();
        let out = OneHotEncoder::new("pet").unwrap().transform(&ds).unwrap();

        assert_eq!(names(&out), vec!["age", "pet_bird", "pet_cat", "pet_dog"]);
        assert_eq!(out.row_count(), 4);
        assert_eq!(
            out.rows[0],
            vec![
                Value::Int64(3),
                Value::Bool(false),
                Value::Bool(false),
                Value::Bool(true)
            ]
        );
        assert!(out.schema.fields[1..].iter().all(|f| f.data_type == DataType::Bool));
        // Original unchanged
        assert_eq!(ds, pets_dataset());
    }

    #[test]
    fn drop_first_level_removes_one_column() {
        let out = OneHotEncoder::new("pet")
            .unwrap()
            .drop_first_level(true)
            .transform(&pets_dataset())
            .unwrap();
        assert_eq!(names(&out), vec!["age", "pet_cat", "pet_dog"]);
        // "bird" row is now all-false.
        assert_eq!(out.rows[2][1..], [Value::Bool(false), Value::Bool(false)]);
    }

    #[test]
    fn null_indicator_is_emitted_on_request() {
        let mut ds = pets_dataset();
        ds.rows[1][0] = Value::Null;

        let without = OneHotEncoder::new("pet").unwrap().transform(&ds).unwrap();
        assert_eq!(names(&without), vec!["age", "pet_bird", "pet_dog"]);

        let with = OneHotEncoder::new("pet")
            .unwrap()
            .include_null_indicator(true)
            .transform(&ds)
            .unwrap();
        assert_eq!(names(&with), vec!["age", "pet_bird", "pet_dog", "pet_nan"]);
        assert_eq!(
            with.rows[1][1..],
            [Value::Bool(false), Value::Bool(false), Value::Bool(true)]
        );
    }

    #[test]
    fn unknown_column_is_a_precondition_error() {
        let err = OneHotEncoder::new("colour")
            .unwrap()
            .transform(&pets_dataset())
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::UnknownColumn { step: "OneHotEncoder", column } if column == "colour"
        ));
    }

    #[test]
    fn category_named_nan_is_kept_apart_from_the_null_indicator() {
        let schema = Schema::new(vec![Field::new("c", DataType::Utf8)]);
        let ds = DataSet::new(
            schema,
            vec![vec![Value::from("nan")], vec![Value::Null], vec![Value::from("x")]],
        );

        let plain = OneHotEncoder::new("c").unwrap().transform(&ds).unwrap();
        assert_eq!(names(&plain), vec!["c_nan", "c_x"]);

        let with_null = OneHotEncoder::new("c")
            .unwrap()
            .include_null_indicator(true)
            .transform(&ds)
            .unwrap();
        assert_eq!(names(&with_null), vec!["c_utf8:nan", "c_utf8:x", "c_nan"]);
        assert_eq!(
            with_null.rows,
            vec![
                vec![Value::Bool(true), Value::Bool(false), Value::Bool(false)],
                vec![Value::Bool(false), Value::Bool(false), Value::Bool(true)],
                vec![Value::Bool(false), Value::Bool(true), Value::Bool(false)],
            ]
        );
    }

    #[test]
    fn indicator_names_must_not_collide() {
        let schema = Schema::new(vec![
            Field::new("pet", DataType::Utf8),
            Field::new("pet_dog", DataType::Bool),
        ]);
        let ds = DataSet::new(schema, vec![vec![Value::from("dog"), Value::Bool(true)]]);
        let err = OneHotEncoder::new("pet").unwrap().transform(&ds).unwrap_err();
        assert!(matches!(err, TransformError::DuplicateColumn { step: "OneHotEncoder", column } if column == "pet_dog"));
    }
}
