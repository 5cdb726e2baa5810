//! Core data model types.
//!
//! Every step consumes a borrowed [`DataSet`] and produces a new one. A dataset is a
//! [`Schema`] (an ordered list of typed [`Field`]s) plus row-major [`Value`] storage, where
//! [`Value::Null`] is the missing-value marker.
//!
//! Set arithmetic over column values goes through [`ValueKey`], a hashable and totally ordered
//! mirror of [`Value`] in which null is an ordinary member.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Deserialize;

use crate::error::{TransformError, TransformResult};

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Non-null values of more than one logical type.
    Mixed,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// An ordered list of fields describing the shape of a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns `true` if a field named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Returns the first name that appears more than once, if any.
    fn first_duplicate(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.fields.len());
        self.field_names().find(|name| !seen.insert(*name))
    }
}

/// A single typed value in a [`DataSet`].
///
/// Deserializes untagged: JSON `null`, booleans, integers, floats and strings map onto the
/// matching variant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Logical type of this value, or `None` for [`Value::Null`].
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::Bool(_) => Some(DataType::Bool),
            Value::Utf8(_) => Some(DataType::Utf8),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Int64(v) => write!(f, "{v}"),
            // Debug keeps the fractional part (`1.0`), so floats never print like integers.
            Value::Float64(v) => write!(f, "{v:?}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Utf8(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Utf8(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Float wrapper with total equality: `-0.0 == 0.0` and every NaN equals every other NaN.
#[derive(Debug, Clone, Copy)]
pub struct FloatKey(f64);

impl FloatKey {
    fn canonical(v: f64) -> f64 {
        if v.is_nan() {
            f64::NAN
        } else if v == 0.0 {
            0.0
        } else {
            v
        }
    }

    /// The canonicalized float.
    pub fn get(self) -> f64 {
        self.0
    }
}

impl From<f64> for FloatKey {
    fn from(v: f64) -> Self {
        Self(Self::canonical(v))
    }
}

impl PartialEq for FloatKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatKey {}

impl Hash for FloatKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for FloatKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Hashable, totally ordered form of a [`Value`] used for set operations.
///
/// `Null` is a regular member: it equals itself and differs from every non-null key.
/// Keys of different logical types never compare equal (`Int64(1) != Float64(1.0)`).
/// Ordering is `Null`, then booleans, integers, floats and strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKey {
    /// The null marker.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// Canonicalized 64-bit float.
    Float64(FloatKey),
    /// UTF-8 string.
    Utf8(String),
}

impl ValueKey {
    /// Returns `true` for [`ValueKey::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, ValueKey::Null)
    }

    /// Convert back into a [`Value`].
    pub fn into_value(self) -> Value {
        match self {
            ValueKey::Null => Value::Null,
            ValueKey::Bool(v) => Value::Bool(v),
            ValueKey::Int64(v) => Value::Int64(v),
            ValueKey::Float64(v) => Value::Float64(v.get()),
            ValueKey::Utf8(s) => Value::Utf8(s),
        }
    }
}

impl From<&Value> for ValueKey {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => ValueKey::Null,
            Value::Int64(v) => ValueKey::Int64(*v),
            Value::Float64(v) => ValueKey::Float64(FloatKey::from(*v)),
            Value::Bool(v) => ValueKey::Bool(*v),
            Value::Utf8(s) => ValueKey::Utf8(s.clone()),
        }
    }
}

impl From<Value> for ValueKey {
    fn from(v: Value) -> Self {
        match v {
            Value::Utf8(s) => ValueKey::Utf8(s),
            other => ValueKey::from(&other),
        }
    }
}

/// Options for [`DataSet::to_dummies`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyOptions {
    /// Indicator column prefix. `None` uses the encoded column's name.
    pub prefix: Option<String>,
    /// Separator between prefix and category label.
    pub prefix_sep: String,
    /// Emit a `{prefix}{sep}nan` indicator for null entries.
    pub dummy_na: bool,
    /// Omit the indicator of the first (lowest ordered) category.
    pub drop_first: bool,
}

impl Default for DummyOptions {
    fn default() -> Self {
        Self {
            prefix: None,
            prefix_sep: "_".to_string(),
            dummy_na: false,
            drop_first: false,
        }
    }
}

/// Label used for the null indicator column.
pub const NULL_INDICATOR_LABEL: &str = "nan";

const DATASET: &str = "DataSet";

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields. Every
/// editing method returns a new dataset and leaves `self` untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the dataset.
    pub fn column_count(&self) -> usize {
        self.schema.fields.len()
    }

    /// Index of the column named `name`, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.index_of(name)
    }

    /// Check that every row is as wide as the schema and column names are unique.
    pub fn validate(&self) -> TransformResult<()> {
        let width = self.column_count();
        if let Some((row, cells)) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != width)
        {
            return Err(TransformError::MalformedDataSet {
                message: format!("row {row} has {} cells but schema has {width} fields", cells.len()),
            });
        }
        if let Some(name) = self.schema.first_duplicate() {
            return Err(TransformError::DuplicateColumn {
                step: DATASET,
                column: name.to_string(),
            });
        }
        Ok(())
    }

    /// Values of the column at `idx`, in row order, nulls included.
    ///
    /// Rows too short to hold `idx` are skipped; [`Self::validate`] rejects such datasets.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().filter_map(move |row| row.get(idx))
    }

    /// Distinct values of the column at `idx`, with every null collapsed into
    /// [`ValueKey::Null`].
    pub fn distinct_keys(&self, idx: usize) -> BTreeSet<ValueKey> {
        self.column_values(idx).map(ValueKey::from).collect()
    }

    /// Returns a new dataset where each value of column `idx` is replaced by `f(value)`.
    ///
    /// The field type is recomputed from the new values: a single logical type is kept as
    /// is, several become [`DataType::Mixed`], and an all-null column keeps its old type.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds for the schema.
    pub fn with_column_replaced<F>(&self, idx: usize, mut f: F) -> Self
    where
        F: FnMut(&Value) -> Value,
    {
        let rows: Vec<Vec<Value>> = self
            .rows
            .iter()
            .map(|row| {
                let mut out = row.clone();
                if let Some(cell) = out.get_mut(idx) {
                    *cell = f(&row[idx]);
                }
                out
            })
            .collect();

        let mut schema = self.schema.clone();
        let field = &mut schema.fields[idx];
        if let Some(data_type) = infer_column_type(rows.iter().filter_map(|row| row.get(idx))) {
            field.data_type = data_type;
        }

        Self { schema, rows }
    }

    /// Returns a new dataset with columns renamed per `renames` (old name → new name).
    ///
    /// Names absent from the dataset are ignored; column order and all values are preserved.
    /// Fails with [`TransformError::DuplicateColumn`] if the result would repeat a name.
    pub fn rename_columns(&self, renames: &BTreeMap<String, String>) -> TransformResult<Self> {
        let mut schema = self.schema.clone();
        for field in &mut schema.fields {
            if let Some(new_name) = renames.get(&field.name) {
                field.name.clone_from(new_name);
            }
        }
        if let Some(name) = schema.first_duplicate() {
            return Err(TransformError::DuplicateColumn {
                step: DATASET,
                column: name.to_string(),
            });
        }
        Ok(Self {
            schema,
            rows: self.rows.clone(),
        })
    }

    /// Expand column `column` into one boolean indicator column per observed category.
    ///
    /// The encoded column is removed and the indicators are appended after the remaining
    /// columns, in [`ValueKey`] order, named `{prefix}{sep}{label}`. Null entries produce an
    /// all-`false` row unless [`DummyOptions::dummy_na`] is set, in which case a trailing
    /// `{prefix}{sep}nan` indicator is always emitted. [`DummyOptions::drop_first`] removes
    /// the first category's indicator, never the null indicator.
    ///
    /// Labels are the category's display form, with booleans as `True`/`False`. When two
    /// categories share a label (`Int64(1)` and `Utf8("1")`), or a category is labelled `nan`
    /// alongside the null indicator, every category label is qualified with its type:
    /// `{prefix}{sep}int64:1`, `{prefix}{sep}utf8:nan`.
    pub fn to_dummies(&self, column: &str, options: &DummyOptions) -> TransformResult<Self> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| TransformError::UnknownColumn {
                step: DATASET,
                column: column.to_string(),
            })?;

        let categories: Vec<ValueKey> = self
            .distinct_keys(idx)
            .into_iter()
            .filter(|k| !k.is_null())
            .skip(usize::from(options.drop_first))
            .collect();

        let prefix = options.prefix.as_deref().unwrap_or(column);
        let mut fields: Vec<Field> = self
            .schema
            .fields
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, f)| f.clone())
            .collect();
        for label in indicator_labels(&categories, options.dummy_na) {
            fields.push(Field::new(
                format!("{prefix}{}{label}", options.prefix_sep),
                DataType::Bool,
            ));
        }
        if options.dummy_na {
            fields.push(Field::new(
                format!("{prefix}{}{NULL_INDICATOR_LABEL}", options.prefix_sep),
                DataType::Bool,
            ));
        }
        let schema = Schema::new(fields);
        if let Some(name) = schema.first_duplicate() {
            return Err(TransformError::DuplicateColumn {
                step: DATASET,
                column: name.to_string(),
            });
        }

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut out = Vec::with_capacity(schema.fields.len());
                out.extend(
                    row.iter()
                        .enumerate()
                        .filter(|(i, _)| *i != idx)
                        .map(|(_, v)| v.clone()),
                );
                let key = row.get(idx).map(ValueKey::from).unwrap_or(ValueKey::Null);
                out.extend(categories.iter().map(|c| Value::Bool(*c == key)));
                if options.dummy_na {
                    out.push(Value::Bool(key.is_null()));
                }
                out
            })
            .collect();

        Ok(Self { schema, rows })
    }
}

/// Indicator labels for `categories`, type-qualified if the plain labels are ambiguous.
fn indicator_labels(categories: &[ValueKey], null_indicator: bool) -> Vec<String> {
    let plain: Vec<String> = categories.iter().map(category_label).collect();
    let ambiguous = {
        let mut seen: HashSet<&str> = HashSet::with_capacity(plain.len() + 1);
        if null_indicator {
            seen.insert(NULL_INDICATOR_LABEL);
        }
        !plain.iter().all(|label| seen.insert(label.as_str()))
    };
    if !ambiguous {
        return plain;
    }
    categories
        .iter()
        .zip(plain)
        .map(|(category, label)| format!("{}:{label}", type_tag(category)))
        .collect()
}

fn category_label(category: &ValueKey) -> String {
    match category {
        ValueKey::Bool(true) => "True".to_string(),
        ValueKey::Bool(false) => "False".to_string(),
        other => other.clone().into_value().to_string(),
    }
}

fn type_tag(category: &ValueKey) -> &'static str {
    match category {
        ValueKey::Null => "null",
        ValueKey::Bool(_) => "bool",
        ValueKey::Int64(_) => "int64",
        ValueKey::Float64(_) => "float64",
        ValueKey::Utf8(_) => "utf8",
    }
}

/// Logical type shared by the non-null `values`: `None` if all are null, [`DataType::Mixed`]
/// if they disagree.
pub fn infer_column_type<'a, I>(values: I) -> Option<DataType>
where
    I: IntoIterator<Item = &'a Value>,
{
    values
        .into_iter()
        .filter_map(Value::data_type)
        .try_fold(None, |acc, t| match acc {
            None => Some(Some(t)),
            Some(prev) if prev == t => Some(Some(prev)),
            Some(_) => None,
        })
        .map_or(Some(DataType::Mixed), |t| t)
}
