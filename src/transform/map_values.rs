//! Value substitution for one column, with mapping/data drift diagnostics.
//!
//! Before substituting, [`ValueMapper`] reconciles its mapping keys against the distinct
//! values of the target column. Both sides go through [`ValueKey`], so every null in the
//! column is the same member as a null mapping key.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{TransformError, TransformResult};
use crate::types::{DataSet, Value, ValueKey};

use super::Step;
use super::observability::{Diagnostic, MismatchKind, StepObserver, default_observer};

const STEP: &str = "ValueMapper";

/// What to do when a mismatch class is non-empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Report a [`Diagnostic`] and continue.
    #[default]
    Warn,
    /// Fail with [`TransformError::MappingMismatch`] before building any output.
    Error,
}

/// Outcome of comparing mapping keys with the distinct values of a column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Mapping keys that never occur in the column.
    pub keys_not_found: Vec<Value>,
    /// Column values without a mapping key.
    pub values_unmapped: Vec<Value>,
}

impl Reconciliation {
    /// `true` when keys and values line up exactly.
    pub fn is_clean(&self) -> bool {
        self.keys_not_found.is_empty() && self.values_unmapped.is_empty()
    }
}

/// Replaces values of one column according to a fixed mapping.
///
/// Values with a matching key become the mapped replacement; everything else, nulls
/// included, passes through unchanged unless [`Value::Null`] is itself a key. Keys match by
/// logical type, so `Int64(1)` does not match `Float64(1.0)`.
pub struct ValueMapper {
    column: String,
    mapping: BTreeMap<ValueKey, Value>,
    on_keys_not_found: MismatchPolicy,
    on_values_unmapped: MismatchPolicy,
    observer: Arc<dyn StepObserver>,
}

impl ValueMapper {
    /// Create a mapper for `column` from `(key, replacement)` pairs.
    ///
    /// Fails with [`TransformError::Config`] if `column` is empty or a key repeats.
    pub fn new<I, K, V>(column: impl Into<String>, mapping: I) -> TransformResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let column = column.into();
        if column.is_empty() {
            return Err(TransformError::Config {
                step: STEP,
                message: "mapping column name is empty".to_string(),
            });
        }

        let mut keyed = BTreeMap::new();
        for (key, replacement) in mapping {
            let key: Value = key.into();
            if keyed
                .insert(ValueKey::from(&key), replacement.into())
                .is_some()
            {
                return Err(TransformError::Config {
                    step: STEP,
                    message: format!("duplicate mapping key {key:?}"),
                });
            }
        }

        Ok(Self {
            column,
            mapping: keyed,
            on_keys_not_found: MismatchPolicy::default(),
            on_values_unmapped: MismatchPolicy::default(),
            observer: default_observer(),
        })
    }

    /// Policy for mapping keys absent from the column.
    pub fn on_keys_not_found(mut self, policy: MismatchPolicy) -> Self {
        self.on_keys_not_found = policy;
        self
    }

    /// Policy for column values absent from the mapping.
    pub fn on_values_unmapped(mut self, policy: MismatchPolicy) -> Self {
        self.on_values_unmapped = policy;
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

    /// Number of mapping entries.
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// `true` if the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Replacement for `value`, if it is a mapping key.
    pub fn lookup(&self, value: &Value) -> Option<&Value> {
        self.mapping.get(&ValueKey::from(value))
    }

    /// Compare mapping keys with the distinct values of the target column.
    pub fn reconcile(&self, data: &DataSet) -> TransformResult<Reconciliation> {
        let idx = self.column_index(data)?;
        Ok(self.reconcile_at(data, idx))
    }

    fn column_index(&self, data: &DataSet) -> TransformResult<usize> {
        data.column_index(&self.column)
            .ok_or_else(|| TransformError::UnknownColumn {
                step: STEP,
                column: self.column.clone(),
            })
    }

    fn reconcile_at(&self, data: &DataSet, idx: usize) -> Reconciliation {
        let actual = data.distinct_keys(idx);
        let keys: BTreeSet<&ValueKey> = self.mapping.keys().collect();

        let keys_not_found = keys
            .iter()
            .filter(|k| !actual.contains(**k))
            .map(|k| (*k).clone().into_value())
            .collect();
        let values_unmapped = actual
            .into_iter()
            .filter(|v| !keys.contains(v))
            .map(ValueKey::into_value)
            .collect();

        Reconciliation {
            keys_not_found,
            values_unmapped,
        }
    }

    fn check(&self, kind: MismatchKind, policy: MismatchPolicy, values: Vec<Value>) -> TransformResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        match policy {
            MismatchPolicy::Error => Err(TransformError::MappingMismatch {
                column: self.column.clone(),
                kind,
                values,
            }),
            MismatchPolicy::Warn => {
                self.observer.on_diagnostic(&Diagnostic::Mismatch {
                    step: STEP,
                    column: self.column.clone(),
                    kind,
                    values,
                });
                Ok(())
            }
        }
    }
}

impl fmt::Debug for ValueMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueMapper")
            .field("column", &self.column)
            .field("mapping_len", &self.mapping.len())
            .field("on_keys_not_found", &self.on_keys_not_found)
            .field("on_values_unmapped", &self.on_values_unmapped)
            .finish()
    }
}

impl Step for ValueMapper {
    fn name(&self) -> &'static str {
        STEP
    }

    fn observer(&self) -> &dyn StepObserver {
        self.observer.as_ref()
    }

    fn transform(&self, data: &DataSet) -> TransformResult<DataSet> {
        data.validate().map_err(|e| e.in_step(STEP))?;
        let idx = self.column_index(data)?;

        let Reconciliation {
            keys_not_found,
            values_unmapped,
        } = self.reconcile_at(data, idx);
        self.check(MismatchKind::KeysNotFound, self.on_keys_not_found, keys_not_found)?;
        self.check(MismatchKind::ValuesUnmapped, self.on_values_unmapped, values_unmapped)?;

        Ok(data.with_column_replaced(idx, |v| self.lookup(v).cloned().unwrap_or_else(|| v.clone())))
    }
}
