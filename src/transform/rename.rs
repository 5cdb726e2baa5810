//! Bulk column renaming.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::error::{TransformError, TransformResult};
use crate::types::DataSet;

use super::Step;
use super::observability::{StepObserver, default_observer};

const STEP: &str = "ColumnRenamer";

/// Renames columns by an old-name → new-name dictionary.
///
/// Unlike [`super::ValueMapper`], a configured name missing from the input is fatal:
/// [`TransformError::RenameTargetsMissing`] lists every such name.
pub struct ColumnRenamer {
    renames: BTreeMap<String, String>,
    observer: Arc<dyn StepObserver>,
}

impl ColumnRenamer {
    /// Create a renamer from `(old, new)` pairs.
    ///
    /// Fails with [`TransformError::Config`] if a name is empty, an old name repeats, or two
    /// old names share one new name.
    pub fn new<I, K, V>(renames: I) -> TransformResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        let mut targets = BTreeSet::new();
        for (old, new) in renames {
            let (old, new): (String, String) = (old.into(), new.into());
            if old.is_empty() || new.is_empty() {
                return Err(config_error(format!("empty column name in rename {old:?} -> {new:?}")));
            }
            if !targets.insert(new.clone()) {
                return Err(config_error(format!("more than one column renamed to {new:?}")));
            }
            if map.contains_key(&old) {
                return Err(config_error(format!("column {old:?} renamed more than once")));
            }
            map.insert(old, new);
        }

        Ok(Self {
            renames: map,
            observer: default_observer(),
        })
    }

    /// Report diagnostics to `observer` instead of the default `tracing` observer.
    pub fn with_observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Configured renames, ordered by old name.
    pub fn renames(&self) -> &BTreeMap<String, String> {
        &self.renames
    }
}

fn config_error(message: String) -> TransformError {
    TransformError::Config { step: STEP, message }
}

impl fmt::Debug for ColumnRenamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnRenamer")
            .field("renames", &self.renames)
            .finish()
    }
}

impl Step for ColumnRenamer {
    fn name(&self) -> &'static str {
        STEP
    }

    fn observer(&self) -> &dyn StepObserver {
        self.observer.as_ref()
    }

    fn transform(&self, data: &DataSet) -> TransformResult<DataSet> {
        data.validate().map_err(|e| e.in_step(STEP))?;
        let missing: Vec<String> = self
            .renames
            .keys()
            .filter(|old| !data.schema.contains(old))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(TransformError::RenameTargetsMissing { columns: missing });
        }

        data.rename_columns(&self.renames).map_err(|e| e.in_step(STEP))
    }
}
