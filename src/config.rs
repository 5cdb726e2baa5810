//! Declarative step configuration.
//!
//! A [`StepsConfig`] is a JSON document listing steps in the order a pipeline driver should
//! run them:
//!
//! ```json
//! {
//!   "steps": [
//!     { "kind": "map_values", "column": "size", "mapping": [["S", 1], ["M", 2], [null, 0]] },
//!     { "kind": "rename", "columns": { "size": "size_code" } },
//!     { "kind": "one_hot", "column": "color", "include_null_indicator": true }
//!   ]
//! }
//! ```
//!
//! Mapping entries are `[key, replacement]` pairs so that `null`, numbers and booleans can be
//! keys. Building goes through the step constructors, so a configuration is rejected exactly
//! as the equivalent constructor call would be.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::error::TransformResult;
use crate::transform::{
    ColumnRenamer, MismatchPolicy, OneHotEncoder, Step, StepObserver, ValueMapper, default_observer,
};
use crate::types::Value;

/// One configured step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepConfig {
    /// A [`ValueMapper`].
    MapValues {
        column: String,
        mapping: Vec<(Value, Value)>,
        #[serde(default)]
        on_keys_not_found: MismatchPolicy,
        #[serde(default)]
        on_values_unmapped: MismatchPolicy,
    },
    /// A [`ColumnRenamer`]. Repeated keys in the JSON object are kept and rejected on build.
    Rename {
        #[serde(deserialize_with = "object_entries")]
        columns: Vec<(String, String)>,
    },
    /// A [`OneHotEncoder`].
    OneHot {
        column: String,
        #[serde(default)]
        include_null_indicator: bool,
        #[serde(default)]
        drop_first_level: bool,
    },
}

impl StepConfig {
    /// Construct the configured step, reporting to `observer`.
    pub fn build_with_observer(&self, observer: Arc<dyn StepObserver>) -> TransformResult<Box<dyn Step>> {
        let step: Box<dyn Step> = match self {
            StepConfig::MapValues {
                column,
                mapping,
                on_keys_not_found,
                on_values_unmapped,
            } => Box::new(
                ValueMapper::new(column.as_str(), mapping.iter().cloned())?
                    .on_keys_not_found(*on_keys_not_found)
                    .on_values_unmapped(*on_values_unmapped)
                    .with_observer(observer),
            ),
            StepConfig::Rename { columns } => {
                Box::new(ColumnRenamer::new(columns.iter().cloned())?.with_observer(observer))
            }
            StepConfig::OneHot {
                column,
                include_null_indicator,
                drop_first_level,
            } => Box::new(
                OneHotEncoder::new(column.as_str())?
                    .include_null_indicator(*include_null_indicator)
                    .drop_first_level(*drop_first_level)
                    .with_observer(observer),
            ),
        };
        Ok(step)
    }

    /// Construct the configured step with the default `tracing` observer.
    pub fn build(&self) -> TransformResult<Box<dyn Step>> {
        self.build_with_observer(default_observer())
    }
}

/// An ordered list of step configurations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StepsConfig {
    /// Steps in execution order.
    pub steps: Vec<StepConfig>,
}

impl StepsConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(input: &str) -> TransformResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> TransformResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Construct every step, failing on the first invalid entry.
    pub fn build(&self) -> TransformResult<Vec<Box<dyn Step>>> {
        self.build_with_observer(default_observer())
    }

    /// Construct every step, all reporting to `observer`.
    pub fn build_with_observer(&self, observer: Arc<dyn StepObserver>) -> TransformResult<Vec<Box<dyn Step>>> {
        self.steps
            .iter()
            .map(|s| s.build_with_observer(Arc::clone(&observer)))
            .collect()
    }
}

/// Deserialize a JSON object as its entries, in document order, duplicates included.
fn object_entries<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object of old-name to new-name entries")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry::<String, String>()? {
                out.push(entry);
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(EntriesVisitor)
}
