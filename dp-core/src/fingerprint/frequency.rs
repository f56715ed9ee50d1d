//! Reference frequency table
//!
//! Maps canonical field name -> observed value -> probability within a
//! reference population. The process-wide table is parsed once, on first
//! use, and never reloaded.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use crate::error::{DevprintError, Result};

/// Reference table shipped with the crate
const BUNDLED_TABLE: &str = include_str!("../../assets/freq_table.json");

static GLOBAL_TABLE: OnceLock<Arc<FrequencyTable>> = OnceLock::new();

/// Immutable field -> value -> probability lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyTable {
    fields: HashMap<String, HashMap<String, f64>>,
}

impl FrequencyTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a JSON object of objects; every probability must be within 0.0-1.0
    pub fn from_json(text: &str) -> Result<Self> {
        let fields: HashMap<String, HashMap<String, f64>> = serde_json::from_str(text)?;

        for (field, values) in &fields {
            for (observed, &value) in values {
                if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                    return Err(DevprintError::InvalidProbability {
                        field: field.clone(),
                        observed: observed.clone(),
                        value,
                    });
                }
            }
        }

        Ok(Self { fields })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| DevprintError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// The table bundled into the binary
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_TABLE)
    }

    /// Build a table from in-memory entries (mainly for tests)
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str, f64)>) -> Result<Self> {
        let mut fields: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for (field, observed, value) in entries {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(DevprintError::InvalidProbability {
                    field: field.to_string(),
                    observed: observed.to_string(),
                    value,
                });
            }
            fields
                .entry(field.to_string())
                .or_default()
                .insert(observed.to_string(), value);
        }
        Ok(Self { fields })
    }

    /// Probability of `value` for `field`, if the table has it
    pub fn probability(&self, field: &str, value: &str) -> Option<f64> {
        self.fields.get(field)?.get(value).copied()
    }

    /// Number of fields present
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The process-wide table.
///
/// Loaded on first call from the settings override path if one is
/// configured, otherwise from the bundled asset. A load failure falls back to
/// the bundled table, then to an empty one; it is never retried.
pub fn global_frequency_table() -> Arc<FrequencyTable> {
    Arc::clone(GLOBAL_TABLE.get_or_init(|| Arc::new(load_process_table())))
}

fn load_process_table() -> FrequencyTable {
    let settings = crate::settings::get_cached_settings();

    if let Some(ref path) = settings.fingerprint.frequency_table_path {
        match FrequencyTable::from_path(path) {
            Ok(table) => {
                info!("Loaded frequency table from {} ({} fields)", path.display(), table.len());
                return table;
            }
            Err(e) => warn!("Failed to load frequency table {}: {}; using bundled table", path.display(), e),
        }
    }

    match FrequencyTable::bundled() {
        Ok(table) => {
            info!("Loaded bundled frequency table ({} fields)", table.len());
            table
        }
        Err(e) => {
            warn!("Bundled frequency table is unusable: {}; entropy will be zero", e);
            FrequencyTable::empty()
        }
    }
}
