//! Drop-zone configuration.
//!
//! Handles loading and validating the `drop.toml` that configures an intake
//! session. Configuration is immutable for the lifetime of an
//! [`IntakeController`](crate::intake::IntakeController): stock defaults are
//! overridden by whatever keys the user file sets, and the merged result is
//! validated once.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! allow_multiple = true     # false = single-file mode (max_items forced to 1)
//! max_items = 10            # Capacity of the ordered collection
//! max_dimension = 1024      # Longer-edge limit applied during normalization
//!
//! [normalize]
//! enabled = true            # false = pass raw bytes through untouched
//! record_failures = false   # true = failed normalizations land in the ledger
//!
//! [normalize.options]       # Opaque to the controller, read by the normalizer
//! # max_size_mb = 1.0
//! # max_width_or_height = 800
//! # quality = 90
//!
//! [accepted_types]          # MIME type -> allowed extensions
//! "image/jpeg" = [".jpeg", ".jpg"]
//! "image/png" = [".png"]
//!
//! [processing]
//! max_concurrency = 4       # Parallel normalizations (omit for one per item slot)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Intake configuration loaded from `drop.toml`.
///
/// All fields have defaults matching the stock drop zone: multiple files,
/// ten items, 1024px longest edge, normalization on, JPEG and PNG accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DropConfig {
    /// Whether the collection holds more than one item.
    pub allow_multiple: bool,
    /// Configured capacity. See [`DropConfig::effective_max_items`].
    pub max_items: usize,
    /// Longer-edge pixel limit handed to the normalizer.
    pub max_dimension: u32,
    /// Normalization switches and options.
    pub normalize: NormalizeConfig,
    /// MIME type to allowed extensions (each with a leading dot).
    pub accepted_types: BTreeMap<String, Vec<String>>,
    /// Concurrency settings for the normalization fan-out.
    pub processing: ProcessingConfig,
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            allow_multiple: true,
            max_items: 10,
            max_dimension: 1024,
            normalize: NormalizeConfig::default(),
            accepted_types: default_accepted_types(),
            processing: ProcessingConfig::default(),
        }
    }
}

fn default_accepted_types() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        (
            "image/jpeg".to_string(),
            vec![".jpeg".to_string(), ".jpg".to_string()],
        ),
        ("image/png".to_string(), vec![".png".to_string()]),
    ])
}

impl DropConfig {
    /// Capacity actually enforced: single-file mode always holds one item.
    pub fn effective_max_items(&self) -> usize {
        if self.allow_multiple {
            self.max_items
        } else {
            1
        }
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_items == 0 {
            return Err(ConfigError::Validation("max_items must be at least 1".into()));
        }
        if self.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "max_dimension must be non-zero".into(),
            ));
        }
        if self.accepted_types.is_empty() {
            return Err(ConfigError::Validation(
                "accepted_types must not be empty".into(),
            ));
        }
        for (mime, extensions) in &self.accepted_types {
            if !mime.contains('/') {
                return Err(ConfigError::Validation(format!(
                    "accepted_types key '{mime}' is not a MIME type"
                )));
            }
            if let Some(bad) = extensions.iter().find(|e| !e.starts_with('.')) {
                return Err(ConfigError::Validation(format!(
                    "extension '{bad}' for '{mime}' must start with a dot"
                )));
            }
        }
        if self.processing.max_concurrency == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Normalization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizeConfig {
    /// When false the normalizer is bypassed and raw bytes pass through.
    pub enabled: bool,
    /// Record failed normalizations in the rejection ledger instead of only
    /// logging them.
    pub record_failures: bool,
    /// Opaque option map forwarded to the normalizer.
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            record_failures: false,
            options: serde_json::Map::new(),
        }
    }
}

/// Concurrency settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of normalizations in flight at once.
    /// When absent, a full batch runs concurrently.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
}

/// Resolve the effective normalization concurrency from config.
///
/// - `None` → one permit per item slot, so any admitted batch fans out fully
/// - `Some(n)` → at most `n`, independent of the host's core count
pub fn effective_concurrency(config: &DropConfig) -> usize {
    config
        .processing
        .max_concurrency
        .unwrap_or_else(|| config.effective_max_items())
        .max(1)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(DropConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
///
/// `accepted_types` is the exception: a user table replaces the stock one
/// wholesale, otherwise the defaults could never be narrowed.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(_) if key == "accepted_types" => overlay_val,
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<DropConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: DropConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file.
///
/// A missing file yields the stock defaults. Unknown keys and invalid values
/// are errors.
pub fn load_config(path: &Path) -> Result<DropConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `drop.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Drop Configuration
# =========================
# All keys are optional. Values shown are the stock defaults.

# Accept more than one file. In single-file mode every new drop replaces
# the current item and max_items is treated as 1.
allow_multiple = true

# Maximum number of items held at once. Files beyond this are rejected
# with "capacity exceeded".
max_items = 10

# Images whose longer edge exceeds this many pixels are downscaled.
max_dimension = 1024

[normalize]
# Set to false to keep the dropped bytes exactly as they are.
enabled = true
# Set to true to list files that failed normalization alongside the
# rejected ones. By default they are only logged.
record_failures = false

[normalize.options]
# Passed through to the normalizer. Recognised keys:
# max_size_mb = 1.0          # Output size budget
# max_width_or_height = 800  # Overrides max_dimension
# quality = 90               # Starting JPEG quality (1-100)

[accepted_types]
# MIME type = list of extensions. A file is accepted when either its type
# or its extension is listed.
"image/jpeg" = [".jpeg", ".jpg"]
"image/png" = [".png"]

[processing]
# Maximum normalizations in flight at once. Omit to run a whole batch
# concurrently (one per item slot). CPU-heavy decoding already runs on a
# bounded blocking pool, so this is not tied to the core count.
# max_concurrency = 4
"##
}
