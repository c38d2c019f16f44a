// crates/kie-config/src/lib.rs
// ============================================================================
// Module: KIE Engine Configuration
// Description: Canonical configuration model, defaults, and validation.
// Purpose: Expose triage weights, validator strictness, toolchain floors, and
// loader thresholds as reviewable configuration rather than hard-coded values.
// Dependencies: kie-core, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Engine configuration loads from `kie.toml` at the workspace root. Every
//! field is optional and defaults conservatively; validation runs on load and
//! reports field paths so a consultant can fix the file without reading
//! source. Triage priority weights and suppression floors are configuration,
//! not constants; the engine exposes them in `kie.toml`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use kie_core::SemanticRole;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Validation messages name the offending field path.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config at {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The config file could not be parsed as TOML.
    #[error("failed to parse config at {path}: {detail}")]
    Parse {
        /// Path that failed to parse.
        path: String,
        /// Parse failure detail.
        detail: String,
    },
    /// A field value is outside its permitted domain.
    #[error("invalid config: {field} {detail}")]
    Invalid {
        /// Dotted field path, e.g. `triage.alpha`.
        field: String,
        /// Constraint description.
        detail: String,
    },
}

// ============================================================================
// SECTION: Triage Configuration
// ============================================================================

/// Triage priority weights and suppression floors.
///
/// # Invariants
/// - Weights are non-negative and sum to a positive value.
/// - Floors lie in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Weight on insight magnitude in the priority score.
    pub alpha: f64,
    /// Weight on insight confidence in the priority score.
    pub beta: f64,
    /// Weight on objective relevance in the priority score.
    pub gamma: f64,
    /// Insights below this magnitude are suppressed.
    pub magnitude_floor: f64,
    /// Insights below this confidence are suppressed.
    pub confidence_floor: f64,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 0.3,
            gamma: 0.2,
            magnitude_floor: 0.10,
            confidence_floor: 0.30,
        }
    }
}

// ============================================================================
// SECTION: Validator Configuration
// ============================================================================

/// Brand validator strictness per consumption context.
///
/// # Invariants
/// - Delivery targets default to strict; preview defaults to lenient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Strict mode for delivery builds (presentation, dashboard, report).
    pub strict_for_build: bool,
    /// Strict mode for preview rendering.
    pub strict_for_preview: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            strict_for_build: true,
            strict_for_preview: false,
        }
    }
}

// ============================================================================
// SECTION: Toolchain Configuration
// ============================================================================

/// Toolchain floors checked by the environment gate.
///
/// # Invariants
/// - Floors apply only to targets that require the toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Minimum Node major version required by `build dashboard`.
    pub node_floor_major: u32,
    /// When true, a missing Python toolchain is a warning rather than a block.
    pub python_optional: bool,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            node_floor_major: 18,
            python_optional: true,
        }
    }
}

// ============================================================================
// SECTION: Loader Configuration
// ============================================================================

/// Data-loader quality thresholds.
///
/// # Invariants
/// - Ratios lie in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Null ratio at which a column draws a data-quality warning.
    pub null_ratio_warn: f64,
    /// Warn on constant columns.
    pub constant_warn: bool,
    /// Uniqueness ratio at which a categorical column is flagged high-cardinality.
    pub high_cardinality_ratio: f64,
    /// Hard cap on rows read from a single data file.
    pub max_rows: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            null_ratio_warn: 0.5,
            constant_warn: true,
            high_cardinality_ratio: 0.9,
            max_rows: 1_000_000,
        }
    }
}

// ============================================================================
// SECTION: Lexicon Configuration
// ============================================================================

/// Extra objective-relevance keywords merged over the built-in role lexicon.
///
/// # Invariants
/// - Keys are semantic roles; values are lowercase keyword lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Additional keywords per role.
    pub extra_keywords: BTreeMap<SemanticRole, Vec<String>>,
}

// ============================================================================
// SECTION: Engine Configuration
// ============================================================================

/// Root engine configuration.
///
/// # Invariants
/// - Every section is optional in the file; defaults are conservative.
/// - Validated on load; invalid values never reach the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Triage weights and floors.
    pub triage: TriageConfig,
    /// Validator strictness.
    pub validator: ValidatorConfig,
    /// Toolchain floors.
    pub toolchain: ToolchainConfig,
    /// Loader thresholds.
    pub loader: LoaderConfig,
    /// Objective-relevance lexicon extensions.
    pub lexicon: LexiconConfig,
}

impl EngineConfig {
    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file exists but cannot be read,
    /// parsed, or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let contents = fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            source: err,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|err| ConfigError::Parse {
            path: path.display().to_string(),
            detail: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every field against its documented domain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("triage.alpha", self.triage.alpha),
            ("triage.beta", self.triage.beta),
            ("triage.gamma", self.triage.gamma),
        ];
        for (field, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    detail: "must be a finite non-negative number".to_string(),
                });
            }
        }
        let weight_sum = self.triage.alpha + self.triage.beta + self.triage.gamma;
        if weight_sum <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "triage".to_string(),
                detail: "weights must sum to a positive value".to_string(),
            });
        }
        let ratios = [
            ("triage.magnitude_floor", self.triage.magnitude_floor),
            ("triage.confidence_floor", self.triage.confidence_floor),
            ("loader.null_ratio_warn", self.loader.null_ratio_warn),
            ("loader.high_cardinality_ratio", self.loader.high_cardinality_ratio),
        ];
        for (field, value) in ratios {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    detail: "must lie in [0, 1]".to_string(),
                });
            }
        }
        if self.loader.max_rows == 0 {
            return Err(ConfigError::Invalid {
                field: "loader.max_rows".to_string(),
                detail: "must be at least 1".to_string(),
            });
        }
        if self.toolchain.node_floor_major == 0 {
            return Err(ConfigError::Invalid {
                field: "toolchain.node_floor_major".to_string(),
                detail: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
