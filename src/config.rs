//! Explicit configuration for the reducer, the estimator and the lookup cache.
//!
//! Nothing in this crate reads the process environment on its own. Callers
//! build a [`Config`] (defaults, TOML file, explicit overrides) and hand the
//! relevant sub-struct to each component.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::SectionKind;
use crate::selection::budgeting::{
    ApproxUnitCounter, BudgetEstimator, DEFAULT_CONTEXT_CEILING, MARKUP_CHARS_PER_UNIT,
    PROSE_CHARS_PER_UNIT,
};
use crate::selection::{ReductionParams, DEFAULT_MAX_QUARTERS, DEFAULT_MAX_YEARS};

pub const DEFAULT_CACHE_TTL_HOURS: u64 = 24;
pub const DEFAULT_CACHE_DIR: &str = "./cache";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub reduction: ReductionConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
    /// When set, any fresh cached result for an entity answers every new query
    /// for that entity, trading freshness for fewer external fetches.
    #[serde(default = "default_true")]
    pub reuse_entity_results: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_cache_dir(),
            ttl_hours: DEFAULT_CACHE_TTL_HOURS,
            reuse_entity_results: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReductionConfig {
    #[serde(default = "default_max_years")]
    pub max_years: usize,
    #[serde(default = "default_max_quarters")]
    pub max_quarters: usize,
    #[serde(default)]
    pub aggressive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<SectionKind>>,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            max_years: DEFAULT_MAX_YEARS,
            max_quarters: DEFAULT_MAX_QUARTERS,
            aggressive: false,
            sections: None,
        }
    }
}

impl ReductionConfig {
    pub fn params(&self) -> ReductionParams {
        ReductionParams {
            max_years: self.max_years,
            max_quarters: self.max_quarters,
            include_sections: self.sections.clone(),
            aggressive: self.aggressive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "default_context_ceiling")]
    pub context_ceiling: usize,
    /// Characters per unit for the reduced markup.
    #[serde(default = "default_markup_density")]
    pub markup_chars_per_unit: f64,
    /// Characters per unit for prompt prose.
    #[serde(default = "default_prose_density")]
    pub prose_chars_per_unit: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            context_ceiling: DEFAULT_CONTEXT_CEILING,
            markup_chars_per_unit: MARKUP_CHARS_PER_UNIT,
            prose_chars_per_unit: PROSE_CHARS_PER_UNIT,
        }
    }
}

impl BudgetConfig {
    pub fn estimator(&self) -> BudgetEstimator {
        BudgetEstimator::new(
            ApproxUnitCounter::new(self.prose_chars_per_unit),
            ApproxUnitCounter::new(self.markup_chars_per_unit),
            self.context_ceiling,
        )
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Apply `ENABLE_CACHE`, `CACHE_DIR` and `CACHE_TTL_HOURS` overrides from
    /// the given variables. Unparsable values leave the current setting alone.
    ///
    /// Pass `std::env::vars()` to honour the process environment.
    pub fn apply_env<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let value = value.as_ref();
            match key.as_ref() {
                "ENABLE_CACHE" => self.cache.enabled = parse_bool(value),
                "CACHE_DIR" if !value.is_empty() => self.cache.dir = PathBuf::from(value),
                "CACHE_TTL_HOURS" => match value.trim().parse() {
                    Ok(hours) => self.cache.ttl_hours = hours,
                    Err(_) => tracing::warn!(value, "ignoring unparsable CACHE_TTL_HOURS"),
                },
                _ => {}
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.ttl_hours == 0 {
            return Err(ConfigError::Invalid {
                field: "cache.ttl_hours",
                reason: "must be at least 1".into(),
            });
        }
        for (field, density) in [
            ("budget.markup_chars_per_unit", self.budget.markup_chars_per_unit),
            ("budget.prose_chars_per_unit", self.budget.prose_chars_per_unit),
        ] {
            if !(density.is_finite() && density > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {density}"),
                });
            }
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

fn default_ttl_hours() -> u64 {
    DEFAULT_CACHE_TTL_HOURS
}

fn default_max_years() -> usize {
    DEFAULT_MAX_YEARS
}

fn default_max_quarters() -> usize {
    DEFAULT_MAX_QUARTERS
}

fn default_context_ceiling() -> usize {
    DEFAULT_CONTEXT_CEILING
}

fn default_markup_density() -> f64 {
    MARKUP_CHARS_PER_UNIT
}

fn default_prose_density() -> f64 {
    PROSE_CHARS_PER_UNIT
}
