//! Builder configuration
//!
//! Every tuning constant of the engine lives in [`BuilderConfig`]. Values can
//! be set through the `with_*` builder methods or loaded from a TOML file
//! with a `[builder]` table; missing keys keep their defaults.
//!
//! ```toml
//! [builder]
//! strategy = "greedy"
//! satisfaction_threshold = 0.4
//! debug_shapes = ["Arrow"]
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::constraint::AndCombination;
use crate::engine::Strategy;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tuning for shape building
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderConfig {
    pub strategy: Strategy,

    /// A constraint value at or below this is not satisfied
    pub satisfaction_threshold: f64,

    /// A binary result credits its second participant only above this
    pub pairing_threshold: f64,

    /// Subtracted per pool member left unused
    pub unused_penalty: f64,

    /// Added when the assignment consumes the whole pool
    pub full_use_bonus: f64,

    /// The full-use bonus applies only below this confidence
    pub full_use_ceiling: f64,

    /// Pool-usage adjustments are dropped when the pool exceeds the
    /// component count by more than this
    pub noisy_pool_margin: usize,

    /// Partial assignments the exhaustive search may generate
    pub partial_assignment_cutoff: u64,

    /// Cutoff for definitions listed in `expensive_shapes`
    pub expensive_cutoff: u64,

    /// Definition names (case-insensitive substrings) that get `expensive_cutoff`
    pub expensive_shapes: Vec<String>,

    pub and_combination: AndCombination,

    /// Also accept candidates carrying the slot type as an is-a tag
    pub match_type_tags: bool,

    /// Shape names that get verbose build logging
    pub debug_shapes: Vec<String>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Exhaustive,
            satisfaction_threshold: 0.35,
            pairing_threshold: 0.35,
            unused_penalty: 0.10,
            full_use_bonus: 0.13,
            full_use_ceiling: 0.84001,
            noisy_pool_margin: 7,
            partial_assignment_cutoff: 50_000,
            expensive_cutoff: 500_000,
            expensive_shapes: vec!["Speaker".to_string(), "ObstacleBypassLane".to_string()],
            and_combination: AndCombination::Minimum,
            match_type_tags: false,
            debug_shapes: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
struct TomlConfig {
    #[serde(default)]
    builder: BuilderConfig,
}

impl BuilderConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        Ok(parsed.builder)
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set both the satisfaction and the pairing threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.satisfaction_threshold = threshold;
        self.pairing_threshold = threshold;
        self
    }

    pub fn with_pairing_threshold(mut self, threshold: f64) -> Self {
        self.pairing_threshold = threshold;
        self
    }

    pub fn with_full_use_bonus(mut self, bonus: f64) -> Self {
        self.full_use_bonus = bonus;
        self
    }

    pub fn with_cutoff(mut self, cutoff: u64) -> Self {
        self.partial_assignment_cutoff = cutoff;
        self
    }

    pub fn with_and_combination(mut self, combination: AndCombination) -> Self {
        self.and_combination = combination;
        self
    }

    pub fn with_type_tags(mut self, enabled: bool) -> Self {
        self.match_type_tags = enabled;
        self
    }

    pub fn with_debug_shape(mut self, name: impl Into<String>) -> Self {
        self.debug_shapes.push(name.into());
        self
    }

    /// Whether a definition name is on the expensive allow-list
    pub fn is_expensive(&self, shape_name: &str) -> bool {
        let name = shape_name.to_lowercase();
        self.expensive_shapes
            .iter()
            .any(|s| name.contains(&s.to_lowercase()))
    }

    /// Search cutoff for a definition
    pub fn cutoff_for(&self, shape_name: &str) -> u64 {
        if self.is_expensive(shape_name) {
            self.expensive_cutoff
        } else {
            self.partial_assignment_cutoff
        }
    }
}
