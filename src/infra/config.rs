// src/infra/config.rs — Configuration loading (TOML) and budget presets

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::infra::errors::TandemError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "ModelsConfig::default_manager")]
    pub manager: RoleModelConfig,
    #[serde(default = "ModelsConfig::default_developer")]
    pub developer: RoleModelConfig,
}

impl ModelsConfig {
    fn default_manager() -> RoleModelConfig {
        RoleModelConfig {
            model: "openai/gpt-4o".into(),
            temperature: 0.3,
        }
    }

    fn default_developer() -> RoleModelConfig {
        RoleModelConfig {
            model: "anthropic/claude-sonnet-4-20250514".into(),
            temperature: 0.7,
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            manager: Self::default_manager(),
            developer: Self::default_developer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleModelConfig {
    /// Model in "provider/model" format.
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.7
}

/// User-facing workflow settings. Every limit is optional; unset fields
/// inherit from the selected budget mode preset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub budget_mode: BudgetMode,
    pub max_iterations: Option<u32>,
    pub max_tokens: Option<u64>,
    pub max_cost_usd: Option<f64>,
    pub checkpoint_interval: Option<u32>,
    pub max_no_progress: Option<u32>,
    pub early_stop_similarity: Option<f64>,
    pub min_changed_lines: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for run transcripts (defaults to ./output).
    pub dir: Option<PathBuf>,
}

impl OutputConfig {
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| PathBuf::from("./output"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetMode {
    Economy,
    #[default]
    Balanced,
    Quality,
}

impl std::str::FromStr for BudgetMode {
    type Err = TandemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "economy" => Ok(Self::Economy),
            "balanced" => Ok(Self::Balanced),
            "quality" => Ok(Self::Quality),
            other => Err(TandemError::Config(format!(
                "unknown budget mode '{other}' (expected economy, balanced, or quality)"
            ))),
        }
    }
}

impl std::fmt::Display for BudgetMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Economy => write!(f, "economy"),
            Self::Balanced => write!(f, "balanced"),
            Self::Quality => write!(f, "quality"),
        }
    }
}

/// Fully-resolved settings consumed by the collaboration loop.
///
/// A value of 0 means "unlimited" for `max_tokens` and `max_cost_usd`,
/// and "disabled" for `checkpoint_interval`.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub max_iterations: u32,
    pub max_tokens: u64,
    pub max_cost_usd: f64,
    pub checkpoint_interval: u32,
    pub max_no_progress: u32,
    pub early_stop_similarity: f64,
    pub min_changed_lines: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        BudgetMode::Balanced.preset()
    }
}

impl BudgetMode {
    /// Named preset defaults for each budget mode.
    pub fn preset(self) -> EngineConfig {
        let (max_iterations, max_tokens, max_cost_usd, checkpoint_interval) = match self {
            Self::Economy => (5, 50_000, 0.50, 2),
            Self::Balanced => (10, 200_000, 2.00, 5),
            Self::Quality => (20, 1_000_000, 10.00, 10),
        };
        EngineConfig {
            max_iterations,
            max_tokens,
            max_cost_usd,
            checkpoint_interval,
            max_no_progress: 3,
            early_stop_similarity: 0.95,
            min_changed_lines: 2,
        }
    }
}

impl EngineConfig {
    /// Layered-defaults merge: explicit values win field-by-field,
    /// everything else inherits from the budget mode preset.
    pub fn resolve(workflow: &WorkflowConfig) -> Result<Self, TandemError> {
        let preset = workflow.budget_mode.preset();
        let resolved = Self {
            max_iterations: workflow.max_iterations.unwrap_or(preset.max_iterations),
            max_tokens: workflow.max_tokens.unwrap_or(preset.max_tokens),
            max_cost_usd: workflow.max_cost_usd.unwrap_or(preset.max_cost_usd),
            checkpoint_interval: workflow
                .checkpoint_interval
                .unwrap_or(preset.checkpoint_interval),
            max_no_progress: workflow.max_no_progress.unwrap_or(preset.max_no_progress),
            early_stop_similarity: workflow
                .early_stop_similarity
                .unwrap_or(preset.early_stop_similarity),
            min_changed_lines: workflow
                .min_changed_lines
                .unwrap_or(preset.min_changed_lines),
        };
        resolved.validate()?;
        Ok(resolved)
    }

    // max_tokens has no check: it is unsigned and 0 already means unlimited.
    fn validate(&self) -> Result<(), TandemError> {
        if self.max_iterations < 1 {
            return Err(TandemError::Config(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.max_cost_usd < 0.0 {
            return Err(TandemError::Config("max_cost_usd must be >= 0".into()));
        }
        if self.max_no_progress < 1 {
            return Err(TandemError::Config(
                "max_no_progress must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.early_stop_similarity) {
            return Err(TandemError::Config(
                "early_stop_similarity must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load config from the default location, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tandem")
        .join("config.toml")
}
