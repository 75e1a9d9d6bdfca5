//! Configuration for grounding and code generation.
//!
//! Load order: `.groundwork/config.toml` → environment variables → defaults.

use crate::index::SymbolOrder;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level groundwork configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundworkConfig {
    pub grounding: GroundingConfig,
    pub generation: GenerationConfig,
    pub output: OutputConfig,
}

/// Grounding stage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundingConfig {
    /// Order in which fluent symbols receive handles. Never affects correctness.
    pub symbol_order: SymbolOrder,
    /// Pre-evaluate external constraints that mention no fluent symbol,
    /// instead of deferring them to generated code.
    pub resolve_static_externals: bool,
}

/// Code generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Directory of `<name>.tpl` files overriding the built-in templates.
    pub template_dir: Option<PathBuf>,
    /// Generate per-action and per-constraint units on the rayon pool.
    pub parallel: bool,
}

/// Artifact output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory, relative to the project root unless absolute.
    pub dir: PathBuf,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            template_dir: None,
            parallel: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("generated"),
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl GroundworkConfig {
    /// Load config from `.groundwork/config.toml` in the project root, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".groundwork").join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("invalid config file {}", config_path.display()))?
        } else {
            Self::default()
        };

        env_override(
            "GROUNDWORK_SYMBOL_ORDER",
            &mut config.grounding.symbol_order,
        );
        env_override(
            "GROUNDWORK_RESOLVE_STATIC_EXTERNALS",
            &mut config.grounding.resolve_static_externals,
        );
        env_override("GROUNDWORK_PARALLEL", &mut config.generation.parallel);
        env_override("GROUNDWORK_OUTPUT_DIR", &mut config.output.dir);
        if let Ok(dir) = std::env::var("GROUNDWORK_TEMPLATE_DIR")
            && !dir.is_empty()
        {
            config.generation.template_dir = Some(PathBuf::from(dir));
        }

        // Relative paths are anchored at the project root.
        if config.output.dir.is_relative() {
            config.output.dir = project_root.join(&config.output.dir);
        }
        if let Some(dir) = config.generation.template_dir.as_mut()
            && dir.is_relative()
        {
            *dir = project_root.join(&*dir);
        }

        Ok(config)
    }
}
