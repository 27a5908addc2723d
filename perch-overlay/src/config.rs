//! Configuration for perch.
//!
//! Loaded from `<config dir>/perch/perch.toml` (e.g. `~/.config/perch/perch.toml`).
//! Every table is optional; missing keys fall back to the defaults below.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use etcetera::BaseStrategy;
use perch_core::{LayerBases, LayerType, PositionOptions};
use serde::Deserialize;

use crate::navigation::NavigationOptions;

/// Top-level configuration loaded from `perch.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PerchConfig {
    pub positioning: PositionOptions,
    pub layers: LayerBases,
    pub navigation: NavigationOptions,
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_file: Option<PathBuf>,
    pub level: String,
    pub suppressed_patterns: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            level: "info".to_string(),
            suppressed_patterns: vec![
                "scored placement".to_string(),
                "dispatching overlay event".to_string(),
                "pointermove".to_string(),
                "mousemove".to_string(),
            ],
        }
    }
}

impl PerchConfig {
    /// Path of the user configuration file.
    pub fn default_path() -> Result<PathBuf> {
        let strategy = etcetera::choose_base_strategy()
            .context("could not determine the user configuration directory")?;
        Ok(strategy.config_dir().join("perch").join("perch.toml"))
    }

    /// Load configuration from the default location.
    ///
    /// Falls back to defaults if the file doesn't exist.
    /// Returns an error only if the file exists but is malformed.
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = toml::from_str::<PerchConfig>(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Set the gap between trigger and content.
    #[must_use]
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.positioning.offset = offset;
        self
    }

    /// Set the minimum distance kept from the viewport edges.
    #[must_use]
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.positioning.padding = padding;
        self
    }

    /// Set the z-index base of one layer type.
    #[must_use]
    pub fn with_layer_base(mut self, layer: LayerType, base: i32) -> Self {
        match layer {
            LayerType::Portal => self.layers.portal = base,
            LayerType::Backdrop => self.layers.backdrop = base,
            LayerType::Modal => self.layers.modal = base,
        }
        self
    }

    /// Set whether keyboard navigation wraps around.
    #[must_use]
    pub fn with_navigation_wrap(mut self, wrap: bool) -> Self {
        self.navigation.wrap = wrap;
        self
    }

    /// Set the log file path.
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.logging.log_file = Some(path.into());
        self
    }

    /// Set the log level (e.g., "info", "debug", "warn").
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }

    /// Generate CSS custom properties for the layer bases.
    ///
    /// Returns a `<style>` block so stylesheets can use `var(--z-modal)` and
    /// stay in step with the allocator.
    #[must_use]
    pub fn z_index_css(&self) -> String {
        let declarations: Vec<String> = LayerType::ALL
            .iter()
            .map(|layer| format!("--z-{layer}: {};", self.layers.base(*layer)))
            .collect();
        format!("<style>:root {{ {} }}</style>", declarations.join(" "))
    }
}
