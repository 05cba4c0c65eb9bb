/*!
Configuration management for the lathser command-line tool.
*/

use anyhow::{Context, Result};
use lathser_core::{CutParams, JobSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Device-facing job settings, passed straight to the encoder
    #[serde(default)]
    pub job: JobSettings,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.as_ref().display());
            Ok(Self::new())
        }
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize config to TOML")?;

        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }
}

/// Image-to-job pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Simplification tolerance, in source pixels
    pub epsilon: f64,

    /// Laser parameters for every traced cut
    pub cut: CutParams,

    /// Resolution of the source image
    pub pixels_per_inch: f64,

    /// Scale the traced outline to fit a square this many inches wide
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit_size_in: Option<f64>,

    /// Final position on the bed, inches from the device origin
    pub final_x_in: f64,
    pub final_y_in: f64,

    /// Treat dark pixels as foreground
    pub invert: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            cut: CutParams::default(),
            pixels_per_inch: 600.0,
            fit_size_in: None,
            // The rig centers the rod 1.25 in from the left; the cutter's
            // zero sits about 0.045 in from the left edge
            final_x_in: 1.25 - 0.045,
            final_y_in: 1.0,
            invert: false,
        }
    }
}
