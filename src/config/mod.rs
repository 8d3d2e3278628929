//! Configuration management
//!
//! Handles loading, validation, and merging of configuration from:
//! - TOML files
//! - Environment variables (through CLI flags)
//! - CLI arguments

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod error;
pub mod types;

pub use error::ConfigError;
pub use types::{LoggingConfig, SimulationConfig, TrailConfig};

use crate::cursor::{SmootherConfig, SmoothingProfile};
use crate::presence::{ColorRegistry, RegistryConfig, DEFAULT_PALETTE};
use crate::trail::Color;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Smoothing for the locally controlled cursor
    #[serde(default = "default_local")]
    pub local: SmootherConfig,
    /// Smoothing for remote cursors
    #[serde(default = "default_remote")]
    pub remote: SmootherConfig,
    /// Particle trails
    #[serde(default)]
    pub trails: TrailConfig,
    /// Cursor color palette (hex strings)
    #[serde(default = "default_palette")]
    pub palette: Vec<Color>,
    /// Headless simulation
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_local() -> SmootherConfig {
    SmoothingProfile::Local.config()
}
fn default_remote() -> SmootherConfig {
    SmoothingProfile::Remote.config()
}
fn default_palette() -> Vec<Color> {
    DEFAULT_PALETTE.to_vec()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Self {
            local: default_local(),
            remote: default_remote(),
            trails: TrailConfig::default(),
            palette: default_palette(),
            simulation: SimulationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.local.validate().context("Invalid [local] smoothing")?;
        self.remote.validate().context("Invalid [remote] smoothing")?;
        self.trails
            .emitter
            .validate()
            .context("Invalid [trails] settings")?;
        self.simulation.validate()?;
        self.logging.validate()?;

        if self.palette.is_empty() {
            anyhow::bail!("palette must contain at least one color");
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(
        mut self,
        entities: Option<usize>,
        frames: Option<u64>,
        seed: Option<u64>,
    ) -> Self {
        if let Some(entities) = entities {
            self.simulation.entities = entities;
        }
        if let Some(frames) = frames {
            self.simulation.frames = frames;
        }
        if let Some(seed) = seed {
            self.simulation.seed = Some(seed);
            if self.trails.emitter.seed.is_none() {
                self.trails.emitter.seed = Some(seed);
            }
        }
        self
    }

    /// Settings for a [`CursorRegistry`](crate::presence::CursorRegistry)
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            local: self.local.clone(),
            remote: self.remote.clone(),
            particles: self.trails.enabled.then(|| self.trails.emitter.clone()),
            local_particles: self.trails.local,
        }
    }

    /// Fresh color registry over the configured palette
    pub fn color_registry(&self) -> ColorRegistry {
        ColorRegistry::new(self.palette.clone())
    }

    /// Serialise back to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialise config")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
