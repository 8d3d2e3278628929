//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigError;
use crate::trail::EmitterConfig;

/// Particle trail configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailConfig {
    /// Emit particle trails at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Also trail the locally controlled cursor
    #[serde(default)]
    pub local: bool,

    /// Emitter tuning
    #[serde(flatten)]
    pub emitter: EmitterConfig,
}

fn default_true() -> bool {
    true
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            local: false,
            emitter: EmitterConfig::default(),
        }
    }
}

/// Headless simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Canvas width (pixels)
    #[serde(default = "default_width")]
    pub width: u32,

    /// Canvas height (pixels)
    #[serde(default = "default_height")]
    pub height: u32,

    /// Number of simulated remote entities
    #[serde(default = "default_entities")]
    pub entities: usize,

    /// Frames to run in virtual-clock mode
    #[serde(default = "default_frames")]
    pub frames: u64,

    /// Display refresh rate (Hz)
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Mean interval between network updates per entity (ms)
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,

    /// Random deviation added to each update interval (ms)
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Fixed seed for the simulated network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_width() -> u32 {
    800
}
fn default_height() -> u32 {
    600
}
fn default_entities() -> usize {
    4
}
fn default_frames() -> u64 {
    600
}
fn default_frame_rate() -> u32 {
    60
}
fn default_update_interval_ms() -> u64 {
    100
}
fn default_jitter_ms() -> u64 {
    60
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            entities: default_entities(),
            frames: default_frames(),
            frame_rate: default_frame_rate(),
            update_interval_ms: default_update_interval_ms(),
            jitter_ms: default_jitter_ms(),
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "simulation.width/height",
                value: format!("{}x{}", self.width, self.height),
            });
        }
        if !(1..=480).contains(&self.frame_rate) {
            return Err(ConfigError::OutOfRange {
                field: "simulation.frame_rate",
                value: self.frame_rate as f64,
                expected: "1-480 Hz",
            });
        }
        if self.update_interval_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "simulation.update_interval_ms",
                value: 0.0,
                expected: "at least 1ms",
            });
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format ("pretty", "compact", "json")
    #[serde(default = "default_format")]
    pub format: String,

    /// Also write logs to this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}
fn default_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Check level and format names
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "logging.level",
                    value: self.level.clone(),
                })
            }
        }
        match self.format.as_str() {
            "pretty" | "compact" | "json" => Ok(()),
            _ => Err(ConfigError::InvalidValue {
                field: "logging.format",
                value: self.format.clone(),
            }),
        }
    }
}
