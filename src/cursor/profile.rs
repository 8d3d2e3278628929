//! Smoothing profiles
//!
//! The locally controlled cursor should track the pointer almost instantly,
//! while remote cursors are damped heavily so that sparse, bursty network
//! updates still read as continuous motion.

use serde::{Deserialize, Serialize};

use super::smoother::SmootherConfig;

/// Named smoothing preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingProfile {
    /// Near-instant tracking for the entity driven by this process
    Local,

    /// Heavily damped tracking for entities reported over the network
    #[default]
    Remote,
}

impl SmoothingProfile {
    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Local => "Near-instant tracking (own cursor)",
            Self::Remote => "Heavily damped tracking (network cursors)",
        }
    }

    /// Built-in smoother settings for this profile
    pub fn config(&self) -> SmootherConfig {
        match self {
            Self::Local => SmootherConfig {
                smooth_factor: 0.9,
                max_speed: 120.0,
                ..SmootherConfig::default()
            },
            Self::Remote => SmootherConfig {
                smooth_factor: 0.12,
                max_speed: 18.0,
                ..SmootherConfig::default()
            },
        }
    }
}

impl std::fmt::Display for SmoothingProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "Local"),
            Self::Remote => write!(f, "Remote"),
        }
    }
}

impl std::str::FromStr for SmoothingProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "self" | "instant" => Ok(Self::Local),
            "remote" | "peer" | "smooth" => Ok(Self::Remote),
            _ => Err(format!("Unknown smoothing profile: {}", s)),
        }
    }
}
