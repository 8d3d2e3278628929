//! Particle Trail Emitter
//!
//! Drops short-lived particles along the path a cursor travels. Emission is
//! driven by distance, not time: a stationary cursor emits nothing, a fast
//! one leaves an evenly spaced line of particles.
//!
//! # Emission
//!
//! ```text
//! accumulated += |new - last|
//! due          = floor(accumulated / spacing)
//! accumulated -= due * spacing
//! spawn the newest min(due, max_particles), walking back from `new`
//! ```
//!
//! Boundaries are compared with a small tolerance relative to the spacing,
//! so a move of exactly `k * spacing` emits `k` particles.
//!
//! # Fade
//!
//! ```text
//! fade_alpha = alpha * (1 - age / lifetime)
//! fade_size  = size  * (1 - decay * age / lifetime)
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use super::color::Color;
use super::surface::DrawSurface;
use crate::config::ConfigError;
use crate::geometry::Position;

/// Maximum positional jitter applied at spawn, per axis (pixels)
const SPAWN_JITTER_PX: f32 = 1.5;

/// Fraction of the spacing treated as rounding noise at emission boundaries
const SPACING_TOLERANCE: f32 = 1e-4;

/// Configuration for a particle emitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterConfig {
    /// Particle color
    #[serde(default)]
    pub color: Color,

    /// Base particle lifetime (ms), randomised to 80-120%
    #[serde(default = "default_lifetime_ms")]
    pub lifetime_ms: u64,

    /// Base particle radius (pixels), randomised to 70-100%
    #[serde(default = "default_size")]
    pub size: f32,

    /// Base particle opacity (0.0-1.0), randomised to 70-100%
    #[serde(default = "default_alpha")]
    pub alpha: f32,

    /// Fraction of its size a particle loses over its lifetime
    #[serde(default = "default_decay")]
    pub decay: f32,

    /// Distance travelled between two particles (pixels)
    #[serde(default = "default_emission_spacing")]
    pub emission_spacing: f32,

    /// Upper bound on live particles; oldest are dropped first
    #[serde(default = "default_max_particles")]
    pub max_particles: usize,

    /// Fixed RNG seed for reproducible trails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_lifetime_ms() -> u64 {
    600
}
fn default_size() -> f32 {
    3.0
}
fn default_alpha() -> f32 {
    0.8
}
fn default_decay() -> f32 {
    0.5
}
fn default_emission_spacing() -> f32 {
    4.0
}
fn default_max_particles() -> usize {
    256
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            color: Color::default(),
            lifetime_ms: default_lifetime_ms(),
            size: default_size(),
            alpha: default_alpha(),
            decay: default_decay(),
            emission_spacing: default_emission_spacing(),
            max_particles: default_max_particles(),
            seed: None,
        }
    }
}

impl EmitterConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lifetime_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "lifetime_ms",
                value: 0.0,
                expected: "at least 1ms",
            });
        }
        if !(self.size.is_finite() && self.size > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "size",
                value: self.size as f64,
                expected: "a positive, finite radius",
            });
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(ConfigError::OutOfRange {
                field: "alpha",
                value: self.alpha as f64,
                expected: "0 <= alpha <= 1",
            });
        }
        if !(0.0..=1.0).contains(&self.decay) {
            return Err(ConfigError::OutOfRange {
                field: "decay",
                value: self.decay as f64,
                expected: "0 <= decay <= 1",
            });
        }
        if !(self.emission_spacing.is_finite() && self.emission_spacing > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "emission_spacing",
                value: self.emission_spacing as f64,
                expected: "a positive, finite distance",
            });
        }
        if self.max_particles == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_particles",
                value: 0.0,
                expected: "at least 1",
            });
        }
        Ok(())
    }
}

/// A single fading trail particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Spawn position (jittered)
    pub position: Position,
    /// Radius at spawn (pixels)
    pub size: f32,
    /// Opacity at spawn
    pub alpha: f32,
    /// When the particle was emitted
    pub spawned_at: Instant,
    /// How long the particle lives
    pub lifetime: Duration,
}

impl Particle {
    /// Fraction of the lifetime elapsed at `now` (0.0 fresh, >= 1.0 expired)
    pub fn progress(&self, now: Instant) -> f32 {
        let age = now.saturating_duration_since(self.spawned_at);
        age.as_secs_f32() / self.lifetime.as_secs_f32()
    }

    /// Has the particle outlived its lifetime?
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.spawned_at) >= self.lifetime
    }
}

/// Distance-driven particle trail for one entity
#[derive(Debug, Clone)]
pub struct ParticleEmitter {
    /// Configuration
    config: EmitterConfig,

    /// Live particles, oldest first
    particles: VecDeque<Particle>,

    /// Position seen by the previous `advance`
    last_position: Option<Position>,

    /// Distance travelled since the last emission
    accumulated: f32,

    /// Jitter source
    rng: StdRng,

    /// Particles emitted over the emitter's life
    emitted_total: u64,
}

impl ParticleEmitter {
    /// Create an emitter with no particles and no reference point
    pub fn new(config: EmitterConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            particles: VecDeque::with_capacity(config.max_particles.min(1024)),
            config,
            last_position: None,
            accumulated: 0.0,
            rng,
            emitted_total: 0,
        }
    }

    /// Feed the entity's latest rendered position
    ///
    /// The first call only records the reference point. Expired particles
    /// are evicted on every call.
    pub fn advance(&mut self, position: Position, now: Instant) {
        self.evict_expired(now);

        if !position.is_finite() {
            debug!("Discarding non-finite trail position {}", position);
            return;
        }

        let Some(last) = self.last_position.replace(position) else {
            return;
        };

        let distance = last.distance(position);
        if distance <= 0.0 {
            return;
        }

        let spacing = self.config.emission_spacing;
        let tolerance = spacing * SPACING_TOLERANCE;
        self.accumulated += distance;
        if self.accumulated + tolerance < spacing {
            return;
        }

        let due = ((self.accumulated + tolerance) / spacing).floor();
        let remainder = self.accumulated - due * spacing;
        self.accumulated = if (0.0..spacing).contains(&remainder) {
            remainder
        } else {
            0.0
        };

        // Anything older than the newest `max_particles` would be evicted
        // by the cap straight away
        let spawned = (due as usize).min(self.config.max_particles);
        for back in (0..spawned).rev() {
            let along = distance - self.accumulated - back as f32 * spacing;
            let t = (along / distance).clamp(0.0, 1.0);
            self.spawn(last.lerp(position, t), now);
        }
        self.emitted_total += due as u64;

        let overflow = self.particles.len().saturating_sub(self.config.max_particles);
        if overflow > 0 {
            self.particles.drain(..overflow);
        }

        if spawned > 0 {
            trace!(
                "Emitted {} particles over {:.1}px ({} live)",
                spawned,
                distance,
                self.particles.len()
            );
        }
    }

    /// Draw every live particle with its age-based fade
    ///
    /// Leaves the surface at full opacity afterwards.
    pub fn render<S: DrawSurface + ?Sized>(&self, surface: &mut S, now: Instant) {
        if self.particles.is_empty() {
            return;
        }

        surface.set_fill_color(self.config.color);
        for particle in &self.particles {
            if particle.is_expired(now) {
                continue;
            }
            let progress = particle.progress(now);
            let fade_alpha = particle.alpha * (1.0 - progress);
            let fade_size = particle.size * (1.0 - self.config.decay * progress);

            surface.set_global_alpha(fade_alpha);
            surface.fill_circle(particle.position, fade_size);
        }
        surface.reset_alpha();
    }

    /// Drop all particles and forget the reference point
    pub fn clear(&mut self) {
        self.particles.clear();
        self.last_position = None;
        self.accumulated = 0.0;
    }

    /// Number of live (not yet evicted) particles
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Live particles, oldest first
    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// No particles left to fade?
    pub fn is_idle(&self) -> bool {
        self.particles.is_empty()
    }

    /// Total particles emitted since creation
    ///
    /// Includes particles the `max_particles` cap dropped on arrival.
    pub fn emitted_total(&self) -> u64 {
        self.emitted_total
    }

    /// Configuration this emitter was built with
    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    fn evict_expired(&mut self, now: Instant) {
        // Lifetimes are randomised, so expiry is not ordered by spawn time
        self.particles.retain(|p| !p.is_expired(now));
    }

    fn spawn(&mut self, at: Position, now: Instant) {
        let jitter_x = self.rng.random_range(-SPAWN_JITTER_PX..=SPAWN_JITTER_PX);
        let jitter_y = self.rng.random_range(-SPAWN_JITTER_PX..=SPAWN_JITTER_PX);
        let size = self.config.size * self.rng.random_range(0.7..=1.0);
        let alpha = self.config.alpha * self.rng.random_range(0.7..=1.0);
        let lifetime_ms = self.config.lifetime_ms as f64 * self.rng.random_range(0.8..=1.2);

        self.particles.push_back(Particle {
            position: Position::new(at.x + jitter_x, at.y + jitter_y),
            size,
            alpha,
            spawned_at: now,
            lifetime: Duration::from_secs_f64(lifetime_ms.max(1.0) / 1000.0),
        });
    }
}
