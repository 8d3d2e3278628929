//! Particle trails
//!
//! Each tracked cursor can carry a [`ParticleEmitter`] that consumes the
//! cursor's smoothed position every frame and leaves fading particles along
//! the path it travelled.
//!
//! # Architecture
//!
//! ```text
//! PositionSmoother (post-tick position)
//!   └─> ParticleEmitter::advance
//!       ├─> evict expired particles
//!       └─> emit one particle per `emission_spacing` travelled
//!
//! Frame render
//!   └─> ParticleEmitter::render(&mut impl DrawSurface)
//!       └─> fade alpha to 0, shrink by `decay`
//! ```

mod color;
mod emitter;
mod surface;

pub use color::{Color, ColorParseError};
pub use emitter::{EmitterConfig, Particle, ParticleEmitter};
pub use surface::{DrawCommand, DrawSurface, PixelSurface, RecordingSurface};
