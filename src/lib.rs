//! # smooth-cursors
//!
//! Position smoothing and particle trails for shared-cursor presence.
//!
//! Raw cursor positions arrive from the network at irregular, sparse
//! intervals. This crate turns them into continuous per-frame motion:
//! - [`cursor`] - spring/damper smoothing of one entity's position
//! - [`trail`] - distance-spaced particles that fade and shrink behind a cursor
//! - [`presence`] - per-entity ownership, join/move/leave, color assignment
//!
//! # Architecture
//!
//! ```text
//! transport ──PresenceEvent──> CursorRegistry
//!                                ├─> PositionSmoother (one per entity)
//!                                ├─> ParticleEmitter  (one per entity, optional)
//!                                └─> ColorRegistry
//!
//! host frame ──frame(now)──> smoother step ──position──> emitter advance
//!            ──render(surface)──> particles, then cursor dots
//! ```
//!
//! The core is synchronous and never reads a clock: every time-dependent
//! call takes an explicit [`std::time::Instant`]. Drawing goes through the
//! [`trail::DrawSurface`] trait.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Screen-space points and vectors
pub mod geometry;

/// Spring/damper position smoothing
pub mod cursor;

/// Particle trails and drawing surfaces
pub mod trail;

/// Entity tracking and transport events
pub mod presence;

/// Configuration
pub mod config;

/// Simulated presence traffic for the headless binary and benchmarks
pub mod sim;

pub use config::Config;
pub use cursor::{PositionSmoother, SmootherConfig, SmoothingProfile};
pub use geometry::{Position, Velocity};
pub use presence::{CursorRegistry, EntityId, PresenceEvent};
pub use trail::{Color, DrawSurface, EmitterConfig, ParticleEmitter};
