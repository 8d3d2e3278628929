//! Presence tracking
//!
//! Glue between a presence transport and the smoothing/trail engine. The
//! transport delivers [`PresenceEvent`]s; the host's frame loop calls
//! [`CursorRegistry::frame`] once per display refresh and then renders.
//!
//! ```text
//! Transport ──PresenceEvent──> CursorRegistry::apply
//!                                ├─> join  → PositionSmoother + ParticleEmitter
//!                                ├─> move  → set_target
//!                                └─> leave → dispose + clear
//!
//! Frame loop ──> CursorRegistry::frame(now)
//!                  └─> per entity: smoother.tick → emitter.advance
//!            ──> CursorRegistry::render(surface, now)
//! ```

mod colors;
mod event;
mod registry;

pub use colors::{ColorRegistry, DEFAULT_PALETTE};
pub use event::{EntityId, PresenceEvent};
pub use registry::{CursorRegistry, FrameStats, RegistryConfig, SlotKey, TrackedCursor};
