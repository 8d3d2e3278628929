//! Cursor position smoothing
//!
//! Network presence updates arrive at irregular, often low rates. Snapping
//! to each one stutters; linear interpolation over a fixed duration lags
//! once updates stop. This module instead drives every tracked cursor with
//! a spring-damper whose velocity is clamped, so motion follows a steadily
//! moving target and settles smoothly when it stops.
//!
//! # Profiles
//!
//! | Profile | smooth_factor | max_speed | Use Case |
//! |---------|---------------|-----------|----------|
//! | Local | 0.9 | 120 px/frame | Own cursor |
//! | Remote | 0.12 | 18 px/frame | Network cursors |
//!
//! # Frame Flow
//!
//! ```text
//! Network update
//!   └─> PositionSmoother::set_target
//!       └─> FrameRequest issued (if idle)
//!
//! Display refresh
//!   └─> PositionSmoother::run_frame / tick
//!       ├─> integrate spring
//!       ├─> shift trail
//!       └─> next FrameRequest (until settled)
//! ```

mod profile;
mod smoother;

pub use profile::SmoothingProfile;
pub use smoother::{FrameRequest, PositionSmoother, SmootherConfig};

use std::time::Duration;

/// Distance at which a cursor snaps onto its target (pixels)
pub const SNAP_THRESHOLD_PX: f32 = 0.5;

/// Default fraction of velocity carried between frames
pub const DEFAULT_DAMPING: f32 = 0.7;

/// One 60 Hz display refresh; the unit integration is normalised to
pub const REFERENCE_FRAME: Duration = Duration::from_micros(16_667);

/// Upper bound on the time integrated in a single step (about two frames)
pub const MAX_FRAME_DT: Duration = Duration::from_micros(33_333);
