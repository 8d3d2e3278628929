//! Position Smoother
//!
//! Spring-damper interpolation of a rendered cursor position towards the
//! last position reported by the network.
//!
//! # Physics Model
//!
//! Once per animation frame, with `dt` measured in 60 Hz reference frames:
//!
//! ```text
//! d        = target - current
//! velocity = velocity * damping + d * (smooth_factor * dt)
//! velocity = clamp(velocity, max_speed)
//! current  = current + velocity
//! ```
//!
//! When `|d|` falls below the snap threshold the smoother lands exactly on
//! the target, zeroes its velocity and stops requesting frames.
//!
//! # Scheduling
//!
//! The smoother never owns a timer. Every step that leaves it animating
//! issues a new [`FrameRequest`]; the host runs it on its next display
//! refresh through [`PositionSmoother::run_frame`]. Requests carry a
//! generation, so [`PositionSmoother::dispose`] invalidates any request the
//! host is still holding.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use super::{DEFAULT_DAMPING, MAX_FRAME_DT, REFERENCE_FRAME, SNAP_THRESHOLD_PX};
use crate::config::ConfigError;
use crate::geometry::{Position, Velocity};

/// Configuration for a position smoother
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmootherConfig {
    /// Spring strength (0.0-1.0, higher = snappier tracking)
    #[serde(default = "default_smooth_factor")]
    pub smooth_factor: f32,

    /// Hard cap on movement per reference frame (pixels)
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,

    /// Number of recent positions retained for the visual trail
    #[serde(default = "default_trail_capacity")]
    pub trail_capacity: usize,

    /// Fraction of velocity carried into the next frame
    #[serde(default = "default_damping")]
    pub damping: f32,

    /// Distance below which the cursor snaps onto its target (pixels)
    #[serde(default = "default_snap_threshold")]
    pub snap_threshold: f32,
}

fn default_smooth_factor() -> f32 {
    0.12
}
fn default_max_speed() -> f32 {
    18.0
}
fn default_trail_capacity() -> usize {
    5
}
fn default_damping() -> f32 {
    DEFAULT_DAMPING
}
fn default_snap_threshold() -> f32 {
    SNAP_THRESHOLD_PX
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            smooth_factor: default_smooth_factor(),
            max_speed: default_max_speed(),
            trail_capacity: default_trail_capacity(),
            damping: default_damping(),
            snap_threshold: default_snap_threshold(),
        }
    }
}

impl SmootherConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.smooth_factor > 0.0 && self.smooth_factor <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "smooth_factor",
                value: self.smooth_factor as f64,
                expected: "0 < smooth_factor <= 1",
            });
        }
        if !(self.max_speed.is_finite() && self.max_speed > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "max_speed",
                value: self.max_speed as f64,
                expected: "a positive, finite speed",
            });
        }
        if self.trail_capacity == 0 {
            return Err(ConfigError::OutOfRange {
                field: "trail_capacity",
                value: 0.0,
                expected: "at least 1",
            });
        }
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "damping",
                value: self.damping as f64,
                expected: "0 < damping < 1",
            });
        }
        if !(self.snap_threshold.is_finite() && self.snap_threshold > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "snap_threshold",
                value: self.snap_threshold as f64,
                expected: "a positive, finite distance",
            });
        }
        Ok(())
    }
}

/// Handle for one scheduled integration step
///
/// Only the most recently issued request of a live smoother is accepted by
/// [`PositionSmoother::run_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRequest {
    generation: u64,
}

/// Spring-damped cursor position for one tracked entity
#[derive(Debug, Clone)]
pub struct PositionSmoother {
    /// Configuration
    config: SmootherConfig,

    /// Rendered position
    current: Position,

    /// Last reported position
    target: Position,

    /// Momentum carried between frames (pixels per reference frame)
    velocity: Velocity,

    /// Recent rendered positions, most recent first
    trail: VecDeque<Position>,

    /// Still converging towards the target?
    is_animating: bool,

    /// Time of the last integration step
    last_step: Option<Instant>,

    /// Continuation the host should run on its next frame
    pending: Option<FrameRequest>,

    /// Bumped on every schedule and on dispose
    generation: u64,

    disposed: bool,
}

impl PositionSmoother {
    /// Create a smoother resting at `seed`
    pub fn new(seed: Position, config: SmootherConfig) -> Self {
        let seed = if seed.is_finite() {
            seed
        } else {
            debug!("Non-finite seed position {}, using origin", seed);
            Position::ZERO
        };
        let capacity = config.trail_capacity.max(1);

        Self {
            trail: std::iter::repeat(seed).take(capacity).collect(),
            config,
            current: seed,
            target: seed,
            velocity: Velocity::ZERO,
            is_animating: false,
            last_step: None,
            pending: None,
            generation: 0,
            disposed: false,
        }
    }

    /// Record a new destination
    ///
    /// Starts the frame loop if the smoother was idle. While already
    /// animating only the attractor moves: velocity and trail are kept, so
    /// the cursor bends towards the new target instead of restarting.
    pub fn set_target(&mut self, target: Position) {
        if self.disposed {
            trace!("set_target on disposed smoother ignored");
            return;
        }
        if !target.is_finite() {
            debug!("Discarding non-finite target {}", target);
            return;
        }

        self.target = target;

        if !self.is_animating {
            self.is_animating = true;
            self.last_step = None;
            self.schedule();
        }
    }

    /// Rendered position right now
    pub fn current_position(&self) -> Position {
        self.current
    }

    /// Last accepted target
    pub fn target(&self) -> Position {
        self.target
    }

    /// Current velocity (pixels per reference frame)
    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    /// Still moving towards the target?
    pub fn is_animating(&self) -> bool {
        self.is_animating
    }

    /// Has [`dispose`](Self::dispose) been called?
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Configuration this smoother was built with
    pub fn config(&self) -> &SmootherConfig {
        &self.config
    }

    /// Copy of the trail buffer, most recent first
    ///
    /// Always exactly `trail_capacity` entries long.
    pub fn trail_positions(&self) -> Vec<Position> {
        self.trail.iter().copied().collect()
    }

    /// The continuation currently scheduled, if any
    pub fn pending_frame(&self) -> Option<FrameRequest> {
        self.pending
    }

    /// Run the pending frame, if there is one
    ///
    /// Returns whether the smoother is still animating afterwards.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(request) => self.run_frame(request, now),
            None => false,
        }
    }

    /// Execute one integration step for `request`
    ///
    /// Stale requests (superseded or cancelled by `dispose`) do nothing and
    /// return `false`. Otherwise returns whether another frame was scheduled.
    ///
    /// A step that would carry the cursor past the target (across the plane
    /// through the target, perpendicular to the remaining displacement)
    /// lands exactly on the target with zero velocity instead of applying
    /// `current += velocity`.
    pub fn run_frame(&mut self, request: FrameRequest, now: Instant) -> bool {
        if self.disposed || self.pending != Some(request) {
            trace!("Dropping stale frame request {:?}", request);
            return false;
        }
        self.pending = None;

        let elapsed = self
            .last_step
            .map(|prev| now.saturating_duration_since(prev))
            .unwrap_or(REFERENCE_FRAME);
        self.last_step = Some(now);
        let dt = frame_units(elapsed);

        let displacement = self.target - self.current;
        let distance = displacement.length();

        if distance < self.config.snap_threshold {
            self.current = self.target;
            self.velocity = Velocity::ZERO;
            self.is_animating = false;
            trace!("Smoother settled at {}", self.current);
            return false;
        }

        let mut velocity = (self.velocity * self.config.damping
            + displacement * (self.config.smooth_factor * dt))
            .clamp_length(self.config.max_speed);
        if !velocity.is_finite() {
            velocity = Velocity::ZERO;
        }

        let mut next = self.current + velocity;

        // Crossing the plane through the target means the spring would
        // overshoot; land on the target instead.
        if (self.target - next).dot(displacement) <= 0.0 {
            next = self.target;
            velocity = Velocity::ZERO;
        }

        self.velocity = velocity;
        self.current = next;

        self.trail.push_front(next);
        self.trail.truncate(self.config.trail_capacity.max(1));

        trace!(
            "Smoother step: pos={}, vel=({:.2}, {:.2}), dist={:.2}, dt={:.2}",
            self.current,
            self.velocity.dx,
            self.velocity.dy,
            distance,
            dt
        );

        self.schedule();
        true
    }

    /// Cancel any scheduled frame and stop animating
    ///
    /// Safe to call repeatedly. Later `set_target` calls are ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.generation = self.generation.wrapping_add(1);
        self.pending = None;
        self.is_animating = false;
        debug!("Smoother disposed at {}", self.current);
    }

    fn schedule(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.pending = Some(FrameRequest {
            generation: self.generation,
        });
    }
}

/// Convert wall time to clamped 60 Hz reference frames
fn frame_units(elapsed: Duration) -> f32 {
    elapsed.min(MAX_FRAME_DT).as_secs_f32() / REFERENCE_FRAME.as_secs_f32()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snappy() -> SmootherConfig {
        SmootherConfig {
            smooth_factor: 1.0,
            max_speed: 100.0,
            ..SmootherConfig::default()
        }
    }

    /// Tick every `step` until settled, returning the number of frames run
    fn run_until_settled(
        smoother: &mut PositionSmoother,
        start: Instant,
        step: Duration,
        limit: usize,
    ) -> (usize, Instant) {
        let mut now = start;
        for frame in 1..=limit {
            now += step;
            if !smoother.tick(now) {
                return (frame, now);
            }
        }
        (limit, now)
    }

    #[test]
    fn test_default_config() {
        let config = SmootherConfig::default();
        assert_eq!(config.trail_capacity, 5);
        assert_eq!(config.damping, 0.7);
        assert_eq!(config.snap_threshold, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SmootherConfig::default();
        config.smooth_factor = 0.0;
        assert!(config.validate().is_err());

        let mut config = SmootherConfig::default();
        config.max_speed = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = SmootherConfig::default();
        config.trail_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = SmootherConfig::default();
        config.damping = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_seed_position_before_any_target() {
        let seed = Position::new(42.0, 7.0);
        let smoother = PositionSmoother::new(seed, SmootherConfig::default());

        assert_eq!(smoother.current_position(), seed);
        assert_eq!(smoother.target(), seed);
        assert!(!smoother.is_animating());
        assert!(smoother.pending_frame().is_none());
        assert_eq!(smoother.trail_positions(), vec![seed; 5]);
    }

    #[test]
    fn test_snappy_profile_converges_within_five_frames() {
        let mut smoother = PositionSmoother::new(Position::ZERO, snappy());
        smoother.set_target(Position::new(10.0, 10.0));
        assert!(smoother.is_animating());

        let start = Instant::now();
        let step = Duration::from_millis(16);

        smoother.tick(start + step);
        assert_ne!(smoother.current_position(), Position::ZERO);

        let (frames, _) = run_until_settled(&mut smoother, start + step, step, 10);
        assert!(frames < 5, "took {} frames", frames + 1);
        assert_eq!(smoother.current_position(), Position::new(10.0, 10.0));
        assert!(!smoother.is_animating());
    }

    #[test]
    fn test_first_step_respects_max_speed() {
        let mut config = SmootherConfig::default();
        config.max_speed = 18.0;
        let mut smoother = PositionSmoother::new(Position::ZERO, config);
        smoother.set_target(Position::new(5000.0, 0.0));

        smoother.tick(Instant::now());
        let moved = smoother.current_position().distance(Position::ZERO);
        assert!(moved > 0.0);
        assert!(moved <= 18.0 + 1e-3, "moved {} px in one frame", moved);
    }

    #[test]
    fn test_overshooting_step_lands_on_target() {
        let config = SmootherConfig {
            smooth_factor: 0.5,
            max_speed: 1000.0,
            ..Default::default()
        };
        let start = Instant::now();
        let mut smoother = PositionSmoother::new(Position::ZERO, config);
        smoother.set_target(Position::new(100.0, 0.0));

        // 0 -> 50, then a 60px step would reach 110
        assert!(smoother.tick(start));
        assert_eq!(smoother.current_position(), Position::new(50.0, 0.0));
        assert!(smoother.tick(start + REFERENCE_FRAME));

        assert_eq!(smoother.current_position(), Position::new(100.0, 0.0));
        assert_eq!(smoother.velocity(), Velocity::ZERO);
        assert!(!smoother.tick(start + REFERENCE_FRAME * 2));
        assert!(!smoother.is_animating());
    }

    #[test]
    fn test_no_drift_after_convergence() {
        let mut smoother = PositionSmoother::new(Position::ZERO, SmootherConfig::default());
        smoother.set_target(Position::new(-120.0, 64.0));

        let start = Instant::now();
        let (_, end) =
            run_until_settled(&mut smoother, start, Duration::from_millis(16), 5_000);
        assert!(!smoother.is_animating());

        let settled = smoother.current_position();
        for i in 1..50 {
            assert!(!smoother.tick(end + Duration::from_millis(16 * i)));
            assert_eq!(smoother.current_position(), settled);
        }
        assert_eq!(settled, Position::new(-120.0, 64.0));
    }

    #[test]
    fn test_trail_always_full() {
        let mut config = SmootherConfig::default();
        config.trail_capacity = 3;
        let mut smoother = PositionSmoother::new(Position::ZERO, config);
        assert_eq!(smoother.trail_positions().len(), 3);

        smoother.set_target(Position::new(300.0, 0.0));
        let start = Instant::now();
        for i in 0..40 {
            smoother.tick(start + Duration::from_millis(16 * i));
            let trail = smoother.trail_positions();
            assert_eq!(trail.len(), 3);
            if smoother.is_animating() {
                assert_eq!(trail[0], smoother.current_position());
            }
        }
    }

    #[test]
    fn test_retarget_keeps_velocity_and_trail() {
        let mut smoother = PositionSmoother::new(Position::ZERO, SmootherConfig::default());
        smoother.set_target(Position::new(400.0, 0.0));

        let start = Instant::now();
        for i in 0..5 {
            smoother.tick(start + Duration::from_millis(16 * i));
        }
        let velocity = smoother.velocity();
        let trail = smoother.trail_positions();
        let request = smoother.pending_frame();

        smoother.set_target(Position::new(400.0, 200.0));
        assert_eq!(smoother.velocity(), velocity);
        assert_eq!(smoother.trail_positions(), trail);
        assert_eq!(smoother.pending_frame(), request);
        assert_eq!(smoother.target(), Position::new(400.0, 200.0));
    }

    #[test]
    fn test_dispose_is_idempotent_and_final() {
        let mut smoother = PositionSmoother::new(Position::ZERO, SmootherConfig::default());
        smoother.set_target(Position::new(100.0, 100.0));
        let held = smoother.pending_frame().unwrap();

        smoother.dispose();
        smoother.dispose();
        assert!(smoother.is_disposed());
        assert!(!smoother.is_animating());
        assert!(smoother.pending_frame().is_none());

        // The request the host was holding must not run
        let before = smoother.current_position();
        assert!(!smoother.run_frame(held, Instant::now()));
        assert_eq!(smoother.current_position(), before);

        smoother.set_target(Position::new(5.0, 5.0));
        assert!(smoother.pending_frame().is_none());
        assert!(!smoother.tick(Instant::now()));
        assert_eq!(smoother.current_position(), before);
    }

    #[test]
    fn test_superseded_request_is_ignored() {
        let mut smoother = PositionSmoother::new(Position::ZERO, SmootherConfig::default());
        smoother.set_target(Position::new(100.0, 0.0));
        let first = smoother.pending_frame().unwrap();

        let now = Instant::now();
        assert!(smoother.run_frame(first, now));
        let after_first = smoother.current_position();

        // Running the consumed request again does nothing
        assert!(!smoother.run_frame(first, now + Duration::from_millis(16)));
        assert_eq!(smoother.current_position(), after_first);
        assert!(smoother.pending_frame().is_some());
    }

    #[test]
    fn test_non_finite_target_is_discarded() {
        let mut smoother = PositionSmoother::new(Position::new(1.0, 1.0), SmootherConfig::default());
        smoother.set_target(Position::new(f32::NAN, 3.0));
        smoother.set_target(Position::new(3.0, f32::INFINITY));
        assert!(!smoother.is_animating());
        assert_eq!(smoother.target(), Position::new(1.0, 1.0));

        // Still usable afterwards
        smoother.set_target(Position::new(2.0, 1.0));
        run_until_settled(&mut smoother, Instant::now(), Duration::from_millis(16), 500);
        assert_eq!(smoother.current_position(), Position::new(2.0, 1.0));
    }

    #[test]
    fn test_frame_rate_independence() {
        let targets = [
            Position::new(250.0, 40.0),
            Position::new(-30.0, 180.0),
            Position::new(600.0, 600.0),
        ];

        let settle = |step_ms: u64| {
            let mut smoother =
                PositionSmoother::new(Position::ZERO, SmootherConfig::default());
            let mut now = Instant::now();
            for target in targets {
                smoother.set_target(target);
                for _ in 0..4 {
                    now += Duration::from_millis(step_ms);
                    smoother.tick(now);
                }
            }
            run_until_settled(&mut smoother, now, Duration::from_millis(step_ms), 10_000);
            smoother.current_position()
        };

        let fast = settle(16);
        let slow = settle(33);
        assert!(fast.distance(slow) < 1e-3, "{} vs {}", fast, slow);
        assert!(fast.distance(Position::new(600.0, 600.0)) < 1e-3);
    }

    #[test]
    fn test_stall_is_clamped() {
        // A 2 second stall must integrate like a ~33ms frame, not 120 frames
        let mut a = PositionSmoother::new(Position::ZERO, SmootherConfig::default());
        let mut b = PositionSmoother::new(Position::ZERO, SmootherConfig::default());
        a.set_target(Position::new(50.0, 0.0));
        b.set_target(Position::new(50.0, 0.0));

        let start = Instant::now();
        a.tick(start);
        b.tick(start);
        a.tick(start + Duration::from_secs(2));
        b.tick(start + Duration::from_millis(34));
        assert_eq!(a.current_position(), b.current_position());
    }
}
