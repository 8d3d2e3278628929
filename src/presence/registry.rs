//! Cursor Registry
//!
//! Owns one [`PositionSmoother`] (and optionally one [`ParticleEmitter`])
//! per tracked entity. Entities live in a slot arena: a slot is reused after
//! its entity leaves, and the generation stored in every [`SlotKey`] makes
//! stale keys resolve to nothing instead of to the slot's new occupant.
//!
//! Per frame, every entity's smoother is advanced exactly once and its
//! emitter then observes the position produced by that same step.

use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, trace};

use super::colors::ColorRegistry;
use super::event::{EntityId, PresenceEvent};
use crate::cursor::{PositionSmoother, SmootherConfig, SmoothingProfile};
use crate::geometry::Position;
use crate::trail::{Color, DrawSurface, EmitterConfig, ParticleEmitter};

/// Radius of the drawn cursor dot (pixels)
const CURSOR_RADIUS: f32 = 5.0;

/// Settings applied to every entity the registry creates
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Smoothing for the locally controlled entity
    pub local: SmootherConfig,

    /// Smoothing for network entities
    pub remote: SmootherConfig,

    /// Particle settings; `None` disables trails entirely
    pub particles: Option<EmitterConfig>,

    /// Give the local entity a particle trail as well
    pub local_particles: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            local: SmoothingProfile::Local.config(),
            remote: SmoothingProfile::Remote.config(),
            particles: Some(EmitterConfig::default()),
            local_particles: false,
        }
    }
}

/// Generational handle to a registry slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    index: u32,
    generation: u32,
}

/// One tracked entity
#[derive(Debug)]
pub struct TrackedCursor {
    id: EntityId,
    smoother: PositionSmoother,
    emitter: Option<ParticleEmitter>,
    color: Color,
    is_local: bool,
}

impl TrackedCursor {
    /// Entity identifier
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Smoothed position to draw this frame
    pub fn position(&self) -> Position {
        self.smoother.current_position()
    }

    /// Last reported position
    pub fn target(&self) -> Position {
        self.smoother.target()
    }

    /// Recent positions, most recent first
    pub fn trail(&self) -> Vec<Position> {
        self.smoother.trail_positions()
    }

    /// Assigned color
    pub fn color(&self) -> Color {
        self.color
    }

    /// Driven by this process?
    pub fn is_local(&self) -> bool {
        self.is_local
    }

    /// Still converging?
    pub fn is_animating(&self) -> bool {
        self.smoother.is_animating()
    }

    /// Live particle count (0 without an emitter)
    pub fn particle_count(&self) -> usize {
        self.emitter.as_ref().map_or(0, ParticleEmitter::particle_count)
    }

    /// Underlying smoother
    pub fn smoother(&self) -> &PositionSmoother {
        &self.smoother
    }

    /// Underlying emitter, if trails are enabled for this entity
    pub fn emitter(&self) -> Option<&ParticleEmitter> {
        self.emitter.as_ref()
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    cursor: Option<TrackedCursor>,
}

/// Per-frame summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Entities tracked
    pub cursors: usize,
    /// Smoothers that ran an integration step this frame
    pub stepped: usize,
    /// Smoothers still animating after the frame
    pub animating: usize,
    /// Live particles after the frame
    pub particles: usize,
}

/// Owning map from entity id to smoother/emitter state
#[derive(Debug)]
pub struct CursorRegistry {
    config: RegistryConfig,
    colors: ColorRegistry,
    slots: Vec<Slot>,
    free: Vec<u32>,
    index: HashMap<EntityId, SlotKey>,
    spawned: u64,
}

impl Default for CursorRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default(), ColorRegistry::default())
    }
}

impl CursorRegistry {
    /// Create an empty registry
    pub fn new(config: RegistryConfig, colors: ColorRegistry) -> Self {
        Self {
            config,
            colors,
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            spawned: 0,
        }
    }

    /// Start tracking `id` at `position`
    ///
    /// Joining an id that is already tracked just retargets it.
    pub fn join(&mut self, id: EntityId, position: Position, is_local: bool) -> SlotKey {
        if let Some(&key) = self.index.get(&id) {
            debug!("{} joined again, retargeting", id);
            if let Some(cursor) = self.slot_mut(key) {
                cursor.smoother.set_target(position);
            }
            return key;
        }

        let smoother_config = if is_local {
            self.config.local.clone()
        } else {
            self.config.remote.clone()
        };
        let color = self.colors.assign(&id);

        let emitter = self
            .config
            .particles
            .as_ref()
            .filter(|_| !is_local || self.config.local_particles)
            .map(|base| {
                let mut cfg = base.clone();
                cfg.color = color;
                // Distinct but reproducible stream per entity
                cfg.seed = base.seed.map(|seed| seed.wrapping_add(self.spawned));
                ParticleEmitter::new(cfg)
            });
        self.spawned += 1;

        let cursor = TrackedCursor {
            id: id.clone(),
            smoother: PositionSmoother::new(position, smoother_config),
            emitter,
            color,
            is_local,
        };

        let key = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.cursor = Some(cursor);
                SlotKey {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    cursor: Some(cursor),
                });
                SlotKey {
                    index,
                    generation: 0,
                }
            }
        };

        info!(
            "Tracking {} at {} ({}, color {})",
            id,
            position,
            if is_local { "local" } else { "remote" },
            color
        );
        self.index.insert(id, key);
        key
    }

    /// Report a new position for `id`
    ///
    /// Returns `false` (and changes nothing) for unknown ids.
    pub fn move_to(&mut self, id: &EntityId, position: Position) -> bool {
        let Some(&key) = self.index.get(id) else {
            debug!("Position for unknown entity {} ignored", id);
            return false;
        };
        match self.slot_mut(key) {
            Some(cursor) => {
                cursor.smoother.set_target(position);
                true
            }
            None => false,
        }
    }

    /// Stop tracking `id`, cancelling its pending frame and particles
    ///
    /// Returns `false` if `id` was not tracked.
    pub fn leave(&mut self, id: &EntityId) -> bool {
        let Some(key) = self.index.remove(id) else {
            debug!("Departure of unknown entity {} ignored", id);
            return false;
        };

        let slot = &mut self.slots[key.index as usize];
        if let Some(mut cursor) = slot.cursor.take() {
            cursor.smoother.dispose();
            if let Some(emitter) = cursor.emitter.as_mut() {
                emitter.clear();
            }
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        self.colors.release(id);

        info!("Stopped tracking {}", id);
        true
    }

    /// Apply a transport event
    pub fn apply(&mut self, event: PresenceEvent) {
        match event {
            PresenceEvent::Joined {
                id,
                position,
                local,
            } => {
                self.join(id, position, local);
            }
            PresenceEvent::Moved { id, position } => {
                self.move_to(&id, position);
            }
            PresenceEvent::Left { id } => {
                self.leave(&id);
            }
        }
    }

    /// Advance every entity by one display frame
    pub fn frame(&mut self, now: Instant) -> FrameStats {
        let mut stats = FrameStats::default();

        for cursor in self.slots.iter_mut().filter_map(|s| s.cursor.as_mut()) {
            stats.cursors += 1;

            if cursor.smoother.pending_frame().is_some() {
                stats.stepped += 1;
                cursor.smoother.tick(now);
            }
            if cursor.smoother.is_animating() {
                stats.animating += 1;
            }

            if let Some(emitter) = cursor.emitter.as_mut() {
                emitter.advance(cursor.smoother.current_position(), now);
                stats.particles += emitter.particle_count();
            }
        }

        trace!(
            "Frame: {} cursors, {} stepped, {} animating, {} particles",
            stats.cursors,
            stats.stepped,
            stats.animating,
            stats.particles
        );
        stats
    }

    /// Is another frame needed (movement or fading particles)?
    pub fn needs_frame(&self) -> bool {
        self.cursors()
            .any(|c| c.is_animating() || c.particle_count() > 0)
    }

    /// Draw all particle trails
    pub fn render_particles<S: DrawSurface + ?Sized>(&self, surface: &mut S, now: Instant) {
        for emitter in self.cursors().filter_map(TrackedCursor::emitter) {
            emitter.render(surface, now);
        }
    }

    /// Draw each cursor as a dot with a fading tail from its trail buffer
    pub fn render_cursors<S: DrawSurface + ?Sized>(&self, surface: &mut S) {
        for cursor in self.cursors() {
            let trail = cursor.trail();
            let len = trail.len() as f32;

            surface.set_fill_color(cursor.color);
            for (i, position) in trail.iter().enumerate().skip(1).rev() {
                let fade = 1.0 - i as f32 / len;
                surface.set_global_alpha(0.5 * fade);
                surface.fill_circle(*position, CURSOR_RADIUS * (0.5 + 0.5 * fade));
            }
            surface.reset_alpha();
            surface.fill_circle(cursor.position(), CURSOR_RADIUS);
        }
    }

    /// Particles first, cursors on top
    pub fn render<S: DrawSurface + ?Sized>(&self, surface: &mut S, now: Instant) {
        self.render_particles(surface, now);
        self.render_cursors(surface);
    }

    /// Look up an entity
    pub fn get(&self, id: &EntityId) -> Option<&TrackedCursor> {
        self.index.get(id).and_then(|&key| self.get_by_key(key))
    }

    /// Resolve a slot key; stale keys yield `None`
    pub fn get_by_key(&self, key: SlotKey) -> Option<&TrackedCursor> {
        self.slots
            .get(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.cursor.as_ref())
    }

    /// All tracked entities
    pub fn cursors(&self) -> impl Iterator<Item = &TrackedCursor> {
        self.slots.iter().filter_map(|s| s.cursor.as_ref())
    }

    /// Number of tracked entities
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Nothing tracked?
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Color assignments
    pub fn colors(&self) -> &ColorRegistry {
        &self.colors
    }

    fn slot_mut(&mut self, key: SlotKey) -> Option<&mut TrackedCursor> {
        self.slots
            .get_mut(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.cursor.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trail::RecordingSurface;
    use std::time::Duration;

    fn seeded_registry() -> CursorRegistry {
        let config = RegistryConfig {
            particles: Some(EmitterConfig {
                seed: Some(1),
                emission_spacing: 3.0,
                ..EmitterConfig::default()
            }),
            ..RegistryConfig::default()
        };
        CursorRegistry::new(config, ColorRegistry::default())
    }

    #[test]
    fn test_join_seeds_position() {
        let mut registry = seeded_registry();
        registry.join("alice".into(), Position::new(10.0, 20.0), false);

        let alice = registry.get(&"alice".into()).unwrap();
        assert_eq!(alice.position(), Position::new(10.0, 20.0));
        assert!(!alice.is_animating());
        assert_eq!(registry.len(), 1);
        assert!(!registry.needs_frame());
    }

    #[test]
    fn test_rejoin_retargets_instead_of_duplicating() {
        let mut registry = seeded_registry();
        let first = registry.join("alice".into(), Position::ZERO, false);
        let second = registry.join("alice".into(), Position::new(50.0, 0.0), false);

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(&"alice".into()).unwrap().target(),
            Position::new(50.0, 0.0)
        );
    }

    #[test]
    fn test_frame_orders_smoother_before_emitter() {
        let mut registry = seeded_registry();
        let id = EntityId::from("alice");
        registry.join(id.clone(), Position::ZERO, false);

        let now = Instant::now();
        registry.frame(now);
        registry.move_to(&id, Position::new(200.0, 0.0));
        let stats = registry.frame(now + Duration::from_millis(16));

        // The emitter saw the position from this very frame: 18px travelled
        // at 3px spacing is 6 particles.
        let alice = registry.get(&id).unwrap();
        assert_eq!(stats.stepped, 1);
        assert_eq!(alice.position(), Position::new(18.0, 0.0));
        assert_eq!(alice.particle_count(), 6);
        assert_eq!(stats.particles, 6);
    }

    #[test]
    fn test_local_entity_has_no_trail_by_default() {
        let mut registry = seeded_registry();
        registry.join("me".into(), Position::ZERO, true);
        let me = registry.get(&"me".into()).unwrap();
        assert!(me.is_local());
        assert!(me.emitter().is_none());
        assert_eq!(me.smoother().config(), &SmoothingProfile::Local.config());
    }

    #[test]
    fn test_leave_disposes_and_frees_slot() {
        let mut registry = seeded_registry();
        let id = EntityId::from("alice");
        let key = registry.join(id.clone(), Position::ZERO, false);
        registry.move_to(&id, Position::new(100.0, 100.0));

        assert!(registry.leave(&id));
        assert!(!registry.leave(&id));
        assert!(registry.get(&id).is_none());
        assert!(registry.get_by_key(key).is_none());
        assert!(registry.colors().is_empty());

        // Slot reuse must not resurrect the old key
        let bob = registry.join("bob".into(), Position::ZERO, false);
        assert_eq!(bob.index, key.index);
        assert_ne!(bob, key);
        assert!(registry.get_by_key(key).is_none());
        assert_eq!(registry.get_by_key(bob).unwrap().id().as_str(), "bob");
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut registry = seeded_registry();
        assert!(!registry.move_to(&"ghost".into(), Position::new(1.0, 1.0)));
        assert!(!registry.leave(&"ghost".into()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_apply_events() {
        let mut registry = seeded_registry();
        registry.apply(PresenceEvent::Joined {
            id: "a".into(),
            position: Position::ZERO,
            local: false,
        });
        registry.apply(PresenceEvent::Moved {
            id: "a".into(),
            position: Position::new(1.0, 0.0),
        });
        assert!(registry.needs_frame());
        registry.apply(PresenceEvent::Left { id: "a".into() });
        assert!(registry.is_empty());
        assert!(!registry.needs_frame());
    }

    #[test]
    fn test_settles_and_stops_needing_frames() {
        let mut registry = seeded_registry();
        let id = EntityId::from("alice");
        registry.join(id.clone(), Position::ZERO, false);
        registry.move_to(&id, Position::new(60.0, -40.0));

        let start = Instant::now();
        let mut frames = 0;
        while registry.needs_frame() && frames < 10_000 {
            frames += 1;
            registry.frame(start + Duration::from_millis(16 * frames));
        }

        assert!(frames < 10_000);
        let alice = registry.get(&id).unwrap();
        assert_eq!(alice.position(), Position::new(60.0, -40.0));
        assert_eq!(alice.particle_count(), 0);
    }

    #[test]
    fn test_render_draws_particles_and_cursors() {
        let mut registry = seeded_registry();
        let id = EntityId::from("alice");
        registry.join(id.clone(), Position::ZERO, false);
        registry.join("bob".into(), Position::new(300.0, 300.0), false);

        let now = Instant::now();
        registry.frame(now);
        registry.move_to(&id, Position::new(100.0, 0.0));
        registry.frame(now + Duration::from_millis(16));

        let mut surface = RecordingSurface::new();
        registry.render(&mut surface, now + Duration::from_millis(20));

        let particles = registry.get(&id).unwrap().particle_count();
        // Each cursor: 4 trail dots + 1 dot
        assert_eq!(surface.circle_count(), particles + 2 * 5);
        assert_eq!(surface.alpha(), 1.0);
    }
}
