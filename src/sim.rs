//! Simulated presence traffic
//!
//! Stands in for a real transport: one locally controlled cursor that moves
//! every display frame, plus remote peers that random-walk across the canvas
//! and report their position at jittered intervals. Time is virtual
//! (`Duration` since start) so runs are reproducible for a fixed seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::SimulationConfig;
use crate::geometry::Position;
use crate::presence::{EntityId, PresenceEvent};

/// Id of the locally controlled cursor
pub const LOCAL_ID: &str = "local";

/// Largest random-walk step of a remote peer per update (pixels)
const REMOTE_STEP_PX: f32 = 140.0;

/// Largest step of the local cursor per frame (pixels)
const LOCAL_STEP_PX: f32 = 12.0;

#[derive(Debug)]
struct SimEntity {
    id: EntityId,
    local: bool,
    position: Position,
    next_update: Duration,
    interval: Duration,
    jitter: Duration,
    step: f32,
}

/// Deterministic generator of [`PresenceEvent`]s
#[derive(Debug)]
pub struct NetworkSim {
    rng: StdRng,
    entities: Vec<SimEntity>,
    width: f32,
    height: f32,
    joined: bool,
    events_sent: u64,
}

impl NetworkSim {
    /// Create a simulator for `config.entities` remote peers plus the local cursor
    pub fn new(config: &SimulationConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let width = config.width.max(1) as f32;
        let height = config.height.max(1) as f32;
        let frame = frame_period(config.frame_rate);
        let interval = Duration::from_millis(config.update_interval_ms.max(1));
        let jitter = Duration::from_millis(config.jitter_ms);

        let mut entities = Vec::with_capacity(config.entities + 1);
        entities.push(SimEntity {
            id: EntityId::new(LOCAL_ID),
            local: true,
            position: Position::new(width / 2.0, height / 2.0),
            next_update: frame,
            interval: frame,
            jitter: Duration::ZERO,
            step: LOCAL_STEP_PX,
        });

        for n in 1..=config.entities {
            let position = Position::new(
                rng.random_range(0.0..width),
                rng.random_range(0.0..height),
            );
            // Stagger first reports so peers don't update in lockstep
            let first = Duration::from_millis(rng.random_range(0..=interval.as_millis() as u64));
            entities.push(SimEntity {
                id: EntityId::new(format!("peer-{}", n)),
                local: false,
                position,
                next_update: first,
                interval,
                jitter,
                step: REMOTE_STEP_PX,
            });
        }

        debug!(
            "Network simulator: {} peers, {:?} ±{:?} update interval, seed {:?}",
            config.entities, interval, jitter, config.seed
        );

        Self {
            rng,
            entities,
            width,
            height,
            joined: false,
            events_sent: 0,
        }
    }

    /// `Joined` events for every entity; empty after the first call
    pub fn join_events(&mut self) -> Vec<PresenceEvent> {
        if self.joined {
            return Vec::new();
        }
        self.joined = true;
        self.events_sent += self.entities.len() as u64;

        self.entities
            .iter()
            .map(|e| PresenceEvent::Joined {
                id: e.id.clone(),
                position: e.position,
                local: e.local,
            })
            .collect()
    }

    /// All position updates due at or before `elapsed`, in delivery order
    pub fn advance(&mut self, elapsed: Duration) -> Vec<PresenceEvent> {
        let mut due = Vec::new();

        for index in 0..self.entities.len() {
            while self.entities[index].next_update <= elapsed {
                let at = self.entities[index].next_update;
                let position = self.walk(index);
                let delay = self.next_delay(index);

                let entity = &mut self.entities[index];
                entity.position = position;
                entity.next_update = at + delay;
                trace!("{} -> {} at {:?}", entity.id, position, at);

                due.push((
                    at,
                    PresenceEvent::Moved {
                        id: entity.id.clone(),
                        position,
                    },
                ));
            }
        }

        due.sort_by_key(|(at, _)| *at);
        self.events_sent += due.len() as u64;
        due.into_iter().map(|(_, event)| event).collect()
    }

    /// Virtual time of the next scheduled update
    pub fn next_due(&self) -> Option<Duration> {
        self.entities.iter().map(|e| e.next_update).min()
    }

    /// `Left` events for every entity
    pub fn leave_events(&self) -> Vec<PresenceEvent> {
        self.entities
            .iter()
            .map(|e| PresenceEvent::Left { id: e.id.clone() })
            .collect()
    }

    /// Number of simulated entities, the local cursor included
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Events produced so far
    pub fn events_sent(&self) -> u64 {
        self.events_sent
    }

    fn walk(&mut self, index: usize) -> Position {
        let step = self.entities[index].step;
        let from = self.entities[index].position;
        let dx = self.rng.random_range(-step..=step);
        let dy = self.rng.random_range(-step..=step);
        Position::new(
            (from.x + dx).clamp(0.0, self.width),
            (from.y + dy).clamp(0.0, self.height),
        )
    }

    fn next_delay(&mut self, index: usize) -> Duration {
        let entity = &self.entities[index];
        let (interval, jitter) = (entity.interval, entity.jitter);
        if jitter.is_zero() {
            return interval;
        }

        let jitter_ms = jitter.as_millis() as u64;
        let offset = self.rng.random_range(0..=jitter_ms);
        let base = (interval.as_millis() as u64).saturating_sub(jitter_ms / 2);
        Duration::from_millis((base + offset).max(1))
    }
}

/// Display frame period for a refresh rate
pub fn frame_period(frame_rate: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(frame_rate.max(1)))
}
