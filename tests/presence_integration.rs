use std::io::Write;
use std::time::{Duration, Instant};

use smooth_cursors::config::{Config, SimulationConfig};
use smooth_cursors::geometry::Position;
use smooth_cursors::presence::{CursorRegistry, EntityId, PresenceEvent};
use smooth_cursors::sim::{frame_period, NetworkSim, LOCAL_ID};
use smooth_cursors::trail::{Color, PixelSurface, RecordingSurface};
use tempfile::{NamedTempFile, TempDir};

fn seeded_config(entities: usize) -> Config {
    Config::default_config().with_overrides(Some(entities), Some(240), Some(99))
}

fn registry_for(config: &Config) -> CursorRegistry {
    CursorRegistry::new(config.registry_config(), config.color_registry())
}

/// Run `frames` frames of simulated traffic, returning the final instant
fn drive(registry: &mut CursorRegistry, sim: &mut NetworkSim, start: Instant, frames: u32) -> Instant {
    let period = frame_period(60);
    let mut now = start;
    for frame in 1..=frames {
        let elapsed = period * frame;
        for event in sim.advance(elapsed) {
            registry.apply(event);
        }
        now = start + elapsed;
        if registry.needs_frame() {
            registry.frame(now);
        }
    }
    now
}

#[test]
fn test_simulated_session_lifecycle() {
    let config = seeded_config(5);
    let mut registry = registry_for(&config);
    let mut sim = NetworkSim::new(&config.simulation);

    for event in sim.join_events() {
        registry.apply(event);
    }
    assert_eq!(registry.len(), 6);
    assert!(registry.get(&EntityId::new(LOCAL_ID)).unwrap().is_local());

    let start = Instant::now();
    drive(&mut registry, &mut sim, start, 240);

    // Remote peers leave particle trails, the local cursor does not
    let remote_particles: usize = registry
        .cursors()
        .filter(|c| !c.is_local())
        .map(|c| c.particle_count())
        .sum();
    assert!(remote_particles > 0);
    assert!(registry
        .get(&EntityId::new(LOCAL_ID))
        .unwrap()
        .emitter()
        .is_none());

    for event in sim.leave_events() {
        registry.apply(event);
    }
    assert!(registry.is_empty());
    assert!(registry.colors().is_empty());
    assert!(!registry.needs_frame());
}

#[test]
fn test_identical_seeds_produce_identical_frames() {
    let config = seeded_config(3);
    let start = Instant::now();

    let run = || {
        let mut registry = registry_for(&config);
        let mut sim = NetworkSim::new(&config.simulation);
        for event in sim.join_events() {
            registry.apply(event);
        }
        let now = drive(&mut registry, &mut sim, start, 120);

        let mut surface = RecordingSurface::new();
        registry.render(&mut surface, now);
        surface.commands().to_vec()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_registry_goes_idle_after_traffic_stops() {
    let config = seeded_config(2);
    let mut registry = registry_for(&config);
    let start = Instant::now();

    let id = EntityId::new("peer");
    registry.apply(PresenceEvent::Joined {
        id: id.clone(),
        position: Position::new(0.0, 0.0),
        local: false,
    });
    registry.apply(PresenceEvent::Moved {
        id: id.clone(),
        position: Position::new(300.0, 200.0),
    });

    let mut frames = 0u32;
    while registry.needs_frame() && frames < 2000 {
        frames += 1;
        registry.frame(start + Duration::from_millis(16) * frames);
    }

    assert!(!registry.needs_frame(), "never went idle");
    let cursor = registry.get(&id).unwrap();
    assert_eq!(cursor.position(), Position::new(300.0, 200.0));
    assert_eq!(cursor.particle_count(), 0);
}

#[test]
fn test_events_arrive_as_json() {
    let mut registry = CursorRegistry::default();
    let lines = [
        r#"{"type":"moved","id":"ghost","position":{"x":1.0,"y":1.0}}"#,
        r#"{"type":"joined","id":"alice","position":{"x":10.0,"y":20.0}}"#,
        r#"{"type":"moved","id":"alice","position":{"x":50.0,"y":20.0}}"#,
        r#"{"type":"left","id":"ghost"}"#,
    ];

    for line in lines {
        let event: PresenceEvent = serde_json::from_str(line).unwrap();
        registry.apply(event);
    }

    assert_eq!(registry.len(), 1);
    let alice = registry.get(&EntityId::new("alice")).unwrap();
    assert!(!alice.is_local());
    assert_eq!(alice.target(), Position::new(50.0, 20.0));
    assert!(alice.is_animating());
}

#[test]
fn test_config_file_drives_registry() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r##"
palette = ["#ff0000"]

[remote]
smooth_factor = 1.0
max_speed = 100.0

[trails]
enabled = false
"##
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    let mut registry = registry_for(&config);
    let key = registry.join(EntityId::new("bob"), Position::ZERO, false);

    let cursor = registry.get_by_key(key).unwrap();
    assert_eq!(cursor.color(), Color::rgb(255, 0, 0));
    assert!(cursor.emitter().is_none());
    assert_eq!(cursor.smoother().config().max_speed, 100.0);
}

#[test]
fn test_snapshot_png() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshot.png");

    let config = Config {
        simulation: SimulationConfig {
            width: 64,
            height: 48,
            ..Default::default()
        },
        ..Config::default_config()
    };
    let mut registry = registry_for(&config);
    registry.join(EntityId::new("dot"), Position::new(32.0, 24.0), false);

    let mut surface = PixelSurface::new(64, 48, Color::BLACK);
    registry.render(&mut surface, Instant::now());
    surface.save_png(&path).unwrap();

    let image = image::open(&path).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (64, 48));
    let color = registry.get(&EntityId::new("dot")).unwrap().color();
    assert_eq!(image.get_pixel(32, 24).0, [color.r, color.g, color.b, 255]);
    assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
}
