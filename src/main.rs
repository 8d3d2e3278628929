//! smooth-cursors - headless presence simulator
//!
//! Drives a [`CursorRegistry`] with simulated network traffic and reports
//! how the smoothing and trail layers behave.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use smooth_cursors::config::Config;
use smooth_cursors::presence::{CursorRegistry, FrameStats, PresenceEvent};
use smooth_cursors::sim::{frame_period, NetworkSim};
use smooth_cursors::trail::{Color, PixelSurface};

/// Snapshot background
const BACKGROUND: Color = Color::rgb(0x1e, 0x1e, 0x2e);

/// Command-line arguments for smooth-cursors
#[derive(Parser, Debug)]
#[command(name = "smooth-cursors")]
#[command(version, about = "Cursor smoothing and particle trail simulator", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, env = "SMOOTH_CURSORS_CONFIG", default_value = "smooth-cursors.toml")]
    pub config: PathBuf,

    /// Number of simulated remote peers
    #[arg(short, long, env = "SMOOTH_CURSORS_ENTITIES")]
    pub entities: Option<usize>,

    /// Frames to simulate (0 = until interrupted, real-time only)
    #[arg(short, long)]
    pub frames: Option<u64>,

    /// Seed for simulated traffic and particle jitter
    #[arg(short, long, env = "SMOOTH_CURSORS_SEED")]
    pub seed: Option<u64>,

    /// Run against the wall clock instead of a virtual one
    #[arg(long)]
    pub realtime: bool,

    /// Render the final frame to a PNG file
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub dump_config: bool,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Write logs to file (in addition to stdout)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Totals over a whole run
#[derive(Debug, Default)]
struct RunSummary {
    frames: u64,
    idle_frames: u64,
    steps: u64,
    events: u64,
    peak_particles: usize,
    last: FrameStats,
}

impl RunSummary {
    fn record(&mut self, stats: FrameStats) {
        self.frames += 1;
        self.steps += stats.stepped as u64;
        self.peak_particles = self.peak_particles.max(stats.particles);
        self.last = stats;
    }

    fn log(&self, elapsed: Duration) {
        info!("════════════════════════════════════════════════════════");
        info!("  Simulated {:?}", elapsed);
        info!(
            "  Frames: {} rendered, {} idle",
            self.frames, self.idle_frames
        );
        info!("  Events applied: {}", self.events);
        info!("  Smoother steps: {}", self.steps);
        info!("  Peak particles: {}", self.peak_particles);
        info!(
            "  Final frame: {} cursors, {} animating, {} particles",
            self.last.cursors, self.last.animating, self.last.particles
        );
        info!("════════════════════════════════════════════════════════");
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logging settings may come from the file, so read it first
    let loaded = Config::load(&args.config);
    let config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => Config::default_config(),
    };
    let config = config.with_overrides(args.entities, args.frames, args.seed);

    if args.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    init_logging(&args, &config)?;

    info!("════════════════════════════════════════════════════════");
    info!("  smooth-cursors v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {}", env!("BUILD_DATE"));
    info!("  Commit: {}", env!("GIT_HASH"));
    info!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    info!("════════════════════════════════════════════════════════");

    match loaded {
        Ok(_) => info!("Configuration loaded from {}", args.config.display()),
        Err(e) => warn!("Failed to load config: {:#}, using defaults", e),
    }
    debug!("Config: {:?}", config);

    if args.realtime {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start tokio runtime")?;
        runtime.block_on(run_realtime(&config, args.snapshot.as_deref()))
    } else {
        run_virtual(&config, args.snapshot.as_deref())
    }
}

fn new_registry(config: &Config) -> CursorRegistry {
    CursorRegistry::new(config.registry_config(), config.color_registry())
}

fn apply_all(registry: &mut CursorRegistry, events: Vec<PresenceEvent>, summary: &mut RunSummary) {
    summary.events += events.len() as u64;
    for event in events {
        registry.apply(event);
    }
}

/// Render one frame if anything is moving or fading
fn step(registry: &mut CursorRegistry, now: Instant, summary: &mut RunSummary) {
    if registry.needs_frame() {
        summary.record(registry.frame(now));
    } else {
        summary.idle_frames += 1;
    }
}

fn snapshot(
    registry: &CursorRegistry,
    config: &Config,
    now: Instant,
    path: &std::path::Path,
) -> Result<()> {
    let mut surface = PixelSurface::new(
        config.simulation.width,
        config.simulation.height,
        BACKGROUND,
    );
    registry.render(&mut surface, now);
    surface.save_png(path)
}

/// Simulate against a virtual clock, as fast as possible
fn run_virtual(config: &Config, snapshot_path: Option<&std::path::Path>) -> Result<()> {
    let sim_config = &config.simulation;
    let period = frame_period(sim_config.frame_rate);
    let mut registry = new_registry(config);
    let mut sim = NetworkSim::new(sim_config);
    let mut summary = RunSummary::default();

    info!(
        "Simulating {} frames at {} Hz with {} peers",
        sim_config.frames, sim_config.frame_rate, sim_config.entities
    );

    let start = Instant::now();
    apply_all(&mut registry, sim.join_events(), &mut summary);

    let mut elapsed = Duration::ZERO;
    for frame in 0..sim_config.frames {
        elapsed = period.saturating_mul(u32::try_from(frame).unwrap_or(u32::MAX));
        apply_all(&mut registry, sim.advance(elapsed), &mut summary);
        step(&mut registry, start + elapsed, &mut summary);

        if frame > 0 && frame % u64::from(sim_config.frame_rate.max(1)) == 0 {
            debug!(
                "t={:?}: {} animating, {} particles",
                elapsed, summary.last.animating, summary.last.particles
            );
        }
    }

    if let Some(path) = snapshot_path {
        snapshot(&registry, config, start + elapsed, path)?;
    }

    apply_all(&mut registry, sim.leave_events(), &mut summary);
    summary.log(elapsed);
    Ok(())
}

/// Feed simulated events into `tx` on the wall clock
async fn transport_task(mut sim: NetworkSim, tx: mpsc::Sender<PresenceEvent>) {
    let start = tokio::time::Instant::now();

    for event in sim.join_events() {
        if tx.send(event).await.is_err() {
            return;
        }
    }

    while let Some(next) = sim.next_due() {
        tokio::time::sleep_until(start + next).await;
        for event in sim.advance(start.elapsed()) {
            if tx.send(event).await.is_err() {
                debug!("Frame loop gone, transport stopping");
                return;
            }
        }
    }
}

/// Simulate on the wall clock until the frame budget runs out or Ctrl+C
async fn run_realtime(config: &Config, snapshot_path: Option<&std::path::Path>) -> Result<()> {
    let sim_config = &config.simulation;
    let mut registry = new_registry(config);
    let mut summary = RunSummary::default();

    let (tx, mut rx) = mpsc::channel(256);
    let transport = tokio::spawn(transport_task(NetworkSim::new(sim_config), tx));

    let mut ticker = tokio::time::interval(frame_period(sim_config.frame_rate));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        "Running in real time at {} Hz with {} peers (Ctrl+C to stop)",
        sim_config.frame_rate, sim_config.entities
    );

    let start = Instant::now();
    let mut ticks = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                step(&mut registry, Instant::now(), &mut summary);
                ticks += 1;
                if sim_config.frames > 0 && ticks >= sim_config.frames {
                    break;
                }
            }
            Some(event) = rx.recv() => {
                summary.events += 1;
                registry.apply(event);
            }
            _ = &mut shutdown => {
                info!("Received Ctrl+C, stopping");
                break;
            }
        }
    }

    transport.abort();

    if let Some(path) = snapshot_path {
        snapshot(&registry, config, Instant::now(), path)?;
    }

    summary.log(start.elapsed());
    Ok(())
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn stdout_layer(format: &str) -> BoxedLayer {
    let layer = fmt::layer().with_writer(std::io::stdout);
    match format {
        "json" => layer.json().boxed(),
        "compact" => layer.compact().boxed(),
        _ => layer.pretty().boxed(),
    }
}

fn file_layer(format: &str, file: File) -> BoxedLayer {
    let layer = fmt::layer().with_writer(file).with_ansi(false);
    match format {
        "json" => layer.json().boxed(),
        "compact" => layer.compact().boxed(),
        _ => layer.boxed(),
    }
}

fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let log_level = match args.verbose {
        0 => config.logging.level.to_lowercase(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let log_format = args
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    let log_file = args.log_file.clone().or_else(|| config.logging.file.clone());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("smooth_cursors={},warn", log_level)));

    // Stdout always, plus the log file when one is given
    let mut layers = vec![stdout_layer(&log_format)];
    if let Some(path) = &log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;
        layers.push(file_layer(&log_format, file));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    if let Some(path) = &log_file {
        info!("Logging to file: {}", path.display());
    }
    Ok(())
}
