//! # OZONE Headless Client
//!
//! Runs the render core against a seeded demo world without a window or GPU.
//! Every device call goes to the recording device, so a run exercises culling,
//! scheduling, the effects thread and the offscreen target lifecycle exactly
//! as a windowed client would.
//!
//! ```bash
//! # 600 frames with the default configuration
//! ./ozone
//!
//! # Custom configuration, per-frame tracing
//! RUST_LOG=ozone_render=trace ./ozone --config ozone.toml --frames 120
//! ```

mod demo;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ozone_core::Vec3;
use ozone_render::{Camera, DrawRecorder, EngineConfig, HeadlessDevice, RenderEngine, RenderResult, UpdateFlags};
use parking_lot::RwLock;
use tracing_subscriber::EnvFilter;

use demo::{DemoSettings, Simulation};

/// Radius of the camera's orbit around the world origin.
const ORBIT_RADIUS: f32 = 120.0;
/// Orbit step per frame, radians.
const ORBIT_STEP: f32 = 0.005;
/// Frames between progress reports.
const REPORT_INTERVAL: u64 = 120;

/// OZONE headless client - run the render core without a window
#[derive(Parser, Debug)]
#[command(name = "ozone")]
#[command(about = "Run the OZONE render core on a demo world without a window")]
struct Args {
    /// Engine configuration file (TOML). Defaults apply when omitted.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Frames to render
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Random seed for the demo world
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Window width in pixels
    #[arg(long, default_value_t = 1280)]
    width: i32,

    /// Window height in pixels
    #[arg(long, default_value_t = 720)]
    height: i32,

    /// Cells per world axis
    #[arg(long, default_value_t = 64)]
    cells: i32,

    /// Do not start the effects thread
    #[arg(long)]
    no_effects: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();

    if let Err(err) = run(&args) {
        tracing::error!(%err, "ozone: fatal error");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> RenderResult<()> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    if args.no_effects {
        config.effects.enabled = false;
    }

    let settings = DemoSettings {
        cells: args.cells,
        ..DemoSettings::default()
    };
    let orbis = Arc::new(RwLock::new(demo::build(args.seed, &settings)));
    let mut simulation = Simulation::new(args.seed, &orbis.read());

    let mut engine = RenderEngine::init(config, HeadlessDevice::new(), Arc::clone(&orbis), args.width, args.height)?;
    engine.load()?;

    let mut sink = DrawRecorder::new();
    let mut draws = 0_u64;

    for frame in 0..args.frames {
        simulation.tick(&mut orbis.write());
        orbit(engine.camera_mut(), frame);

        engine.update(UpdateFlags::ALL, &mut sink);

        draws += sink.calls.len() as u64;
        sink.calls.clear();
        engine.device_mut().take_calls();

        if frame % REPORT_INTERVAL == 0 {
            let camera = engine.camera();
            tracing::info!(
                frame,
                objects_staged = engine.stats().objects_staged,
                flash = camera.flash(),
                shake = camera.shake(),
                "ozone: progress"
            );
        }
    }

    engine.unload();

    let stats = engine.stats();
    tracing::info!(
        frames = stats.frames,
        draws,
        fps = stats.fps(),
        frame_ms = stats.frame_time_ms(),
        prepare_us = stats.prepare_micros,
        geometry_us = stats.geometry_micros,
        effects_wait_us = stats.effects_wait_micros,
        cells_scheduled = stats.cells_scheduled,
        cells_culled = stats.cells_culled,
        scans = engine.effects().scans(),
        "ozone: run complete"
    );

    engine.destroy();
    Ok(())
}

/// Circles the world origin, looking slightly down at it.
#[allow(clippy::cast_precision_loss)]
fn orbit(camera: &mut Camera, frame: u64) {
    let angle = frame as f32 * ORBIT_STEP;
    camera.p = Vec3::new(ORBIT_RADIUS * angle.cos(), ORBIT_RADIUS * angle.sin(), 30.0);
    camera.look_at(Vec3::ZERO);
}
