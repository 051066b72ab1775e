use std::path::PathBuf;

use clap::Parser;

use rust_orrery::camera::Viewport;
use rust_orrery::driver::{FrameDriver, InputEvent};
use rust_orrery::file::{default_scene, read_file};
use rust_orrery::options::Options;
use rust_orrery::render::RecordingBackend;
use rust_orrery::OrreryError;

/// Runs a scene headlessly for a fixed number of frames and reports where
/// every body ended up.
#[derive(Debug, Parser)]
struct Args {
    /// Scene file; defaults to the built-in solar system
    #[arg(long)]
    scene: Option<PathBuf>,
    /// Options file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the effective options to this file before running
    #[arg(long)]
    save_config: Option<PathBuf>,
    #[arg(long, default_value_t = 600)]
    frames: usize,
    #[arg(long, default_value_t = 60.0)]
    fps: f64,
    #[arg(long, default_value_t = 800)]
    width: u32,
    #[arg(long, default_value_t = 600)]
    height: u32,
    /// Key presses as FRAME:CODE, e.g. `120:KeyW` or `300:p`
    #[arg(long = "key", value_parser = parse_key_press)]
    keys: Vec<(usize, InputEvent)>,
}

fn parse_key_press(s: &str) -> Result<(usize, InputEvent), String> {
    let (frame, code) = s
        .split_once(':')
        .ok_or_else(|| format!("expected FRAME:CODE, got {s}"))?;
    let frame = frame
        .parse()
        .map_err(|e| format!("bad frame number {frame}: {e}"))?;
    let event = InputEvent::from_code(code).ok_or_else(|| format!("unknown key code {code}"))?;
    Ok((frame, event))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(mut args: Args) -> Result<(), OrreryError> {
    if !(args.fps > 0.0 && args.fps.is_finite()) {
        return Err(OrreryError::Configuration(format!(
            "frame rate must be positive, got {}",
            args.fps
        )));
    }

    let orrery = match &args.scene {
        Some(path) => read_file(path)?,
        None => default_scene()?,
    };
    let options = match &args.config {
        Some(path) => Options::load(path)?,
        None => Options::default(),
    };
    if let Some(path) = &args.save_config {
        options.save(path)?;
        log::info!("wrote options to {}", path.display());
    }

    let viewport = Viewport::new(args.width, args.height)?;
    let mut driver = FrameDriver::new(RecordingBackend::new(), orrery, options, viewport)?;

    // Run up to each key press, apply it, and carry on
    args.keys.sort_by_key(|&(frame, _)| frame);
    let frame_time = 1.0 / args.fps;
    let mut now = 0.0;
    let mut clock = || {
        let t = now;
        now += frame_time;
        t
    };
    for (frame, event) in args.keys.iter().copied() {
        let target = frame.min(args.frames);
        let remaining = target.saturating_sub(driver.frames());
        driver.run(&mut clock, Some(remaining))?;
        driver.handle_event(event);
    }
    let remaining = args.frames.saturating_sub(driver.frames());
    driver.run(&mut clock, Some(remaining))?;

    println!(
        "After {} frames ({:.2} time units, {:.1} fps):",
        driver.frames(),
        driver.sim_time(),
        driver.controller().fps()
    );
    for body in driver.orrery().bodies() {
        let p = body.position();
        println!(
            "- {:<10} ({:>9.3}, {:>9.3}, {:>9.3})  angle {:>6.1} deg",
            body.name(),
            p.x,
            p.y,
            p.z,
            body.current_angle().to_degrees()
        );
    }

    let backend = driver.shutdown()?;
    log::info!(
        "{} draw calls recorded, {} buffers still live",
        backend.draws().count(),
        backend.live_buffers()
    );
    Ok(())
}
