use std::path::PathBuf;
use std::sync::Arc;

use cadence_core::audio::SampleRing;
use cadence_core::engine::{Engine, TestPatternEngine};
use cadence_core::input::InputState;
use cadence_core::overlay::Overlay;
use cadence_core::pacer::Pacer;
use cadence_core::save::{Autosave, FsStorage, save_path_for};
use clap::{ArgAction, Parser};
use log::{LevelFilter, error, info, warn};
use simplelog::{ColorChoice, TermLogger, TerminalMode};

mod audio;
mod config;
mod error;
mod host;
mod input;
mod rom_path;
mod screenshot;
mod video;

use config::Config;
use error::StartupError;
use host::{HostOptions, SdlHost};
use input::{JoystickMap, KeyMap};
use video::Video;

#[derive(Parser, Debug)]
#[command(name = "cadence", version, about = "Run a ROM with paced audio, video and input")]
struct Args {
    /// ROM image, raw or inside a .zip archive
    rom: PathBuf,

    /// Integer window scale
    #[arg(long)]
    scale: Option<u32>,

    /// Config file [default: <config dir>/cadence/config.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show FPS and buffered audio in the overlay
    #[arg(long)]
    stats: bool,

    /// Write the save file only on exit
    #[arg(long)]
    no_autosave: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("Logger init failed: {e}");
    }
}

fn load_config(args: &Args) -> Result<Config, StartupError> {
    let mut config = match (&args.config, Config::default_path()) {
        (Some(path), _) => Config::load(path, true)?,
        (None, Some(path)) => Config::load(&path, false)?,
        (None, None) => Config::default(),
    };
    if let Some(scale) = args.scale {
        config.video.scale = scale;
    }
    if args.stats {
        config.overlay.show_stats = true;
    }
    if args.no_autosave {
        config.save.autosave = false;
    }
    Ok(config)
}

fn run(args: &Args) -> Result<(), StartupError> {
    let config = load_config(args)?;
    let key_map = KeyMap::from_bindings(&config.input.keyboard)?;
    let joystick_map = JoystickMap::from_bindings(&config.input.joystick)?;

    let rom = rom_path::load_rom(&args.rom)?;
    let mut engine = TestPatternEngine::new();
    engine.load_rom(&rom)?;
    info!("Loaded {} ({} bytes)", args.rom.display(), rom.len());
    engine.reset();

    let autosave = Autosave::attach(
        FsStorage,
        save_path_for(&args.rom),
        &mut engine,
        config.save.autosave,
    );
    info!(
        "Save file {} (autosave {})",
        autosave.path().display(),
        if autosave.is_enabled() { "on" } else { "off" }
    );
    let (width, height) = engine.display_size();
    let sample_rate = engine.sample_rate();
    let ring = Arc::new(SampleRing::new(config.audio.ring_capacity));
    let mut pacer = Pacer::new(
        engine,
        autosave,
        Arc::clone(&ring),
        InputState::new(config.input.deadzone),
        Overlay::new(config.overlay.show_stats),
    );

    let sdl = sdl2::init().map_err(StartupError::Sdl)?;
    let sdl_audio = sdl.audio().map_err(StartupError::Sdl)?;
    let (device, fade_out) = audio::open(
        &sdl_audio,
        ring,
        pacer.turbo_flag(),
        sample_rate,
        config.audio.buffer_samples,
    )?;

    let title = match args.rom.file_stem() {
        Some(stem) => format!("cadence - {}", stem.to_string_lossy()),
        None => "cadence".to_string(),
    };
    let sdl_video = sdl.video().map_err(StartupError::Sdl)?;
    let canvas = video::open_window(
        &sdl_video,
        &title,
        width,
        height,
        config.video.scale,
        config.video.vsync,
    )?;
    let texture_creator = canvas.texture_creator();
    let video = Video::new(canvas, &texture_creator, width, height)?;
    let mut host = SdlHost::new(
        &sdl,
        video,
        HostOptions {
            key_map,
            joystick_map,
            rom_path: args.rom.clone(),
        },
    )?;

    device.resume();
    let result = pacer.run(&mut host);
    audio::shut_down(&device, &fade_out);

    // A failed final save is reported, not fatal.
    if let Err(e) = result {
        warn!("Save region not persisted: {e}");
    }
    Ok(())
}
