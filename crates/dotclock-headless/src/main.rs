mod config;
mod error;
mod input;
mod pacer;
mod screenshot;
mod session;

use clap::Parser;
use config::{HeadlessConfig, Settings};
use error::HostError;
use input::HeldButton;
use log::{error, info};
use session::Session;
use std::path::PathBuf;
use std::process::ExitCode;

/// Run a DMG program image without a window.
#[derive(Parser, Debug)]
#[command(name = "dotclock-headless", version)]
struct Args {
    /// Path to ROM file
    rom: PathBuf,

    /// Path to a 256-byte boot ROM; without one execution starts at 0x0100
    #[arg(long)]
    bootrom: Option<PathBuf>,

    /// TOML file with default settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective settings to this TOML file before running
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Number of frames to run
    #[arg(long)]
    frames: Option<u64>,

    /// Number of CPU cycles to run
    #[arg(long)]
    cycles: Option<u64>,

    /// Pace emulation to the 4.194304 MHz hardware clock
    #[arg(long)]
    realtime: bool,

    /// Button held down for the whole run (repeatable)
    #[arg(long, value_enum)]
    hold: Vec<HeldButton>,

    /// Save the last frame as a 160x144 PNG on exit
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Echo serial output to stdout
    #[arg(long)]
    serial: bool,

    /// Enable debug logging of CPU state
    #[arg(long)]
    debug: bool,
}

impl Args {
    /// Merge over `cfg`: flags given on the command line win.
    fn into_settings(self, cfg: HeadlessConfig) -> Settings {
        let mut settings = Settings::from_config(self.rom, cfg);
        if self.bootrom.is_some() {
            settings.bootrom = self.bootrom;
        }
        if self.frames.is_some() {
            settings.frames = self.frames;
        }
        if self.cycles.is_some() {
            settings.cycles = self.cycles;
        }
        if !self.hold.is_empty() {
            settings.hold = self.hold;
        }
        if self.screenshot.is_some() {
            settings.screenshot = self.screenshot;
        }
        settings.realtime |= self.realtime;
        settings.serial |= self.serial;
        settings.debug = self.debug;
        settings
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn run(args: Args) -> Result<(), HostError> {
    let cfg = match &args.config {
        Some(path) => config::load_from_file(path)?,
        None => HeadlessConfig::default(),
    };
    let save_path = args.save_config.clone();
    let settings = args.into_settings(cfg);
    if let Some(path) = save_path {
        config::save_to_file(&path, &settings.to_config())?;
        info!("saved settings to {}", path.display());
    }

    let mut session = Session::new(settings)?;
    session.run()?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    info!("Starting emulator");
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
