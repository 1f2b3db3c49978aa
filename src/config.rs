use anyhow::{Context, Result};
use clap::Parser;
use std::{fs::File, path::PathBuf};

use crate::model::Hsl;

/// Vibrant presets that read well on a black terminal.
pub(crate) const PALETTE: [Hsl; 8] = [
    Hsl::new(0, 100, 60),   // red
    Hsl::new(30, 100, 60),  // orange
    Hsl::new(45, 100, 60),  // yellow
    Hsl::new(140, 100, 45), // green
    Hsl::new(200, 100, 60), // cyan
    Hsl::new(260, 100, 65), // purple
    Hsl::new(300, 100, 60), // magenta
    Hsl::new(330, 95, 60),  // pink
];

pub(crate) const INITIAL_CIRCLES: usize = 10;

pub(crate) const LEFT_PCT: (f64, f64) = (5.0, 95.0);
pub(crate) const SIZE_PX: (f64, f64) = (28.0, 120.0);
pub(crate) const RISE_MS: (f64, f64) = (25_000.0, 60_000.0);
pub(crate) const SPAWN_DELAY_MS: (f64, f64) = (280.0, 780.0);

pub(crate) const SPLATTER_LIFETIME_MS: (f64, f64) = (900.0, 1600.0);
pub(crate) const SPLATTER_GRACE_MS: u64 = 100;

pub(crate) const FLASH_MS: u64 = 600;

/// Braille dot edge length in viewport pixels.
pub(crate) const PX_PER_DOT: f32 = 4.0;

#[derive(Parser, Debug, Clone)]
#[command(name = "colorpop")]
#[command(about = "Pop rising color bubbles in your terminal", long_about = None)]
pub(crate) struct Args {
    /// Frame cap (clamped to 10..=240)
    #[arg(long, default_value_t = 60)]
    pub(crate) fps: u32,

    /// RNG seed; random if omitted
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Render braille dots without color
    #[arg(long, default_value_t = false)]
    pub(crate) no_color: bool,

    /// Start with the status line hidden
    #[arg(long, default_value_t = false)]
    pub(crate) no_hud: bool,

    /// Write logs here (filter with RUST_LOG); stdout belongs to the canvas
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,
}

impl Args {
    pub(crate) fn frame_cap(&self) -> u32 {
        self.fps.clamp(10, 240)
    }
}

pub(crate) fn init_logging(args: &Args) -> Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("could not create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("logger already initialized")?;
    Ok(())
}
