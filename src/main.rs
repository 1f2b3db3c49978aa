mod app;
mod config;
mod effects;
mod input;
mod model;
mod random;
mod render;
mod scene;
mod timers;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = config::Args::parse();
    config::init_logging(&args)?;
    app::run(args)
}
