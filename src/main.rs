mod app;
mod input;
mod storage;
mod term;

use clap::Parser;
use std::path::PathBuf;

/// Falling-sand particle sandbox in the terminal.
#[derive(Parser, Debug)]
#[command(name = "sandpit", version, about)]
pub(crate) struct Args {
    /// Field width in simulation units (overrides the config file)
    #[arg(long)]
    width: Option<u32>,

    /// Field height in simulation units (overrides the config file)
    #[arg(long)]
    height: Option<u32>,

    /// Size the field to the terminal's braille resolution
    #[arg(long, default_value_t = false)]
    fit: bool,

    /// Particle pool capacity
    #[arg(long)]
    max_particles: Option<usize>,

    /// Seed for the simulation's random source
    #[arg(long)]
    seed: Option<u64>,

    /// FPS cap; one simulation step per frame while running
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// JSON config file (defaults to the project data directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scene snapshot to load at startup; also the save target
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Start paused
    #[arg(long, default_value_t = false)]
    paused: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    app::run(args)
}
