mod fruit;
mod game;
mod grid;
mod input;
mod session;
mod snake;
mod term;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use rand::Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use grid::{DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH};

#[derive(Parser)]
#[command(name = "fruit-snake", about = "Eat the good fruit, avoid the apples")]
struct Args {
    /// Field width in cells, shrunk to fit the terminal
    #[arg(long, default_value_t = DEFAULT_GRID_WIDTH)]
    width: i32,

    /// Field height in cells, shrunk to fit the terminal
    #[arg(long, default_value_t = DEFAULT_GRID_HEIGHT)]
    height: i32,

    /// Seed for fruit placement; random if not given
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file. The terminal is busy with the game.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("Could not create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run(game: &mut game::SnakeGame) -> Result<()> {
    game.initialize()?;

    if game.show_intro()? {
        game.play()?;
    }

    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(seed, "starting");

    let mut game = game::SnakeGame::new(args.width, args.height, seed)?;

    // The terminal has to be handed back even when the game fails
    let res = run(&mut game);
    let restored = game.restore();
    res?;
    restored
}
