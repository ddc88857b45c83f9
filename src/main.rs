use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use simplelog::{Config, WriteLogger};

use ansi_snake::config::{AppleSpawn, GameConfig, TurnRule, DEFAULT_GRID_SIZE, DEFAULT_TICK_MS};
use ansi_snake::game::SnakeGame;
use ansi_snake::term::TermManager;
use ansi_snake::TermInt;

#[derive(Parser)]
#[command(name = "ansi-snake", version, about = "Snake on a wrap-around grid, drawn with ANSI colors")]
struct Cli {
    /// Grid width in cells
    #[arg(long, default_value_t = DEFAULT_GRID_SIZE)]
    width: TermInt,

    /// Grid height in cells
    #[arg(long, default_value_t = DEFAULT_GRID_SIZE)]
    height: TermInt,

    /// Milliseconds per tick
    #[arg(long, default_value_t = DEFAULT_TICK_MS)]
    tick_ms: u64,

    /// When turning back along the current axis is refused
    #[arg(long, value_enum, default_value_t = TurnRule::WhenGrown)]
    turn_rule: TurnRule,

    /// Where new apples may appear
    #[arg(long, value_enum, default_value_t = AppleSpawn::Anywhere)]
    apple_spawn: AppleSpawn,

    /// Seed for a reproducible game
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file (the terminal itself is busy with the game)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log verbosity: off, error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

impl Cli {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            tick: Duration::from_millis(self.tick_ms),
            turn_rule: self.turn_rule,
            apple_spawn: self.apple_spawn,
            seed: self.seed,
            ..GameConfig::new(self.width, self.height)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        let file = File::create(path).with_context(|| format!("Error creating log file {}", path.display()))?;
        WriteLogger::init(cli.log_level, Config::default(), file).context("Error setting up logger")?;
    }

    let config = cli.game_config();
    config.validate()?;
    info!("starting {}x{} game, turn rule {:?}, apples {:?}", config.width, config.height, config.turn_rule, config.apple_spawn);

    let mut term = TermManager::new();
    term.check_size(config.width, config.height);
    term.setup()?;

    let mut game = SnakeGame::new(term, &config)?;
    let ending = game.play();
    let score = game.state().score();

    // Dropping the game hands the terminal back before anything is printed.
    drop(game);

    ending?;
    println!("Score: {}", score);
    Ok(())
}
