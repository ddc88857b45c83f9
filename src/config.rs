use std::time::Duration;

use anyhow::{ensure, Result};
use clap::ValueEnum;

use crate::TermInt;

pub const DEFAULT_GRID_SIZE: TermInt = 20;
pub const DEFAULT_TICK_MS: u64 = 100;

// Each cell is two terminal columns wide, plus a score row and a help row.
const MAX_GRID_WIDTH: TermInt = TermInt::MAX / 2;
const MAX_GRID_HEIGHT: TermInt = TermInt::MAX - 2;
// The snake's ring buffer holds one slot per cell.
pub const MAX_CELLS: usize = 1 << 20;

/// When a turn onto the axis the snake is already moving along is refused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TurnRule {
    /// Only once the snake is longer than its head
    WhenGrown,
    /// At any length
    Always,
}

/// Where a fresh apple may appear.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum AppleSpawn {
    /// Any cell, including ones under the snake
    Anywhere,
    /// Only cells the snake does not cover
    FreeCells,
}

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub width: TermInt,
    pub height: TermInt,
    pub tick: Duration,
    pub turn_rule: TurnRule,
    pub apple_spawn: AppleSpawn,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            width: DEFAULT_GRID_SIZE,
            height: DEFAULT_GRID_SIZE,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            turn_rule: TurnRule::WhenGrown,
            apple_spawn: AppleSpawn::Anywhere,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn new(width: TermInt, height: TermInt) -> Self {
        GameConfig { width, height, ..Default::default() }
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.width > 0 && self.height > 0, "grid must be at least 1x1, got {}x{}", self.width, self.height);
        ensure!(self.cell_count() >= 2, "grid needs at least two cells to place the snake and an apple");
        ensure!(self.width <= MAX_GRID_WIDTH, "grid width {} exceeds {}", self.width, MAX_GRID_WIDTH);
        ensure!(self.height <= MAX_GRID_HEIGHT, "grid height {} exceeds {}", self.height, MAX_GRID_HEIGHT);
        ensure!(self.cell_count() <= MAX_CELLS, "grid has {} cells, at most {} are allowed", self.cell_count(), MAX_CELLS);
        Ok(())
    }
}
