use anyhow::Result;
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::{AppleSpawn, GameConfig, TurnRule};
use crate::snake::{Direction, Position, Snake};
use crate::TermInt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Win,
    Lose,
}

pub struct GameState {
    width: TermInt,
    height: TermInt,
    snake: Snake,
    apple: Position,
    score: usize,
    turn_rule: TurnRule,
    apple_spawn: AppleSpawn,
    rng: StdRng,
}

impl GameState {
    /// Fresh game with a random head and an apple somewhere else. Fails on a
    /// config that `GameConfig::validate` rejects.
    pub fn new(config: &GameConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let head = random_cell(&mut rng, config.width, config.height);
        let mut apple = random_cell(&mut rng, config.width, config.height);
        while apple == head {
            apple = random_cell(&mut rng, config.width, config.height);
        }

        Ok(Self::with_positions(config, head, apple, rng))
    }

    pub fn with_positions(config: &GameConfig, head: Position, apple: Position, rng: StdRng) -> Self {
        GameState {
            width: config.width,
            height: config.height,
            snake: Snake::new(head, config.cell_count()),
            apple,
            score: 0,
            turn_rule: config.turn_rule,
            apple_spawn: config.apple_spawn,
            rng,
        }
    }

    pub fn width(&self) -> TermInt {
        self.width
    }

    pub fn height(&self) -> TermInt {
        self.height
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn apple(&self) -> Position {
        self.apple
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn direction(&self) -> Direction {
        self.snake.direction()
    }

    /// One tick of movement in the current direction.
    pub fn advance(&mut self) -> Outcome {
        let new_head = self.snake.head().wrapped_step(self.snake.direction(), self.width, self.height);
        let ate = new_head == self.apple;

        self.snake.step(new_head, ate);
        if ate {
            self.score += 1;
            debug!("apple eaten at ({}, {}), score {}", new_head.x, new_head.y, self.score);
        }

        if self.snake.bites_itself() {
            return Outcome::Lose;
        }
        if self.score >= self.snake.capacity() - 1 {
            return Outcome::Win;
        }
        if ate {
            self.apple = self.spawn_apple();
        }

        Outcome::Continue
    }

    /// Whether `dir` may replace the current direction under the turn rule.
    pub fn can_turn(&self, dir: Direction) -> bool {
        let current = self.snake.direction();
        if !current.shares_axis(dir) {
            return true;
        }
        match self.turn_rule {
            TurnRule::WhenGrown => self.snake.len() == 1,
            TurnRule::Always => false,
        }
    }

    pub fn turn(&mut self, dir: Direction) -> bool {
        let allowed = self.can_turn(dir);
        if allowed {
            self.snake.set_direction(dir);
        }
        allowed
    }

    /// Applies the last acceptable direction out of one input batch. Every
    /// candidate is judged against the velocity held before the batch, so two
    /// quick turns cannot fold the snake back onto its neck.
    pub fn steer<I>(&mut self, wanted: I) -> Option<Direction>
    where
        I: IntoIterator<Item = Direction>,
    {
        let accepted = wanted.into_iter().filter(|dir| self.can_turn(*dir)).last();
        if let Some(dir) = accepted {
            self.snake.set_direction(dir);
        }
        accepted
    }

    fn spawn_apple(&mut self) -> Position {
        match self.apple_spawn {
            AppleSpawn::Anywhere => random_cell(&mut self.rng, self.width, self.height),
            AppleSpawn::FreeCells => {
                let free: Vec<Position> = (0..self.height)
                    .flat_map(|y| (0..self.width).map(move |x| Position::new(x, y)))
                    .filter(|pos| !self.snake.contains(*pos))
                    .collect();

                match free.choose(&mut self.rng) {
                    Some(pos) => *pos,
                    None => random_cell(&mut self.rng, self.width, self.height),
                }
            }
        }
    }
}

fn random_cell<R: Rng>(rng: &mut R, width: TermInt, height: TermInt) -> Position {
    Position::new(rng.gen_range(0..width), rng.gen_range(0..height))
}
