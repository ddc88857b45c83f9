use std::{thread::sleep, time::Duration};

use anyhow::{Context, Result};
use log::info;

use crate::config::GameConfig;
use crate::input::KeyDecoder;
use crate::render::{Palette, Renderer};
use crate::state::{GameState, Outcome};
use crate::term::Console;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ending {
    Won,
    Lost,
    Quit,
}

pub struct SnakeGame<C: Console> {
    console: C,
    state: GameState,
    renderer: Renderer,
    tick: Duration,
    input: Vec<u8>,
    decoder: KeyDecoder,
}

impl<C: Console> SnakeGame<C> {
    pub fn new(console: C, config: &GameConfig) -> Result<Self> {
        Ok(Self::with_state(console, GameState::new(config)?, config.tick))
    }

    pub fn with_state(console: C, state: GameState, tick: Duration) -> Self {
        SnakeGame {
            console,
            state,
            renderer: Renderer::new(Palette::default()),
            tick,
            input: vec![],
            decoder: KeyDecoder::new(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// Runs ticks until the snake wins, dies or the player quits. Every ending
    /// closes with the prompt, which waits for one more key.
    pub fn play(&mut self) -> Result<Ending> {
        self.renderer.draw_intro(&mut self.console, self.state.height()).context("Error drawing board")?;

        let ending = loop {
            match self.state.advance() {
                Outcome::Win => break Ending::Won,
                Outcome::Lose => break Ending::Lost,
                Outcome::Continue => {}
            }

            self.renderer.draw_frame(&mut self.console, &self.state).context("Error drawing frame")?;
            self.console.flush().context("Error flushing")?;

            sleep(self.tick);

            self.input.clear();
            self.console.read_available(&mut self.input).context("Error reading input")?;
            let batch = self.decoder.feed(&self.input);
            if batch.quit {
                break Ending::Quit;
            }
            self.state.steer(batch.turns);
        };

        info!("game over: {:?} with score {}", ending, self.state.score());

        self.show_ending(ending == Ending::Won)?;
        Ok(ending)
    }

    fn show_ending(&mut self, won: bool) -> Result<()> {
        // Final position first, so the last score is on screen.
        self.renderer.draw_frame(&mut self.console, &self.state).context("Error drawing frame")?;
        self.renderer
            .draw_exit_prompt(&mut self.console, self.state.height(), won)
            .context("Error drawing exit prompt")?;
        self.console.flush().context("Error flushing")?;
        self.console.wait_for_key().context("Error waiting for key")
    }
}
