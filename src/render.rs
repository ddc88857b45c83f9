//! Turns the game grid into ANSI escape sequences.
//!
//! Layout: the score sits on the top row, the board below it with `y = 0`
//! at the bottom, and the help line under the board. Every cell is two
//! columns wide so it looks roughly square.

use std::io::{self, Write};

use crossterm::queue;
use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor};
use crossterm::terminal::{Clear, ClearType};

use crate::state::GameState;
use crate::TermInt;

pub const HELP_TEXT: &str = "Use arrow keys or WASD to move, press Q to quit";
const CELL: &str = "  ";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    pub empty: Color,
    pub body: Color,
    pub head: Color,
    pub apple: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            empty: rgb(0x007FFF),
            body: rgb(0x00FF00),
            head: rgb(0x00A000),
            apple: rgb(0xFF0000),
        }
    }
}

fn rgb(hex: u32) -> Color {
    Color::Rgb { r: (hex >> 16) as u8, g: (hex >> 8) as u8, b: hex as u8 }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Cell {
    Empty,
    Body,
    Head,
    Apple,
}

pub struct Renderer {
    palette: Palette,
    cells: Vec<Cell>,
    frame: Vec<u8>,
}

impl Renderer {
    pub fn new(palette: Palette) -> Self {
        Renderer { palette, cells: vec![], frame: vec![] }
    }

    /// Clears the screen and prints the help line under a `height` row board.
    pub fn draw_intro<W: Write>(&mut self, out: &mut W, height: TermInt) -> io::Result<()> {
        self.frame.clear();
        queue!(
            self.frame,
            ResetColor,
            Clear(ClearType::All),
            MoveTo(0, help_row(height)),
            Print(HELP_TEXT)
        )?;
        out.write_all(&self.frame)
    }

    /// Redraws the score line and every cell of the board.
    pub fn draw_frame<W: Write>(&mut self, out: &mut W, state: &GameState) -> io::Result<()> {
        self.paint_cells(state);
        self.frame.clear();

        queue!(
            self.frame,
            ResetColor,
            MoveTo(0, 0),
            Print(format!("Score: {}", state.score())),
            Clear(ClearType::UntilNewLine)
        )?;

        let (width, height) = (state.width() as usize, state.height() as usize);
        for row in 0..height {
            let y = height - 1 - row;
            queue!(self.frame, MoveTo(0, row as TermInt + 1))?;

            let mut current = None;
            for cell in &self.cells[y * width..(y + 1) * width] {
                let color = self.color_of(*cell);
                if current != Some(color) {
                    queue!(self.frame, SetBackgroundColor(color))?;
                    current = Some(color);
                }
                queue!(self.frame, Print(CELL))?;
            }
        }
        queue!(self.frame, ResetColor)?;

        out.write_all(&self.frame)
    }

    /// Replaces the help line with the closing message.
    pub fn draw_exit_prompt<W: Write>(&mut self, out: &mut W, height: TermInt, won: bool) -> io::Result<()> {
        self.frame.clear();
        queue!(
            self.frame,
            ResetColor,
            MoveTo(0, help_row(height)),
            Clear(ClearType::CurrentLine)
        )?;
        if won {
            queue!(self.frame, Print("You win! "))?;
        }
        queue!(self.frame, Print("Press any key to exit"))?;
        out.write_all(&self.frame)
    }

    fn paint_cells(&mut self, state: &GameState) {
        let width = state.width() as usize;
        let index = |x: TermInt, y: TermInt| y as usize * width + x as usize;

        self.cells.clear();
        self.cells.resize(width * state.height() as usize, Cell::Empty);

        for pos in state.snake().segments().skip(1) {
            self.cells[index(pos.x, pos.y)] = Cell::Body;
        }
        let apple = state.apple();
        self.cells[index(apple.x, apple.y)] = Cell::Apple;
        let head = state.snake().head();
        self.cells[index(head.x, head.y)] = Cell::Head;
    }

    fn color_of(&self, cell: Cell) -> Color {
        match cell {
            Cell::Empty => self.palette.empty,
            Cell::Body => self.palette.body,
            Cell::Head => self.palette.head,
            Cell::Apple => self.palette.apple,
        }
    }
}

fn help_row(height: TermInt) -> TermInt {
    height + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppleSpawn, GameConfig};
    use crate::snake::{Direction, Position};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn render(state: &GameState) -> String {
        let mut out: Vec<u8> = vec![];
        Renderer::new(Palette::default()).draw_frame(&mut out, state).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_frame_bytes_for_tiny_board() {
        let config = GameConfig::new(2, 1);
        let state = GameState::with_positions(&config, Position::new(0, 0), Position::new(1, 0), StdRng::seed_from_u64(1));

        assert_eq!(
            render(&state),
            "\x1b[0m\x1b[1;1HScore: 0\x1b[K\
             \x1b[2;1H\x1b[48;2;0;160;0m  \x1b[48;2;255;0;0m  \
             \x1b[0m"
        );
    }

    #[test]
    fn test_bottom_row_holds_y_zero() {
        let config = GameConfig::new(1, 3);
        let state = GameState::with_positions(&config, Position::new(0, 0), Position::new(0, 2), StdRng::seed_from_u64(1));
        let frame = render(&state);

        let apple_at = frame.find("\x1b[2;1H\x1b[48;2;255;0;0m").unwrap();
        let empty_at = frame.find("\x1b[3;1H\x1b[48;2;0;127;255m").unwrap();
        let head_at = frame.find("\x1b[4;1H\x1b[48;2;0;160;0m").unwrap();
        assert!(apple_at < empty_at && empty_at < head_at);
    }

    #[test]
    fn test_color_switches_only_between_runs() {
        let config = GameConfig::new(5, 2);
        let mut state = GameState::with_positions(&config, Position::new(0, 0), Position::new(4, 1), StdRng::seed_from_u64(1));
        state.turn(Direction::Right);
        state.advance();
        let frame = render(&state);

        // Bottom row: empty, head, three empty cells.
        assert!(frame.contains("\x1b[3;1H\x1b[48;2;0;127;255m  \x1b[48;2;0;160;0m  \x1b[48;2;0;127;255m      "));
        assert!(frame.contains("Score: 0"));
    }

    #[test]
    fn test_body_segments_use_body_color() {
        let config = GameConfig { apple_spawn: AppleSpawn::FreeCells, ..GameConfig::new(4, 1) };
        let mut state = GameState::with_positions(&config, Position::new(0, 0), Position::new(1, 0), StdRng::seed_from_u64(3));
        state.turn(Direction::Right);
        state.advance();
        let frame = render(&state);

        assert!(frame.contains("\x1b[2;1H\x1b[48;2;0;255;0m  \x1b[48;2;0;160;0m  "));
        assert!(frame.contains("Score: 1"));
    }

    #[test]
    fn test_intro_clears_and_prints_help() {
        let mut out: Vec<u8> = vec![];
        Renderer::new(Palette::default()).draw_intro(&mut out, 20).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\x1b[2J"));
        assert!(text.ends_with(&format!("\x1b[22;1H{}", HELP_TEXT)));
    }

    #[test]
    fn test_exit_prompt() {
        let mut renderer = Renderer::new(Palette::default());

        let mut out: Vec<u8> = vec![];
        renderer.draw_exit_prompt(&mut out, 20, true).unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("\x1b[22;1H\x1b[2KYou win! Press any key to exit"));

        let mut out: Vec<u8> = vec![];
        renderer.draw_exit_prompt(&mut out, 20, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("You win!"));
        assert!(text.ends_with("Press any key to exit"));
    }
}
