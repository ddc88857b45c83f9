pub mod config;
pub mod game;
pub mod input;
pub mod render;
pub mod snake;
pub mod state;
pub mod term;

/// Terminal coordinates, as crossterm counts them.
pub type TermInt = u16;
