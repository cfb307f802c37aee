pub mod commands;
pub mod terminal;

pub use terminal::TerminalUI;
