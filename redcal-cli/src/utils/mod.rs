pub mod parse;
pub mod tui;
