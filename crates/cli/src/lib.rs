//! Command-line driver for repkv
//!
//! Splits into two halves the binary wires together:
//! - `parse`: one script line → one [`repkv_engine::Command`]
//! - `format`: one [`repkv_engine::Event`] → its output line(s)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod format;
pub mod parse;

pub use format::render;
pub use parse::{parse_line, ParseError};
