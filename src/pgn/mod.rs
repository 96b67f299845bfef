//! PGN import and export.

mod reader;
mod tags;
mod writer;

pub use reader::read;
pub use tags::{is_valid_key, Tags, SEVEN_TAG_ROSTER, UNKNOWN_VALUE};
pub use writer::write;

/// Movetext tokens that end a game.
pub(crate) const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];
