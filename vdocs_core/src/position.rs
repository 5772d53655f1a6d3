use serde::Deserialize;
use serde::Serialize;

/// Source location of a node, 1-indexed like the markdown parser reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
	pub start_line: usize,
	pub start_column: usize,
	pub end_line: usize,
	pub end_column: usize,
}

impl Position {
	pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
		Self {
			start_line,
			start_column,
			end_line,
			end_column,
		}
	}
}

impl From<&markdown::unist::Position> for Position {
	fn from(position: &markdown::unist::Position) -> Self {
		Self::new(
			position.start.line,
			position.start.column,
			position.end.line,
			position.end.column,
		)
	}
}
