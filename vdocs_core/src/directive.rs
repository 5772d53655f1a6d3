use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::MarkerKind;
use crate::Node;
use crate::NodeId;
use crate::NodeKind;
use crate::PipelineError;
use crate::PipelineResult;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^\s*<!--\s+(BEGIN|END):\s+(.*?)\s+-->\s*$").expect("marker pattern is valid")
});

/// A `BEGIN`/`END` delimited region of a document. `start` and `end` are the
/// ids of the two marker nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectiveBlock {
	pub start: NodeId,
	pub end: NodeId,
	/// The directive text shared by both markers, e.g. `Vault:>=v1.21.x`.
	pub content: String,
	pub start_line: usize,
	pub end_line: usize,
}

/// A recognised marker comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker<'a> {
	pub kind: MarkerKind,
	pub content: &'a str,
}

/// Match `value` against the marker syntax. Returns `None` for anything that
/// is not a `BEGIN`/`END` comment. The content may be empty.
pub fn parse_marker(value: &str) -> Option<Marker<'_>> {
	let captures = MARKER.captures(value)?;
	let kind = match captures.get(1)?.as_str() {
		"BEGIN" => MarkerKind::Begin,
		_ => MarkerKind::End,
	};
	let content = captures.get(2).map_or("", |content| content.as_str().trim());

	Some(Marker { kind, content })
}

/// Whether `node` can carry a marker: comments, and literal blocks that were
/// parsed from the document (indented comments come out as code). Literal
/// blocks created from non-markdown partials have no position and are never
/// markers.
fn marker_candidate(node: &Node) -> Option<(&str, usize)> {
	let line = node.position?.end_line;
	match node.kind {
		NodeKind::Comment | NodeKind::Code { .. } => Some((node.value.as_deref()?, line)),
		_ => None,
	}
}

struct OpenBlock<'a> {
	start: NodeId,
	content: &'a str,
	line: usize,
}

/// Collect every directive block in `root` in document order.
///
/// Blocks never nest, and every `BEGIN` must be closed by an `END` carrying
/// the same directive.
pub fn parse_directive_blocks(root: &Node) -> PipelineResult<Vec<DirectiveBlock>> {
	let mut markers = Vec::new();
	root.walk(&mut |node| {
		if let Some((value, line)) = marker_candidate(node) {
			if let Some(marker) = parse_marker(value) {
				markers.push((node.id, marker, line));
			}
		}
	});

	let mut blocks = Vec::new();
	let mut open: Option<OpenBlock<'_>> = None;

	for (id, marker, line) in markers {
		match marker.kind {
			MarkerKind::Begin => {
				if let Some(current) = &open {
					return Err(PipelineError::NestedBlock {
						line,
						open_line: current.line,
					});
				}
				if marker.content.is_empty() {
					return Err(PipelineError::EmptyDirective {
						marker: MarkerKind::Begin,
						line,
					});
				}

				open = Some(OpenBlock {
					start: id,
					content: marker.content,
					line,
				});
			}
			MarkerKind::End => {
				let Some(current) = open.take() else {
					return Err(PipelineError::UnmatchedEnd {
						content: marker.content.to_string(),
						line,
					});
				};
				if marker.content.is_empty() {
					return Err(PipelineError::EmptyDirective {
						marker: MarkerKind::End,
						line,
					});
				}
				if marker.content != current.content {
					return Err(PipelineError::MismatchedBlock {
						begin: current.content.to_string(),
						begin_line: current.line,
						end: marker.content.to_string(),
						end_line: line,
					});
				}

				blocks.push(DirectiveBlock {
					start: current.start,
					end: id,
					content: current.content.to_string(),
					start_line: current.line,
					end_line: line,
				});
			}
		}
	}

	if let Some(current) = open {
		return Err(PipelineError::UnclosedBlock {
			content: current.content.to_string(),
			line: current.line,
		});
	}

	Ok(blocks)
}
