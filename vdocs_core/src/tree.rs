use markdown::ParseOptions;
use markdown::mdast;
use markdown::to_mdast;
use serde::Serialize;

use crate::PipelineError;
use crate::PipelineResult;
use crate::Position;

/// Identity of a node inside one document build. Directive blocks refer to
/// their marker nodes by id, so removal never depends on line numbers (which
/// collide once partials from several files are spliced together).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u32);

/// Allocates [`NodeId`]s for a single document. Partials spliced into the
/// document must be parsed with the same allocator.
#[derive(Debug, Default)]
pub struct NodeIds {
	next: u32,
}

impl NodeIds {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn next_id(&mut self) -> NodeId {
		let id = NodeId(self.next);
		self.next += 1;
		id
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Align {
	None,
	Left,
	Center,
	Right,
}

impl From<&mdast::AlignKind> for Align {
	fn from(kind: &mdast::AlignKind) -> Self {
		match kind {
			mdast::AlignKind::Left => Self::Left,
			mdast::AlignKind::Center => Self::Center,
			mdast::AlignKind::Right => Self::Right,
			mdast::AlignKind::None => Self::None,
		}
	}
}

/// How a link reference names its definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReferenceStyle {
	/// `[text][label]`
	Full,
	/// `[text][]`
	Collapsed,
	/// `[text]`
	Shortcut,
}

impl From<&mdast::ReferenceKind> for ReferenceStyle {
	fn from(kind: &mdast::ReferenceKind) -> Self {
		match kind {
			mdast::ReferenceKind::Full => Self::Full,
			mdast::ReferenceKind::Collapsed => Self::Collapsed,
			mdast::ReferenceKind::Shortcut => Self::Shortcut,
		}
	}
}

/// The syntax a link was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkStyle {
	/// `[text](url "title")`
	Inline,
	/// `<https://example.com>`
	Autolink,
	/// A bare `https://example.com` picked up by GFM.
	Literal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub enum NodeKind {
	Root,
	Paragraph,
	Heading {
		depth: u8,
	},
	ThematicBreak,
	Blockquote,
	List {
		ordered: bool,
		start: Option<u32>,
		spread: bool,
	},
	ListItem {
		spread: bool,
		checked: Option<bool>,
	},
	/// A literal block. `value` holds the code.
	Code {
		lang: Option<String>,
		meta: Option<String>,
		fenced: bool,
	},
	/// An HTML comment. `value` holds the full comment text.
	Comment,
	/// Embedded markup (HTML or JSX) that is not a comment.
	Html,
	/// Plain text. `value` is the decoded text, `source` the text exactly as
	/// authored (escapes included) when it came from a parsed file.
	Text {
		source: Option<String>,
	},
	Emphasis,
	Strong,
	Delete,
	InlineCode,
	Break,
	Link {
		url: String,
		title: Option<String>,
		style: LinkStyle,
	},
	Definition {
		identifier: String,
		label: Option<String>,
		url: String,
		title: Option<String>,
	},
	LinkReference {
		identifier: String,
		label: Option<String>,
		reference: ReferenceStyle,
	},
	Table {
		align: Vec<Align>,
	},
	TableRow,
	TableCell,
	/// A construct the pipeline never looks inside (images, footnotes, ...).
	/// `value` holds its authored source.
	Raw,
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
	pub id: NodeId,
	pub kind: NodeKind,
	pub value: Option<String>,
	pub children: Vec<Node>,
	pub position: Option<Position>,
}

impl Node {
	pub fn new(ids: &mut NodeIds, kind: NodeKind) -> Self {
		Self {
			id: ids.next_id(),
			kind,
			value: None,
			children: Vec::new(),
			position: None,
		}
	}

	#[must_use]
	pub fn with_value(mut self, value: impl Into<String>) -> Self {
		self.value = Some(value.into());
		self
	}

	/// Whether a node with `id` exists anywhere in this subtree.
	pub fn contains(&self, id: NodeId) -> bool {
		self.id == id || self.children.iter().any(|child| child.contains(id))
	}

	/// Visit every node depth-first, parents before children.
	pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
		visit(self);
		for child in &self.children {
			child.walk(visit);
		}
	}

	/// Mutable variant of [`Node::walk`].
	pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Node)) {
		visit(self);
		for child in &mut self.children {
			child.walk_mut(visit);
		}
	}
}

/// Whether `value`, once trimmed, is a single HTML comment.
pub fn is_comment_text(value: &str) -> bool {
	let trimmed = value.trim();
	trimmed.starts_with("<!--") && trimmed.ends_with("-->")
}

/// Parse markdown into a document tree, allocating node ids from `ids`.
pub fn parse_markdown(source: &str, ids: &mut NodeIds) -> PipelineResult<Node> {
	let options = ParseOptions::gfm();
	let mdast = to_mdast(source, &options).map_err(|e| PipelineError::Markdown(e.to_string()))?;
	let mut converter = Converter { source, ids };

	Ok(converter.convert(&mdast))
}

struct Converter<'a> {
	source: &'a str,
	ids: &'a mut NodeIds,
}

impl Converter<'_> {
	fn convert(&mut self, node: &mdast::Node) -> Node {
		let (kind, value) = match node {
			mdast::Node::Root(_) => (NodeKind::Root, None),
			mdast::Node::Paragraph(_) => (NodeKind::Paragraph, None),
			mdast::Node::Heading(heading) => {
				(
					NodeKind::Heading {
						depth: heading.depth,
					},
					None,
				)
			}
			mdast::Node::ThematicBreak(_) => (NodeKind::ThematicBreak, None),
			mdast::Node::Blockquote(_) => (NodeKind::Blockquote, None),
			mdast::Node::List(list) => {
				(
					NodeKind::List {
						ordered: list.ordered,
						start: list.start,
						spread: list.spread,
					},
					None,
				)
			}
			mdast::Node::ListItem(item) => {
				(
					NodeKind::ListItem {
						spread: item.spread,
						checked: item.checked,
					},
					None,
				)
			}
			mdast::Node::Code(code) => {
				let fenced = self.slice(node).is_some_and(|raw| {
					let raw = raw.trim_start();
					raw.starts_with("```") || raw.starts_with("~~~")
				});
				(
					NodeKind::Code {
						lang: code.lang.clone(),
						meta: code.meta.clone(),
						fenced,
					},
					Some(code.value.clone()),
				)
			}
			mdast::Node::Html(html) => {
				let kind = if is_comment_text(&html.value) {
					NodeKind::Comment
				} else {
					NodeKind::Html
				};
				(kind, Some(html.value.clone()))
			}
			mdast::Node::Text(text) => {
				(
					NodeKind::Text {
						source: self.slice(node).map(ToString::to_string),
					},
					Some(text.value.clone()),
				)
			}
			mdast::Node::Emphasis(_) => (NodeKind::Emphasis, None),
			mdast::Node::Strong(_) => (NodeKind::Strong, None),
			mdast::Node::Delete(_) => (NodeKind::Delete, None),
			mdast::Node::InlineCode(code) => (NodeKind::InlineCode, Some(code.value.clone())),
			mdast::Node::Break(_) => (NodeKind::Break, None),
			mdast::Node::Link(link) => {
				let style = match self.slice(node).and_then(|raw| raw.chars().next()) {
					Some('[') => LinkStyle::Inline,
					Some('<') => LinkStyle::Autolink,
					_ => LinkStyle::Literal,
				};
				(
					NodeKind::Link {
						url: link.url.clone(),
						title: link.title.clone(),
						style,
					},
					None,
				)
			}
			mdast::Node::Definition(definition) => {
				(
					NodeKind::Definition {
						identifier: definition.identifier.clone(),
						label: definition.label.clone(),
						url: definition.url.clone(),
						title: definition.title.clone(),
					},
					None,
				)
			}
			mdast::Node::LinkReference(reference) => {
				(
					NodeKind::LinkReference {
						identifier: reference.identifier.clone(),
						label: reference.label.clone(),
						reference: ReferenceStyle::from(&reference.reference_kind),
					},
					None,
				)
			}
			mdast::Node::Table(table) => {
				(
					NodeKind::Table {
						align: table.align.iter().map(Align::from).collect(),
					},
					None,
				)
			}
			mdast::Node::TableRow(_) => (NodeKind::TableRow, None),
			mdast::Node::TableCell(_) => (NodeKind::TableCell, None),
			_ => {
				// Opaque: keep the authored source and do not descend.
				let raw = self.slice(node).unwrap_or_default().to_string();
				return Node {
					id: self.ids.next_id(),
					kind: NodeKind::Raw,
					value: Some(raw),
					children: Vec::new(),
					position: node.position().map(Position::from),
				};
			}
		};

		let id = self.ids.next_id();
		let children = node
			.children()
			.map(|children| children.iter().map(|child| self.convert(child)).collect())
			.unwrap_or_default();

		Node {
			id,
			kind,
			value,
			children,
			position: node.position().map(Position::from),
		}
	}

	fn slice(&self, node: &mdast::Node) -> Option<&str> {
		let position = node.position()?;
		self.source.get(position.start.offset..position.end.offset)
	}
}
