use crate::Align;
use crate::LinkStyle;
use crate::Node;
use crate::NodeKind;
use crate::ReferenceStyle;

/// Serialize a document tree back to markdown.
///
/// Text is re-emitted from the slice it was parsed from, so escapes and
/// character references survive untouched. Block structure is rebuilt from
/// the tree, which is what lets removed ranges and spliced partials come out
/// as well formed markdown.
pub fn to_markdown(root: &Node) -> String {
	let mut output = match root.kind {
		NodeKind::Root => render_blocks(&root.children, false),
		_ => render_block(root, Bullet::Primary),
	};

	let trimmed = output.trim_end_matches('\n').len();
	output.truncate(trimmed);
	if !output.is_empty() {
		output.push('\n');
	}

	output
}

/// Consecutive lists alternate their markers, otherwise they would merge
/// into a single list when parsed again.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Bullet {
	Primary,
	Secondary,
}

fn render_blocks(nodes: &[Node], tight: bool) -> String {
	let separator = if tight { "\n" } else { "\n\n" };
	let mut output = String::new();
	let mut previous: Option<&NodeKind> = None;
	let mut bullet = Bullet::Primary;

	for node in nodes {
		let after_list = matches!(previous, Some(NodeKind::List { .. }));
		let rendered = match &node.kind {
			NodeKind::List { .. } => {
				bullet = if after_list && bullet == Bullet::Primary {
					Bullet::Secondary
				} else {
					Bullet::Primary
				};
				render_block(node, bullet)
			}
			NodeKind::Code { .. } if after_list => render_code(node, true),
			_ => render_block(node, Bullet::Primary),
		};

		if previous.is_some() {
			output.push_str(separator);
		}
		output.push_str(&rendered);
		previous = Some(&node.kind);
	}

	output
}

fn render_block(node: &Node, bullet: Bullet) -> String {
	match &node.kind {
		NodeKind::Root => render_blocks(&node.children, false),
		NodeKind::Paragraph => render_inlines(&node.children, false),
		NodeKind::Heading { depth } => {
			let content = render_inlines(&node.children, false);
			let hashes = "#".repeat(usize::from(*depth));
			if content.is_empty() {
				hashes
			} else {
				format!("{hashes} {content}")
			}
		}
		NodeKind::ThematicBreak => "***".to_string(),
		NodeKind::Blockquote => prefix_lines(&render_blocks(&node.children, false), "> ", "> "),
		NodeKind::List {
			ordered,
			start,
			spread,
		} => render_list(node, *ordered, start.unwrap_or(1), *spread, bullet),
		NodeKind::ListItem { spread, .. } => render_blocks(&node.children, !spread),
		NodeKind::Code { .. } => render_code(node, false),
		NodeKind::Definition {
			identifier,
			label,
			url,
			title,
		} => {
			let label = label.as_deref().unwrap_or(identifier);
			format!("[{label}]: {}{}", destination(url), title_suffix(title.as_deref()))
		}
		NodeKind::Table { align } => render_table(node, align),
		NodeKind::TableRow => render_inlines(&node.children, false),
		NodeKind::TableCell => render_inlines(&node.children, true),
		_ => render_inline(node, false),
	}
}

fn render_list(node: &Node, ordered: bool, start: u32, spread: bool, bullet: Bullet) -> String {
	let spread = spread
		|| node
			.children
			.iter()
			.any(|item| matches!(item.kind, NodeKind::ListItem { spread: true, .. }));
	let mut items = Vec::with_capacity(node.children.len());

	for (index, item) in node.children.iter().enumerate() {
		let marker = if ordered {
			let delimiter = if bullet == Bullet::Primary { '.' } else { ')' };
			let number = u64::from(start) + index as u64;
			format!("{number}{delimiter}")
		} else if bullet == Bullet::Primary {
			"-".to_string()
		} else {
			"*".to_string()
		};

		let mut content = render_block(item, Bullet::Primary);
		if let NodeKind::ListItem {
			checked: Some(checked),
			..
		} = item.kind
		{
			let check = if checked { "[x] " } else { "[ ] " };
			content.insert_str(0, check);
		}

		let indent = " ".repeat(marker.len() + 1);
		items.push(prefix_lines(&content, &format!("{marker} "), &indent));
	}

	items.join(if spread { "\n\n" } else { "\n" })
}

fn render_code(node: &Node, force_fence: bool) -> String {
	let NodeKind::Code {
		lang,
		meta,
		fenced,
	} = &node.kind
	else {
		return String::new();
	};
	let value = node.value.as_deref().unwrap_or_default();

	if !fenced && !force_fence && lang.is_none() && !value.trim().is_empty() {
		return prefix_lines(value, "    ", "    ");
	}

	let fence = "`".repeat(longest_run(value, '`').max(2) + 1);
	let mut info = lang.clone().unwrap_or_default();
	if let Some(meta) = meta {
		info.push(' ');
		info.push_str(meta);
	}

	if value.is_empty() {
		format!("{fence}{info}\n{fence}")
	} else {
		format!("{fence}{info}\n{value}\n{fence}")
	}
}

fn render_table(node: &Node, align: &[Align]) -> String {
	let mut lines = Vec::with_capacity(node.children.len() + 1);

	for (index, row) in node.children.iter().enumerate() {
		let cells: Vec<String> = row
			.children
			.iter()
			.map(|cell| render_inlines(&cell.children, true))
			.collect();
		lines.push(format!("| {} |", cells.join(" | ")));

		if index == 0 {
			let columns = cells.len().max(align.len());
			let delimiters: Vec<&str> = (0..columns)
				.map(|column| {
					match align.get(column).copied().unwrap_or(Align::None) {
						Align::None => "---",
						Align::Left => ":--",
						Align::Center => ":-:",
						Align::Right => "--:",
					}
				})
				.collect();
			lines.push(format!("| {} |", delimiters.join(" | ")));
		}
	}

	lines.join("\n")
}

/// `in_cell` re-escapes the `|` that table cells decode out of code spans
/// and link destinations.
fn render_inlines(nodes: &[Node], in_cell: bool) -> String {
	let mut output = String::new();
	let mut after_break = false;

	for node in nodes {
		let rendered = render_inline(node, in_cell);
		if after_break {
			output.push_str(rendered.trim_start_matches([' ', '\t']));
		} else {
			output.push_str(&rendered);
		}
		after_break = matches!(node.kind, NodeKind::Break);
	}

	output
}

fn render_inline(node: &Node, in_cell: bool) -> String {
	let value = node.value.as_deref().unwrap_or_default();
	let escape = |text: &str| {
		if in_cell {
			text.replace('|', "\\|")
		} else {
			text.to_string()
		}
	};

	match &node.kind {
		NodeKind::Text { source } => {
			match source {
				Some(source) => text_from_source(source),
				None => escape(value),
			}
		}
		NodeKind::Emphasis => format!("*{}*", render_inlines(&node.children, in_cell)),
		NodeKind::Strong => format!("**{}**", render_inlines(&node.children, in_cell)),
		NodeKind::Delete => format!("~~{}~~", render_inlines(&node.children, in_cell)),
		NodeKind::InlineCode => {
			let value = escape(value);
			let ticks = "`".repeat(longest_run(&value, '`') + 1);
			if value.starts_with('`') || value.ends_with('`') {
				format!("{ticks} {value} {ticks}")
			} else {
				format!("{ticks}{value}{ticks}")
			}
		}
		NodeKind::Break => "\\\n".to_string(),
		NodeKind::Link { url, title, style } => {
			match style {
				LinkStyle::Autolink => format!("<{}>", escape(url)),
				LinkStyle::Literal => render_inlines(&node.children, in_cell),
				LinkStyle::Inline => {
					format!(
						"[{}]({}{})",
						render_inlines(&node.children, in_cell),
						escape(&destination(url)),
						escape(&title_suffix(title.as_deref()))
					)
				}
			}
		}
		NodeKind::LinkReference {
			identifier,
			label,
			reference,
		} => {
			let text = render_inlines(&node.children, in_cell);
			match reference {
				ReferenceStyle::Full => {
					format!("[{text}][{}]", label.as_deref().unwrap_or(identifier))
				}
				ReferenceStyle::Collapsed => format!("[{text}][]"),
				ReferenceStyle::Shortcut => format!("[{text}]"),
			}
		}
		NodeKind::Comment | NodeKind::Html | NodeKind::Raw => value.to_string(),
		_ => render_block(node, Bullet::Primary),
	}
}

/// Strip the container prefixes (indentation and `>` markers) that a
/// multi-line text slice picks up from the lists and quotes around it.
fn text_from_source(source: &str) -> String {
	let mut output = String::with_capacity(source.len());

	for (index, line) in source.split('\n').enumerate() {
		if index == 0 {
			output.push_str(line);
		} else {
			output.push('\n');
			output.push_str(line.trim_start_matches([' ', '\t', '>']));
		}
	}

	output
}

fn prefix_lines(text: &str, first: &str, rest: &str) -> String {
	let mut output = String::with_capacity(text.len());

	for (index, line) in text.split('\n').enumerate() {
		let prefix = if index == 0 { first } else { rest };
		if index > 0 {
			output.push('\n');
		}
		if line.is_empty() {
			output.push_str(prefix.trim_end());
		} else {
			output.push_str(prefix);
			output.push_str(line);
		}
	}

	output
}

fn destination(url: &str) -> String {
	let needs_brackets = url.is_empty()
		|| url.chars().any(|ch| ch.is_whitespace() || ch.is_control())
		|| url.matches('(').count() != url.matches(')').count();

	if needs_brackets {
		format!("<{url}>")
	} else {
		url.to_string()
	}
}

fn title_suffix(title: Option<&str>) -> String {
	title.map_or_else(String::new, |title| {
		format!(" \"{}\"", title.replace('"', "\\\""))
	})
}

fn longest_run(value: &str, target: char) -> usize {
	let mut longest = 0;
	let mut current = 0;

	for ch in value.chars() {
		if ch == target {
			current += 1;
			longest = longest.max(current);
		} else {
			current = 0;
		}
	}

	longest
}
