use crate::Node;
use crate::NodeIds;
use crate::NodeKind;

/// Alert styles keyed by the sigil that opens the paragraph.
pub const SIGILS: [(&str, AlertKind); 4] = [
	("=>", AlertKind::Success),
	("->", AlertKind::Info),
	("~>", AlertKind::Warning),
	("!>", AlertKind::Danger),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
	Success,
	Info,
	Warning,
	Danger,
}

impl AlertKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Success => "success",
			Self::Info => "info",
			Self::Warning => "warning",
			Self::Danger => "danger",
		}
	}

	pub fn opening_tag(self) -> String {
		format!("<div className=\"alert alert-{} g-type-body\">", self.as_str())
	}
}

/// Strip a leading `=> `, `-> `, `~> ` or `!> ` from the paragraph's first
/// text and report which alert it was.
fn take_sigil(paragraph: &mut Node) -> Option<AlertKind> {
	let text = paragraph.children.first_mut()?;
	let NodeKind::Text { source } = &mut text.kind else {
		return None;
	};
	let value = text.value.as_mut()?;

	for (sigil, kind) in SIGILS {
		let marker = format!("{sigil} ");
		let Some(rest) = value.strip_prefix(&marker) else {
			continue;
		};
		*value = rest.to_string();
		*source = source
			.as_deref()
			.and_then(|source| source.strip_prefix(&marker))
			.map(ToString::to_string);

		return Some(kind);
	}

	None
}

/// Wrap every alert paragraph in `root` between an opening alert `<div>` and
/// a closing `</div>`.
pub fn apply_alerts(root: &mut Node, ids: &mut NodeIds) -> usize {
	let mut count = 0;
	wrap_alerts(&mut root.children, ids, &mut count);
	count
}

fn wrap_alerts(nodes: &mut Vec<Node>, ids: &mut NodeIds, count: &mut usize) {
	let mut wrapped = Vec::with_capacity(nodes.len());

	for mut node in std::mem::take(nodes) {
		let kind = if matches!(node.kind, NodeKind::Paragraph) {
			take_sigil(&mut node)
		} else {
			wrap_alerts(&mut node.children, ids, count);
			None
		};

		match kind {
			Some(kind) => {
				*count += 1;
				wrapped.push(Node::new(ids, NodeKind::Html).with_value(kind.opening_tag()));
				wrapped.push(node);
				wrapped.push(Node::new(ids, NodeKind::Html).with_value("</div>"));
			}
			None => wrapped.push(node),
		}
	}

	*nodes = wrapped;
}
