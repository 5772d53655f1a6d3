use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::Node;
use crate::NodeIds;
use crate::NodeKind;
use crate::PipelineError;
use crate::PipelineResult;
use crate::parse_markdown;

static INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"^@include\s['"](.+)['"]$"#).expect("include pattern is valid")
});

/// The path named by an `@include 'path'` paragraph.
pub fn include_target(node: &Node) -> Option<&str> {
	if !matches!(node.kind, NodeKind::Paragraph) {
		return None;
	}

	let first = node.children.first()?;
	if !matches!(first.kind, NodeKind::Text { .. }) {
		return None;
	}

	let captures = INCLUDE.captures(first.value.as_deref()?)?;
	captures.get(1).map(|target| target.as_str())
}

fn is_markdown(path: &Path) -> bool {
	path.extension()
		.and_then(|extension| extension.to_str())
		.is_some_and(|extension| matches!(extension, "md" | "mdx"))
}

/// Replace every `@include` paragraph in `root` with the content of the file
/// it names, resolved against `partials_dir`.
///
/// Markdown partials are parsed with the document's id allocator and resolved
/// recursively. Anything else becomes a single literal block tagged with the
/// file extension.
pub fn resolve_partials(
	root: &mut Node,
	file: &Path,
	partials_dir: &Path,
	ids: &mut NodeIds,
) -> PipelineResult<()> {
	let mut resolver = PartialResolver {
		partials_dir,
		ids,
		stack: vec![canonical(file)],
	};

	resolver.resolve_children(&mut root.children, file)
}

struct PartialResolver<'a> {
	partials_dir: &'a Path,
	ids: &'a mut NodeIds,
	/// Files currently being expanded, outermost first.
	stack: Vec<PathBuf>,
}

impl PartialResolver<'_> {
	fn resolve_children(&mut self, nodes: &mut Vec<Node>, file: &Path) -> PipelineResult<()> {
		let mut resolved = Vec::with_capacity(nodes.len());

		for mut node in std::mem::take(nodes) {
			if let Some(target) = include_target(&node) {
				let target = target.to_string();
				resolved.extend(self.include(&node, &target, file)?);
			} else {
				self.resolve_children(&mut node.children, file)?;
				resolved.push(node);
			}
		}

		*nodes = resolved;
		Ok(())
	}

	fn include(&mut self, marker: &Node, target: &str, file: &Path) -> PipelineResult<Vec<Node>> {
		let path = self.partials_dir.join(target);
		let contents = match std::fs::read_to_string(&path) {
			Ok(contents) => contents,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(PipelineError::MissingPartial {
					file: file.display().to_string(),
					partial: path.display().to_string(),
					line: marker.position.map_or(0, |position| position.start_line),
					column: marker.position.map_or(0, |position| position.start_column),
				});
			}
			Err(e) => return Err(e.into()),
		};

		if !is_markdown(&path) {
			let lang = path
				.extension()
				.map(|extension| extension.to_string_lossy().into_owned());
			let code = Node::new(
				self.ids,
				NodeKind::Code {
					lang,
					meta: None,
					fenced: true,
				},
			)
			.with_value(contents.trim());

			return Ok(vec![code]);
		}

		let canonical_path = canonical(&path);
		if self.stack.contains(&canonical_path) {
			let chain = self
				.stack
				.iter()
				.chain(std::iter::once(&canonical_path))
				.map(|path| path.display().to_string())
				.collect::<Vec<_>>()
				.join(" -> ");

			return Err(PipelineError::PartialCycle {
				file: file.display().to_string(),
				chain,
			});
		}

		tracing::debug!(partial = %path.display(), "including partial");
		let mut tree = parse_markdown(&contents, self.ids)?;
		self.stack.push(canonical_path);
		self.resolve_children(&mut tree.children, &path)?;
		self.stack.pop();

		Ok(tree.children)
	}
}

fn canonical(path: &Path) -> PathBuf {
	std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
