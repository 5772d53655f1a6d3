use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use regex::Regex;
use regex::RegexBuilder;
use serde::Deserialize;
use url::Url;

use crate::Node;
use crate::NodeKind;
use crate::PipelineError;
use crate::PipelineResult;

/// File name of the redirect list inside a redirects directory.
pub const REDIRECTS_FILE: &str = "redirects.json";

const DEFAULT_PARAM_PATTERN: &str = r"[^/#?]+?";
const PARAM_PREFIXES: &str = "./";

/// One entry of a `redirects.json` file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RedirectSource {
	pub source: String,
	pub destination: String,
	#[serde(default)]
	pub permanent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
	One,
	Optional,
	ZeroOrMore,
	OneOrMore,
}

impl Modifier {
	fn from_char(ch: char) -> Option<Self> {
		match ch {
			'?' => Some(Self::Optional),
			'*' => Some(Self::ZeroOrMore),
			'+' => Some(Self::OneOrMore),
			_ => None,
		}
	}

	fn is_required(self) -> bool {
		matches!(self, Self::One | Self::OneOrMore)
	}

	fn is_repeated(self) -> bool {
		matches!(self, Self::ZeroOrMore | Self::OneOrMore)
	}

	fn as_str(self) -> &'static str {
		match self {
			Self::One => "",
			Self::Optional => "?",
			Self::ZeroOrMore => "*",
			Self::OneOrMore => "+",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Param {
		name: String,
		prefix: String,
		pattern: String,
		modifier: Modifier,
	},
}

/// A path pattern with `:name` parameters, e.g. `/docs/:slug*`.
///
/// A parameter may carry a custom pattern (`:id(\d+)`) and one of the
/// modifiers `?`, `*` or `+`. A `/` or `.` directly before a parameter
/// belongs to it, so `/:name?` also matches when the whole segment is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
	source: String,
	segments: Vec<Segment>,
}

impl PathPattern {
	pub fn parse(source: &str) -> PipelineResult<Self> {
		let invalid = |reason: &str| {
			PipelineError::InvalidRedirect {
				pattern: source.to_string(),
				reason: reason.to_string(),
			}
		};
		let chars: Vec<char> = source.chars().collect();
		let mut segments = Vec::new();
		let mut literal = String::new();
		let mut unnamed = 0;
		let mut index = 0;

		while index < chars.len() {
			let ch = chars[index];

			if ch == '\\' {
				if let Some(escaped) = chars.get(index + 1) {
					literal.push(*escaped);
				}
				index += 2;
				continue;
			}

			let mut name = None;
			if ch == ':' {
				let start = index + 1;
				let mut end = start;
				while chars
					.get(end)
					.is_some_and(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
				{
					end += 1;
				}
				if end == start {
					return Err(invalid("missing parameter name"));
				}
				name = Some(chars[start..end].iter().collect::<String>());
				index = end;
			}

			let mut pattern = None;
			if chars.get(index) == Some(&'(') && (name.is_some() || ch == '(') {
				let (custom, next) = read_group(&chars, index).ok_or_else(|| invalid("unbalanced pattern"))?;
				if has_capturing_group(&custom) {
					return Err(invalid("capturing groups are not allowed in parameter patterns"));
				}
				pattern = Some(custom);
				index = next;
			}

			if name.is_none() && pattern.is_none() {
				literal.push(ch);
				index += 1;
				continue;
			}

			let name = name.unwrap_or_else(|| {
				let key = unnamed.to_string();
				unnamed += 1;
				key
			});
			let prefix = match literal.chars().last() {
				Some(last) if PARAM_PREFIXES.contains(last) => {
					literal.pop();
					last.to_string()
				}
				_ => String::new(),
			};
			if !literal.is_empty() {
				segments.push(Segment::Literal(std::mem::take(&mut literal)));
			}

			let modifier = chars
				.get(index)
				.and_then(|ch| Modifier::from_char(*ch))
				.unwrap_or(Modifier::One);
			if modifier != Modifier::One {
				index += 1;
			}

			segments.push(Segment::Param {
				name,
				prefix,
				pattern: pattern.unwrap_or_else(|| DEFAULT_PARAM_PATTERN.to_string()),
				modifier,
			});
		}

		if !literal.is_empty() {
			segments.push(Segment::Literal(literal));
		}

		Ok(Self {
			source: source.to_string(),
			segments,
		})
	}

	pub fn as_str(&self) -> &str {
		&self.source
	}

	/// Parameter names in order of appearance.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.segments.iter().filter_map(|segment| {
			match segment {
				Segment::Param { name, .. } => Some(name.as_str()),
				Segment::Literal(_) => None,
			}
		})
	}

	fn required_names(&self) -> impl Iterator<Item = &str> {
		self.segments.iter().filter_map(|segment| {
			match segment {
				Segment::Param { name, modifier, .. } if modifier.is_required() => Some(name.as_str()),
				_ => None,
			}
		})
	}

	/// Compile to a case-insensitive regex over the whole path that tolerates
	/// one trailing delimiter.
	fn to_regex(&self) -> PipelineResult<Regex> {
		let mut route = String::from("^");

		for segment in &self.segments {
			match segment {
				Segment::Literal(literal) => route.push_str(&regex::escape(literal)),
				Segment::Param {
					prefix,
					pattern,
					modifier,
					..
				} => {
					let prefix = regex::escape(prefix);
					if prefix.is_empty() {
						route.push_str(&format!("({pattern}){}", modifier.as_str()));
					} else if modifier.is_repeated() {
						let optional = if *modifier == Modifier::ZeroOrMore { "?" } else { "" };
						route.push_str(&format!(
							"(?:{prefix}((?:{pattern})(?:{prefix}(?:{pattern}))*)){optional}"
						));
					} else {
						route.push_str(&format!("(?:{prefix}({pattern})){}", modifier.as_str()));
					}
				}
			}
		}
		route.push_str("[/#?]?$");

		RegexBuilder::new(&route)
			.case_insensitive(true)
			.build()
			.map_err(|e| {
				PipelineError::InvalidRedirect {
					pattern: self.source.clone(),
					reason: e.to_string(),
				}
			})
	}

	/// Fill the pattern with `params`. Optional parameters without a value
	/// are dropped together with their prefix.
	pub fn render(&self, params: &HashMap<String, String>) -> PipelineResult<String> {
		let mut output = String::new();

		for segment in &self.segments {
			match segment {
				Segment::Literal(literal) => output.push_str(literal),
				Segment::Param {
					name,
					prefix,
					modifier,
					..
				} => {
					match params.get(name).filter(|value| !value.is_empty()) {
						Some(value) if modifier.is_repeated() && !prefix.is_empty() => {
							for part in value.split(prefix.as_str()).filter(|part| !part.is_empty()) {
								output.push_str(prefix);
								output.push_str(part);
							}
						}
						Some(value) => {
							output.push_str(prefix);
							output.push_str(value);
						}
						None if modifier.is_required() => {
							return Err(PipelineError::InvalidRedirect {
								pattern: self.source.clone(),
								reason: format!("no value for parameter `{name}`"),
							});
						}
						None => {}
					}
				}
			}
		}

		Ok(output)
	}
}

fn has_capturing_group(pattern: &str) -> bool {
	let mut chars = pattern.chars().peekable();
	while let Some(ch) = chars.next() {
		match ch {
			'\\' => {
				chars.next();
			}
			'(' if chars.peek() != Some(&'?') => return true,
			_ => {}
		}
	}

	false
}

fn read_group(chars: &[char], open: usize) -> Option<(String, usize)> {
	let mut depth = 0;
	let mut index = open;
	let mut group = String::new();

	while index < chars.len() {
		let ch = chars[index];
		match ch {
			'\\' => {
				group.push(ch);
				group.push(*chars.get(index + 1)?);
				index += 2;
				continue;
			}
			'(' => {
				depth += 1;
				if depth > 1 {
					group.push(ch);
				}
			}
			')' => {
				depth -= 1;
				if depth == 0 {
					return Some((group, index + 1));
				}
				group.push(ch);
			}
			_ => group.push(ch),
		}
		index += 1;
	}

	None
}

#[derive(Debug, Clone)]
enum Destination {
	/// An external URL without parameters.
	Static(String),
	/// An internal path, possibly with parameters.
	Path(PathPattern),
	/// An external URL whose path carries parameters.
	External { base: Url, path: PathPattern },
}

/// A compiled redirect.
#[derive(Debug, Clone)]
pub struct RedirectRule {
	source: PathPattern,
	matcher: Regex,
	destination: Destination,
	pub permanent: bool,
}

impl RedirectRule {
	pub fn compile(redirect: &RedirectSource) -> PipelineResult<Self> {
		let source = PathPattern::parse(&redirect.source)?;
		let matcher = source.to_regex()?;
		let raw = redirect.destination.as_str();

		let destination = if raw.starts_with('/') {
			Destination::Path(PathPattern::parse(raw)?)
		} else if raw.contains("/:") {
			let base = Url::parse(raw).map_err(|e| {
				PipelineError::InvalidRedirect {
					pattern: raw.to_string(),
					reason: e.to_string(),
				}
			})?;
			let path = PathPattern::parse(base.path())?;
			Destination::External { base, path }
		} else {
			Destination::Static(raw.to_string())
		};

		if let Destination::Path(path) | Destination::External { path, .. } = &destination {
			let available: Vec<&str> = source.names().collect();
			if let Some(missing) = path.required_names().find(|name| !available.contains(name)) {
				return Err(PipelineError::InvalidRedirect {
					pattern: redirect.destination.clone(),
					reason: format!("parameter `{missing}` does not appear in source `{}`", redirect.source),
				});
			}
		}

		Ok(Self {
			source,
			matcher,
			destination,
			permanent: redirect.permanent,
		})
	}

	/// Parameters captured from `url`, or `None` when the rule does not match.
	pub fn matches(&self, url: &str) -> Option<HashMap<String, String>> {
		let captures = self.matcher.captures(url)?;
		let params = self
			.source
			.names()
			.enumerate()
			.filter_map(|(index, name)| {
				captures
					.get(index + 1)
					.map(|value| (name.to_string(), value.as_str().to_string()))
			})
			.collect();

		Some(params)
	}

	/// The destination for `url`, or `None` when the rule does not match.
	pub fn resolve(&self, url: &str) -> PipelineResult<Option<String>> {
		let Some(params) = self.matches(url) else {
			return Ok(None);
		};

		let destination = match &self.destination {
			Destination::Static(destination) => destination.clone(),
			Destination::Path(path) => path.render(&params)?,
			Destination::External { base, path } => {
				let mut url = base.clone();
				url.set_path(&path.render(&params)?);
				url.to_string()
			}
		};

		Ok(Some(destination))
	}
}

/// Load and compile `redirects.json` from `redirects_dir`. A missing file is
/// an empty rule set.
pub fn load_redirects(redirects_dir: &Path) -> PipelineResult<Vec<RedirectRule>> {
	let path = redirects_dir.join(REDIRECTS_FILE);
	let content = match std::fs::read_to_string(&path) {
		Ok(content) => content,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
		Err(e) => return Err(e.into()),
	};

	let sources: Vec<RedirectSource> = serde_json::from_str(&content).map_err(|e| {
		PipelineError::RedirectsFile {
			path: path.display().to_string(),
			reason: e.to_string(),
		}
	})?;

	sources.iter().map(RedirectRule::compile).collect()
}

/// Compiled redirect rules keyed by redirects directory, shared by every
/// document of a build.
///
/// Two workers asking for the same directory at once may both compile it;
/// the first result stored wins.
#[derive(Debug, Default)]
pub struct RedirectCache {
	rules: RwLock<HashMap<PathBuf, Arc<[RedirectRule]>>>,
}

impl RedirectCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get_or_load(&self, redirects_dir: &Path) -> PipelineResult<Arc<[RedirectRule]>> {
		{
			let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
			if let Some(cached) = rules.get(redirects_dir) {
				return Ok(Arc::clone(cached));
			}
		}

		let loaded: Arc<[RedirectRule]> = load_redirects(redirects_dir)?.into();
		tracing::debug!(
			dir = %redirects_dir.display(),
			rules = loaded.len(),
			"compiled redirects"
		);

		let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
		let entry = rules.entry(redirects_dir.to_path_buf()).or_insert(loaded);

		Ok(Arc::clone(entry))
	}

	/// Number of redirect directories loaded so far.
	pub fn len(&self) -> usize {
		self.rules.read().unwrap_or_else(PoisonError::into_inner).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// The first rule that applies to `url`, resolved.
pub fn apply_redirect(url: &str, rules: &[RedirectRule]) -> PipelineResult<Option<String>> {
	for rule in rules {
		if let Some(destination) = rule.resolve(url)? {
			return Ok(Some(destination));
		}
	}

	Ok(None)
}

/// Rewrite root-relative link and definition urls in `root` through `rules`.
/// Returns how many urls changed.
pub fn rewrite_redirects(root: &mut Node, rules: &[RedirectRule]) -> PipelineResult<usize> {
	if rules.is_empty() {
		return Ok(0);
	}

	let mut result = Ok(0);
	root.walk_mut(&mut |node| {
		let Ok(count) = &mut result else {
			return;
		};
		let (NodeKind::Link { url, .. } | NodeKind::Definition { url, .. }) = &mut node.kind else {
			return;
		};
		if !url.starts_with('/') {
			return;
		}

		match apply_redirect(url, rules) {
			Ok(Some(destination)) => {
				*url = destination;
				*count += 1;
			}
			Ok(None) => {}
			Err(e) => result = Err(e),
		}
	});

	result
}
