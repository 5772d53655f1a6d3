use serde_yaml_ng::Mapping;
use serde_yaml_ng::Value;

use crate::PipelineError;
use crate::PipelineResult;

const DELIMITER: &str = "---";

/// The `---` delimited YAML block at the top of a document. The raw text is
/// kept so it can be written back exactly as authored.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
	raw: String,
	data: Mapping,
}

impl Frontmatter {
	/// The YAML exactly as it appeared between the delimiters.
	pub fn raw(&self) -> &str {
		&self.raw
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.data.get(key)
	}

	/// Attach this frontmatter ahead of `body`.
	pub fn stringify(&self, body: &str) -> String {
		let mut output = String::with_capacity(self.raw.len() + body.len() + 10);
		output.push_str(DELIMITER);
		output.push('\n');
		output.push_str(&self.raw);
		if !self.raw.is_empty() && !self.raw.ends_with('\n') {
			output.push('\n');
		}
		output.push_str(DELIMITER);
		output.push('\n');
		if !body.is_empty() {
			output.push('\n');
			output.push_str(body);
		}
		output
	}
}

/// Split `source` into its frontmatter (when present) and the markdown body.
/// A document without a closing delimiter has no frontmatter.
pub fn split_frontmatter(source: &str) -> PipelineResult<(Option<Frontmatter>, &str)> {
	let Some(rest) = strip_delimiter_line(source) else {
		return Ok((None, source));
	};

	let mut offset = 0;
	for line in rest.split_inclusive('\n') {
		if line.trim_end_matches(['\r', '\n']) == DELIMITER {
			let raw = &rest[..offset];
			let body = &rest[offset + line.len()..];
			let data = parse_yaml(raw)?;
			let frontmatter = Frontmatter {
				raw: raw.to_string(),
				data,
			};

			return Ok((Some(frontmatter), body.trim_start_matches(['\r', '\n'])));
		}
		offset += line.len();
	}

	Ok((None, source))
}

fn strip_delimiter_line(source: &str) -> Option<&str> {
	let rest = source.strip_prefix(DELIMITER)?;
	rest.strip_prefix('\n')
		.or_else(|| rest.strip_prefix("\r\n"))
}

fn parse_yaml(raw: &str) -> PipelineResult<Mapping> {
	let value: Value =
		serde_yaml_ng::from_str(raw).map_err(|e| PipelineError::Frontmatter(e.to_string()))?;

	match value {
		Value::Null => Ok(Mapping::new()),
		Value::Mapping(mapping) => Ok(mapping),
		_ => Err(PipelineError::Frontmatter("expected a mapping of keys to values".into())),
	}
}
