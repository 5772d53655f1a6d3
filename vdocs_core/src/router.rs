use std::sync::LazyLock;

use regex::Regex;

use crate::DirectiveBlock;
use crate::Node;
use crate::PipelineError;
use crate::PipelineResult;
use crate::ProductConfig;
use crate::Version;
use crate::parse_directive_blocks;
use crate::remove_block;

/// The product whose documents evaluate `Vault:` version directives.
pub const VAULT_PRODUCT: &str = "vault";
/// The product that keeps `TFC:only` blocks.
pub const DOCS_COMMON_PRODUCT: &str = "terraform-docs-common";
/// The product that keeps `TFEnterprise:only` blocks.
pub const ENTERPRISE_PRODUCT: &str = "terraform-enterprise";

static VAULT_EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(<=|>=|<|>|=)v(\d+\.\d+\.x|\d+\.x)$").expect("vault expression pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
	Lt,
	Lte,
	Gt,
	Gte,
	Eq,
}

impl Comparator {
	pub fn parse(operator: &str) -> Option<Self> {
		match operator {
			"<" => Some(Self::Lt),
			"<=" => Some(Self::Lte),
			">" => Some(Self::Gt),
			">=" => Some(Self::Gte),
			"=" => Some(Self::Eq),
			_ => None,
		}
	}

	/// Apply the comparator as `current <op> target`.
	pub fn compare(self, current: Version, target: Version) -> bool {
		match self {
			Self::Lt => current < target,
			Self::Lte => current <= target,
			Self::Gt => current > target,
			Self::Gte => current >= target,
			Self::Eq => current == target,
		}
	}
}

/// The product-specific rule a directive block carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
	/// `Vault:<op>v<version>`. The expression is only validated when a Vault
	/// document is built.
	Vault { expression: String },
	/// `TFC:only`, optionally `TFC:only name:<label>`.
	Tfc { label: Option<String> },
	/// `TFEnterprise:only`, optionally `TFEnterprise:only name:<label>`.
	TfEnterprise { label: Option<String> },
}

impl Directive {
	/// Split the block content on its first `:` and dispatch on the product.
	pub fn parse(block: &DirectiveBlock) -> PipelineResult<Self> {
		let (product, rest) = block
			.content
			.split_once(':')
			.unwrap_or((block.content.as_str(), ""));

		match product {
			"Vault" => {
				Ok(Self::Vault {
					expression: rest.to_string(),
				})
			}
			"TFC" => {
				Ok(Self::Tfc {
					label: parse_only(product, rest, block)?,
				})
			}
			"TFEnterprise" => {
				Ok(Self::TfEnterprise {
					label: parse_only(product, rest, block)?,
				})
			}
			_ => {
				Err(PipelineError::UnknownDirectiveProduct {
					product: product.to_string(),
					content: block.content.clone(),
					start_line: block.start_line,
					end_line: block.end_line,
				})
			}
		}
	}

	/// Whether the block survives a build of `product` at `version`.
	pub fn keeps(
		&self,
		block: &DirectiveBlock,
		product: &str,
		version: Option<&str>,
	) -> PipelineResult<bool> {
		match self {
			Self::Vault { expression } => {
				if product != VAULT_PRODUCT {
					return Ok(true);
				}
				evaluate_vault(expression, block, version)
			}
			Self::Tfc { .. } => Ok(product == DOCS_COMMON_PRODUCT),
			Self::TfEnterprise { .. } => Ok(product == ENTERPRISE_PRODUCT),
		}
	}
}

fn parse_only(product: &str, rest: &str, block: &DirectiveBlock) -> PipelineResult<Option<String>> {
	if rest == "only" {
		return Ok(None);
	}

	let label = rest
		.strip_prefix("only name:")
		.filter(|label| !label.is_empty() && !label.contains(char::is_whitespace));

	label.map(|label| Some(label.to_string())).ok_or_else(|| {
		PipelineError::InvalidDirective {
			product: product.to_string(),
			directive: rest.to_string(),
			expected: format!("{product}:only"),
			start_line: block.start_line,
			end_line: block.end_line,
		}
	})
}

fn evaluate_vault(expression: &str, block: &DirectiveBlock, version: Option<&str>) -> PipelineResult<bool> {
	let captures = VAULT_EXPRESSION.captures(expression).ok_or_else(|| {
		PipelineError::InvalidDirective {
			product: "Vault".to_string(),
			directive: expression.to_string(),
			expected: "Vault:>=vX.Y.x".to_string(),
			start_line: block.start_line,
			end_line: block.end_line,
		}
	})?;

	let Some(version) = version else {
		return Err(PipelineError::MissingDocumentVersion {
			content: block.content.clone(),
			start_line: block.start_line,
			end_line: block.end_line,
		});
	};

	let comparator = Comparator::parse(&captures[1])
		.ok_or_else(|| PipelineError::InvalidVersion(captures[1].to_string()))?;
	let current =
		Version::normalize(version).ok_or_else(|| PipelineError::InvalidVersion(version.to_string()))?;
	let target = Version::normalize(&captures[2])
		.ok_or_else(|| PipelineError::InvalidVersion(captures[2].to_string()))?;

	Ok(comparator.compare(current, target))
}

/// What a document is being built as.
#[derive(Debug, Clone, Copy)]
pub struct ExclusionContext<'a> {
	/// Path of the document, used in error messages.
	pub file: &'a str,
	pub product: &'a str,
	/// The document's version directory name, `None` for non-versioned
	/// products.
	pub version: Option<&'a str>,
	pub config: &'a ProductConfig,
}

/// Evaluate every directive block in `root` and remove the ones that do not
/// apply to the build described by `ctx`.
///
/// Products that have not opted in to directives are left untouched, marker
/// comments included. Blocks are handled last to first so removals never
/// disturb blocks that are still pending.
pub fn exclude_content(root: &mut Node, ctx: &ExclusionContext<'_>) -> PipelineResult<()> {
	if !ctx.config.supports_exclusion_directives {
		return Ok(());
	}

	apply_directives(root, ctx).map_err(|source| {
		PipelineError::ContentExclusion {
			file: ctx.file.to_string(),
			source: Box::new(source),
		}
	})
}

fn apply_directives(root: &mut Node, ctx: &ExclusionContext<'_>) -> PipelineResult<()> {
	let blocks = parse_directive_blocks(root)?;

	for block in blocks.iter().rev() {
		let directive = Directive::parse(block)?;
		if directive.keeps(block, ctx.product, ctx.version)? {
			continue;
		}

		tracing::debug!(
			file = ctx.file,
			directive = %block.content,
			start_line = block.start_line,
			end_line = block.end_line,
			"removing directive block"
		);
		remove_block(root, block)?;
	}

	Ok(())
}
