use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Which side of a directive block a marker comment sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
	Begin,
	End,
}

impl fmt::Display for MarkerKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Begin => write!(f, "BEGIN"),
			Self::End => write!(f, "END"),
		}
	}
}

/// Coarse classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// Malformed version directory names, directive syntax or redirect
	/// patterns.
	Format,
	/// Broken BEGIN/END pairing.
	Structural,
	/// A referenced file or product could not be resolved.
	Reference,
	/// A partial includes itself, directly or transitively.
	Cycle,
	/// Bad or missing configuration.
	Configuration,
	/// Filesystem failures.
	Io,
}

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum PipelineError {
	#[error(transparent)]
	#[diagnostic(code(vdocs::io_error))]
	Io(#[from] std::io::Error),

	#[error("failure to parse markdown: {0}")]
	#[diagnostic(code(vdocs::markdown))]
	Markdown(String),

	#[error("invalid frontmatter: {0}")]
	#[diagnostic(
		code(vdocs::frontmatter),
		help("frontmatter must be a YAML mapping between two `---` lines")
	)]
	Frontmatter(String),

	#[error("invalid version format `{version}` for product `{product}`")]
	#[diagnostic(
		code(vdocs::invalid_version_format),
		help(
			"a release stage must follow the version after exactly one space, e.g. `v1.0.x (beta)`"
		)
	)]
	InvalidVersionFormat { product: String, version: String },

	#[error("invalid release stage `{stage}` in version `{version}` for product `{product}`")]
	#[diagnostic(
		code(vdocs::invalid_release_stage),
		help("accepted release stages are: alpha, beta, rc")
	)]
	InvalidReleaseStage {
		product: String,
		version: String,
		stage: String,
	},

	#[error("nested BEGIN blocks not allowed: BEGIN at line {line}, previous BEGIN at line {open_line}")]
	#[diagnostic(
		code(vdocs::nested_block),
		help("close the previous block with a matching END comment first")
	)]
	NestedBlock { line: usize, open_line: usize },

	#[error("empty {marker} block at line {line}")]
	#[diagnostic(
		code(vdocs::empty_directive),
		help("write the directive after the marker, e.g. `<!-- BEGIN: Vault:>=v1.21.x -->`")
	)]
	EmptyDirective { marker: MarkerKind, line: usize },

	#[error("unexpected END block `{content}` at line {line}: no matching BEGIN block found")]
	#[diagnostic(code(vdocs::unmatched_end))]
	UnmatchedEnd { content: String, line: usize },

	#[error(
		"mismatched block names: BEGIN=\"{begin}\" at line {begin_line}, END=\"{end}\" at line \
		 {end_line}"
	)]
	#[diagnostic(
		code(vdocs::mismatched_block),
		help("the END comment must repeat the BEGIN directive exactly")
	)]
	MismatchedBlock {
		begin: String,
		begin_line: usize,
		end: String,
		end_line: usize,
	},

	#[error("unclosed BEGIN block `{content}` opened at line {line}")]
	#[diagnostic(
		code(vdocs::unclosed_block),
		help("add `<!-- END: {content} -->` to close this block")
	)]
	UnclosedBlock { content: String, line: usize },

	#[error("directive block `{content}` (lines {start_line}-{end_line}) is no longer in the tree")]
	#[diagnostic(code(vdocs::detached_block))]
	DetachedBlock {
		content: String,
		start_line: usize,
		end_line: usize,
	},

	#[error(
		"unknown directive product `{product}` in block `{content}` at lines \
		 {start_line}-{end_line}"
	)]
	#[diagnostic(
		code(vdocs::unknown_directive_product),
		help("expected one of: Vault, TFC, TFEnterprise")
	)]
	UnknownDirectiveProduct {
		product: String,
		content: String,
		start_line: usize,
		end_line: usize,
	},

	#[error("invalid {product} directive `{directive}` at lines {start_line}-{end_line}")]
	#[diagnostic(code(vdocs::invalid_directive), help("expected format: {expected}"))]
	InvalidDirective {
		product: String,
		directive: String,
		expected: String,
		start_line: usize,
		end_line: usize,
	},

	#[error("version directive `{content}` at lines {start_line}-{end_line} requires a document version")]
	#[diagnostic(code(vdocs::missing_document_version))]
	MissingDocumentVersion {
		content: String,
		start_line: usize,
		end_line: usize,
	},

	#[error("cannot compare against version `{0}`")]
	#[diagnostic(code(vdocs::invalid_version))]
	InvalidVersion(String),

	#[error("content exclusion failed in {file}: {source}")]
	#[diagnostic(code(vdocs::content_exclusion))]
	ContentExclusion {
		file: String,
		#[source]
		source: Box<PipelineError>,
	},

	#[error(
		"@include file not found. In \"{file}\", on line {line}, column {column}, please ensure \
		 the referenced file \"{partial}\" exists"
	)]
	#[diagnostic(code(vdocs::missing_partial))]
	MissingPartial {
		file: String,
		partial: String,
		line: usize,
		column: usize,
	},

	#[error("partial inclusion cycle detected in \"{file}\": {chain}")]
	#[diagnostic(
		code(vdocs::partial_cycle),
		help("a partial cannot include itself, directly or through other partials")
	)]
	PartialCycle { file: String, chain: String },

	#[error("unknown product `{0}`")]
	#[diagnostic(
		code(vdocs::unknown_product),
		help("add a `[products.{0}]` table to vdocs.toml")
	)]
	UnknownProduct(String),

	#[error("no version metadata found for product `{0}`")]
	#[diagnostic(code(vdocs::missing_version_metadata))]
	MissingVersionMetadata(String),

	#[error("document path `{0}` is not inside a product version directory")]
	#[diagnostic(code(vdocs::invalid_document_path))]
	InvalidDocumentPath(String),

	#[error("no vdocs.toml found in `{0}`")]
	#[diagnostic(
		code(vdocs::missing_config),
		help("create a vdocs.toml with a [products.<slug>] table per product")
	)]
	MissingConfig(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(vdocs::config_parse),
		help("check that vdocs.toml is valid TOML with a [products] table")
	)]
	ConfigParse(String),

	#[error("failed to read version metadata `{path}`: {reason}")]
	#[diagnostic(
		code(vdocs::version_metadata_file),
		help("run `vdocs build --only-version-metadata` to regenerate it")
	)]
	VersionMetadataFile { path: String, reason: String },

	#[error("failed to load redirects from `{path}`: {reason}")]
	#[diagnostic(code(vdocs::redirects_file))]
	RedirectsFile { path: String, reason: String },

	#[error("invalid redirect `{pattern}`: {reason}")]
	#[diagnostic(code(vdocs::invalid_redirect))]
	InvalidRedirect { pattern: String, reason: String },
}

impl PipelineError {
	/// The broad category this error belongs to.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Io(_) => ErrorKind::Io,
			Self::Markdown(_)
			| Self::Frontmatter(_)
			| Self::InvalidVersionFormat { .. }
			| Self::InvalidReleaseStage { .. }
			| Self::EmptyDirective { .. }
			| Self::InvalidDirective { .. }
			| Self::InvalidVersion(_)
			| Self::InvalidRedirect { .. }
			| Self::RedirectsFile { .. }
			| Self::VersionMetadataFile { .. } => ErrorKind::Format,
			Self::NestedBlock { .. }
			| Self::UnmatchedEnd { .. }
			| Self::MismatchedBlock { .. }
			| Self::UnclosedBlock { .. }
			| Self::DetachedBlock { .. } => ErrorKind::Structural,
			Self::MissingPartial { .. }
			| Self::MissingDocumentVersion { .. }
			| Self::MissingVersionMetadata(_)
			| Self::InvalidDocumentPath(_) => ErrorKind::Reference,
			Self::PartialCycle { .. } => ErrorKind::Cycle,
			Self::UnknownDirectiveProduct { .. }
			| Self::UnknownProduct(_)
			| Self::MissingConfig(_)
			| Self::ConfigParse(_) => ErrorKind::Configuration,
			Self::ContentExclusion { source, .. } => source.kind(),
		}
	}
}

pub type PipelineResult<T> = Result<T, PipelineError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
