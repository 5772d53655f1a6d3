use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Build per-product, per-version documentation from a shared content tree.",
	long_about = "vdocs transforms a documentation corpus that spans many products and many \
	              versions of each into the documents that get published.\n\nEvery source \
	              document has its partials inlined, its product and version directives \
	              evaluated, legacy links redirected and same-product links pointed at the \
	              right version.\n\nQuick start:\n  vdocs version-metadata  Show the detected \
	              versions\n  vdocs build             Transform every document\n  vdocs \
	              transform <file>  Transform a single document"
)]
pub struct VdocsCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output, including debug logs.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Transform every document under the content directory.
	///
	/// Scans the content directory for versions, writes the version metadata
	/// artifact and then transforms every document into the output
	/// directory. Documents that fail are reported and not written; the
	/// command exits with status 1 when any document failed.
	Build {
		/// Number of worker threads. Overrides `jobs` from `vdocs.toml`.
		#[arg(long, short)]
		jobs: Option<usize>,

		/// Only write the version metadata artifact.
		#[arg(long, default_value_t = false)]
		only_version_metadata: bool,
	},
	/// Print the versions detected for every product.
	///
	/// Versions are listed newest first with their release stage. The latest
	/// release of each product is marked.
	VersionMetadata {
		/// Output format. Use `text` for human-readable output or `json` for
		/// the same shape as the metadata artifact.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Transform a single document.
	///
	/// Uses the version metadata artifact written by the last `vdocs build`.
	/// The result is written to the document's output path unless `--stdout`
	/// is given.
	Transform {
		/// The document to transform.
		file: PathBuf,

		/// Print the transformed document instead of writing it.
		#[arg(long, default_value_t = false)]
		stdout: bool,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
