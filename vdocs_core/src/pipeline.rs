use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use globset::GlobSet;
use ignore::WalkBuilder;
use rayon::prelude::*;

use crate::ExclusionContext;
use crate::LinkVersioner;
use crate::NodeIds;
use crate::PipelineError;
use crate::PipelineResult;
use crate::RedirectCache;
use crate::VdocsConfig;
use crate::VersionMetadata;
use crate::apply_alerts;
use crate::clean_version;
use crate::exclude_content;
use crate::gather_version_metadata;
use crate::parse_markdown;
use crate::resolve_partials;
use crate::rewrite_links;
use crate::rewrite_redirects;
use crate::split_frontmatter;
use crate::to_markdown;

const PARTIALS_DIR: &str = "partials";

/// Where a document sits in the content tree and everything derived from
/// that location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
	pub file: PathBuf,
	/// Path relative to the content root, e.g. `vault/v1.21.x/docs/index.mdx`.
	pub relative: PathBuf,
	pub product: String,
	/// The version directory name, stage suffix included. `None` for
	/// non-versioned products.
	pub version: Option<String>,
	pub partials_dir: PathBuf,
	pub redirects_dir: PathBuf,
	pub output_path: PathBuf,
}

impl DocumentEntry {
	/// Derive the entry for `file`, which must live under `content_root` as
	/// `<product>/<version>/<content dir>/...` (or without the version
	/// segment for non-versioned products).
	pub fn from_path(
		content_root: &Path,
		output_root: &Path,
		file: &Path,
		config: &VdocsConfig,
	) -> PipelineResult<Self> {
		let invalid = || PipelineError::InvalidDocumentPath(file.display().to_string());
		let relative = file.strip_prefix(content_root).map_err(|_| invalid())?;
		let segments: Vec<&str> = relative
			.components()
			.filter_map(|component| {
				match component {
					Component::Normal(segment) => segment.to_str(),
					_ => None,
				}
			})
			.collect();

		let product = *segments.first().ok_or_else(invalid)?;
		let product_config = config.product(product)?;

		let (version, rest) = if product_config.versioned_docs {
			// A versioned document needs at least a version directory and a
			// file inside it.
			if segments.len() < 3 {
				return Err(invalid());
			}
			(Some(segments[1].to_string()), &segments[2..])
		} else {
			(None, &segments[1..])
		};

		let mut redirects_dir = content_root.join(product);
		if let Some(version) = &version {
			redirects_dir.push(version);
		}

		let mut partials_dir = redirects_dir.clone();
		if rest.len() > 1 {
			partials_dir.push(rest[0]);
		}
		partials_dir.push(PARTIALS_DIR);

		Ok(Self {
			file: file.to_path_buf(),
			relative: relative.to_path_buf(),
			product: product.to_string(),
			version,
			partials_dir,
			redirects_dir,
			output_path: output_root.join(relative),
		})
	}

	/// The version without any release stage suffix.
	pub fn clean_version(&self) -> Option<String> {
		self.version.as_deref().map(clean_version)
	}
}

/// Shared, read-only state for every document of a build.
#[derive(Debug)]
pub struct BuildContext {
	pub config: VdocsConfig,
	pub content_root: PathBuf,
	pub output_root: PathBuf,
	pub metadata: VersionMetadata,
	pub redirects: RedirectCache,
	global_partials: GlobSet,
}

impl BuildContext {
	/// Create a context for the project at `root` with already computed
	/// version metadata.
	pub fn new(root: &Path, config: VdocsConfig, metadata: VersionMetadata) -> PipelineResult<Self> {
		let global_partials = config.global_partials_matcher()?;

		Ok(Self {
			content_root: root.join(&config.content_dir),
			output_root: root.join(&config.output_dir),
			config,
			metadata,
			redirects: RedirectCache::new(),
			global_partials,
		})
	}

	/// Scan the content root for versions and create the context.
	pub fn gather(root: &Path, config: VdocsConfig) -> PipelineResult<Self> {
		let content_root = root.join(&config.content_dir);
		let metadata = gather_version_metadata(&content_root, &config.products)?;

		Self::new(root, config, metadata)
	}

	pub fn entry(&self, file: &Path) -> PipelineResult<DocumentEntry> {
		DocumentEntry::from_path(&self.content_root, &self.output_root, file, &self.config)
	}

	/// Global partials are written as authored; their directives only run
	/// once another document includes them.
	pub fn is_global_partial(&self, entry: &DocumentEntry) -> bool {
		self.global_partials.is_match(&entry.relative)
	}
}

/// Transform one document's source text.
pub fn transform_source(source: &str, entry: &DocumentEntry, ctx: &BuildContext) -> PipelineResult<String> {
	let product_config = ctx.config.product(&entry.product)?;
	let file = entry.file.display().to_string();
	let (frontmatter, body) = split_frontmatter(source)?;

	let mut ids = NodeIds::new();
	let mut tree = parse_markdown(body, &mut ids)?;
	resolve_partials(&mut tree, &entry.file, &entry.partials_dir, &mut ids)?;

	let global = ctx.is_global_partial(entry);
	if global {
		tracing::debug!(file = %file, "skipping directives in global partial");
	} else {
		let exclusion = ExclusionContext {
			file: &file,
			product: &entry.product,
			version: entry.version.as_deref(),
			config: product_config,
		};
		exclude_content(&mut tree, &exclusion)?;
	}

	let alerts = apply_alerts(&mut tree, &mut ids);
	let rules = ctx.redirects.get_or_load(&entry.redirects_dir)?;
	let redirected = rewrite_redirects(&mut tree, &rules)?;
	// Global partials are shared by every version, so their links stay
	// unversioned until a document includes them.
	let versioner = if global {
		None
	} else {
		LinkVersioner::new(
			&entry.product,
			entry.version.as_deref(),
			product_config,
			&ctx.metadata,
		)?
	};
	let versioned = versioner.map_or(0, |versioner| rewrite_links(&mut tree, &versioner));
	tracing::debug!(file = %file, alerts, redirected, versioned, "transformed document");

	let body = to_markdown(&tree);
	Ok(match frontmatter {
		Some(frontmatter) => frontmatter.stringify(&body),
		None => body,
	})
}

/// Read and transform the document behind `entry`.
pub fn transform_document(entry: &DocumentEntry, ctx: &BuildContext) -> PipelineResult<String> {
	let source = std::fs::read_to_string(&entry.file)?;
	transform_source(&source, entry, ctx)
}

/// Write transformed `contents` to the entry's output path.
pub fn write_document(entry: &DocumentEntry, contents: &str) -> PipelineResult<()> {
	if let Some(parent) = entry.output_path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(&entry.output_path, contents)?;

	Ok(())
}

/// Every document under the content root, sorted.
pub fn discover_documents(ctx: &BuildContext) -> PipelineResult<Vec<PathBuf>> {
	let mut files = Vec::new();

	for entry in WalkBuilder::new(&ctx.content_root).standard_filters(false).build() {
		let entry = entry.map_err(|e| PipelineError::Io(std::io::Error::other(e.to_string())))?;
		let path = entry.path();
		if entry.file_type().is_some_and(|kind| kind.is_file()) && ctx.config.is_document(path) {
			files.push(path.to_path_buf());
		}
	}
	files.sort();

	Ok(files)
}

/// A document that could not be built. Nothing was written for it.
#[derive(Debug)]
pub struct BuildFailure {
	pub file: PathBuf,
	pub error: PipelineError,
}

#[derive(Debug, Default)]
pub struct BuildReport {
	pub written: Vec<PathBuf>,
	pub failures: Vec<BuildFailure>,
}

impl BuildReport {
	pub fn is_ok(&self) -> bool {
		self.failures.is_empty()
	}

	pub fn total(&self) -> usize {
		self.written.len() + self.failures.len()
	}
}

fn build_one(file: &Path, ctx: &BuildContext) -> PipelineResult<PathBuf> {
	let entry = ctx.entry(file)?;
	let contents = transform_document(&entry, ctx)?;
	write_document(&entry, &contents)?;

	Ok(entry.output_path)
}

/// Transform every document under the content root on a pool of
/// `config.jobs` workers. Failures are collected, not fatal.
pub fn build_all(ctx: &BuildContext) -> PipelineResult<BuildReport> {
	let files = discover_documents(ctx)?;
	let workers = ctx.config.worker_count();
	tracing::info!(documents = files.len(), workers, "transforming documents");

	let pool = rayon::ThreadPoolBuilder::new()
		.num_threads(workers)
		.build()
		.map_err(|e| PipelineError::Io(std::io::Error::other(e.to_string())))?;
	let outcomes: Vec<(&PathBuf, PipelineResult<PathBuf>)> =
		pool.install(|| files.par_iter().map(|file| (file, build_one(file, ctx))).collect());

	let mut report = BuildReport::default();
	for (file, outcome) in outcomes {
		match outcome {
			Ok(output) => report.written.push(output),
			Err(error) => {
				tracing::warn!(file = %file.display(), error = %error, "document failed");
				report.failures.push(BuildFailure {
					file: file.clone(),
					error,
				});
			}
		}
	}

	tracing::info!(
		written = report.written.len(),
		failed = report.failures.len(),
		"build finished"
	);

	Ok(report)
}
