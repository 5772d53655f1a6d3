use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use serde::Deserialize;

use crate::PipelineError;
use crate::PipelineResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["vdocs.toml", ".vdocs.toml", ".config/vdocs.toml"];

/// Configuration loaded from a `vdocs.toml` file.
///
/// ```toml
/// content_dir = "content"
/// output_dir = "public/content"
/// version_metadata_file = "app/api/versionMetadata.json"
/// jobs = 8
///
/// [products.vault]
/// supports_exclusion_directives = true
/// base_paths = ["docs", "api-docs"]
///
/// [products.hcp-docs]
/// versioned_docs = false
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct VdocsConfig {
	/// Directory holding one sub-directory per product, relative to the
	/// project root.
	#[serde(default = "default_content_dir")]
	pub content_dir: PathBuf,
	/// Where transformed documents are written, mirroring `content_dir`.
	#[serde(default = "default_output_dir")]
	pub output_dir: PathBuf,
	/// The version metadata artifact.
	#[serde(default = "default_version_metadata_file")]
	pub version_metadata_file: PathBuf,
	/// Worker threads used for a build. Defaults to the available
	/// parallelism.
	#[serde(default)]
	pub jobs: Option<usize>,
	/// File extensions treated as documents.
	#[serde(default = "default_extensions")]
	pub extensions: Vec<String>,
	/// Globs (relative to `content_dir`) for partials shared across products
	/// and versions. Directive blocks in these files are only evaluated once
	/// they are included into a document.
	#[serde(default = "default_global_partials")]
	pub global_partials: Vec<String>,
	#[serde(default)]
	pub products: BTreeMap<String, ProductConfig>,
}

/// Settings for one product repository.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProductConfig {
	#[serde(default = "default_true")]
	pub versioned_docs: bool,
	/// Opt in to evaluating `BEGIN`/`END` directive blocks.
	#[serde(default)]
	pub supports_exclusion_directives: bool,
	/// Top level URL segments that live under a version, e.g. `language`
	/// for `/terraform/language/...`.
	#[serde(default)]
	pub base_paths: Vec<String>,
	#[serde(default = "default_product_content_dir")]
	pub content_dir: String,
	#[serde(default = "default_data_dir")]
	pub data_dir: String,
	#[serde(default = "default_asset_dir")]
	pub asset_dir: String,
	#[serde(default = "default_website_dir")]
	pub website_dir: String,
	/// The product segment used in URLs when it differs from the directory
	/// name (`terraform-enterprise` publishes under `/terraform`).
	#[serde(default)]
	pub product_slug: Option<String>,
	/// Recognise version directories by semantic version coercion. When
	/// disabled every sub-directory of the product is a version.
	#[serde(default = "default_true")]
	pub semver_coerce: bool,
}

impl Default for ProductConfig {
	fn default() -> Self {
		Self {
			versioned_docs: true,
			supports_exclusion_directives: false,
			base_paths: Vec::new(),
			content_dir: default_product_content_dir(),
			data_dir: default_data_dir(),
			asset_dir: default_asset_dir(),
			website_dir: default_website_dir(),
			product_slug: None,
			semver_coerce: true,
		}
	}
}

impl ProductConfig {
	/// The URL segment for `product`.
	pub fn url_slug<'a>(&'a self, product: &'a str) -> &'a str {
		self.product_slug.as_deref().unwrap_or(product)
	}
}

impl Default for VdocsConfig {
	fn default() -> Self {
		Self {
			content_dir: default_content_dir(),
			output_dir: default_output_dir(),
			version_metadata_file: default_version_metadata_file(),
			jobs: None,
			extensions: default_extensions(),
			global_partials: default_global_partials(),
			products: BTreeMap::new(),
		}
	}
}

impl VdocsConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> PipelineResult<Option<VdocsConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: VdocsConfig =
			toml::from_str(&content).map_err(|e| PipelineError::ConfigParse(e.to_string()))?;

		Ok(Some(config))
	}

	/// Like [`VdocsConfig::load`] but a missing file is an error.
	pub fn load_required(root: &Path) -> PipelineResult<VdocsConfig> {
		Self::load(root)?.ok_or_else(|| PipelineError::MissingConfig(root.display().to_string()))
	}

	pub fn product(&self, slug: &str) -> PipelineResult<&ProductConfig> {
		self.products
			.get(slug)
			.ok_or_else(|| PipelineError::UnknownProduct(slug.to_string()))
	}

	/// Number of workers to build with.
	pub fn worker_count(&self) -> usize {
		self.jobs
			.filter(|jobs| *jobs > 0)
			.or_else(|| std::thread::available_parallelism().ok().map(usize::from))
			.unwrap_or(1)
	}

	/// Whether `path` has one of the configured document extensions.
	pub fn is_document(&self, path: &Path) -> bool {
		path.extension()
			.and_then(|extension| extension.to_str())
			.is_some_and(|extension| self.extensions.iter().any(|e| e == extension))
	}

	pub fn global_partials_matcher(&self) -> PipelineResult<GlobSet> {
		let mut builder = GlobSetBuilder::new();
		for pattern in &self.global_partials {
			let glob = Glob::new(pattern).map_err(|e| {
				PipelineError::ConfigParse(format!("invalid global partial pattern `{pattern}`: {e}"))
			})?;
			builder.add(glob);
		}

		builder
			.build()
			.map_err(|e| PipelineError::ConfigParse(format!("failed to build global partial rules: {e}")))
	}
}

fn default_true() -> bool {
	true
}

fn default_content_dir() -> PathBuf {
	PathBuf::from("content")
}

fn default_output_dir() -> PathBuf {
	PathBuf::from("public/content")
}

fn default_version_metadata_file() -> PathBuf {
	PathBuf::from("app/api/versionMetadata.json")
}

fn default_extensions() -> Vec<String> {
	vec!["mdx".to_string()]
}

fn default_global_partials() -> Vec<String> {
	vec!["**/global/partials/**".to_string()]
}

fn default_product_content_dir() -> String {
	"docs".to_string()
}

fn default_data_dir() -> String {
	"data".to_string()
}

fn default_asset_dir() -> String {
	"img".to_string()
}

fn default_website_dir() -> String {
	"website".to_string()
}
