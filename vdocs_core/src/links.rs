use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

use crate::Node;
use crate::NodeKind;
use crate::PipelineError;
use crate::PipelineResult;
use crate::ProductConfig;
use crate::VersionMetadata;
use crate::clean_version;

/// A path segment that already names a version: `v1.2.3`, `v1.2.x`,
/// `1.2.3` or a dated enterprise release such as `v202410-1`.
static VERSION_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)^(?:v\d+\.\d+\.(?:\d+|\w+)|\d+\.\d+\.(?:\d+|\w+)|v[0-9]{6}-\d+)")
		.expect("version segment pattern is valid")
});

static EXTERNAL: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)^https?://").expect("external url pattern is valid"));

/// Whether any `/` separated segment of `url` is a version.
pub fn has_version_segment(url: &str) -> bool {
	url.split('/').any(|segment| VERSION_SEGMENT.is_match(segment))
}

/// Splices a document's version into same-product links.
#[derive(Debug, Clone)]
pub struct LinkVersioner {
	version: String,
	base_paths: Regex,
	product_prefix: String,
}

impl LinkVersioner {
	/// Build the rewriter for a document of `product` living in the
	/// `version_dir` directory. Returns `None` when links stay as they are:
	/// the product is not versioned, the document is the latest version or
	/// the product has no base paths.
	pub fn new(
		product: &str,
		version_dir: Option<&str>,
		config: &ProductConfig,
		metadata: &VersionMetadata,
	) -> PipelineResult<Option<Self>> {
		if !config.versioned_docs {
			return Ok(None);
		}
		if !metadata.contains_key(product) {
			return Err(PipelineError::MissingVersionMetadata(product.to_string()));
		}
		let Some(version_dir) = version_dir else {
			return Ok(None);
		};

		let version = clean_version(version_dir);
		let base_paths: Vec<String> = config
			.base_paths
			.iter()
			.map(|path| path.trim_matches('/'))
			.filter(|path| !path.is_empty())
			.map(regex::escape)
			.collect();
		if metadata.is_latest(product, &version) || base_paths.is_empty() {
			return Ok(None);
		}

		let alternatives = base_paths.join("|");
		let base_paths = Regex::new(&format!("/({alternatives})(/|$|[?#])")).map_err(|e| {
			PipelineError::ConfigParse(format!("invalid base paths for `{product}`: {e}"))
		})?;

		Ok(Some(Self {
			version,
			base_paths,
			product_prefix: format!("/{}/", config.url_slug(product)),
		}))
	}

	/// The versioned form of `url`, or `None` when it is left alone.
	pub fn rewrite(&self, url: &str) -> Option<String> {
		if EXTERNAL.is_match(url) || !(url.starts_with('.') || url.starts_with('/')) {
			return None;
		}
		if has_version_segment(url) {
			return None;
		}

		if self.base_paths.is_match(url) {
			let rewritten = self.base_paths.replacen(url, 1, |captures: &Captures<'_>| {
				format!("/{}/{}{}", &captures[1], self.version, &captures[2])
			});
			return Some(rewritten.into_owned());
		}

		let rest = url.strip_prefix(&self.product_prefix)?;
		Some(format!("{}{}/{rest}", self.product_prefix, self.version))
	}
}

/// Rewrite link and definition urls in `root`. Returns how many changed.
pub fn rewrite_links(root: &mut Node, versioner: &LinkVersioner) -> usize {
	let mut count = 0;

	root.walk_mut(&mut |node| {
		let (NodeKind::Link { url, .. } | NodeKind::Definition { url, .. }) = &mut node.kind else {
			return;
		};
		if let Some(rewritten) = versioner.rewrite(url) {
			*url = rewritten;
			count += 1;
		}
	});

	count
}
