use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use derive_more::Deref;
use derive_more::DerefMut;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::PipelineError;
use crate::PipelineResult;
use crate::ProductConfig;

/// The placeholder version every non-versioned product is published under.
pub const UNVERSIONED: &str = "v0.0.x";

static COERCE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?:^|[^\d])(\d{1,16})(?:\.(\d{1,16}))?(?:\.(\d{1,16}))?(?:$|[^\d])")
		.expect("coerce pattern is valid")
});

/// Date coded enterprise releases such as `v202410-1`.
static DATED_RELEASE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)v[0-9]{6}-\d+").expect("dated release pattern is valid"));

static STAGED_NAME: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^([^\s()]+) \(([^()]*)\)$").expect("staged version pattern is valid")
});

static STAGE_SUFFIX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\s*\([^)]+\)").expect("stage suffix pattern is valid"));

/// A `major.minor.patch` triple, ordered numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
	pub major: u64,
	pub minor: u64,
	pub patch: u64,
}

impl Version {
	pub fn new(major: u64, minor: u64, patch: u64) -> Self {
		Self {
			major,
			minor,
			patch,
		}
	}

	/// Pull the first `major[.minor[.patch]]` run of digits out of `input`,
	/// filling missing parts with zero. `v1.21.x` coerces to `1.21.0` and
	/// `terraform 2` to `2.0.0`.
	pub fn coerce(input: &str) -> Option<Self> {
		let captures = COERCE.captures(input)?;
		let part = |index: usize| {
			captures
				.get(index)
				.map_or(Some(0), |part| part.as_str().parse::<u64>().ok())
		};

		Some(Self::new(part(1)?, part(2)?, part(3)?))
	}

	/// Normalize a version as it appears in directories and directives:
	/// anything after the first space is dropped, then a leading `v` and a
	/// trailing `.x` are rewritten before coercion.
	pub fn normalize(input: &str) -> Option<Self> {
		let head = input.split(' ').next().unwrap_or_default();
		let head = head.strip_prefix('v').unwrap_or(head);
		let head = head
			.strip_suffix(".x")
			.map_or_else(|| head.to_string(), |prefix| format!("{prefix}.0"));

		Self::coerce(&head)
	}
}

impl fmt::Display for Version {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStage {
	Stable,
	Alpha,
	Beta,
	Rc,
}

impl ReleaseStage {
	/// Parse one of the accepted pre-release labels.
	pub fn from_label(label: &str) -> Option<Self> {
		match label {
			"alpha" => Some(Self::Alpha),
			"beta" => Some(Self::Beta),
			"rc" => Some(Self::Rc),
			_ => None,
		}
	}

	pub fn is_stable(self) -> bool {
		self == Self::Stable
	}
}

impl fmt::Display for ReleaseStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			Self::Stable => "stable",
			Self::Alpha => "alpha",
			Self::Beta => "beta",
			Self::Rc => "rc",
		};
		f.write_str(label)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
	pub version: String,
	pub release_stage: ReleaseStage,
	pub is_latest: bool,
}

impl VersionEntry {
	fn unversioned() -> Self {
		Self {
			version: UNVERSIONED.to_string(),
			release_stage: ReleaseStage::Stable,
			is_latest: true,
		}
	}
}

/// Product slug to its versions, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref, DerefMut)]
#[serde(transparent)]
pub struct VersionMetadata(BTreeMap<String, Vec<VersionEntry>>);

impl VersionMetadata {
	pub fn new() -> Self {
		Self::default()
	}

	/// The entry flagged as latest for `product`.
	pub fn latest(&self, product: &str) -> Option<&VersionEntry> {
		self.get(product)?.iter().find(|entry| entry.is_latest)
	}

	/// Whether `version` is the latest version of `product`.
	pub fn is_latest(&self, product: &str, version: &str) -> bool {
		self.latest(product)
			.is_some_and(|entry| entry.version == version)
	}

	pub fn load(path: &Path) -> PipelineResult<Self> {
		let content = std::fs::read_to_string(path)?;
		serde_json::from_str(&content).map_err(|e| {
			PipelineError::VersionMetadataFile {
				path: path.display().to_string(),
				reason: e.to_string(),
			}
		})
	}

	pub fn write(&self, path: &Path) -> PipelineResult<()> {
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		let json = serde_json::to_string_pretty(self).map_err(|e| {
			PipelineError::VersionMetadataFile {
				path: path.display().to_string(),
				reason: e.to_string(),
			}
		})?;
		std::fs::write(path, format!("{json}\n"))?;

		Ok(())
	}
}

/// A version directory name without its release stage suffix:
/// `v1.21.x (rc)` becomes `v1.21.x`.
pub fn clean_version(name: &str) -> String {
	STAGE_SUFFIX.replace(name, "").trim().to_string()
}

/// How a version directory name sorts.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SortKey {
	Semver(Version),
	Opaque(String),
}

impl SortKey {
	fn from_name(name: &str) -> Self {
		let clean = STAGE_SUFFIX.replace(name, "");
		let clean = clean
			.strip_suffix(".x")
			.map_or_else(|| clean.to_string(), |prefix| format!("{prefix}.0"));

		if DATED_RELEASE.is_match(&clean) {
			return Self::Opaque(clean);
		}

		match Version::coerce(&clean) {
			Some(version) => Self::Semver(version),
			None => Self::Opaque(clean),
		}
	}
}

/// Split a directory name into its clean version and release stage.
fn parse_version_name(product: &str, name: &str) -> PipelineResult<(String, ReleaseStage)> {
	if !name.contains(['(', ')']) {
		return Ok((name.to_string(), ReleaseStage::Stable));
	}

	let captures = STAGED_NAME
		.captures(name)
		.ok_or_else(|| {
			PipelineError::InvalidVersionFormat {
				product: product.to_string(),
				version: name.to_string(),
			}
		})?;
	let stage = &captures[2];
	let release_stage = ReleaseStage::from_label(stage).ok_or_else(|| {
		PipelineError::InvalidReleaseStage {
			product: product.to_string(),
			version: name.to_string(),
			stage: stage.to_string(),
		}
	})?;

	Ok((captures[1].to_string(), release_stage))
}

/// Order the version directory names of one product newest first and tag
/// each with its release stage and whether it is the latest release.
///
/// Semantic versions sort descending ahead of opaque names, which sort
/// descending as strings. The latest version is the first stable entry; when
/// every entry is a pre-release the newest one is used.
pub fn build_product_versions(product: &str, names: &[String]) -> PipelineResult<Vec<VersionEntry>> {
	let mut keyed: Vec<(SortKey, &String)> =
		names.iter().map(|name| (SortKey::from_name(name), name)).collect();

	keyed.sort_by(|(a, _), (b, _)| {
		match (a, b) {
			(SortKey::Semver(a), SortKey::Semver(b)) => b.cmp(a),
			(SortKey::Opaque(a), SortKey::Opaque(b)) => b.cmp(a),
			(SortKey::Semver(_), SortKey::Opaque(_)) => Ordering::Less,
			(SortKey::Opaque(_), SortKey::Semver(_)) => Ordering::Greater,
		}
	});

	let mut entries = keyed
		.into_iter()
		.map(|(_, name)| {
			let (version, release_stage) = parse_version_name(product, name)?;
			Ok(VersionEntry {
				version,
				release_stage,
				is_latest: false,
			})
		})
		.collect::<PipelineResult<Vec<_>>>()?;

	let leading_prereleases = entries
		.iter()
		.take_while(|entry| !entry.release_stage.is_stable())
		.count();
	let latest = if leading_prereleases == entries.len() {
		0
	} else {
		leading_prereleases
	};
	if let Some(entry) = entries.get_mut(latest) {
		entry.is_latest = true;
	}

	Ok(entries)
}

/// Scan `content_root` (one directory per product, one per version inside
/// it) and build the version table for every configured product.
pub fn gather_version_metadata(
	content_root: &Path,
	products: &BTreeMap<String, ProductConfig>,
) -> PipelineResult<VersionMetadata> {
	let mut metadata = VersionMetadata::new();

	for product in list_directories(content_root)? {
		let Some(config) = products.get(&product) else {
			tracing::warn!(product = %product, "skipping content directory without a product config");
			continue;
		};

		if !config.versioned_docs {
			metadata.insert(product, vec![VersionEntry::unversioned()]);
			continue;
		}

		let names: Vec<String> = list_directories(&content_root.join(&product))?
			.into_iter()
			.filter(|name| !config.semver_coerce || Version::coerce(name).is_some())
			.collect();
		let entries = build_product_versions(&product, &names)?;
		tracing::debug!(product = %product, versions = entries.len(), "gathered versions");
		metadata.insert(product, entries);
	}

	Ok(metadata)
}

fn list_directories(path: &Path) -> PipelineResult<Vec<String>> {
	let mut names = Vec::new();

	for entry in std::fs::read_dir(path)? {
		let entry = entry?;
		if entry.file_type()?.is_dir() {
			names.push(entry.file_name().to_string_lossy().into_owned());
		}
	}
	names.sort();

	Ok(names)
}
