mod common;

use predicates::prelude::PredicateBooleanExt;
use similar_asserts::assert_eq;
use vdocs_core::AnyEmptyResult;
use vdocs_core::VersionMetadata;

#[test]
fn build_transforms_every_document() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path())?;

	let mut cmd = common::vdocs_cmd();
	let _ = cmd
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Transformed 4 document(s)."));

	let output = tmp.path().join("public/content");
	let older = std::fs::read_to_string(output.join("vault/v1.20.x/docs/index.mdx"))?;
	assert_eq!(
		older,
		"---\npage_title: Vault\n---\n\n# Vault\n\nSee the [API](/vault/api-docs/v1.20.x/secret).\n"
	);

	let latest = std::fs::read_to_string(output.join("vault/v1.21.x/docs/index.mdx"))?;
	assert_eq!(
		latest,
		"# Vault\n\n<!-- BEGIN: Vault:>=v1.21.x -->\n\nNew in 1.21.\n\n<!-- END: Vault:>=v1.21.x \
		 -->\n\n<div className=\"alert alert-warning g-type-body\">\n\nUpgrade first.\n\n</div>\n"
	);

	let hcp = std::fs::read_to_string(output.join("hcp-docs/docs/index.mdx"))?;
	assert_eq!(hcp, "# HCP\n");

	Ok(())
}

#[test]
fn build_writes_version_metadata() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path())?;

	let mut cmd = common::vdocs_cmd();
	let _ = cmd
		.arg("build")
		.arg("--only-version-metadata")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("app/api/versionMetadata.json"));

	let metadata = VersionMetadata::load(&tmp.path().join("app/api/versionMetadata.json"))?;
	let latest = metadata.latest("vault").map(|entry| entry.version.as_str());
	assert_eq!(latest, Some("v1.21.x"));
	assert_eq!(metadata["vault"].len(), 3);
	assert_eq!(metadata["hcp-docs"][0].version, "v0.0.x");
	assert!(!tmp.path().join("public/content").exists());

	Ok(())
}

#[test]
fn build_logs_progress_when_verbose() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path())?;

	let mut cmd = common::vdocs_cmd();
	let _ = cmd
		.arg("build")
		.arg("--only-version-metadata")
		.arg("--verbose")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("loaded configuration"))
		.stderr(predicates::str::contains("wrote version metadata"));

	let mut cmd = common::vdocs_cmd();
	let _ = cmd
		.arg("build")
		.arg("--only-version-metadata")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("wrote version metadata").not());

	Ok(())
}

#[test]
fn build_reports_failed_documents() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path())?;
	common::write_file(
		&tmp.path().join("content/vault/v1.21.x/docs/broken.mdx"),
		"<!-- BEGIN: Vault:>=v1.21.x -->\n\nNever closed.\n",
	)?;

	let mut cmd = common::vdocs_cmd();
	let _ = cmd
		.arg("build")
		.arg("--jobs")
		.arg("1")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stdout(predicates::str::contains("Transformed 4 document(s), 1 failed."))
		.stderr(predicates::str::contains("broken.mdx"));

	assert!(
		!tmp
			.path()
			.join("public/content/vault/v1.21.x/docs/broken.mdx")
			.exists()
	);

	Ok(())
}

#[test]
fn build_without_config_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	let mut cmd = common::vdocs_cmd();
	let _ = cmd
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("vdocs.toml"));

	Ok(())
}

#[test]
fn build_rejects_bad_version_directories() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path())?;
	std::fs::create_dir_all(tmp.path().join("content/vault/v1.23.x (gamma)"))?;

	let mut cmd = common::vdocs_cmd();
	let _ = cmd
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("gamma"));

	Ok(())
}
