mod common;

use similar_asserts::assert_eq;
use vdocs_core::AnyEmptyResult;

fn prepare(root: &std::path::Path) -> AnyEmptyResult {
	common::write_project(root)?;

	let mut cmd = common::vdocs_cmd();
	let _ = cmd
		.arg("build")
		.arg("--only-version-metadata")
		.arg("--path")
		.arg(root)
		.assert()
		.success();

	Ok(())
}

#[test]
fn transform_prints_to_stdout() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	prepare(tmp.path())?;
	let file = tmp.path().join("content/vault/v1.20.x/docs/index.mdx");

	let mut cmd = common::vdocs_cmd();
	let output = cmd
		.arg("transform")
		.arg(&file)
		.arg("--stdout")
		.arg("--path")
		.arg(tmp.path())
		.output()?;

	assert!(output.status.success());
	assert_eq!(
		String::from_utf8(output.stdout)?,
		"---\npage_title: Vault\n---\n\n# Vault\n\nSee the [API](/vault/api-docs/v1.20.x/secret).\n"
	);
	assert!(!tmp.path().join("public/content").exists());

	Ok(())
}

#[test]
fn transform_writes_output_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	prepare(tmp.path())?;
	let file = tmp.path().join("content/hcp-docs/docs/index.mdx");

	let mut cmd = common::vdocs_cmd();
	let _ = cmd
		.arg("transform")
		.arg(&file)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("public/content/hcp-docs/docs/index.mdx"));

	let written = std::fs::read_to_string(tmp.path().join("public/content/hcp-docs/docs/index.mdx"))?;
	assert_eq!(written, "# HCP\n");

	Ok(())
}

#[test]
fn transform_reports_missing_partial() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	prepare(tmp.path())?;
	let file = tmp.path().join("content/vault/v1.21.x/docs/partial-user.mdx");
	common::write_file(&file, "# Title\n\n@include 'missing.mdx'\n")?;

	let mut cmd = common::vdocs_cmd();
	let _ = cmd
		.arg("transform")
		.arg(&file)
		.arg("--stdout")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("@include file not found"));

	Ok(())
}

#[test]
fn transform_requires_version_metadata() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path())?;
	let file = tmp.path().join("content/vault/v1.20.x/docs/index.mdx");

	let mut cmd = common::vdocs_cmd();
	let _ = cmd
		.arg("transform")
		.arg(&file)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2);

	Ok(())
}

#[test]
fn transform_rejects_unknown_product() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	prepare(tmp.path())?;
	let file = tmp.path().join("content/nomad/v1.0.x/docs/index.mdx");
	common::write_file(&file, "# Nomad\n")?;

	let mut cmd = common::vdocs_cmd();
	let _ = cmd
		.arg("transform")
		.arg(&file)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("nomad"));

	Ok(())
}
