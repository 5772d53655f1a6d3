#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn vdocs_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("vdocs"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("RUST_LOG");
	cmd
}

pub const CONFIG: &str = r#"jobs = 2

[products.vault]
supports_exclusion_directives = true
base_paths = ["docs", "api-docs"]

[products.hcp-docs]
versioned_docs = false
"#;

pub fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, contents)
}

/// A small project with two Vault versions and one non-versioned product.
pub fn write_project(root: &Path) -> std::io::Result<()> {
	write_file(&root.join("vdocs.toml"), CONFIG)?;

	let content = root.join("content");
	write_file(
		&content.join("vault/v1.20.x/docs/index.mdx"),
		"---\npage_title: Vault\n---\n\n# Vault\n\n<!-- BEGIN: Vault:>=v1.21.x -->\n\nNew in \
		 1.21.\n\n<!-- END: Vault:>=v1.21.x -->\n\nSee the [API](/vault/api-docs/secret).\n",
	)?;
	write_file(
		&content.join("vault/v1.21.x/docs/index.mdx"),
		"# Vault\n\n<!-- BEGIN: Vault:>=v1.21.x -->\n\nNew in 1.21.\n\n<!-- END: Vault:>=v1.21.x \
		 -->\n\n~> Upgrade first.\n",
	)?;
	write_file(
		&content.join("vault/v1.22.x (rc)/docs/index.mdx"),
		"# Vault\n",
	)?;
	write_file(&content.join("hcp-docs/docs/index.mdx"), "# HCP\n")?;

	Ok(())
}
