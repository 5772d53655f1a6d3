//! `vdocs_core` is the build-time transform engine for a documentation corpus
//! that spans many products and many versions of each. Every source document
//! is turned into the document that gets published for one product at one
//! version.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Markdown document
//!   → Frontmatter split (YAML kept verbatim)
//!   → Parser (markdown into a Node tree with per-document node ids)
//!   → Partials (`@include 'file'` paragraphs replaced, recursively)
//!   → Directives (BEGIN/END blocks parsed, routed per product, removed by id)
//!   → Alerts (`=> `, `-> `, `~> `, `!> ` paragraphs wrapped)
//!   → Redirects (legacy urls rewritten through compiled rules)
//!   → Link versioning (version segment spliced into same-product links)
//!   → Serializer (tree back to markdown, frontmatter reattached)
//! ```
//!
//! ## Directive blocks
//!
//! ```md
//! <!-- BEGIN: Vault:>=v1.21.x -->
//! Only published for Vault 1.21 and later.
//! <!-- END: Vault:>=v1.21.x -->
//!
//! <!-- BEGIN: TFC:only name:run-tasks -->
//! Only published in the HCP Terraform docs.
//! <!-- END: TFC:only name:run-tasks -->
//! ```
//!
//! ## Key Types
//!
//! - [`Node`] - The document tree, a closed set of node kinds.
//! - [`DirectiveBlock`] - A BEGIN/END region, bounded by node ids.
//! - [`Directive`] - The product rule a block carries.
//! - [`VersionMetadata`] - Versions per product, newest first, with the latest
//!   release flagged.
//! - [`RedirectCache`] - Compiled redirect rules per version directory.
//! - [`BuildContext`] - Everything a build shares between documents.
//! - [`VdocsConfig`] - Configuration loaded from `vdocs.toml`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use vdocs_core::BuildContext;
//! use vdocs_core::VdocsConfig;
//! use vdocs_core::build_all;
//!
//! let root = Path::new(".");
//! let config = VdocsConfig::load_required(root).unwrap();
//! let ctx = BuildContext::gather(root, config).unwrap();
//!
//! let report = build_all(&ctx).unwrap();
//! for failure in &report.failures {
//!     eprintln!("{}: {}", failure.file.display(), failure.error);
//! }
//! ```

pub use alerts::*;
pub use config::*;
pub use directive::*;
pub use error::*;
pub use frontmatter::*;
pub use links::*;
pub use partials::*;
pub use pipeline::*;
pub use position::*;
pub use redirects::*;
pub use remove::*;
pub use router::*;
pub use serialize::*;
pub use tree::*;
pub use version::*;

mod alerts;
pub mod config;
mod directive;
#[allow(unused_assignments)]
mod error;
mod frontmatter;
mod links;
mod partials;
mod pipeline;
mod position;
pub mod redirects;
mod remove;
mod router;
mod serialize;
mod tree;
pub mod version;
