use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use vdocs_cli::Commands;
use vdocs_cli::OutputFormat;
use vdocs_cli::VdocsCli;
use vdocs_core::BuildContext;
use vdocs_core::BuildReport;
use vdocs_core::PipelineError;
use vdocs_core::VdocsConfig;
use vdocs_core::VersionMetadata;
use vdocs_core::build_all;
use vdocs_core::gather_version_metadata;
use vdocs_core::transform_document;
use vdocs_core::write_document;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = VdocsCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Build {
			jobs,
			only_version_metadata,
		}) => run_build(&args, *jobs, *only_version_metadata),
		Some(Commands::VersionMetadata { format }) => run_version_metadata(&args, *format),
		Some(Commands::Transform { file, stdout }) => run_transform(&args, file, *stdout),
		None => {
			eprintln!("No subcommand specified. Run `vdocs --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<PipelineError>() {
			Ok(error) => {
				let report: miette::Report = (*error).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Logs go to stderr so `transform --stdout` output stays clean. `--verbose`
/// wins over `RUST_LOG`.
fn init_tracing(verbose: bool, use_color: bool) {
	let filter = if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.try_init()
		.ok();
}

fn resolve_root(args: &VdocsCli) -> PathBuf {
	let root = args
		.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

	std::path::absolute(&root).unwrap_or(root)
}

fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

fn run_build(
	args: &VdocsCli,
	jobs: Option<usize>,
	only_version_metadata: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let mut config = VdocsConfig::load_required(&root)?;
	if jobs.is_some() {
		config.jobs = jobs;
	}

	tracing::debug!(root = %root.display(), jobs = config.worker_count(), "loaded configuration");

	let ctx = BuildContext::gather(&root, config)?;
	let metadata_path = root.join(&ctx.config.version_metadata_file);
	ctx.metadata.write(&metadata_path)?;
	tracing::info!(path = %metadata_path.display(), products = ctx.metadata.len(), "wrote version metadata");
	println!(
		"Wrote version metadata for {} product(s) to {}",
		ctx.metadata.len(),
		make_relative(&metadata_path, &root)
	);

	if only_version_metadata {
		return Ok(());
	}

	let report = build_all(&ctx)?;
	print_build_report(report, &root, args.verbose);

	Ok(())
}

/// Exits with status 1 when any document failed.
fn print_build_report(report: BuildReport, root: &Path, verbose: bool) {
	if verbose {
		let mut written: Vec<String> = report
			.written
			.iter()
			.map(|path| make_relative(path, root))
			.collect();
		written.sort();
		for path in written {
			println!("  {path}");
		}
	}

	if report.is_ok() {
		println!(
			"{} {} document(s).",
			colored!("Transformed", green),
			report.written.len()
		);
		return;
	}

	let failed = report.failures.len();
	for failure in report.failures {
		eprintln!(
			"{} {}",
			colored!("failed:", red),
			make_relative(&failure.file, root)
		);
		eprintln!("{:?}", miette::Report::new(failure.error));
	}
	println!(
		"Transformed {} document(s), {} failed.",
		report.written.len(),
		failed
	);

	process::exit(1);
}

fn run_version_metadata(args: &VdocsCli, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = VdocsConfig::load_required(&root)?;
	let metadata = gather_version_metadata(&root.join(&config.content_dir), &config.products)?;

	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&metadata)?),
		OutputFormat::Text => print_metadata(&metadata),
	}

	Ok(())
}

fn print_metadata(metadata: &VersionMetadata) {
	if metadata.is_empty() {
		println!("No products found.");
		return;
	}

	for (index, (product, entries)) in metadata.iter().enumerate() {
		if index > 0 {
			println!();
		}
		println!("{}", colored!(product, bold));
		for entry in entries {
			let latest = if entry.is_latest { " (latest)" } else { "" };
			println!("  {:<16} {}{latest}", entry.version, entry.release_stage);
		}
	}
}

fn run_transform(args: &VdocsCli, file: &Path, stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = VdocsConfig::load_required(&root)?;
	let metadata = VersionMetadata::load(&root.join(&config.version_metadata_file))?;
	let ctx = BuildContext::new(&root, config, metadata)?;

	let file = std::path::absolute(file)?;
	let entry = ctx.entry(&file)?;
	tracing::debug!(file = %file.display(), product = %entry.product, "transforming single document");
	let contents = transform_document(&entry, &ctx)?;

	if stdout {
		print!("{contents}");
	} else {
		write_document(&entry, &contents)?;
		println!("Wrote {}", make_relative(&entry.output_path, &root));
	}

	Ok(())
}
