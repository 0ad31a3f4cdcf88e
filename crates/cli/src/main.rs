use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod config;
mod pipeline;

#[derive(Parser)]
#[command(name = "codeslice")]
#[command(
    about = "Extract the dependency closure of source files into a standalone artifact",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Entry files the closure is computed from
    entry_files: Vec<PathBuf>,

    /// Project root to search for dependencies; repeatable, first match
    /// owns a file's relative path
    #[arg(short = 'd', long = "project-dir")]
    project_dirs: Vec<PathBuf>,

    /// Directory name to ignore everywhere; repeatable
    #[arg(long = "ignore-dir")]
    ignore_dirs: Vec<String>,

    /// File name or glob to ignore everywhere; repeatable
    #[arg(long = "ignore-file")]
    ignore_files: Vec<String>,

    /// Skip the built-in ignore set (.git, __pycache__, node_modules, ...)
    #[arg(long)]
    no_default_ignores: bool,

    /// Destination directory for the extracted tree
    #[arg(short = 'o', long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Write a zip archive with the same relative layout
    #[arg(short = 'z', long = "zip")]
    archive: Option<PathBuf>,

    /// Path to a JSON configuration file; explicit flags win per field
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Extract only the immediate dependencies of the entry files
    #[arg(long)]
    direct_only: bool,

    /// Replace an existing destination directory
    #[arg(long)]
    force: bool,

    /// Write extraction-report.md and extraction-report.json with the output
    #[arg(long)]
    report: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings and errors, no progress
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    if let Err(e) = run(cli).await {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let file_config = match &cli.config {
        Some(path) => config::load(path)?,
        None => config::FileConfig::default(),
    };

    let show_progress = !cli.quiet;
    let mut job = config::merge(&cli, file_config);

    if job.output.is_empty() {
        log::warn!("no output specified, nothing to do (use --output-dir or --zip)");
        return Ok(());
    }

    job.canonicalize()?;
    let summary = pipeline::execute(job, show_progress).await?;

    for warning in &summary.warnings {
        log::warn!("{warning}");
    }
    println!(
        "extracted {} files ({} written), {} external packages, {} warnings",
        summary.files, summary.files_written, summary.external, summary.warnings.len()
    );

    Ok(())
}
