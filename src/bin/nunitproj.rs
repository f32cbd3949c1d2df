//! Open a project file (or start a new one) and print what it contains.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use nunitproj_rs::ProjectDocument;
use nunitproj_rs::path_utils::{relative_path, standardize_separators};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "nunitproj", version, about = "Inspect NUnit project files")]
struct Cli {
    /// Project file to open.  Without one, a new empty project is started.
    path: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long)]
    verbose: bool,

    /// Print assembly paths relative to this directory.
    #[arg(long, value_name = "DIR")]
    relative_to: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut doc = ProjectDocument::new();
    match &cli.path {
        Some(path) => doc
            .open_project(path)
            .with_context(|| format!("failed to open {}", path.display()))?,
        None => doc.create_new_project().context("failed to start a new project")?,
    }

    let relative_to = cli
        .relative_to
        .as_ref()
        .map(|d| standardize_separators(&d.to_string_lossy()));

    print_summary(&doc, relative_to.as_deref());
    Ok(())
}

fn print_summary(doc: &ProjectDocument, relative_to: Option<&str>) {
    let path = doc
        .project_path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    println!("Project: {} ({path})", doc.name().unwrap_or_default());

    if let Some(error) = doc.last_error() {
        println!("  invalid: {error}");
        return;
    }
    if let Some(root) = doc.schema_mismatch() {
        println!("  not a project file: root element is <{root}>");
        return;
    }

    let settings = doc.settings();
    for diagnostic in [
        settings.process_model_parsed().diagnostic,
        settings.domain_usage_parsed().diagnostic,
        settings.auto_config_parsed().diagnostic,
    ]
    .into_iter()
    .flatten()
    {
        tracing::warn!("{diagnostic}");
    }

    println!("  Base path:      {}", settings.effective_base_path().unwrap_or_default());
    println!("  Active config:  {}", settings.active_config_name().unwrap_or("(none)"));
    println!("  Process model:  {}", settings.process_model());
    println!("  Domain usage:   {}", settings.domain_usage());

    for config in doc.configs().iter() {
        for diagnostic in [
            config.bin_path_type_parsed().diagnostic,
            config.runtime_framework_parsed().diagnostic,
        ]
        .into_iter()
        .flatten()
        {
            tracing::warn!(config = ?config.name(), "{diagnostic}");
        }

        println!();
        println!("  [{}]", config.name().unwrap_or("(unnamed)"));
        println!("    Base path:    {}", config.effective_base_path().unwrap_or_default());
        println!("    Runtime:      {}", config.runtime_framework());
        println!("    Bin path:     {} {}", config.bin_path_type(), config.effective_private_bin_path().unwrap_or_default());
        if let Some(file) = config.configuration_file() {
            println!("    Config file:  {file}");
        }
        for assembly in config.assemblies().iter() {
            let shown = relative_to
                .and_then(|dir| relative_path(dir, assembly))
                .unwrap_or_else(|| assembly.to_string());
            println!("    - {shown}");
        }
    }
}
