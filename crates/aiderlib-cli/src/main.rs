//! aiderlib installer binary.
//!
//! `aiderlib install` acquires uv and provisions the interpreter
//! environment; both steps are idempotent, so it is safe to run on every
//! startup. Any bootstrap failure exits non-zero with the underlying cause
//! printed, distinct from interpreter-level exit codes which only ever
//! surface through the run-time bridge.

use std::path::{Path, PathBuf};

use aiderlib_bootstrap::{run_install, InstallOptions, DEFAULT_PYTHON_VERSION};
use aiderlib_core::{AmbientCredentials, InstallLayout};
use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aiderlib", about = "Provision and inspect the aider runtime", version)]
struct Cli {
    /// Installation root (defaults to AIDERLIB_DATA_DIR or the platform
    /// data directory).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download uv and provision the interpreter environment
    Install {
        /// Python version to pin the virtualenv to
        #[arg(long, default_value = DEFAULT_PYTHON_VERSION)]
        python: String,
    },
    /// Show the state of the installation
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let layout = match cli.data_dir {
        Some(root) => InstallLayout::new(root),
        None => InstallLayout::discover()?,
    };

    match cli.command {
        Commands::Install { python } => install(&layout, &python).await,
        Commands::Status => {
            status(&layout);
            Ok(())
        }
    }
}

async fn install(layout: &InstallLayout, python: &str) -> Result<()> {
    println!(
        "Installing the aider runtime into {}...",
        layout.root().display()
    );

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
            .unwrap()
            .progress_chars("█▓░"),
    );

    let progress = |downloaded: u64, total: u64| {
        if total > 0 {
            bar.set_length(total);
        }
        bar.set_position(downloaded);
    };

    let env = run_install(
        layout,
        InstallOptions {
            python_version: python,
            progress: Some(&progress),
        },
    )
    .await?;
    bar.finish_and_clear();

    println!("✓ aider runtime installed");
    println!("  uv:          {}", layout.uv_path().display());
    println!("  interpreter: {}", env.interpreter.display());
    Ok(())
}

fn status(layout: &InstallLayout) {
    println!("Installation root: {}", layout.root().display());
    print_item("uv binary", &layout.uv_path());
    print_item("interpreter", &layout.interpreter_path());
    print_item("completion marker", &layout.marker_path());

    let marker = layout.marker_path();
    if marker.exists() {
        if let Ok(content) = std::fs::read_to_string(&marker) {
            println!("  {}", content.trim());
        }
    } else {
        println!("Run 'aiderlib install' to provision the runtime.");
    }

    if !AmbientCredentials::from_env().has_any() {
        println!("  ! no provider credentials detected in the environment");
    }
}

fn print_item(label: &str, path: &Path) {
    let state = if path.exists() { "✓" } else { "✗" };
    println!("  {state} {label:<17} {}", path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
