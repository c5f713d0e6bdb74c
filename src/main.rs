//! bosua-build - release driver for bosua.
//!
//! Cross-compiles the bosua binaries, merges the macOS universal binary,
//! builds container images and runs the quality gate.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use bosua_build::error::exit_code_for;
use bosua_build::preflight;
use bosua_build::process::SystemRunner;
use bosua_build::{Config, Orchestrator};

#[derive(Parser)]
#[command(name = "bosua-build")]
#[command(about = "Build and release automation for bosua")]
#[command(
    after_help = "TARGETS:\n  help, release, universal, linux, linux-arm64, windows, clean,\n  docker-linux, docker-linux-arm64, quality-check, deploy\n\nRun 'bosua-build help' for descriptions."
)]
struct Cli {
    /// Target to run (default: release, or BOSUA_DEFAULT_TARGET)
    target: Option<String>,

    /// Output directory for artifacts
    #[arg(long, value_name = "DIR")]
    dist_dir: Option<PathBuf>,

    /// Container image name
    #[arg(long)]
    image_name: Option<String>,

    /// Container image tag
    #[arg(long)]
    image_tag: Option<String>,

    /// The bosua cargo workspace to build
    #[arg(long, value_name = "DIR")]
    workspace: Option<PathBuf>,

    /// Print the expanded step plan without running anything
    #[arg(long)]
    dry_run: bool,

    /// Verify required host tools before running the target
    #[arg(long)]
    check: bool,

    /// Print the resolved configuration and exit
    #[arg(long)]
    show_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.dist_dir {
            config.dist_dir = dir.clone();
        }
        if let Some(name) = &self.image_name {
            config.image_name = name.clone();
        }
        if let Some(tag) = &self.image_tag {
            config.image_tag = tag.clone();
        }
        if let Some(workspace) = &self.workspace {
            config.workspace = workspace.clone();
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load();
    cli.apply(&mut config);

    if cli.show_config {
        config.print();
        return Ok(());
    }

    let mut orchestrator = Orchestrator::new(config, SystemRunner);
    // Unknown names fail here, before any step.
    let target = orchestrator.resolve(cli.target.as_deref())?;

    if cli.dry_run {
        for line in orchestrator.plan(target) {
            println!("{}", line);
        }
        return Ok(());
    }

    if cli.check {
        preflight::run_preflight_or_fail(orchestrator.table(), target, orchestrator.config())?;
    }

    orchestrator.run(target)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}
