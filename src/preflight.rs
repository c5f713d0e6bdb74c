//! Preflight checks for a build target.
//!
//! Verifies the host tools, rustup targets and image definitions a target
//! needs before any of its steps run.

use anyhow::Result;
use std::collections::BTreeSet;

use crate::config::Config;
use crate::error::BuildError;
use crate::process::{self, Cmd};
use crate::step::Step;
use crate::target::{Target, TargetTable};

/// Result of a single preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed.
    Pass,
    /// Check failed - build will fail.
    Fail,
    /// Check passed but with a warning.
    Warn,
}

impl CheckResult {
    pub fn pass_with(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            details: Some(details.to_string()),
        }
    }

    pub fn fail(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Fail,
            details: Some(details.to_string()),
        }
    }

    pub fn warn(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warn,
            details: Some(details.to_string()),
        }
    }
}

/// Results of all preflight checks.
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    /// Returns true if no check failed.
    pub fn all_passed(&self) -> bool {
        !self.checks.iter().any(|c| c.status == CheckStatus::Fail)
    }

    pub fn fail_count(&self) -> usize {
        self.count(CheckStatus::Fail)
    }

    pub fn warn_count(&self) -> usize {
        self.count(CheckStatus::Warn)
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    /// Print the report to stdout.
    pub fn print(&self) {
        println!("=== Preflight Check Results ===\n");

        if self.checks.is_empty() {
            println!("  Nothing to check.\n");
            return;
        }

        for check in &self.checks {
            let status_str = match check.status {
                CheckStatus::Pass => "PASS",
                CheckStatus::Fail => "FAIL",
                CheckStatus::Warn => "WARN",
            };

            print!("  [{}] {}", status_str, check.name);
            if let Some(details) = &check.details {
                println!(": {}", details);
            } else {
                println!();
            }
        }

        println!();
        let total = self.checks.len();
        let passed = self.count(CheckStatus::Pass);
        println!("Summary: {}/{} passed", passed, total);
        if self.fail_count() > 0 {
            println!("         {} FAILED - build will not succeed", self.fail_count());
        }
        if self.warn_count() > 0 {
            println!("         {} warnings", self.warn_count());
        }
        println!();
    }
}

/// Run every check the target's expanded step list calls for.
pub fn run_preflight(table: &TargetTable, target: Target, config: &Config) -> PreflightReport {
    let steps = table.expanded(target);
    let mut checks = Vec::new();

    let programs: BTreeSet<&str> = steps.iter().filter_map(|s| s.program()).collect();
    for program in &programs {
        checks.push(check_program(program));
    }

    let uses_cargo = programs.contains(config.cargo.as_str());
    if uses_cargo {
        let manifest = config.workspace.join("Cargo.toml");
        if manifest.is_file() {
            checks.push(CheckResult::pass_with("Workspace", &manifest.display().to_string()));
        } else {
            checks.push(CheckResult::fail(
                "Workspace",
                &format!("{} not found (set BOSUA_WORKSPACE)", manifest.display()),
            ));
        }
    }

    let triples: BTreeSet<&str> = steps.iter().filter_map(|s| flag_value(s, "--target")).collect();
    if !triples.is_empty() {
        checks.extend(check_rust_targets(&triples, config));
    }

    for dockerfile in steps.iter().filter_map(|s| flag_value(s, "-f")) {
        let path = config.workspace.join(dockerfile);
        if path.is_file() {
            checks.push(CheckResult::pass_with(dockerfile, "Found"));
        } else {
            checks.push(CheckResult::fail(
                dockerfile,
                &format!("{} not found", path.display()),
            ));
        }
    }

    PreflightReport { checks }
}

/// Run preflight, print the report, and fail if anything failed.
pub fn run_preflight_or_fail(table: &TargetTable, target: Target, config: &Config) -> Result<()> {
    let report = run_preflight(table, target, config);
    report.print();
    if !report.all_passed() {
        return Err(BuildError::PreflightFailed(report.fail_count()).into());
    }
    Ok(())
}

fn check_program(program: &str) -> CheckResult {
    match process::which(program) {
        Some(path) => CheckResult::pass_with(program, &path.display().to_string()),
        None => CheckResult::fail(program, "Not found in PATH"),
    }
}

/// Value following `flag` in a tool step's arguments.
fn flag_value<'a>(step: &'a Step, flag: &str) -> Option<&'a str> {
    let Step::Tool(cmd) = step else {
        return None;
    };
    let args = cmd.get_args();
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn check_rust_targets(triples: &BTreeSet<&str>, config: &Config) -> Vec<CheckResult> {
    if !process::exists("rustup") {
        return vec![CheckResult::warn(
            "Rust targets",
            "rustup not found, cannot verify installed targets",
        )];
    }

    let installed = match Cmd::new("rustup")
        .args(["target", "list", "--installed"])
        .dir(&config.workspace)
        .run()
    {
        Ok(result) => result.stdout,
        Err(e) => {
            return vec![CheckResult::warn(
                "Rust targets",
                &format!("could not list installed targets: {:#}", e),
            )]
        }
    };

    triples
        .iter()
        .map(|triple| check_triple(triple, &installed))
        .collect()
}

fn check_triple(triple: &str, installed: &str) -> CheckResult {
    if installed.lines().any(|l| l.trim() == triple) {
        CheckResult::pass_with(triple, "Installed")
    } else {
        CheckResult::warn(
            triple,
            &format!("Not installed (rustup target add {})", triple),
        )
    }
}
