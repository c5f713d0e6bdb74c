//! Target dispatch and step execution.
//!
//! Steps run strictly in order; the first failure aborts the target and
//! every target that depends on it.

use anyhow::{Context, Result};
use std::fs;
use std::rc::Rc;

use crate::clean;
use crate::config::Config;
use crate::dist;
use crate::process::Runner;
use crate::step::Step;
use crate::target::{usage_text, Target, TargetTable};
use crate::timing::Timer;

pub struct Orchestrator<R: Runner> {
    config: Config,
    table: Rc<TargetTable>,
    runner: R,
}

impl<R: Runner> Orchestrator<R> {
    pub fn new(config: Config, runner: R) -> Self {
        let table = Rc::new(TargetTable::new(&config));
        Self {
            config,
            table,
            runner,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn table(&self) -> &TargetTable {
        &self.table
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Resolve a CLI target name, falling back to the configured default.
    pub fn resolve(&self, name: Option<&str>) -> Result<Target> {
        let name = name.unwrap_or(&self.config.default_target);
        Ok(name.parse::<Target>()?)
    }

    /// Execute a target's step sequence.
    pub fn run(&mut self, target: Target) -> Result<()> {
        tracing::debug!(%target, "running target");
        let timer = (target != Target::Help).then(|| Timer::start(target.name()));

        let table = Rc::clone(&self.table);
        for step in table.steps(target) {
            self.execute(step)
                .with_context(|| format!("target '{}' failed", target))?;
        }

        if let Some(timer) = timer {
            timer.finish();
        }
        Ok(())
    }

    fn execute(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::Status(text) => println!("{}", text),
            Step::Tool(cmd) => {
                println!("  $ {}", cmd);
                self.runner.run(cmd)?;
            }
            Step::EnsureDir(dir) => {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
            Step::Copy { from, to } => {
                dist::copy_artifact(from, to)?;
                println!("  Copied {} -> {}", from.display(), to.display());
            }
            Step::Merge {
                tool,
                inputs,
                output,
            } => {
                for input in inputs {
                    dist::require_file(input)?;
                }
                let cmd = Step::merge_cmd(tool, inputs, output);
                println!("  $ {}", cmd);
                self.runner.run(&cmd)?;
            }
            Step::ReportSize(path) => {
                let size = dist::artifact_size(path)?;
                println!("  {}: {}", path.display(), dist::human_size(size));
            }
            Step::RemoveDir(dir) => {
                clean::clean_outputs(dir, &self.config.workspace)?;
            }
            Step::Run(target) => self.run(*target)?,
            Step::ListArtifacts(dir) => {
                let artifacts = dist::list_artifacts(dir)?;
                dist::print_artifacts(dir, &artifacts);
            }
            Step::WriteChecksums(dir) => {
                let out = dist::write_checksums(dir)?;
                println!("  Wrote {}", out.display());
            }
            Step::Usage => print!("{}", usage_text(&self.config)),
            Step::Done(text) => println!("{}", text),
        }
        Ok(())
    }

    /// The expanded step plan of a target, one line per step.
    ///
    /// Dependent targets are expanded in place, indented under their `run`
    /// line.
    pub fn plan(&self, target: Target) -> Vec<String> {
        let mut lines = vec![format!("{}:", target)];
        self.plan_into(target, 1, &mut lines);
        lines
    }

    fn plan_into(&self, target: Target, depth: usize, lines: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        for step in self.table.steps(target) {
            lines.push(format!("{}{}", indent, step));
            if let Step::Run(sub) = step {
                self.plan_into(*sub, depth + 1, lines);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::RecordingRunner;
    use std::path::PathBuf;

    fn orchestrator() -> Orchestrator<RecordingRunner> {
        Orchestrator::new(Config::default(), RecordingRunner::new())
    }

    #[test]
    fn test_resolve_default_target() {
        let orch = orchestrator();
        assert_eq!(orch.resolve(None).unwrap(), Target::Release);
        assert_eq!(orch.resolve(Some("deploy")).unwrap(), Target::Deploy);
    }

    #[test]
    fn test_resolve_configured_default() {
        let config = Config {
            default_target: "help".into(),
            ..Config::default()
        };
        let orch = Orchestrator::new(config, RecordingRunner::new());
        assert_eq!(orch.resolve(None).unwrap(), Target::Help);
    }

    #[test]
    fn test_resolve_unknown() {
        let err = orchestrator().resolve(Some("bogus")).unwrap_err();
        assert!(err.to_string().contains("no such target: 'bogus'"));
    }

    #[test]
    fn test_help_runs_no_tools() {
        let mut orch = orchestrator();
        orch.run(Target::Help).unwrap();
        assert!(orch.runner().calls().is_empty());
    }

    #[test]
    fn test_plan_expands_dependencies() {
        let config = Config {
            dist_dir: PathBuf::from("out"),
            ..Config::default()
        };
        let orch = Orchestrator::new(config, RecordingRunner::new());
        let plan = orch.plan(Target::DockerLinux);

        assert_eq!(plan[0], "docker-linux:");
        assert_eq!(plan[1], "  run linux");
        assert!(plan[3].starts_with("    cargo build --release --target x86_64-unknown-linux-gnu"));
        assert!(plan
            .iter()
            .any(|l| l == "    cp ./target/x86_64-unknown-linux-gnu/release/bosua-linux out/bosua-linux"));
        assert!(plan.iter().any(|l| l.starts_with("  docker build --platform linux/amd64")));
    }
}
