//! Build targets and the table mapping each one to its step sequence.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::Config;
use crate::error::BuildError;
use crate::process::Cmd;
use crate::step::Step;

/// A named, invokable unit of build work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Help,
    Release,
    Universal,
    Linux,
    LinuxArm64,
    Windows,
    Clean,
    DockerLinux,
    DockerLinuxArm64,
    QualityCheck,
    Deploy,
}

impl Target {
    /// Every target, in help-text order.
    pub const ALL: [Target; 11] = [
        Target::Help,
        Target::Release,
        Target::Universal,
        Target::Linux,
        Target::LinuxArm64,
        Target::Windows,
        Target::Clean,
        Target::DockerLinux,
        Target::DockerLinuxArm64,
        Target::QualityCheck,
        Target::Deploy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Target::Help => "help",
            Target::Release => "release",
            Target::Universal => "universal",
            Target::Linux => "linux",
            Target::LinuxArm64 => "linux-arm64",
            Target::Windows => "windows",
            Target::Clean => "clean",
            Target::DockerLinux => "docker-linux",
            Target::DockerLinuxArm64 => "docker-linux-arm64",
            Target::QualityCheck => "quality-check",
            Target::Deploy => "deploy",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Target::Help => "Show this help",
            Target::Release => "Build macOS release binary for the host architecture",
            Target::Universal => "Build macOS universal binary (x86_64 + arm64)",
            Target::Linux => "Cross-compile Linux x86_64 binary",
            Target::LinuxArm64 => "Cross-compile Linux arm64 binary",
            Target::Windows => "Cross-compile Windows x86_64 binary",
            Target::Clean => "Remove the output directory",
            Target::DockerLinux => "Build Linux x86_64 binary and its container image",
            Target::DockerLinuxArm64 => "Build Linux arm64 binary and its container image",
            Target::QualityCheck => "Run format check, clippy (warnings are errors) and tests",
            Target::Deploy => "Build release, linux, linux-arm64 and windows, then list artifacts",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| BuildError::UnknownTarget(s.to_string()))
    }
}

// =============================================================================
// Platforms
// =============================================================================

/// A compilation platform of the bosua workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Human-readable name for status lines.
    pub label: &'static str,
    /// Target triple; `None` builds for the host.
    pub triple: Option<&'static str>,
    /// Binary name in the bosua workspace.
    pub bin: &'static str,
}

pub const MACOS_HOST: Platform = Platform {
    label: "macOS (host architecture)",
    triple: None,
    bin: "bosua-macos",
};

pub const MACOS_X86_64: Platform = Platform {
    label: "macOS x86_64",
    triple: Some("x86_64-apple-darwin"),
    bin: "bosua-macos",
};

pub const MACOS_ARM64: Platform = Platform {
    label: "macOS arm64",
    triple: Some("aarch64-apple-darwin"),
    bin: "bosua-macos",
};

pub const LINUX_X86_64: Platform = Platform {
    label: "Linux x86_64",
    triple: Some("x86_64-unknown-linux-gnu"),
    bin: "bosua-linux",
};

pub const LINUX_ARM64: Platform = Platform {
    label: "Linux arm64",
    triple: Some("aarch64-unknown-linux-gnu"),
    bin: "bosua-linux",
};

pub const WINDOWS_X86_64: Platform = Platform {
    label: "Windows x86_64",
    triple: Some("x86_64-pc-windows-gnu"),
    bin: "bosua-windows",
};

impl Platform {
    fn exe_suffix(&self) -> &'static str {
        match self.triple {
            Some(triple) if triple.contains("windows") => ".exe",
            _ => "",
        }
    }

    /// The release compile invocation for this platform.
    pub fn build_cmd(&self, config: &Config) -> Cmd {
        let mut cmd = Cmd::new(&config.cargo).args(["build", "--release"]);
        if let Some(triple) = self.triple {
            cmd = cmd.args(["--target", triple]);
        }
        cmd.args(["--bin", self.bin]).dir(&config.workspace)
    }

    /// Where cargo leaves the release binary.
    pub fn built_binary(&self, config: &Config) -> PathBuf {
        let mut path = config.workspace.join("target");
        if let Some(triple) = self.triple {
            path.push(triple);
        }
        path.push("release");
        path.push(format!("{}{}", self.bin, self.exe_suffix()));
        path
    }
}

// =============================================================================
// Artifact names
// =============================================================================

pub const RELEASE_ARTIFACT: &str = "bosua";
pub const UNIVERSAL_ARTIFACT: &str = "bosua-universal";
pub const LINUX_ARTIFACT: &str = "bosua-linux";
pub const LINUX_ARM64_ARTIFACT: &str = "bosua-linux-arm64";
pub const WINDOWS_ARTIFACT: &str = "bosua-windows.exe";

pub const DOCKERFILE_AMD64: &str = "Dockerfile.linux-amd64";
pub const DOCKERFILE_ARM64: &str = "Dockerfile.linux-arm64";

// =============================================================================
// Table
// =============================================================================

/// Target name to ordered step list, resolved against one config.
#[derive(Debug, Clone)]
pub struct TargetTable {
    steps: HashMap<Target, Vec<Step>>,
}

impl TargetTable {
    pub fn new(config: &Config) -> Self {
        let steps = Target::ALL
            .into_iter()
            .map(|target| (target, target_steps(target, config)))
            .collect();
        Self { steps }
    }

    /// The step sequence of a target.
    pub fn steps(&self, target: Target) -> &[Step] {
        self.steps.get(&target).map(Vec::as_slice).unwrap_or_default()
    }

    /// Steps of a target with dependent targets flattened in place.
    pub fn expanded(&self, target: Target) -> Vec<&Step> {
        let mut out = Vec::new();
        for step in self.steps(target) {
            match step {
                Step::Run(sub) => out.extend(self.expanded(*sub)),
                _ => out.push(step),
            }
        }
        out
    }
}

fn target_steps(target: Target, config: &Config) -> Vec<Step> {
    let dist = &config.dist_dir;
    match target {
        Target::Help => vec![Step::Usage],
        Target::Release => single_binary(MACOS_HOST, RELEASE_ARTIFACT, config),
        Target::Universal => {
            let output = dist.join(UNIVERSAL_ARTIFACT);
            vec![
                Step::Status("Building macOS universal binary...".into()),
                Step::Tool(MACOS_X86_64.build_cmd(config)),
                Step::Tool(MACOS_ARM64.build_cmd(config)),
                Step::EnsureDir(dist.clone()),
                Step::Merge {
                    tool: config.merge_tool.clone(),
                    inputs: vec![
                        MACOS_X86_64.built_binary(config),
                        MACOS_ARM64.built_binary(config),
                    ],
                    output: output.clone(),
                },
                Step::ReportSize(output),
            ]
        }
        Target::Linux => single_binary(LINUX_X86_64, LINUX_ARTIFACT, config),
        Target::LinuxArm64 => single_binary(LINUX_ARM64, LINUX_ARM64_ARTIFACT, config),
        Target::Windows => single_binary(WINDOWS_X86_64, WINDOWS_ARTIFACT, config),
        Target::Clean => vec![Step::RemoveDir(dist.clone())],
        Target::DockerLinux => container(
            Target::Linux,
            "linux/amd64",
            DOCKERFILE_AMD64,
            config.image_ref(""),
            config,
        ),
        Target::DockerLinuxArm64 => container(
            Target::LinuxArm64,
            "linux/arm64",
            DOCKERFILE_ARM64,
            config.image_ref("-arm64"),
            config,
        ),
        Target::QualityCheck => {
            let cargo = |args: &[&str]| {
                Step::Tool(Cmd::new(&config.cargo).args(args).dir(&config.workspace))
            };
            vec![
                Step::Status("Checking formatting...".into()),
                cargo(&["fmt", "--all", "--", "--check"]),
                Step::Status("Running clippy...".into()),
                cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"]),
                Step::Status("Running tests...".into()),
                cargo(&["test", "--workspace"]),
                Step::Done("All quality checks passed".into()),
            ]
        }
        Target::Deploy => vec![
            Step::Status("Building all release artifacts...".into()),
            Step::Run(Target::Release),
            Step::Run(Target::Linux),
            Step::Run(Target::LinuxArm64),
            Step::Run(Target::Windows),
            Step::ListArtifacts(dist.clone()),
            Step::WriteChecksums(dist.clone()),
            Step::Done(format!("Release artifacts ready in {}", dist.display())),
        ],
    }
}

/// compile -> ensure output dir -> copy to the fixed name -> report size
fn single_binary(platform: Platform, artifact: &str, config: &Config) -> Vec<Step> {
    let output = config.dist_dir.join(artifact);
    vec![
        Step::Status(format!("Building bosua for {}...", platform.label)),
        Step::Tool(platform.build_cmd(config)),
        Step::EnsureDir(config.dist_dir.clone()),
        Step::Copy {
            from: platform.built_binary(config),
            to: output.clone(),
        },
        Step::ReportSize(output),
    ]
}

fn container(
    binary: Target,
    platform: &str,
    dockerfile: &str,
    image: String,
    config: &Config,
) -> Vec<Step> {
    vec![
        Step::Run(binary),
        Step::Status(format!("Building container image {} ({})...", image, platform)),
        Step::Tool(
            Cmd::new(&config.container_engine)
                .args(["build", "--platform", platform, "-f", dockerfile, "-t"])
                .arg(&image)
                .arg(".")
                .dir(&config.workspace),
        ),
        Step::Done(format!("Built image {}", image)),
    ]
}

/// Usage text listing every target.
pub fn usage_text(config: &Config) -> String {
    let mut out = String::new();
    out.push_str("bosua-build - build and release automation for bosua\n\n");
    out.push_str("USAGE:\n  bosua-build [OPTIONS] [TARGET]\n\n");
    out.push_str("TARGETS:\n");
    for target in Target::ALL {
        let marker = if target.name() == config.default_target {
            " (default)"
        } else {
            ""
        };
        out.push_str(&format!(
            "  {:<20}{}{}\n",
            target.name(),
            target.description(),
            marker
        ));
    }
    out.push_str(&format!(
        "\nOutput directory: {}\nContainer image:  {}\n",
        config.dist_dir.display(),
        config.image_ref("")
    ));
    out
}
