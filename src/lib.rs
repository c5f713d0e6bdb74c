//! bosua-build library exports.
//!
//! The binary is a thin clap layer over these modules; integration tests
//! drive the orchestrator directly with a recording runner.

pub mod clean;
pub mod config;
pub mod dist;
pub mod error;
pub mod orchestrator;
pub mod preflight;
pub mod process;
pub mod step;
pub mod target;
pub mod timing;

pub use config::Config;
pub use error::BuildError;
pub use orchestrator::Orchestrator;
pub use target::Target;
