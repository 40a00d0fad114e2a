//! Adwizard CLI — enters one listing from a YAML script.

pub mod config;
pub mod runner;
pub mod script;

pub use config::CliConfig;
pub use runner::{RunError, run_from_env, run_script};
pub use script::{ListingScript, ScriptError, VehicleAnswers};
