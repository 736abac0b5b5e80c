// Executor module - pluggable script execution

pub mod runner;
pub mod config;

pub use runner::{ExecutionOutcome, ScriptRunner, SubprocessRunner};
pub use config::ExecutionConfig;
