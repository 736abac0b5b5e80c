pub mod cli;
pub mod error;
pub mod executor;
pub mod generator;
pub mod mcp;
pub mod models;
pub mod pipeline;
pub mod storage;

pub use error::KabuError;

// Re-export commonly used types
pub use models::{ArtifactSet, PublishedArtifact, RunReport, RunStatus};

pub use executor::{ExecutionConfig, ExecutionOutcome, ScriptRunner, SubprocessRunner};
pub use generator::{create_code_generator, CodeGenerator};
pub use pipeline::PublishOrchestrator;
pub use storage::{ArtifactPublisher, S3Config, S3Publisher, ScriptStore};

pub use cli::CliHandler;
