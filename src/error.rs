use thiserror::Error;

#[derive(Error, Debug)]
pub enum KabuError {
    #[error("No script has been saved yet: {0}")]
    ScriptNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Code generation timeout after {timeout} seconds")]
    GenerationTimeout { timeout: u64 },

    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),

    #[error("LLM client error: {0}")]
    LlmClientError(String),

    #[error("Script execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Failed to upload file to S3: {0}")]
    PublishError(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
