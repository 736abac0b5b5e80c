use crate::error::KabuError;
use crate::storage::DEFAULT_SCRIPT_FILE;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kabu")]
#[command(about = "Stock analysis MCP server - turns natural-language queries into published plots")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// Address to bind the MCP server to
    #[arg(short = 'b', long, default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// LLM model to use for script generation
    #[arg(short = 'm', long, default_value = "gpt-5-mini")]
    pub model: String,

    /// Working directory for scripts and generated plots
    #[arg(short = 'w', long, default_value = ".")]
    pub workdir: PathBuf,

    /// File name of the script slot inside the working directory
    #[arg(long, default_value = DEFAULT_SCRIPT_FILE)]
    pub script_file: String,

    /// Python interpreter used to run saved scripts
    #[arg(long, default_value = "python3")]
    pub python: String,

    /// Maximum time for script generation in seconds (10-300)
    #[arg(short = 't', long, default_value = "60", value_parser = validate_timeout)]
    pub timeout: u64,

    /// Enable verbose output to stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Enable debug output including subprocess command lines
    #[arg(short = 'd', long)]
    pub debug: bool,
}

impl Cli {
    pub fn parse_args() -> Result<Self, KabuError> {
        let cli = Self::try_parse().map_err(|e| KabuError::InvalidArguments(e.to_string()))?;

        // Additional validation
        cli.validate()?;

        Ok(cli)
    }

    pub fn validate(&self) -> Result<(), KabuError> {
        // Validate timeout range
        if !(10..=300).contains(&self.timeout) {
            return Err(KabuError::InvalidArguments(
                "Timeout must be between 10 and 300 seconds".to_string(),
            ));
        }

        if self.script_file.trim().is_empty() {
            return Err(KabuError::InvalidArguments(
                "Script file name must not be empty".to_string(),
            ));
        }

        // The script slot must stay inside the working directory
        if self.script_file.contains(std::path::MAIN_SEPARATOR) {
            return Err(KabuError::InvalidArguments(
                "Script file must be a bare file name, not a path".to_string(),
            ));
        }

        if self.python.trim().is_empty() {
            return Err(KabuError::InvalidArguments(
                "Python interpreter must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn get_llm_model(&self) -> String {
        // Check environment variable override
        if let Ok(model) = std::env::var("KABU_DEFAULT_MODEL") {
            if !model.trim().is_empty() {
                return model;
            }
        }
        self.model.clone()
    }

    pub fn get_timeout_seconds(&self) -> u64 {
        // Check environment variable override
        if let Ok(timeout_str) = std::env::var("KABU_DEFAULT_TIMEOUT") {
            if let Ok(timeout) = timeout_str.parse::<u64>() {
                if (10..=300).contains(&timeout) {
                    return timeout;
                }
            }
        }
        self.timeout
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose || self.debug
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }
}

fn validate_timeout(s: &str) -> Result<u64, String> {
    let timeout: u64 = s.parse().map_err(|_| "Timeout must be a number")?;

    if (10..=300).contains(&timeout) {
        Ok(timeout)
    } else {
        Err("Timeout must be between 10 and 300 seconds".to_string())
    }
}
