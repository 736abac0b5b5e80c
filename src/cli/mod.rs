pub mod args;

pub use args::Cli;

use crate::error::KabuError;
use crate::executor::{ExecutionConfig, SubprocessRunner};
use crate::generator::create_code_generator;
use crate::mcp::{McpServer, McpServerConfig, ServerState};
use crate::pipeline::PublishOrchestrator;
use crate::storage::ScriptStore;

pub struct CliHandler {
    cli: Cli,
}

impl CliHandler {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    pub async fn run(&self) -> Result<(), KabuError> {
        // Step 1: Check the working directory
        let workdir = self.cli.workdir.clone();
        if !workdir.is_dir() {
            return Err(KabuError::ConfigError(format!(
                "Working directory does not exist: {}",
                workdir.display()
            )));
        }

        if self.cli.is_verbose() {
            eprintln!("📁 Working directory: {}", workdir.display());
        }

        // Step 2: Build the code generator for the configured model
        let model = self.cli.get_llm_model();
        let generator = create_code_generator(&model, None, self.cli.get_timeout_seconds())?;

        if self.cli.is_verbose() {
            eprintln!("🤖 Script generation model: {}", generator.get_model_name());
        }

        // Step 3: Wire the script slot and the run-and-publish pipeline
        let store = ScriptStore::new(workdir.join(&self.cli.script_file));

        let exec_config = ExecutionConfig::new(self.cli.python.clone(), vec![])
            .with_working_dir(workdir.clone())
            .with_env_var("MPLBACKEND".to_string(), "Agg".to_string());
        exec_config.validate().map_err(KabuError::InvalidArguments)?;

        if self.cli.is_debug() {
            eprintln!("🔧 Script interpreter: {}", exec_config.get_full_command());
        }

        let runner = SubprocessRunner::new(exec_config);
        let orchestrator =
            PublishOrchestrator::new(store.clone(), Box::new(runner), workdir.clone());

        // Step 4: Serve MCP over HTTP
        let state = ServerState::new(generator, store, orchestrator);
        let config = McpServerConfig {
            bind_address: self.cli.bind,
            ..Default::default()
        };

        if self.cli.is_verbose() {
            eprintln!("🚀 MCP server listening on {}", self.cli.bind);
        }

        McpServer::new(config, state).serve().await
    }
}
