use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// How the subprocess runner invokes the interpreter. The script itself is
/// not part of the config; it is piped over stdin at run time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env_vars: HashMap<String, String>,
}

impl ExecutionConfig {
    pub fn new(command: String, args: Vec<String>) -> Self {
        Self {
            command,
            args,
            working_dir: None,
            env_vars: HashMap::new(),
        }
    }

    /// Default interpreter for generated analysis scripts. MPLBACKEND is
    /// pinned so matplotlib renders to files on headless hosts instead of
    /// trying to open a display.
    pub fn python() -> Self {
        Self::new("python3".to_string(), vec![])
            .with_env_var("MPLBACKEND".to_string(), "Agg".to_string())
    }

    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    pub fn with_env_var(mut self, key: String, value: String) -> Self {
        self.env_vars.insert(key, value);
        self
    }

    pub fn get_full_command(&self) -> String {
        let mut cmd = self.command.clone();
        for arg in &self.args {
            cmd.push(' ');
            if arg.contains(' ') {
                cmd.push_str(&format!("\"{}\"", arg));
            } else {
                cmd.push_str(arg);
            }
        }
        cmd
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.command.is_empty() {
            return Err("Interpreter command cannot be empty".to_string());
        }

        Ok(())
    }
}
