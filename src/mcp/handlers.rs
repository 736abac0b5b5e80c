// MCP Tool Handlers
//
// This module implements the handler for each MCP tool the server exposes.

use super::server::ServerState;
use crate::error::KabuError;
use serde_json::Value;

/// Enum of all tool handlers
///
/// Instead of using trait objects (which don't work well with async),
/// we use an enum to dispatch to the appropriate handler.
#[derive(Clone)]
pub enum ToolHandler {
    /// Handler for analysis script generation
    AnalyzeStock(AnalyzeStockHandler),
    /// Handler for saving a generated script
    SaveCode(SaveCodeHandler),
    /// Handler for running the saved script and publishing its plots
    ExecuteCode(ExecuteCodeHandler),
}

impl ToolHandler {
    /// Every tool the server exposes, in listing order
    pub fn all() -> Vec<ToolHandler> {
        vec![
            ToolHandler::AnalyzeStock(AnalyzeStockHandler),
            ToolHandler::SaveCode(SaveCodeHandler),
            ToolHandler::ExecuteCode(ExecuteCodeHandler),
        ]
    }

    /// Get the tool name
    pub fn name(&self) -> &str {
        match self {
            ToolHandler::AnalyzeStock(h) => h.name(),
            ToolHandler::SaveCode(h) => h.name(),
            ToolHandler::ExecuteCode(h) => h.name(),
        }
    }

    /// Get the tool description
    pub fn description(&self) -> &str {
        match self {
            ToolHandler::AnalyzeStock(h) => h.description(),
            ToolHandler::SaveCode(h) => h.description(),
            ToolHandler::ExecuteCode(h) => h.description(),
        }
    }

    /// Get the tool argument schema
    pub fn argument_schema(&self) -> Value {
        match self {
            ToolHandler::AnalyzeStock(h) => h.argument_schema(),
            ToolHandler::SaveCode(h) => h.argument_schema(),
            ToolHandler::ExecuteCode(h) => h.argument_schema(),
        }
    }

    /// Execute the tool
    pub async fn execute(&self, state: &ServerState, args: Value) -> Result<String, KabuError> {
        match self {
            ToolHandler::AnalyzeStock(h) => h.execute(state, args).await,
            ToolHandler::SaveCode(h) => h.execute(state, args).await,
            ToolHandler::ExecuteCode(h) => h.execute(state, args).await,
        }
    }
}

/// Helper to extract a required non-empty string argument
fn extract_string(args: &Value, key: &str) -> Result<String, KabuError> {
    let value = args
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| KabuError::InvalidArguments(format!("missing required '{}'", key)))?;

    if value.trim().is_empty() {
        return Err(KabuError::InvalidArguments(format!(
            "'{}' must not be empty",
            key
        )));
    }

    Ok(value.to_string())
}

/// Handler for analyze_stock
///
/// Generates an executable Python analysis script for a stock query.
#[derive(Clone)]
pub struct AnalyzeStockHandler;

impl AnalyzeStockHandler {
    /// Returns the name of this tool
    pub fn name(&self) -> &str {
        "analyze_stock"
    }

    /// Returns the description of this tool
    pub fn description(&self) -> &str {
        "Analyze stock market data based on the user query and generate executable Python code to visualize the stock data. The query should contain a stock symbol (e.g. TSLA, NVDA, MSFT), a timeframe (e.g. 1d, 1mo, 1y), and an action to perform (e.g. plot, analyze, compare). Returns a formatted Python script ready for execution."
    }

    /// Returns the JSON schema for the arguments of this tool
    pub fn argument_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The user query to analyze the stock market data (e.g., \"Show Tesla's stock performance over the last 6 months\")"
                }
            },
            "required": ["query"]
        })
    }

    /// Executes the tool
    pub async fn execute(&self, state: &ServerState, args: Value) -> Result<String, KabuError> {
        let query = extract_string(&args, "query")?;
        state.generator.generate(&query).await
    }
}

/// Handler for save_code
///
/// Writes a generated script into the single on-disk script slot.
#[derive(Clone)]
pub struct SaveCodeHandler;

impl SaveCodeHandler {
    /// Returns the name of this tool
    pub fn name(&self) -> &str {
        "save_code"
    }

    /// Returns the description of this tool
    pub fn description(&self) -> &str {
        "Save working, executable Python code to the stock_analysis.py file, replacing any previously saved script. Returns a message confirming the code has been saved."
    }

    /// Returns the JSON schema for the arguments of this tool
    pub fn argument_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "The generated Python code to save"
                }
            },
            "required": ["code"]
        })
    }

    /// Executes the tool
    pub async fn execute(&self, state: &ServerState, args: Value) -> Result<String, KabuError> {
        let code = extract_string(&args, "code")?;
        state.store.save(&code)?;

        let file_name = state
            .store
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(crate::storage::DEFAULT_SCRIPT_FILE);

        Ok(format!("Code saved to {}", file_name))
    }
}

/// Handler for execute_code
///
/// Runs the saved script through the publish pipeline. The pipeline never
/// fails at this level: execution and publishing problems come back inside
/// the rendered report text.
#[derive(Clone)]
pub struct ExecuteCodeHandler;

impl ExecuteCodeHandler {
    /// Returns the name of this tool
    pub fn name(&self) -> &str {
        "execute_code"
    }

    /// Returns the description of this tool
    pub fn description(&self) -> &str {
        "Execute the Python code saved in the stock_analysis.py file, upload any plots it produces to S3, and return an execution report listing the uploaded file URLs."
    }

    /// Returns the JSON schema for the arguments of this tool
    pub fn argument_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    /// Executes the tool
    pub async fn execute(&self, state: &ServerState, _args: Value) -> Result<String, KabuError> {
        let orchestrator = state.orchestrator.lock().await;
        let report = orchestrator.run().await;
        Ok(report.render())
    }
}
