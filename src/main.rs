use kabu::{
    cli::{Cli, CliHandler},
    error::KabuError,
};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("kabu=info,tower_http=warn")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command line arguments
    let cli = match Cli::parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("❌ Argument parsing failed: {}", e);
            process::exit(2);
        }
    };

    // Create and run the server
    let handler = CliHandler::new(cli);

    let exit_code = match handler.run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("❌ Server failed: {}", e);
            match e {
                KabuError::InvalidArguments(_) => 2, // Bad CLI or interpreter config
                KabuError::ConfigError(_) => 3,      // Missing directory or credentials
                KabuError::LlmClientError(_) => 5,   // LLM provider setup error
                _ => 1,                              // General error
            }
        }
    };

    process::exit(exit_code);
}
