// toolspec-server/src/main.rs
// ============================================================================
// Module: ToolSpec Server Binary
// Description: Entry point for the registry HTTP service.
// Purpose: Load configuration and serve the registry API.
// Dependencies: toolspec-server, toolspec-config, clap, tokio
// ============================================================================

//! ## Overview
//! Thin binary wrapper: parse flags, load `toolspec.toml`, run the server.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use toolspec_config::ToolSpecConfig;
use toolspec_server::server::run_server;

// ============================================================================
// SECTION: CLI
// ============================================================================

/// ToolSpec registry server.
#[derive(Debug, Parser)]
#[command(name = "toolspec-server", version, about = "ToolSpec review registry server")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Server entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match ToolSpecConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            let _ = write_stderr_line(&format!("error: {err}"));
            return ExitCode::FAILURE;
        }
    };
    match run_server(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = write_stderr_line(&format!("error: {err}"));
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes a line to stderr without panicking on failure.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}
