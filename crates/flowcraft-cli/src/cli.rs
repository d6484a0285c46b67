//! ABOUTME: Argument parsing — mirrors the teacher's hierarchical
//! ABOUTME: `#[command] struct Cli` / `#[derive(Subcommand)]` layout, scaled down

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Operator CLI for the Flowcraft workflow engine.
#[derive(Parser, Debug)]
#[command(name = "flowcraft")]
#[command(version)]
#[command(about = "Compile and run Google Workspace workflows from the command line")]
pub struct Cli {
    /// Configuration file (GLOBAL)
    #[arg(short = 'c', long, global = true, env = "FLOWCRAFT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API server.
    Serve,
    /// Catalog diagnostics.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Workflow operations.
    Workflow {
        #[command(subcommand)]
        action: WorkflowAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CatalogAction {
    /// Fetch and normalize the MCP catalog, reporting structural issues.
    Validate,
}

#[derive(Subcommand, Debug)]
pub enum WorkflowAction {
    /// Prepare and execute a stored workflow for one user.
    Run {
        /// Workflow id, as returned by `workflow generate` / `workflow list`.
        id: String,
        #[arg(long)]
        user: String,
        /// Repeatable `key=value` runtime parameter.
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, serde_json::Value)>,
        #[arg(long)]
        timezone: Option<String>,
    },
    /// List the workflows stored for one user.
    List {
        #[arg(long)]
        user: String,
    },
}

fn parse_key_val(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let parsed = serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), parsed))
}
