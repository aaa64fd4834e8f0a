//! # tscat CLI Module
//!
//! This module implements the command line interface for tscat.
//!
//! ## Available Commands
//!
//! - `lint` - Check a catalog for translation mistakes
//! - `stats` - Show completion statistics
//! - `lookup` - Translate a single string
//! - `compile` - Write the compiled catalog
//! - `export` - Convert a catalog to another format
//! - `merge` - Update a translation from a fresh template
//! - `hash` - Compute the BLAKE3 hash of the compiled catalog
//! - `serve` - Start the HTTP server

mod commands;

use crate::config::TscatConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tscat_core::{CatalogFormat, Severity, TscatError};

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// tscat - Qt Linguist translation catalog toolkit
///
/// Lint, inspect, compile and serve `.ts` translation catalogs.
#[derive(Parser, Debug)]
#[command(name = "tscat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to ./tscat.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a catalog and print findings
    Lint {
        /// Catalog file (TS, JSON or compiled)
        file: PathBuf,

        /// Lowest severity that fails the run (error, warning, info)
        #[arg(long, value_parser = parse_severity)]
        fail_on: Option<Severity>,
    },

    /// Show message counts and completion
    Stats {
        /// Catalog file
        file: PathBuf,
    },

    /// Translate one string, falling back to the source
    Lookup {
        /// Catalog file
        file: PathBuf,

        /// Context name
        #[arg(short, long)]
        context: String,

        /// Source text
        #[arg(short, long)]
        source: String,

        /// Disambiguating comment
        #[arg(long)]
        comment: Option<String>,

        /// Count for plural messages
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        count: Option<i64>,
    },

    /// Write the compiled catalog
    Compile {
        /// Catalog file
        file: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Convert a catalog to another format
    Export {
        /// Catalog file
        file: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format (ts, json, compiled)
        #[arg(short = 't', long, default_value = "ts")]
        format: CatalogFormat,
    },

    /// Update an existing translation from a template
    Merge {
        /// Existing translation
        existing: PathBuf,

        /// Freshly extracted template
        template: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Remove messages that are no longer in the template
        #[arg(long)]
        drop_obsolete: bool,
    },

    /// Compute BLAKE3 cryptographic hash of the compiled catalog
    Hash {
        /// Catalog file
        file: PathBuf,
    },

    /// Start HTTP server
    Serve {
        /// Catalog file
        file: PathBuf,

        /// Host to bind to (overrides configuration)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn parse_severity(value: &str) -> Result<Severity, String> {
    match value.to_ascii_lowercase().as_str() {
        "error" => Ok(Severity::Error),
        "warning" | "warn" => Ok(Severity::Warning),
        "info" => Ok(Severity::Info),
        other => Err(format!(
            "unknown severity '{other}' (expected error, warning or info)"
        )),
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
///
/// Returns `Ok(false)` when the command ran but its check failed
/// (a lint report at or above the failure threshold).
pub async fn execute(cli: Cli) -> Result<bool, TscatError> {
    let mut config = TscatConfig::load(cli.config.as_deref())?.with_env();
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Lint { file, fail_on } => {
            if let Some(severity) = fail_on {
                config.lint.fail_on = severity;
            }
            cmd_lint(&file, &config.lint, json_mode)
        }
        Commands::Stats { file } => cmd_stats(&file, json_mode).map(|()| true),
        Commands::Lookup {
            file,
            context,
            source,
            comment,
            count,
        } => cmd_lookup(
            &file,
            json_mode,
            &context,
            &source,
            comment.as_deref(),
            count,
        )
        .map(|()| true),
        Commands::Compile { file, output } => cmd_compile(&file, &output, json_mode).map(|()| true),
        Commands::Export {
            file,
            output,
            format,
        } => cmd_export(&file, &output, format, json_mode).map(|()| true),
        Commands::Merge {
            existing,
            template,
            output,
            drop_obsolete,
        } => cmd_merge(&existing, &template, &output, drop_obsolete, json_mode).map(|()| true),
        Commands::Hash { file } => cmd_hash(&file, json_mode).map(|()| true),
        Commands::Serve { file, host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_serve(&file, config).await.map(|()| true)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
