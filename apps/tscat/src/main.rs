//! # tscat - Qt Linguist Catalog Toolkit
//!
//! The main binary for tscat.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                 apps/tscat (THE BINARY)                │
//! │                                                        │
//! │   ┌─────────────┐   ┌─────────────┐   ┌────────────┐   │
//! │   │    CLI      │   │  HTTP API   │   │   Config   │   │
//! │   │   (clap)    │   │   (axum)    │   │   (toml)   │   │
//! │   └──────┬──────┘   └──────┬──────┘   └─────┬──────┘   │
//! │          └─────────────────┼────────────────┘          │
//! │                            ▼                           │
//! │                    ┌───────────────┐                   │
//! │                    │  tscat-core   │                   │
//! │                    │ (THE CATALOG) │                   │
//! │                    └───────────────┘                   │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! tscat lint translations/lang_uk.ts --fail-on warning
//! tscat lookup translations/lang_uk.ts -c ListView -s "%n coin(s) selected" -n 5
//! tscat compile translations/lang_uk.ts -o lang_uk.tsqm
//! tscat serve translations/lang_uk.ts --port 8080
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tscat::cli::{self, Commands};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // TSCAT_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("TSCAT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "tscat=debug,tscat_core=debug,tower_http=debug"
    } else {
        "tscat=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so command output stays pipeable.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode && matches!(cli.command, Commands::Serve { .. }) {
        print_banner();
    }

    match cli::execute(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the tscat startup banner.
fn print_banner() {
    println!(
        r#"
  ████████╗███████╗ ██████╗ █████╗ ████████╗
  ╚══██╔══╝██╔════╝██╔════╝██╔══██╗╚══██╔══╝
     ██║   ███████╗██║     ███████║   ██║
     ██║   ╚════██║██║     ██╔══██║   ██║
     ██║   ███████║╚██████╗██║  ██║   ██║
     ╚═╝   ╚══════╝ ╚═════╝╚═╝  ╚═╝   ╚═╝

  Qt Linguist Catalog Toolkit v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
