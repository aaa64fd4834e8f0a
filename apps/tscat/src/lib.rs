//! # tscat
//!
//! Command line and HTTP front end for `tscat-core`.
//!
//! The binary in `main.rs` only sets up logging and hands the parsed
//! arguments to [`cli::execute`]. Everything else lives here so the
//! integration tests can build the router directly.

pub mod api;
pub mod cli;
pub mod config;
