//! CLI module for the keymzanzi gateway
//!
//! Provides subcommands for running the gateway:
//! - `api`: the HTTP server (key issuance, authorization, summarizer)
//! - `serve`: compatibility alias for `api`

pub mod api;
pub mod serve;

use clap::{Parser, Subcommand};

/// keymzanzi gateway - API key issuance and the summarizer endpoint
#[derive(Parser)]
#[command(name = "keymzanzi-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Api,

    /// Run the HTTP server (alias kept for older deploy scripts)
    Serve,
}
