//! CLI module - command-line interface for search-trends
//!
//! Subcommands run against the configured database directly; only `serve`
//! starts the scheduler and the HTTP API.

mod commands;

use clap::{Parser, Subcommand};

/// search-trends - popular search tracking with daily and weekly decay
#[derive(Parser)]
#[command(name = "search-trends")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scheduler and the HTTP API until interrupted
    #[command(alias = "daemon", alias = "-d")]
    Serve,

    /// Run a single maintenance pass now
    #[command(alias = "m")]
    Maintain,

    /// Record one search occurrence
    #[command(alias = "t")]
    Track {
        /// Search text, as typed by the user
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Show the trending list
    #[command(alias = "ls")]
    Top {
        /// Maximum number of entries
        #[arg(short, long)]
        limit: Option<u64>,
    },

    /// Show record counts
    Stats,

    /// Show the stored counters for one query
    #[command(alias = "i")]
    Inspect {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
