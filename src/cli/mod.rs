//! CLI module for podsearch.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// podsearch - Ask questions of a podcast archive
///
/// Transcribes episodes, cuts transcripts into overlapping windows, embeds
/// them, indexes them in OpenSearch, and answers questions from the most
/// relevant windows and their neighbors.
#[derive(Parser, Debug)]
#[command(name = "podsearch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "PODSEARCH_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe every episode in the manifest that has no transcript yet
    Transcribe,

    /// Build embedding artifacts for every transcribed episode
    Embed,

    /// Upload embedding artifacts to the search index
    Index,

    /// Show the transcript windows retrieved for a question
    Search {
        /// The question to search for
        question: String,
    },

    /// Ask a question and get an answer grounded in the archive
    Query {
        /// The question to ask
        question: String,
    },

    /// List episodes in the manifest
    List,

    /// Start the HTTP query service
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
