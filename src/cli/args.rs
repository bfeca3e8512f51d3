//! Command-line argument parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Backend Oracle - documentation-grounded assistant for backend developers
#[derive(Parser, Debug)]
#[command(name = "backend-oracle")]
#[command(version)]
#[command(about = "Answer backend questions from an indexed documentation corpus", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: default (info), -v (debug), -vv (trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP API
    Serve {
        /// Listen address override
        #[arg(long)]
        host: Option<String>,

        /// Listen port override
        #[arg(long)]
        port: Option<u16>,
    },

    /// Ask a single question and print the model's JSON response
    Ask {
        #[arg(value_name = "QUESTION")]
        question: String,
    },

    /// Check that Ollama and Qdrant are reachable
    Doctor,

    /// Display the effective configuration
    Config,
}

impl Args {
    /// Subcommand to run; `serve` with no overrides when none was given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve {
            host: None,
            port: None,
        })
    }
}
