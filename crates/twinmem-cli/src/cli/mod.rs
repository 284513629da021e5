//! CLI command definitions for the `twinmem` binary.

pub mod check;
pub mod memory;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Write facts to a vector store and a knowledge graph at once.
#[derive(Parser)]
#[command(name = "twinmem", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all log output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans as OpenTelemetry to stdout.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store one or more facts about a subject in both stores.
    Add {
        /// Subject (user id) the facts belong to.
        subject: String,

        /// Fact texts, one per argument.
        #[arg(required = true)]
        texts: Vec<String>,

        /// JSON object stored alongside each vector record.
        #[arg(long)]
        metadata: Option<String>,
    },

    /// List everything stored in the vector store for a subject.
    Recall {
        subject: String,
    },

    /// List graph relations stored for a subject.
    Graph {
        subject: String,
    },

    /// Check store, embedder and LLM connectivity and dimensions.
    Check,

    /// List vector collections and their dimensions.
    #[command(alias = "ls")]
    Collections,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
