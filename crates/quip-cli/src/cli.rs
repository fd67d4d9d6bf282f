use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "quip")]
#[command(about = "Collect, shuffle and sync quotes from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a random quote (default when no command is given)
    Random {
        /// Only pick from this category (overrides the saved filter)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Add a new quote
    #[command(alias = "new")]
    Add {
        /// Quote text
        #[arg(required = true)]
        text: Vec<String>,
        /// Quote category
        #[arg(short, long)]
        category: String,
    },
    /// List quotes
    List {
        /// Only list quotes in this category
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List distinct categories
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show, set or clear the saved category filter
    Filter {
        /// Category to remember for `quip random`
        #[arg(conflicts_with = "clear")]
        category: Option<String>,
        /// Forget the saved filter
        #[arg(long)]
        clear: bool,
    },
    /// Export quotes as JSON
    Export {
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Import quotes from a JSON export
    Import {
        /// File produced by `quip export` (or any array of {text, category})
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Sync quotes with the remote collection (server wins on conflicts)
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
        /// Restore local categories for every conflict after syncing
        #[arg(long)]
        keep_local: bool,
        /// Output the sync report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configure the sync endpoint and timings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Sync periodically until interrupted
    Watch {
        /// Seconds between cycles (defaults to the configured interval)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update the sync configuration
    Init {
        /// Remote collection endpoint
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,
        /// Seconds between periodic sync cycles
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
        /// Upper bound for a single pull or push, in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
    /// Print the effective sync configuration
    Show,
}
