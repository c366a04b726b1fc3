pub mod list;
pub mod report;
pub mod searches;

use clap::{Args, Parser, Subcommand};

use crate::loader::SourceConfig;

#[derive(Parser)]
#[command(
    name = "tally",
    about = "Personal-finance transaction explorer for ledger journals and CSV exports."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Data-source flags shared by every command that reads transactions.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Glob pattern for CSV exports; repeatable. Takes precedence over
    /// the ledger journal when given.
    #[arg(long = "csv")]
    pub csv: Vec<String>,
    /// Ledger journal file (default: $LEDGER_FILE or $HLEDGER_FILE)
    #[arg(long)]
    pub ledger: Option<String>,
    /// JSON file overriding the default CSV column mapping
    #[arg(long = "csv-config")]
    pub csv_config: Option<String>,
}

impl SourceArgs {
    pub fn to_source(&self) -> SourceConfig {
        SourceConfig {
            csv_patterns: self.csv.clone(),
            ledger_file: self.ledger.clone(),
            csv_config_path: self.csv_config.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List transactions, optionally filtered and windowed.
    List {
        #[command(flatten)]
        source: SourceArgs,
        /// Keyword query, e.g. 'a:check m:>10 -coffee'
        #[arg(long)]
        query: Option<String>,
        /// Run a saved search by name
        #[arg(long)]
        search: Option<String>,
        /// Restrict to the current period: weekly, monthly, quarterly, yearly
        #[arg(long)]
        range: Option<String>,
    },
    /// Income/expense totals per period.
    Report {
        #[command(flatten)]
        source: SourceArgs,
        /// Bucket size: weekly, monthly, quarterly, yearly, all
        #[arg(long, default_value = "monthly")]
        increment: String,
        /// Only transactions for this account
        #[arg(long)]
        account: Option<String>,
        /// Only transactions for this category
        #[arg(long)]
        category: Option<String>,
        /// Keyword query applied before aggregating
        #[arg(long)]
        query: Option<String>,
    },
    /// Manage saved searches.
    Searches {
        #[command(subcommand)]
        command: SearchesCommands,
    },
}

#[derive(Subcommand)]
pub enum SearchesCommands {
    /// Save a query under a name, replacing any existing one.
    Add {
        /// Search name
        name: String,
        /// Keyword query to save
        query: String,
    },
    /// List saved searches, newest first.
    List,
    /// Delete a saved search by name.
    Delete {
        /// Search name
        name: String,
    },
}
