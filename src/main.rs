mod aggregate;
mod cli;
mod date;
mod error;
mod fmt;
mod importer;
mod journal;
mod loader;
mod models;
mod query;
mod savedsearch;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, SearchesCommands};

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tally=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List {
            source,
            query,
            search,
            range,
        } => cli::list::run(
            &source,
            query.as_deref(),
            search.as_deref(),
            range.as_deref(),
        ),
        Commands::Report {
            source,
            increment,
            account,
            category,
            query,
        } => cli::report::run(
            &source,
            &increment,
            account.as_deref(),
            category.as_deref(),
            query.as_deref(),
        ),
        Commands::Searches { command } => match command {
            SearchesCommands::Add { name, query } => cli::searches::add(&name, &query),
            SearchesCommands::List => cli::searches::list(),
            SearchesCommands::Delete { name } => cli::searches::delete(&name),
        },
    };

    match result {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
