use std::path::PathBuf;

use clap::Parser;
use ghdb::Config;

mod export;
mod filter;

/// Export open issues mentioning a search term to CSV.
#[derive(Debug, Parser)]
#[command(name = "ghdb-filter")]
struct Args {
    /// Configuration file (defaults to ./ghdb.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Search term, overriding `search_term`
    #[arg(long)]
    term: Option<String>,

    /// Output file, overriding `output`
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    ghdb::logging::init(&config.log_level);

    if let Some(term) = args.term {
        config.search_term = Some(term);
    }
    if let Some(output) = args.output {
        config.output = output;
    }

    let settings = config.filter_settings()?;
    let summary = export::run(&settings).map_err(|e| {
        tracing::error!("export failed: {e}");
        e
    })?;

    println!("Data has been written to {}", summary.output.display());
    println!("Total issues fetched: {}", summary.fetched);
    println!("Total issues containing search term: {}", summary.matched);
    Ok(())
}
