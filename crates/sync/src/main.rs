use std::path::PathBuf;

use clap::Parser;
use ghdb::{Config, GitHub};

mod enrich;
mod index;
mod project;
mod query;
mod sync;

/// Mirror a project board, joined with its repository's issues, into a
/// search index.
#[derive(Debug, Parser)]
#[command(name = "ghdb-sync")]
struct Args {
    /// Configuration file (defaults to ./ghdb.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    ghdb::logging::init(&config.log_level);

    let settings = config.sync_settings()?;
    let runner = query::GhCli::new(settings.gh_program.as_str());
    let github = GitHub::new(settings.token.as_str())?;
    let es = index::Elasticsearch::new(
        &settings.endpoint,
        settings.index_name.as_str(),
        settings.user.clone(),
        settings.password.clone(),
    )?;

    let summary = sync::run(&settings, &runner, &github, &es).map_err(|e| {
        tracing::error!("sync failed: {e}");
        e
    })?;

    println!("Data has been written to index {}", settings.index_name);
    println!("Total issues fetched: {}", summary.issues_fetched);
    println!(
        "Board items: {} (skipped {}, unchanged {}, upserted {}, failed {})",
        summary.items, summary.skipped, summary.unchanged, summary.upserted, summary.failed
    );
    Ok(())
}
