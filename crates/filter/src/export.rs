use std::path::{Path, PathBuf};

use ghdb::{config::FilterSettings, GitHub, Issue, Result};

use crate::filter::filter_issues;

pub(crate) const CSV_COLUMNS: [&str; 6] =
    ["Issue Number", "Title", "URL", "State", "Created At", "Body"];

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ExportSummary {
    pub(crate) fetched: usize,
    pub(crate) matched: usize,
    pub(crate) output: PathBuf,
}

/// Fetches every issue in `settings.state`, keeps those mentioning the
/// search term and writes them to `settings.output`.
pub(crate) fn run(settings: &FilterSettings) -> Result<ExportSummary> {
    let github = GitHub::new(settings.token.as_str())?;
    let issues: Vec<Issue> = github.fetch_all(
        &settings.base_url,
        &[("state", settings.state.as_str()), ("per_page", "100")],
    )?;
    let fetched = issues.len();

    let matching = filter_issues(issues, &settings.search_term);
    tracing::info!(
        term = %settings.search_term,
        fetched,
        matched = matching.len(),
        "filtered issues"
    );
    write_csv(&settings.output, &matching)?;

    Ok(ExportSummary {
        fetched,
        matched: matching.len(),
        output: settings.output.clone(),
    })
}

/// Writes `issues` to `path`, replacing whatever was there.
pub(crate) fn write_csv(path: &Path, issues: &[Issue]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(CSV_COLUMNS)?;
    for issue in issues {
        let number = issue.number.to_string();
        let state = issue.state.to_string();
        wtr.write_record([
            number.as_str(),
            issue.title.as_str(),
            issue.html_url.as_str(),
            state.as_str(),
            issue.created_at.as_str(),
            issue.body.as_deref().unwrap_or(""),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
