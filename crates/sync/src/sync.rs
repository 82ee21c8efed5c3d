use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;

use ghdb::{config::SyncSettings, GitHub, Issue, Result};

use crate::{
    enrich::{enrich, index_by_url, ItemDocument},
    index::DocumentIndex,
    project::fetch_project,
    query::QueryRunner,
};

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct SyncSummary {
    pub(crate) issues_fetched: usize,
    pub(crate) items: usize,
    pub(crate) skipped: usize,
    pub(crate) unchanged: usize,
    pub(crate) upserted: usize,
    pub(crate) failed: usize,
}

/// Whether `doc` differs from what the index holds for it. Any difference,
/// or a stored document that no longer decodes, rewrites the whole document.
pub(crate) fn needs_upsert(existing: Option<&Value>, doc: &ItemDocument) -> bool {
    let Some(existing) = existing else {
        return true;
    };
    match ItemDocument::deserialize(existing) {
        Ok(stored) => stored != *doc,
        Err(e) => {
            tracing::debug!(id = %doc.id, "stored document does not decode: {e}");
            true
        }
    }
}

/// Loads the board, joins it with the issue listing and pushes every changed
/// item to the index in a single batch.
pub(crate) fn run(
    settings: &SyncSettings,
    runner: &dyn QueryRunner,
    github: &GitHub,
    index: &dyn DocumentIndex,
) -> Result<SyncSummary> {
    let project = fetch_project(runner, &settings.org, settings.project_number)?;
    tracing::info!(
        project = %project.title,
        items = project.items.nodes.len(),
        "loaded project board"
    );

    let issues: Vec<Issue> = github.fetch_all(
        &settings.base_url,
        &[("state", settings.state.as_str()), ("per_page", "100")],
    )?;
    let by_url = index_by_url(&issues);

    let mut summary = SyncSummary {
        issues_fetched: issues.len(),
        items: project.items.nodes.len(),
        ..SyncSummary::default()
    };
    let now = Utc::now();
    let mut pending = Vec::new();
    for item in &project.items.nodes {
        let Some(doc) = enrich(item, &by_url, now) else {
            tracing::debug!(id = %item.id, "item has no linked issue or pull request");
            summary.skipped += 1;
            continue;
        };
        let existing = index.get(&doc.id)?;
        if needs_upsert(existing.as_ref(), &doc) {
            pending.push(doc);
        } else {
            summary.unchanged += 1;
        }
    }

    let last_updated = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
    let report = index.bulk_upsert(&pending, &last_updated)?;
    for failure in &report.failures {
        tracing::error!(
            id = %failure.id,
            status = failure.status,
            "bulk indexing rejected document:\n{}",
            serde_json::to_string_pretty(&failure.error).unwrap_or_default()
        );
    }
    summary.failed = report.failures.len();
    summary.upserted = report.submitted - summary.failed;
    tracing::info!(?summary, "sync finished");
    Ok(summary)
}
