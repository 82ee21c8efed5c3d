use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use ghdb::Issue;

use crate::project::{ProjectField, ProjectItem};

pub(crate) const UNKNOWN: &str = "Unknown";

/// One board item flattened together with its issue, as stored in the index.
/// Field names are the index schema.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct ItemDocument {
    #[serde(rename = "ID")]
    pub(crate) id: String,
    #[serde(rename = "Title")]
    pub(crate) title: String,
    #[serde(rename = "Description")]
    pub(crate) description: String,
    #[serde(rename = "Comments")]
    pub(crate) comments: String,
    #[serde(rename = "Assignees")]
    pub(crate) assignees: String,
    #[serde(rename = "Priority")]
    pub(crate) priority: String,
    #[serde(rename = "Status")]
    pub(crate) status: String,
    #[serde(rename = "Theme")]
    pub(crate) theme: String,
    #[serde(rename = "Product Area")]
    pub(crate) product_area: String,
    #[serde(rename = "Date")]
    pub(crate) date: String,
    #[serde(rename = "Issue Number")]
    pub(crate) issue_number: Option<u64>,
    #[serde(rename = "URL")]
    pub(crate) url: String,
    #[serde(rename = "State")]
    pub(crate) state: String,
    #[serde(rename = "Created At")]
    pub(crate) created_at: String,
    #[serde(rename = "Labels")]
    pub(crate) labels: String,
    #[serde(rename = "Age")]
    pub(crate) age: Option<i64>,
}

/// Issues from the REST listing, keyed by their web URL.
pub(crate) fn index_by_url(issues: &[Issue]) -> HashMap<&str, &Issue> {
    issues.iter().map(|i| (i.html_url.as_str(), i)).collect()
}

/// Builds the document for `item`, or `None` when the item is not linked to
/// an issue or pull request.
pub(crate) fn enrich(
    item: &ProjectItem,
    issues: &HashMap<&str, &Issue>,
    now: DateTime<Utc>,
) -> Option<ItemDocument> {
    let content = item.content.as_ref()?;
    let url = content.url.clone()?;

    let mut doc = ItemDocument {
        id: item.id.clone(),
        title: content.title.clone().unwrap_or_default(),
        description: content.body.clone().unwrap_or_default(),
        comments: content
            .comments
            .nodes
            .iter()
            .map(|c| c.body.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        assignees: content
            .assignees
            .nodes
            .iter()
            .map(|a| a.login.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        priority: UNKNOWN.to_string(),
        status: UNKNOWN.to_string(),
        theme: UNKNOWN.to_string(),
        product_area: UNKNOWN.to_string(),
        date: UNKNOWN.to_string(),
        issue_number: None,
        url,
        state: String::new(),
        created_at: String::new(),
        labels: String::new(),
        age: None,
    };

    for (field, value) in item.field_values.nodes.iter().filter_map(|v| v.recognized()) {
        let slot = match field {
            ProjectField::Title => &mut doc.title,
            ProjectField::Date => &mut doc.date,
            ProjectField::Priority => &mut doc.priority,
            ProjectField::Status => &mut doc.status,
            ProjectField::Theme => &mut doc.theme,
            ProjectField::ProductArea => &mut doc.product_area,
        };
        *slot = value.to_owned();
    }

    match issues.get(doc.url.as_str()) {
        Some(issue) => {
            doc.issue_number = Some(issue.number);
            doc.state = issue.state.to_string();
            doc.created_at = issue.created_at.clone();
            doc.labels = issue.label_names();
        }
        None => tracing::debug!(url = %doc.url, "no issue in listing for board item"),
    }
    doc.age = age_in_days(Some(doc.created_at.as_str()), now);

    Some(doc)
}

/// Whole days between `created_at` (`%Y-%m-%dT%H:%M:%SZ`, read as UTC) and
/// `now`. Empty or missing timestamps have no age.
pub(crate) fn age_in_days(created_at: Option<&str>, now: DateTime<Utc>) -> Option<i64> {
    let created_at = created_at.filter(|s| !s.is_empty())?;
    match NaiveDateTime::parse_from_str(created_at, "%Y-%m-%dT%H:%M:%SZ") {
        Ok(created) => Some((now.naive_utc() - created).num_days()),
        Err(e) => {
            tracing::warn!(created_at, "unparseable creation time: {e}");
            None
        }
    }
}
