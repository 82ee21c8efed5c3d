use serde::Deserialize;
use serde_json::Value;

use ghdb::{Error, Result};

use crate::query::{project_query, QueryRunner};

#[derive(Debug, Deserialize)]
struct Response {
    data: Option<Data>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Data {
    organization: Option<Organization>,
}

#[derive(Debug, Deserialize)]
struct Organization {
    #[serde(rename = "projectV2")]
    project: Option<Project>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Project {
    pub(crate) title: String,
    pub(crate) items: Connection<ProjectItem>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Connection<T> {
    #[serde(default)]
    pub(crate) nodes: Vec<T>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectItem {
    pub(crate) id: String,
    pub(crate) content: Option<ItemContent>,
    #[serde(default)]
    pub(crate) field_values: Connection<FieldValue>,
}

/// The linked issue or pull request. Draft issues come back as an empty
/// object, so every field is optional.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ItemContent {
    pub(crate) url: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) body: Option<String>,
    #[serde(default)]
    pub(crate) comments: Connection<Comment>,
    #[serde(default)]
    pub(crate) assignees: Connection<Assignee>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Comment {
    pub(crate) body: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Assignee {
    pub(crate) login: String,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "__typename")]
pub(crate) enum FieldValue {
    #[serde(rename = "ProjectV2ItemFieldTextValue")]
    Text {
        #[serde(default)]
        field: FieldName,
        text: Option<String>,
    },
    #[serde(rename = "ProjectV2ItemFieldDateValue")]
    Date {
        #[serde(default)]
        field: FieldName,
        date: Option<String>,
    },
    #[serde(rename = "ProjectV2ItemFieldSingleSelectValue")]
    SingleSelect {
        #[serde(default)]
        field: FieldName,
        name: Option<String>,
    },
    #[serde(other)]
    Other,
}

/// Name of the board field a value belongs to.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub(crate) struct FieldName {
    pub(crate) name: Option<String>,
}

/// Board fields copied into the indexed document. Anything else on the
/// board is ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ProjectField {
    Title,
    Date,
    Priority,
    Status,
    Theme,
    ProductArea,
}

impl ProjectField {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "Title" => Some(Self::Title),
            "Date" => Some(Self::Date),
            "Priority" => Some(Self::Priority),
            "Status" => Some(Self::Status),
            "Theme" => Some(Self::Theme),
            "Product Area" => Some(Self::ProductArea),
            _ => None,
        }
    }
}

impl FieldValue {
    /// The recognized field this value targets and the value itself, if the
    /// variant is one that field accepts.
    pub(crate) fn recognized(&self) -> Option<(ProjectField, &str)> {
        let (field, value) = match self {
            Self::Text { field, text } => (field, text),
            Self::Date { field, date } => (field, date),
            Self::SingleSelect { field, name } => (field, name),
            Self::Other => return None,
        };
        let target = ProjectField::from_name(field.name.as_deref()?)?;
        let accepted = matches!(
            (self, target),
            (Self::Text { .. }, ProjectField::Title)
                | (Self::Date { .. }, ProjectField::Date)
                | (
                    Self::SingleSelect { .. },
                    ProjectField::Priority
                        | ProjectField::Status
                        | ProjectField::Theme
                        | ProjectField::ProductArea
                )
        );
        if accepted {
            Some((target, value.as_deref()?))
        } else {
            None
        }
    }
}

/// Runs the board query and decodes the project it returns.
pub(crate) fn fetch_project(runner: &dyn QueryRunner, org: &str, number: u64) -> Result<Project> {
    let raw = runner.run(&project_query(org, number))?;
    parse_response(&raw)
}

pub(crate) fn parse_response(raw: &str) -> Result<Project> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(source) => {
            tracing::error!("graphql output is not JSON: {source}\nraw output:\n{raw}");
            return Err(Error::QueryOutput {
                source,
                raw: raw.to_owned(),
            });
        }
    };
    let response: Response = serde_json::from_value(value)?;

    let project = response
        .data
        .and_then(|d| d.organization)
        .and_then(|o| o.project);
    match project {
        Some(project) => {
            for error in &response.errors {
                tracing::warn!("graphql reported: {}", error.message);
            }
            Ok(project)
        }
        None => {
            let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
            Err(Error::ProjectNotFound(if messages.is_empty() {
                "organization or project is null".to_string()
            } else {
                messages.join("; ")
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn board() -> Value {
        json!({
            "data": {
                "organization": {
                    "projectV2": {
                        "title": "Roadmap",
                        "items": {
                            "nodes": [
                                {
                                    "id": "PVTI_1",
                                    "content": {
                                        "url": "https://github.com/o/r/issues/1",
                                        "title": "Crash on start",
                                        "body": "It crashes.",
                                        "comments": { "nodes": [{ "body": "same here" }] },
                                        "assignees": { "nodes": [{ "login": "octocat" }] }
                                    },
                                    "fieldValues": {
                                        "nodes": [
                                            { "__typename": "ProjectV2ItemFieldRepositoryValue" },
                                            {
                                                "__typename": "ProjectV2ItemFieldSingleSelectValue",
                                                "name": "High",
                                                "field": { "name": "Priority" }
                                            },
                                            {
                                                "__typename": "ProjectV2ItemFieldTextValue",
                                                "text": "Crash on start (board)",
                                                "field": { "name": "Title" }
                                            }
                                        ]
                                    }
                                },
                                { "id": "PVTI_2", "content": null, "fieldValues": { "nodes": [] } },
                                { "id": "PVTI_3", "content": {}, "fieldValues": { "nodes": [] } }
                            ]
                        }
                    }
                }
            }
        })
    }

    struct Canned(String);

    impl QueryRunner for Canned {
        fn run(&self, _query: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn decodes_items_and_typed_values() {
        let project = fetch_project(&Canned(board().to_string()), "o", 1).unwrap();
        assert_eq!(project.title, "Roadmap");
        assert_eq!(project.items.nodes.len(), 3);

        let first = &project.items.nodes[0];
        let content = first.content.as_ref().unwrap();
        assert_eq!(content.assignees.nodes[0].login, "octocat");
        assert_eq!(first.field_values.nodes[0], FieldValue::Other);
        assert_eq!(
            first.field_values.nodes[1].recognized(),
            Some((ProjectField::Priority, "High"))
        );
        assert!(project.items.nodes[1].content.is_none());
        assert!(project.items.nodes[2].content.as_ref().unwrap().url.is_none());
    }

    #[test]
    fn variant_must_fit_the_field() {
        let value: FieldValue = serde_json::from_value(json!({
            "__typename": "ProjectV2ItemFieldTextValue",
            "text": "High",
            "field": { "name": "Priority" }
        }))
        .unwrap();
        assert_eq!(value.recognized(), None);

        let value: FieldValue = serde_json::from_value(json!({
            "__typename": "ProjectV2ItemFieldSingleSelectValue",
            "name": "Sprint 4",
            "field": { "name": "Iteration" }
        }))
        .unwrap();
        assert_eq!(value.recognized(), None);

        let value: FieldValue = serde_json::from_value(json!({
            "__typename": "ProjectV2ItemFieldDateValue",
            "date": "2024-05-01",
            "field": {}
        }))
        .unwrap();
        assert_eq!(value.recognized(), None);
    }

    #[test]
    fn malformed_output_keeps_raw_text() {
        let err = parse_response("gh: not logged in").unwrap_err();
        match err {
            Error::QueryOutput { raw, .. } => assert_eq!(raw, "gh: not logged in"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_project_reports_graphql_errors() {
        let raw = json!({
            "data": { "organization": { "projectV2": null } },
            "errors": [{ "message": "Could not resolve to a ProjectV2 with the number 9." }]
        })
        .to_string();
        match parse_response(&raw).unwrap_err() {
            Error::ProjectNotFound(msg) => assert!(msg.contains("number 9")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
