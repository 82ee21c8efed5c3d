use std::fmt;

pub mod config;
pub mod error;
pub mod github;
pub mod logging;

pub use config::Config;
pub use error::{Error, Result};
pub use github::GitHub;

#[derive(
    Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Deserialize, serde::Serialize,
)]
pub struct Label {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(
    Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Deserialize, serde::Serialize,
)]
pub struct User {
    pub login: String,
}

#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Deserialize, serde::Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

/// An issue (or pull request) as returned by the REST issues endpoint.
#[derive(
    Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Deserialize, serde::Serialize,
)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub state: IssueState,
    pub created_at: String,
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub assignees: Vec<User>,
}

impl Issue {
    /// Label names joined with `", "`.
    pub fn label_names(&self) -> String {
        self.labels
            .iter()
            .map(|l| l.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_ignores_unknown_fields() {
        let issue: Issue = serde_json::from_str(
            r#"{
                "id": 1,
                "number": 42,
                "title": "Crash on start",
                "html_url": "https://github.com/o/r/issues/42",
                "state": "open",
                "created_at": "2024-01-01T00:00:00Z",
                "body": null,
                "labels": [{"id": 7, "name": "bug", "description": null}],
                "comments": 3
            }"#,
        )
        .unwrap();
        assert_eq!(issue.number, 42);
        assert_eq!(issue.state, IssueState::Open);
        assert!(issue.body.is_none());
        assert!(issue.assignees.is_empty());
        assert_eq!(issue.label_names(), "bug");
    }

    #[test]
    fn label_names_joined() {
        let issue = Issue {
            number: 1,
            title: String::new(),
            html_url: String::new(),
            state: IssueState::Closed,
            created_at: String::new(),
            body: None,
            labels: vec![
                Label {
                    id: 1,
                    name: "bug".to_string(),
                    description: None,
                },
                Label {
                    id: 2,
                    name: "P-high".to_string(),
                    description: Some("urgent".to_string()),
                },
            ],
            assignees: Vec::new(),
        };
        assert_eq!(issue.label_names(), "bug, P-high");
        assert_eq!(issue.state.to_string(), "closed");
    }
}
