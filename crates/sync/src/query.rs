use std::process::Command;

use ghdb::{Error, Result};

/// Executes a GraphQL document against the hosting provider and returns the
/// raw response text.
pub(crate) trait QueryRunner {
    fn run(&self, query: &str) -> Result<String>;
}

/// Shells out to `gh api graphql`, reusing whatever authentication the CLI
/// already has.
pub(crate) struct GhCli {
    program: String,
}

impl GhCli {
    pub(crate) fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl QueryRunner for GhCli {
    fn run(&self, query: &str) -> Result<String> {
        tracing::debug!(program = %self.program, "running graphql query");
        let output = Command::new(&self.program)
            .args(["api", "graphql", "-f"])
            .arg(format!("query={query}"))
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::error!(status = %output.status, "graphql query failed: {stderr}");
            return Err(Error::Query {
                status: output.status,
                stderr,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

const FIELD_NAME: &str = "field { ... on ProjectV2FieldCommon { name } }";

/// The board query: every item with its linked issue or pull request and
/// the text, date and single-select field values.
pub(crate) fn project_query(org: &str, number: u64) -> String {
    let content = "url title body \
        comments(first: 100) { nodes { body } } \
        assignees(first: 10) { nodes { login } }";
    format!(
        r#"query {{
  organization(login: "{org}") {{
    projectV2(number: {number}) {{
      title
      items(first: 100) {{
        nodes {{
          id
          content {{
            ... on Issue {{ {content} }}
            ... on PullRequest {{ {content} }}
          }}
          fieldValues(first: 20) {{
            nodes {{
              __typename
              ... on ProjectV2ItemFieldTextValue {{ text {FIELD_NAME} }}
              ... on ProjectV2ItemFieldDateValue {{ date {FIELD_NAME} }}
              ... on ProjectV2ItemFieldSingleSelectValue {{ name {FIELD_NAME} }}
            }}
          }}
        }}
      }}
    }}
  }}
}}"#
    )
}
