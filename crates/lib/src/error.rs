use std::{io, process::ExitStatus};

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered, but not with a success status.
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("could not write csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("graphql query exited with {status}: {stderr}")]
    Query { status: ExitStatus, stderr: String },

    #[error("graphql query output is not valid JSON: {source}")]
    QueryOutput {
        source: serde_json::Error,
        raw: String,
    },

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("invalid search index endpoint: {0}")]
    Endpoint(String),
}
