use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{
    blocking::{Client, Response},
    header::{ACCEPT, LINK},
};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

static RE_NEXT_PAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).expect("next-page regex"));

/// Blocking client for the REST API, authenticated with a bearer token.
pub struct GitHub {
    client: Client,
    token: String,
}

impl GitHub {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ghdb/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            token: token.into(),
        })
    }

    /// Fetches `url` with `query`, then follows `rel="next"` links until the
    /// server stops sending one. Records keep the order they were served in.
    pub fn fetch_all<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut records = Vec::new();
        let mut response = self.get(url, query)?;
        let mut page = 1;
        loop {
            let next = next_page(&response);
            let mut batch: Vec<T> = serde_json::from_slice(&response.bytes()?)?;
            tracing::debug!(page, count = batch.len(), "fetched page");
            records.append(&mut batch);

            match next {
                Some(next) => {
                    page += 1;
                    response = self.get(&next, &[])?;
                }
                None => break,
            }
        }
        tracing::info!(url, pages = page, total = records.len(), "pagination finished");
        Ok(records)
    }

    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .send()?;
        check_status(response)
    }
}

/// Turns a non-success response into [`Error::Status`] so callers never
/// decode an error payload as data.
pub fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().unwrap_or_default();
    Err(Error::Status { url, status, body })
}

fn next_page(response: &Response) -> Option<String> {
    let link = response.headers().get(LINK)?.to_str().ok()?;
    parse_next_link(link)
}

/// Extracts the `rel="next"` target from a `Link` header value.
pub fn parse_next_link(link: &str) -> Option<String> {
    RE_NEXT_PAGE
        .captures(link)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}
