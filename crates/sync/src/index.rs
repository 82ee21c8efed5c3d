use std::collections::HashMap;

use base64::{engine::general_purpose, Engine};
use reqwest::{
    blocking::{Client, RequestBuilder},
    header::CONTENT_TYPE,
    Method, StatusCode, Url,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use ghdb::{config::IndexEndpoint, github::check_status, Error, Result};

use crate::enrich::ItemDocument;

/// The search index the sync writes to.
pub(crate) trait DocumentIndex {
    /// The stored `_source` of document `id`, if there is one.
    fn get(&self, id: &str) -> Result<Option<Value>>;

    /// Upserts every document in one batch, stamping each with
    /// `last_updated`. Per-document rejections are returned, not raised.
    fn bulk_upsert(&self, docs: &[ItemDocument], last_updated: &str) -> Result<BulkReport>;
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct BulkReport {
    pub(crate) submitted: usize,
    pub(crate) failures: Vec<BulkFailure>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct BulkFailure {
    pub(crate) id: String,
    pub(crate) status: u16,
    pub(crate) error: Value,
}

#[derive(Serialize)]
struct IndexedDocument<'a> {
    #[serde(flatten)]
    doc: &'a ItemDocument,
    #[serde(rename = "Last Updated")]
    last_updated: &'a str,
}

#[derive(Deserialize)]
struct BulkResponse {
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Deserialize)]
struct BulkItem {
    #[serde(rename = "_id")]
    id: String,
    status: u16,
    error: Option<Value>,
}

/// Elasticsearch over its REST API.
pub(crate) struct Elasticsearch {
    client: Client,
    base: Url,
    index: String,
    user: Option<String>,
    password: Option<String>,
}

impl Elasticsearch {
    pub(crate) fn new(
        endpoint: &IndexEndpoint,
        index: impl Into<String>,
        user: Option<String>,
        password: Option<String>,
    ) -> Result<Self> {
        let base = match endpoint {
            IndexEndpoint::Url(url) => url.clone(),
            IndexEndpoint::CloudId(id) => cloud_url(id)?,
        };
        let base = Url::parse(&base).map_err(|e| Error::Endpoint(format!("{base}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::Endpoint(base.to_string()));
        }
        Ok(Self {
            client: Client::builder().build()?,
            base,
            index: index.into(),
            user,
            password,
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.user {
            Some(user) => request.basic_auth(user, self.password.as_deref()),
            None => request,
        }
    }
}

impl DocumentIndex for Elasticsearch {
    fn get(&self, id: &str) -> Result<Option<Value>> {
        let response = self
            .request(Method::GET, self.url(&[self.index.as_str(), "_doc", id]))
            .send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let mut found: Value = check_status(response)?.json()?;
        Ok(found.get_mut("_source").map(Value::take))
    }

    fn bulk_upsert(&self, docs: &[ItemDocument], last_updated: &str) -> Result<BulkReport> {
        if docs.is_empty() {
            return Ok(BulkReport::default());
        }

        let mut body = String::new();
        for doc in docs {
            let action = json!({ "update": { "_index": self.index, "_id": doc.id } });
            let indexed = IndexedDocument { doc, last_updated };
            let payload = json!({ "doc": indexed, "doc_as_upsert": true });
            body.push_str(&action.to_string());
            body.push('\n');
            body.push_str(&payload.to_string());
            body.push('\n');
        }

        let response = self
            .request(Method::POST, self.url(&["_bulk"]))
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()?;
        let response: BulkResponse = check_status(response)?.json()?;

        let failures = if response.errors {
            response
                .items
                .into_iter()
                .flat_map(HashMap::into_values)
                .filter_map(|item| {
                    item.error.map(|error| BulkFailure {
                        id: item.id,
                        status: item.status,
                        error,
                    })
                })
                .collect()
        } else {
            Vec::new()
        };
        Ok(BulkReport {
            submitted: docs.len(),
            failures,
        })
    }
}

/// Resolves an Elastic Cloud id (`name:base64(host$es_uuid$kibana_uuid)`)
/// to the HTTPS URL of its Elasticsearch deployment.
pub(crate) fn cloud_url(cloud_id: &str) -> Result<String> {
    let invalid = || Error::Endpoint(format!("malformed cloud id `{cloud_id}`"));
    let (_, encoded) = cloud_id.split_once(':').ok_or_else(invalid)?;
    let decoded = general_purpose::STANDARD
        .decode(encoded)
        .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(encoded))
        .map_err(|_| invalid())?;
    let decoded = String::from_utf8(decoded).map_err(|_| invalid())?;

    let mut parts = decoded.split('$');
    let host = parts.next().filter(|h| !h.is_empty()).ok_or_else(invalid)?;
    let es_uuid = parts.next().filter(|u| !u.is_empty()).ok_or_else(invalid)?;
    Ok(match host.split_once(':') {
        Some((host, port)) => format!("https://{es_uuid}.{host}:{port}"),
        None => format!("https://{es_uuid}.{host}"),
    })
}
