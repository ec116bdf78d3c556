//! Document store driver.
//!
//! Speaks a Data-API-style surface: `action/find` to read a collection,
//! `action/insertMany` for creates, and one `action/updateOne` per record
//! for updates (the store filters by its own `_id`-style field, whose
//! native name comes from configuration).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::model::{ApplyKind, RawRecord, Side};

use super::Backend;

/// Driver for the document store.
pub struct DocsBackend {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    id_field: String,
    token: Option<String>,
    timeout: std::time::Duration,
}

impl DocsBackend {
    /// Build a driver from backend configuration.
    #[must_use]
    pub fn new(config: &BackendConfig, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            collection: config.resource.clone(),
            id_field: config.mapping.id.clone(),
            token: config.token.clone(),
            timeout: std::time::Duration::from_secs(timeout_secs),
        }
    }

    fn action_url(&self, action: &str) -> String {
        format!("{}/action/{action}", self.base_url)
    }

    async fn post_action(
        &self,
        action: &str,
        body: &Value,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        let mut request = self
            .client
            .post(self.action_url(action))
            .timeout(self.timeout)
            .json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request.send().await
    }
}

#[derive(Debug, Serialize)]
struct FindRequest<'a> {
    collection: &'a str,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    documents: Vec<RawRecord>,
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    #[serde(rename = "insertedCount")]
    inserted_count: usize,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    #[serde(rename = "modifiedCount")]
    modified_count: usize,
}

impl Backend for DocsBackend {
    fn side(&self) -> Side {
        Side::Docs
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let body = serde_json::to_value(FindRequest {
            collection: &self.collection,
        })?;
        let response = self
            .post_action("find", &body)
            .await
            .map_err(|e| Error::Fetch {
                side: Side::Docs,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Error::Fetch {
                side: Side::Docs,
                message: format!("document store returned {}", response.status()),
            });
        }

        let data: FindResponse = response.json().await.map_err(|e| Error::Fetch {
            side: Side::Docs,
            message: format!("invalid find response: {e}"),
        })?;

        Ok(data.documents)
    }

    async fn apply(&self, kind: ApplyKind, records: Vec<RawRecord>) -> Result<usize> {
        let as_apply_error = |message: String| Error::Apply {
            side: Side::Docs,
            kind,
            message,
        };

        match kind {
            ApplyKind::Create => {
                let body = json!({
                    "collection": self.collection,
                    "documents": records,
                });
                let response = self
                    .post_action("insertMany", &body)
                    .await
                    .map_err(|e| as_apply_error(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(as_apply_error(format!(
                        "document store returned {}",
                        response.status()
                    )));
                }

                let data: InsertResponse = response
                    .json()
                    .await
                    .map_err(|e| as_apply_error(format!("invalid insert response: {e}")))?;
                Ok(data.inserted_count)
            }
            ApplyKind::Update => {
                // One updateOne per record: the store's update action
                // takes a single filter, and each record targets its own
                // id.
                let mut applied = 0;
                for mut record in records {
                    let id = record.remove(&self.id_field).ok_or_else(|| {
                        as_apply_error(format!("update payload missing '{}'", self.id_field))
                    })?;
                    let mut filter = RawRecord::new();
                    filter.insert(self.id_field.clone(), id);
                    let body = json!({
                        "collection": self.collection,
                        "filter": filter,
                        "update": { "$set": Value::Object(record) },
                    });
                    let response = self
                        .post_action("updateOne", &body)
                        .await
                        .map_err(|e| as_apply_error(e.to_string()))?;

                    if !response.status().is_success() {
                        return Err(as_apply_error(format!(
                            "document store returned {} after {applied} updates",
                            response.status()
                        )));
                    }

                    let data: UpdateResponse = response
                        .json()
                        .await
                        .map_err(|e| as_apply_error(format!("invalid update response: {e}")))?;
                    applied += data.modified_count;
                }
                Ok(applied)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldMap;

    fn config(base: &str) -> BackendConfig {
        BackendConfig {
            base_url: base.to_string(),
            resource: "tasks".to_string(),
            token: None,
            mapping: FieldMap::docs_default(),
        }
    }

    #[test]
    fn test_action_url_shape() {
        let backend = DocsBackend::new(&config("https://data.example/v1/"), 30);
        assert_eq!(backend.action_url("find"), "https://data.example/v1/action/find");
        assert_eq!(
            backend.action_url("insertMany"),
            "https://data.example/v1/action/insertMany"
        );
    }

    #[test]
    fn test_id_field_from_mapping() {
        let backend = DocsBackend::new(&config("https://data.example/v1"), 30);
        assert_eq!(backend.id_field, "_id");
    }
}
