//! Hosted list service driver.
//!
//! Speaks the list service's item API: one GET for all items of a named
//! list, one POST per batch of mutations with a `kind` discriminator
//! (`New` / `Update` / `Delete`). The sync planner never emits `Delete`;
//! the kind exists because the service's batch endpoint defines it.
//!
//! Authentication is a bearer token resolved by configuration; the token
//! handshake itself happens outside this tool.

use serde::{Deserialize, Serialize};

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::model::{ApplyKind, RawRecord, Side};

use super::Backend;

/// Driver for the hosted list service.
pub struct ListBackend {
    client: reqwest::Client,
    base_url: String,
    list: String,
    token: Option<String>,
    timeout: std::time::Duration,
}

impl ListBackend {
    /// Build a driver from backend configuration.
    #[must_use]
    pub fn new(config: &BackendConfig, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            list: config.resource.clone(),
            token: config.token.clone(),
            timeout: std::time::Duration::from_secs(timeout_secs),
        }
    }

    fn items_url(&self) -> String {
        format!("{}/lists/{}/items", self.base_url, self.list)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ItemsResponse {
    items: Vec<RawRecord>,
}

#[derive(Debug, Serialize)]
struct ApplyRequest<'a> {
    kind: &'a str,
    items: &'a [RawRecord],
}

#[derive(Debug, Deserialize)]
struct ApplyResponse {
    applied: usize,
}

/// Wire name for a mutation kind on the list service.
const fn wire_kind(kind: ApplyKind) -> &'static str {
    match kind {
        ApplyKind::Create => "New",
        ApplyKind::Update => "Update",
    }
}

impl Backend for ListBackend {
    fn side(&self) -> Side {
        Side::List
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let response = self
            .authorize(self.client.get(self.items_url()))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::Fetch {
                side: Side::List,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Error::Fetch {
                side: Side::List,
                message: format!("list service returned {}", response.status()),
            });
        }

        let data: ItemsResponse = response.json().await.map_err(|e| Error::Fetch {
            side: Side::List,
            message: format!("invalid items response: {e}"),
        })?;

        Ok(data.items)
    }

    async fn apply(&self, kind: ApplyKind, records: Vec<RawRecord>) -> Result<usize> {
        let request = ApplyRequest {
            kind: wire_kind(kind),
            items: &records,
        };

        let response = self
            .authorize(self.client.post(self.items_url()))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Apply {
                side: Side::List,
                kind,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Apply {
                side: Side::List,
                kind,
                message: format!("list service returned {status}: {body}"),
            });
        }

        let data: ApplyResponse = response.json().await.map_err(|e| Error::Apply {
            side: Side::List,
            kind,
            message: format!("invalid apply response: {e}"),
        })?;

        Ok(data.applied)
    }
}
