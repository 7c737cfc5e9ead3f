// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP storage adapter.
//!
//! Routes, relative to the base URL:
//!
//! | operation    | request                     |
//! |--------------|-----------------------------|
//! | `fetch_all`  | `GET /<kind>?filter=&sort=` |
//! | `read_one`   | `GET /<kind>/<id>`          |
//! | `create_one` | `POST /<kind>`              |
//! | `update_one` | `PUT /<kind>/<id>`          |
//! | `delete_one` | `DELETE /<kind>/<id>`       |

use mirra_core::record::ID_KEY;
use mirra_core::{Fields, Filter, SortSpec};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::{AdapterError, AdapterFuture, AdapterResult, FieldCase, StorageAdapter};

/// Storage adapter speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct RestAdapter {
    client: Client,
    base_url: String,
    codec: FieldCase,
}

impl RestAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        RestAdapter { client, base_url, codec: FieldCase::Identity }
    }

    /// Sets the field-name codec.
    pub fn with_codec(mut self, codec: FieldCase) -> Self {
        self.codec = codec;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn kind_url(&self, kind: &str) -> String {
        format!("{}/{}", self.base_url, kind)
    }

    fn entity_url(&self, kind: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, kind, id)
    }

    /// Sends a record to the server with `_id` set.
    async fn write(&self, method: Method, url: String, id: &str, fields: &Fields) -> AdapterResult<()> {
        let mut body = self.codec.encode(fields);
        body.insert(ID_KEY.to_string(), Value::String(id.to_string()));
        debug!(%method, %url, "storage write");
        let response = self.client.request(method, &url).json(&body).send().await?;
        check(response).await?;
        Ok(())
    }

    fn decode_record(&self, value: Value) -> AdapterResult<Fields> {
        match value {
            Value::Object(map) => Ok(self.codec.decode(&map)),
            other => Err(AdapterError::Decode(format!("expected a record object, got {other}"))),
        }
    }
}

/// Turns a non-success response into [`AdapterError::Status`].
async fn check(response: Response) -> AdapterResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let reason = status.canonical_reason().unwrap_or("error").to_string();
    let body = response.text().await.unwrap_or_default();
    let text = if body.is_empty() { reason } else { format!("{reason}: {body}") };
    Err(AdapterError::Status { status: status.as_u16(), text })
}

impl StorageAdapter for RestAdapter {
    fn fetch_all<'a>(
        &'a self,
        kind: &'a str,
        filter: &'a Filter,
        sort: &'a SortSpec,
    ) -> AdapterFuture<'a, Vec<Fields>> {
        Box::pin(async move {
            let mut request = self.client.get(self.kind_url(kind));
            if !filter.is_all() {
                request = request.query(&[("filter", filter.to_json().to_string())]);
            }
            if !sort.is_empty() {
                request = request.query(&[("sort", sort.to_json().to_string())]);
            }
            let response = check(request.send().await?).await?;
            let body: Value = response.json().await?;
            let Value::Array(items) = body else {
                return Err(AdapterError::Decode(format!("expected an array of {kind}")));
            };
            debug!(kind, count = items.len(), "fetched");
            items.into_iter().map(|item| self.decode_record(item)).collect()
        })
    }

    fn read_one<'a>(&'a self, kind: &'a str, id: &'a str) -> AdapterFuture<'a, Option<Fields>> {
        Box::pin(async move {
            let response = self.client.get(self.entity_url(kind, id)).send().await?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            let body: Value = check(response).await?.json().await?;
            self.decode_record(body).map(Some)
        })
    }

    fn create_one<'a>(&'a self, kind: &'a str, id: &'a str, fields: &'a Fields) -> AdapterFuture<'a, ()> {
        Box::pin(self.write(Method::POST, self.kind_url(kind), id, fields))
    }

    fn update_one<'a>(&'a self, kind: &'a str, id: &'a str, fields: &'a Fields) -> AdapterFuture<'a, ()> {
        Box::pin(self.write(Method::PUT, self.entity_url(kind, id), id, fields))
    }

    fn delete_one<'a>(&'a self, kind: &'a str, id: &'a str, fields: &'a Fields) -> AdapterFuture<'a, ()> {
        Box::pin(self.write(Method::DELETE, self.entity_url(kind, id), id, fields))
    }

    fn decode_push(&self, fields: &Fields) -> Fields {
        self.codec.decode(fields)
    }
}
