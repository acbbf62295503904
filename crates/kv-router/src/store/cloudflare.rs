//! Cloudflare Workers KV backend, accessed through the REST API.
//!
//! Values live at
//! `{base_url}/accounts/{account_id}/storage/kv/namespaces/{namespace_id}/values/{key}`.
//! Workers KV is eventually consistent: a write can take up to a minute to
//! become visible at other edge locations.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};

use super::{KvStore, StoreError, StoreResult};

pub struct CloudflareKvStore {
    client: reqwest::Client,
    values_url: Url,
    api_token: String,
}

impl CloudflareKvStore {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        account_id: &str,
        namespace_id: &str,
        api_token: String,
    ) -> StoreResult<Self> {
        if account_id.is_empty() || namespace_id.is_empty() {
            return Err(StoreError::Config(
                "cloudflare account_id and namespace_id are required".to_string(),
            ));
        }

        let mut values_url = Url::parse(base_url)
            .map_err(|e| StoreError::Config(format!("invalid base_url {base_url}: {e}")))?;
        values_url
            .path_segments_mut()
            .map_err(|_| StoreError::Config(format!("base_url {base_url} cannot be a base")))?
            .pop_if_empty()
            .extend([
                "accounts",
                account_id,
                "storage",
                "kv",
                "namespaces",
                namespace_id,
                "values",
            ]);

        Ok(Self {
            client,
            values_url,
            api_token,
        })
    }

    /// URL for a single key; the key is percent-encoded as one path segment.
    fn key_url(&self, key: &str) -> Url {
        let mut url = self.values_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(key);
        }
        url
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_token.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.api_token)
        }
    }
}

#[async_trait]
impl KvStore for CloudflareKvStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let resp = self
            .authorized(self.client.get(self.key_url(key)))
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(resp.text().await?)),
            status => Err(StoreError::UnexpectedStatus {
                key: key.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let resp = self
            .authorized(self.client.put(self.key_url(key)))
            .header("content-type", "text/plain")
            .body(value.to_string())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(StoreError::UnexpectedStatus {
                key: key.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let resp = self
            .authorized(self.client.delete(self.key_url(key)))
            .send()
            .await?;

        // 404 on delete means the key is already gone
        let status = resp.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(StoreError::UnexpectedStatus {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
