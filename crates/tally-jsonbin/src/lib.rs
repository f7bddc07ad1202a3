//! JSONBin adapter for the registry store.
//!
//! The whole registry lives in one bin: `GET /b/{id}` reads it, `PUT /b/{id}`
//! replaces it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use tally_core::{errors::Error, registry::Registry, store::RegistryStore, Result};

const MASTER_KEY_HEADER: &str = "X-Master-Key";
const BIN_META_HEADER: &str = "X-Bin-Meta";

#[derive(Clone, Debug)]
pub struct JsonBinStore {
    base_url: String,
    bin_id: String,
    api_key: String,
    http: reqwest::Client,
}

impl JsonBinStore {
    pub fn new(
        base_url: impl Into<String>,
        bin_id: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Store(format!("jsonbin client build failed: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bin_id: bin_id.into(),
            api_key: api_key.into(),
            http,
        })
    }

    fn bin_url(&self) -> String {
        format!("{}/b/{}", self.base_url, self.bin_id)
    }
}

#[async_trait]
impl RegistryStore for JsonBinStore {
    async fn load(&self) -> Result<Registry> {
        let resp = self
            .http
            .get(self.bin_url())
            .header(MASTER_KEY_HEADER, &self.api_key)
            .header(BIN_META_HEADER, "false")
            .send()
            .await
            .map_err(|e| Error::Store(format!("jsonbin read request error: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(status_error("read", status, resp).await);
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::Store(format!("jsonbin read body error: {e}")))?;
        let registry: Registry = serde_json::from_slice(&body)
            .map_err(|e| Error::Store(format!("jsonbin returned a malformed registry: {e}")))?;

        debug!(users = registry.len(), "loaded registry from jsonbin");
        Ok(registry)
    }

    async fn save(&self, registry: &Registry) -> Result<()> {
        let resp = self
            .http
            .put(self.bin_url())
            .header(MASTER_KEY_HEADER, &self.api_key)
            .json(registry)
            .send()
            .await
            .map_err(|e| Error::Store(format!("jsonbin write request error: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(status_error("write", status, resp).await);
        }

        debug!(users = registry.len(), "saved registry to jsonbin");
        Ok(())
    }
}

async fn status_error(op: &str, status: StatusCode, resp: reqwest::Response) -> Error {
    let body = resp.text().await.unwrap_or_default();
    Error::Store(format!(
        "jsonbin {op} failed: {status} {}",
        body.chars().take(200).collect::<String>()
    ))
}
