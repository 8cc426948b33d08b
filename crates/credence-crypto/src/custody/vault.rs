//! HashiCorp Vault KV v2 custody backend.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | put       | `POST   {addr}/v1/<mount>/data/dids/<did>` with `{"data": map}` |
//! | get       | `GET    {addr}/v1/<mount>/data/dids/<did>` → `{"data": {"data": map}}` |
//! | delete    | `DELETE {addr}/v1/<mount>/metadata/dids/<did>` |
//!
//! Authentication is the `X-Vault-Token` header on every request.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::{ConfigError, KeyCustodyError, SecretMap, DEFAULT_MOUNT};

const TOKEN_HEADER: &str = "X-Vault-Token";

/// Connection settings for the Vault backend.
///
/// Custom `Debug` redacts the token.
#[derive(Clone)]
pub struct VaultConfig {
    /// Vault server address, e.g. `https://vault.internal:8200`.
    pub addr: Url,
    /// Token sent as `X-Vault-Token`.
    pub token: String,
    /// KV v2 mount name.
    pub mount: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("addr", &self.addr)
            .field("token", &"[REDACTED]")
            .field("mount", &self.mount)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl VaultConfig {
    /// Load configuration from environment variables.
    ///
    /// - `VAULT_ADDR` (required; [`ConfigError::MissingAddr`] when unset)
    /// - `VAULT_TOKEN` (required when `VAULT_ADDR` is set)
    /// - `VAULT_MOUNT` (default: `secret`)
    /// - `KEY_CUSTODY_TIMEOUT_SECS` (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_addr = std::env::var("VAULT_ADDR").map_err(|_| ConfigError::MissingAddr)?;
        let addr = Url::parse(&raw_addr)
            .map_err(|e| ConfigError::InvalidUrl("VAULT_ADDR".to_string(), e.to_string()))?;
        let token = std::env::var("VAULT_TOKEN").map_err(|_| ConfigError::MissingToken)?;
        let mount = std::env::var("VAULT_MOUNT").unwrap_or_else(|_| DEFAULT_MOUNT.to_string());
        let timeout_secs = match std::env::var("KEY_CUSTODY_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| {
                ConfigError::InvalidValue("KEY_CUSTODY_TIMEOUT_SECS".to_string(), raw)
            })?,
            Err(_) => 10,
        };
        Ok(Self {
            addr,
            token,
            mount,
            timeout_secs,
        })
    }
}

/// Vault KV v2 client.
#[derive(Debug, Clone)]
pub struct VaultKeyCustody {
    http: reqwest::Client,
    base: String,
    mount: String,
}

#[derive(Serialize)]
struct WriteRequest<'a> {
    data: &'a SecretMap,
}

#[derive(Deserialize)]
struct ReadResponse {
    data: ReadData,
}

#[derive(Deserialize)]
struct ReadData {
    data: SecretMap,
}

impl VaultKeyCustody {
    /// Build a client from configuration.
    pub fn new(config: VaultConfig) -> Result<Self, KeyCustodyError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut token = reqwest::header::HeaderValue::from_str(&config.token).map_err(|_| {
            ConfigError::InvalidValue("VAULT_TOKEN".to_string(), "[REDACTED]".to_string())
        })?;
        token.set_sensitive(true);
        headers.insert(TOKEN_HEADER, token);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| KeyCustodyError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            base: config.addr.as_str().trim_end_matches('/').to_string(),
            mount: config.mount,
        })
    }

    pub(crate) fn mount(&self) -> &str {
        &self.mount
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.base)
    }

    pub(crate) async fn put(&self, path: &str, secret: &SecretMap) -> Result<(), KeyCustodyError> {
        let endpoint = format!("POST {path}");
        let resp = self
            .http
            .post(self.url(path))
            .json(&WriteRequest { data: secret })
            .send()
            .await
            .map_err(|e| KeyCustodyError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if !resp.status().is_success() {
            return Err(api_error(endpoint, resp).await);
        }
        Ok(())
    }

    pub(crate) async fn get(&self, path: &str) -> Result<Option<SecretMap>, KeyCustodyError> {
        let endpoint = format!("GET {path}");
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| KeyCustodyError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(api_error(endpoint, resp).await);
        }

        let body: ReadResponse = resp
            .json()
            .await
            .map_err(|e| KeyCustodyError::Deserialization { endpoint, source: e })?;
        Ok(Some(body.data.data))
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), KeyCustodyError> {
        let metadata_path = path.replacen("/data/", "/metadata/", 1);
        let endpoint = format!("DELETE {metadata_path}");
        let resp = self
            .http
            .delete(self.url(&metadata_path))
            .send()
            .await
            .map_err(|e| KeyCustodyError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        if !resp.status().is_success() {
            return Err(api_error(endpoint, resp).await);
        }
        Ok(())
    }
}

async fn api_error(endpoint: String, resp: reqwest::Response) -> KeyCustodyError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    tracing::warn!(%endpoint, status, "custody backend rejected request");
    KeyCustodyError::Api {
        endpoint,
        status,
        body,
    }
}
