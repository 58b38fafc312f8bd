//! Runtime support for generated clients.
//!
//! Generated implementations hold a [`ClientContext`] and call the helpers in this module
//! to build, send and decode requests. The context is an explicit, cloneable handle: every
//! clone observes the same installed client, and nothing is stored globally.
//!
//! ```no_run
//! use client_from_source::runtime::{reqwest, ClientContext};
//!
//! let context = ClientContext::new();
//! context.install_with_base_url(reqwest::Client::new(), "https://api.example.com");
//! assert!(context.is_installed());
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

pub use reqwest;
pub use reqwest::multipart::{Form, Part};

use reqwest::{Client, RequestBuilder, Response, StatusCode};

/// Errors raised by generated client methods.
///
/// Error types returned by service traits must implement `From<ClientError>`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP client not initialized")]
    Uninitialized,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug)]
struct Installed {
    client: Client,
    base_url: String,
}

/// Shared handle to the HTTP client used by generated implementations.
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    inner: Arc<RwLock<Option<Installed>>>,
}

impl ClientContext {
    /// A context with no client installed
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let context = Self::new();
        context.install_with_base_url(client, base_url);
        context
    }

    /// Installs `client`, keeping the current base URL.
    pub fn install(&self, client: Client) {
        let base_url = self.base_url().unwrap_or_default();
        self.install_with_base_url(client, base_url);
    }

    /// Installs `client` and `base_url`, replacing any previous client.
    ///
    /// The previous client is dropped before the new one is stored.
    pub fn install_with_base_url(&self, client: Client, base_url: impl Into<String>) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        drop(guard.take());
        *guard = Some(Installed {
            client,
            base_url: base_url.into(),
        });
    }

    /// Drops the installed client, if any
    pub fn reset(&self) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    pub fn is_installed(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The installed client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Uninitialized`] when no client is installed.
    pub fn client(&self) -> Result<Client, ClientError> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|installed| installed.client.clone())
            .ok_or(ClientError::Uninitialized)
    }

    pub fn base_url(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|installed| installed.base_url.clone())
    }

    /// The installed client and the absolute URL of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Uninitialized`] when no client is installed.
    pub fn endpoint(&self, path: &str) -> Result<(Client, String), ClientError> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let installed = guard.as_ref().ok_or(ClientError::Uninitialized)?;
        Ok((installed.client.clone(), join_url(&installed.base_url, path)))
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    if base_url.is_empty() {
        return path.to_string();
    }
    if path.is_empty() {
        return base_url.to_string();
    }
    match (base_url.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base_url, &path[1..]),
        (false, false) => format!("{}/{}", base_url, path),
        _ => format!("{}{}", base_url, path),
    }
}

/// A JSON object assembled from individual fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct JsonFields(serde_json::Map<String, serde_json::Value>);

impl JsonFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<V>(&mut self, key: &str, value: &V) -> Result<(), ClientError>
    where
        V: Serialize + ?Sized,
    {
        self.0.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Inserts every entry of a map, keyed by the entry key's string form
    pub fn extend<'a, K, V, I>(&mut self, entries: I) -> Result<(), ClientError>
    where
        I: IntoIterator<Item = (&'a K, &'a V)>,
        K: fmt::Display + ?Sized + 'a,
        V: Serialize + ?Sized + 'a,
    {
        for (key, value) in entries {
            self.0.insert(key.to_string(), serde_json::to_value(value)?);
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Ordered `application/x-www-form-urlencoded` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<V>(&mut self, key: &str, value: &V)
    where
        V: fmt::Display + ?Sized,
    {
        self.0.push((key.to_string(), value.to_string()));
    }

    pub fn extend<'a, K, V, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (&'a K, &'a V)>,
        K: fmt::Display + ?Sized + 'a,
        V: fmt::Display + ?Sized + 'a,
    {
        for (key, value) in entries {
            self.0.push((key.to_string(), value.to_string()));
        }
    }

    pub fn as_slice(&self) -> &[(String, String)] {
        &self.0
    }
}

/// Sends a request, turning non-success statuses into [`ClientError::Status`].
pub async fn send(request: RequestBuilder) -> Result<Response, ClientError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status { status, body });
    }
    Ok(response)
}

/// Deserializes a JSON response body.
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    Ok(response.json::<T>().await?)
}

pub async fn read_text(response: Response) -> Result<String, ClientError> {
    Ok(response.text().await?)
}
