//! Transport boundary: one blocking request operation returning raw bytes
//! or a classified [`TransportError`].
//!
//! [`HttpTransport`] is the production implementation over a `ureq` agent.
//! Retries, backoff and token acquisition are out of scope; the API key is
//! passed through as a header.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use dirsync_core::EntityId;

use crate::error::TransportError;

/// Collection path for directory users.
pub const USERS_PATH: &str = "/systemusers";

/// `/systemusers/{id}`
pub fn entity_path(id: &EntityId) -> String {
    format!("{USERS_PATH}/{id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single operation the reconciler needs from the network.
pub trait Transport {
    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&[u8]>,
    ) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&[u8]>,
    ) -> Result<Vec<u8>, TransportError> {
        (**self).request(method, path, body)
    }
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Connection settings for [`HttpTransport`].
#[derive(Clone)]
pub struct HttpConfig {
    pub base_url: String,
    pub api_key: String,
    pub org_id: Option<String>,
    pub timeout: Duration,
}

impl fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("org_id", &self.org_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Blocking JSON-over-HTTP transport.
#[derive(Debug)]
pub struct HttpTransport {
    agent: ureq::Agent,
    config: HttpConfig,
}

impl HttpTransport {
    pub fn new(config: HttpConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.timeout)
            .timeout_read(config.timeout)
            .timeout_write(config.timeout)
            .user_agent(concat!("dirsync/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

impl Transport for HttpTransport {
    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&[u8]>,
    ) -> Result<Vec<u8>, TransportError> {
        let url = self.url(path);
        tracing::debug!("{method} {url}");

        let mut req = self
            .agent
            .request(method.as_str(), &url)
            .set("accept", "application/json")
            .set("content-type", "application/json")
            .set("x-api-key", &self.config.api_key);
        if let Some(org_id) = self.config.org_id.as_deref() {
            req = req.set("x-org-id", org_id);
        }

        let result = match body {
            Some(bytes) => req.send_bytes(bytes),
            None => req.call(),
        };

        match result {
            Ok(resp) => {
                let mut buf = Vec::new();
                resp.into_reader()
                    .read_to_end(&mut buf)
                    .map_err(|err| TransportError::Generic {
                        status: None,
                        body: format!("reading response body: {err}"),
                    })?;
                Ok(buf)
            }
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(TransportError::from_status(code, body))
            }
            Err(ureq::Error::Transport(err)) => Err(TransportError::Generic {
                status: None,
                body: err.to_string(),
            }),
        }
    }
}
