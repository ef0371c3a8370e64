// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! HTTP seam for OCSP.
//!
//! The verifier never imposes its own timeout; callers wrap verification in
//! whatever deadline they need. The default agent lifts ureq's built-in
//! connect timeout for the same reason.

use std::io::Read as _;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub const OCSP_REQUEST_CONTENT_TYPE: &str = "application/ocsp-request";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("ocsp_request_failed: {url}: {message}")]
    Request { url: String, message: String },

    #[error("ocsp_http_status_{status}: {url}")]
    Status { url: String, status: u16 },

    #[error("ocsp_response_read_failed: {url}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ocsp_transport_task_failed: {0}")]
    Task(String),
}

/// POSTs an OCSP request and returns the raw response body.
#[async_trait]
pub trait OcspTransport: Send + Sync {
    async fn post(
        &self,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError>;
}

/// Default transport backed by a blocking `ureq` agent.
///
/// Requests run on the tokio blocking pool so the two checks of one chain
/// proceed concurrently.
#[derive(Debug, Clone)]
pub struct UreqOcspTransport {
    agent: ureq::Agent,
}

impl UreqOcspTransport {
    /// Agent without connect, read or overall timeouts.
    pub fn new() -> Self {
        // An unrepresentable connect deadline disables ureq's 30s default.
        Self::with_agent(
            ureq::AgentBuilder::new()
                .timeout_connect(Duration::MAX)
                .build(),
        )
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqOcspTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcspTransport for UreqOcspTransport {
    async fn post(
        &self,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        let agent = self.agent.clone();
        let url = url.to_string();
        let content_type = content_type.to_string();

        tokio::task::spawn_blocking(move || {
            let resp = match agent.post(&url).set("Content-Type", &content_type).send_bytes(&body) {
                Ok(r) => r,
                Err(ureq::Error::Status(status, _)) => {
                    return Err(TransportError::Status { url, status })
                }
                Err(e) => {
                    return Err(TransportError::Request {
                        url,
                        message: e.to_string(),
                    })
                }
            };

            let mut bytes = Vec::new();
            match resp.into_reader().read_to_end(&mut bytes) {
                Ok(_) => Ok(bytes),
                Err(source) => Err(TransportError::Body { url, source }),
            }
        })
        .await
        .map_err(|e| TransportError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_agent_has_no_timeouts() {
        let debug = format!("{:?}", UreqOcspTransport::new());
        assert!(debug.contains(&format!("timeout_connect: Some({:?})", Duration::MAX)));
        assert!(!debug.contains("timeout_connect: Some(30s)"));
        assert!(debug.contains("timeout_read: None"));
        assert!(debug.contains("timeout_write: None"));
        assert!(debug.contains("timeout: None"));
    }
}
