//! Reqwest callback client.
//!
//! Delivers forwards and error callbacks to participant endpoints over HTTP.
//! Every non-2xx status is a failure. There is no retry; the message bus
//! redelivers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::application::ports::{
    CallbackPort, CallbackResponse, ForwardError, HttpMethod, OutboundRequest,
};

/// Callback client settings.
#[derive(Debug, Clone)]
pub struct CallbackClientConfig {
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for CallbackClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

/// HTTP implementation of [`CallbackPort`].
#[derive(Debug, Clone)]
pub struct ReqwestCallbackClient {
    client: Client,
}

impl ReqwestCallbackClient {
    /// Build a client with the configured timeout.
    pub fn new(config: &CallbackClientConfig) -> Result<Self, ForwardError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ForwardError::Connection {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CallbackPort for ReqwestCallbackClient {
    async fn send(&self, request: OutboundRequest) -> Result<CallbackResponse, ForwardError> {
        let OutboundRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = match method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
        };
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            // `json` would overwrite the interop content-type header.
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ForwardError::Timeout { url: url.clone() }
            } else {
                ForwardError::Connection {
                    url: url.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "callback rejected");
            return Err(ForwardError::Status {
                url,
                status: status.as_u16(),
            });
        }

        tracing::debug!(url = %url, status = status.as_u16(), method = %method, "callback delivered");
        Ok(CallbackResponse {
            status: status.as_u16(),
        })
    }
}
