//! Recording callback client.
//!
//! Keeps every request it is handed and answers 200, unless the URL starts
//! with a prefix registered through [`RecordingCallbackClient::fail_for`].
//! Used by tests and dry runs.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::application::ports::{CallbackPort, CallbackResponse, ForwardError, OutboundRequest};

/// In-process [`CallbackPort`] that records instead of sending.
#[derive(Debug, Default)]
pub struct RecordingCallbackClient {
    requests: Mutex<Vec<OutboundRequest>>,
    failures: Mutex<Vec<(String, ForwardError)>>,
}

impl RecordingCallbackClient {
    /// Create a client that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail requests whose URL starts with `url_prefix`.
    pub fn fail_for(&self, url_prefix: &str, error: ForwardError) {
        self.failures.lock().push((url_prefix.to_string(), error));
    }

    /// Requests received so far, in order, including failed ones.
    #[must_use]
    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().clone()
    }

    /// Requests sent to URLs starting with `url_prefix`.
    #[must_use]
    pub fn requests_to(&self, url_prefix: &str) -> Vec<OutboundRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.url.starts_with(url_prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CallbackPort for RecordingCallbackClient {
    async fn send(&self, request: OutboundRequest) -> Result<CallbackResponse, ForwardError> {
        let failure = self
            .failures
            .lock()
            .iter()
            .find(|(prefix, _)| request.url.starts_with(prefix.as_str()))
            .map(|(_, error)| error.clone());
        self.requests.lock().push(request);

        match failure {
            Some(error) => Err(error),
            None => Ok(CallbackResponse { status: 200 }),
        }
    }
}
