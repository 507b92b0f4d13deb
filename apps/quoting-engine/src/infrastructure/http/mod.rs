//! Callback delivery adapters.

mod callback_client;
mod recording_client;

pub use callback_client::{CallbackClientConfig, ReqwestCallbackClient};
pub use recording_client::RecordingCallbackClient;
