use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::error::{BackendError, Result};

/// A reusable async client driven to completion on a runtime it owns.
///
/// Using or dropping one from inside another tokio runtime panics.
#[derive(Debug)]
pub struct BlockingTransport {
    client: Client,
    runtime: Runtime,
}

impl BlockingTransport {
    pub fn new(timeout: std::time::Duration) -> Result<Self> {
        let runtime = Runtime::new()?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, runtime })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send a request and decode a successful JSON response.
    ///
    /// Non-2xx responses become [`BackendError::Status`] carrying the body text.
    pub fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.runtime.block_on(async {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = match response.text().await {
                    Ok(body) => body,
                    Err(error) => {
                        warn!(status = status.as_u16(), %error, "Could not read error response body");
                        String::new()
                    }
                };
                return Err(BackendError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let bytes = response.bytes().await?;
            debug!(status = status.as_u16(), bytes = bytes.len(), "Backend responded");
            Ok(serde_json::from_slice(&bytes)?)
        })
    }
}
