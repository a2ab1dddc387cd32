//! Stream-based executor.
//!
//! Opens a connection through the shared pool, streams the body, buffers
//! the reply and decodes it per the requested response type. The executor
//! is stateless and reusable: a client wired to it may issue any number of
//! sends.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::error::CourierError;
use crate::types::{Request, Response};

use super::Executor;

static SHARED_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

/// Buffered streaming transport over a shared connection pool.
#[derive(Clone)]
pub struct StreamExecutor {
    client: reqwest::Client,
}

impl StreamExecutor {
    /// An executor backed by the process-wide connection pool.
    pub fn new() -> Self {
        Self {
            client: SHARED_CLIENT.clone(),
        }
    }

    /// An executor backed by a caller-provided pool.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for StreamExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for StreamExecutor {
    async fn send(&self, request: &Request) -> Result<Response, CourierError> {
        let builder = super::prepare(&self.client, request)?;

        let exchange = super::exchange(builder, request);
        let (status, headers, bytes) = if request.timeout > 0 {
            // Race the timer against the in-flight send. Losing the race
            // drops the exchange future, so a late reply is never observed.
            match tokio::time::timeout(Duration::from_millis(request.timeout), exchange).await
            {
                Ok(result) => result?,
                Err(_) => {
                    return Err(CourierError::RequestTimedOut {
                        request: Box::new(request.clone()),
                    });
                }
            }
        } else {
            exchange.await?
        };

        tracing::debug!(
            target: "courier::executor",
            status,
            method = %request.method,
            "response received"
        );

        let body = super::decode_body(&bytes, &request.response);
        super::finalize(body, status, headers)
    }
}
