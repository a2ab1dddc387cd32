//! Event-driven, single-use executor.
//!
//! Models a one-shot transport handle: the first `send` consumes the
//! handle, a second call fails fast with `RequestInvalidated` before any
//! I/O. Completion is a biased race over abort, timeout and the arriving
//! response, so a fired timer or a cancelled token suppresses any later
//! completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::CourierError;
use crate::types::{Request, Response};

use super::Executor;

/// One-shot, event-driven transport handle.
pub struct EventExecutor {
    client: reqwest::Client,
    abort: CancellationToken,
    consumed: AtomicBool,
}

impl EventExecutor {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            abort: CancellationToken::new(),
            consumed: AtomicBool::new(false),
        }
    }

    /// Abort the in-flight send; it rejects with `RequestAborted`.
    pub fn abort(&self) {
        self.abort.cancel();
    }

    /// A token that aborts the in-flight send when cancelled.
    pub fn abort_handle(&self) -> CancellationToken {
        self.abort.clone()
    }
}

impl Default for EventExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for EventExecutor {
    async fn send(&self, request: &Request) -> Result<Response, CourierError> {
        // Single-use: the flag flips before any I/O happens.
        if self.consumed.swap(true, Ordering::SeqCst) {
            return Err(CourierError::RequestInvalidated {
                request: Box::new(request.clone()),
            });
        }

        let builder = super::prepare(&self.client, request)?;
        let exchange = super::exchange(builder, request);
        tokio::pin!(exchange);

        let timer = tokio::time::sleep(Duration::from_millis(request.timeout));
        tokio::pin!(timer);

        tokio::select! {
            biased;

            _ = self.abort.cancelled() => Err(CourierError::RequestAborted {
                request: Box::new(request.clone()),
            }),

            // Armed only when a timeout is configured. Returning here drops
            // the exchange future, so a late reply can never complete the
            // send a second time.
            _ = &mut timer, if request.timeout > 0 => {
                Err(CourierError::RequestTimedOut {
                    request: Box::new(request.clone()),
                })
            }

            result = &mut exchange => {
                let (status, headers, bytes) = result?;
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
    }
}
