//! Interceptor contract and the priority-ordered pipeline.
//!
//! An interceptor is a unit of deferred, asynchronous work that receives
//! the shared [`Request`] by mutable reference and may rewrite any field.
//! The pipeline runs interceptors strictly sequentially in descending
//! priority order; equal priorities preserve registration order. A failing
//! interceptor aborts the remaining chain and the failure propagates to
//! the caller of `send`.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::CourierError;
use crate::types::Request;

/// Priority assigned to user interceptors registered without an explicit
/// one. Built-ins that derive state (executor selection, URL caching) sit
/// above this value; trailing normalizers sit below it.
pub const DEFAULT_PRIORITY: i32 = 100;

/// A unit of request mutation registered with a priority.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, request: &mut Request) -> Result<(), CourierError>;
}

/// Closures returning boxed futures act as interceptors directly.
#[async_trait]
impl<F> Interceptor for F
where
    F: for<'a> Fn(&'a mut Request) -> BoxFuture<'a, Result<(), CourierError>> + Send + Sync,
{
    async fn intercept(&self, request: &mut Request) -> Result<(), CourierError> {
        (self)(request).await
    }
}

pub(crate) struct Registered {
    pub interceptor: Arc<dyn Interceptor>,
    pub priority: i32,
}

/// The ordered interceptor list of one client.
#[derive(Default)]
pub(crate) struct Pipeline {
    entries: Vec<Registered>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, interceptor: Arc<dyn Interceptor>, priority: i32) {
        self.entries.push(Registered {
            interceptor,
            priority,
        });
    }

    /// Drop every registered interceptor, built-ins included.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Run all interceptors against the request, highest priority first.
    ///
    /// The sort is stable, so interceptors registered at the same priority
    /// run in registration order. Each interceptor is awaited to completion
    /// before the next begins; the request is never mutated concurrently.
    pub async fn run(&self, request: &mut Request) -> Result<(), CourierError> {
        let mut order: Vec<&Registered> = self.entries.iter().collect();
        order.sort_by(|a, b| b.priority.cmp(&a.priority));

        for entry in order {
            tracing::trace!(
                target: "courier::pipeline",
                priority = entry.priority,
                "running interceptor"
            );
            entry.interceptor.intercept(request).await?;
        }

        Ok(())
    }
}
