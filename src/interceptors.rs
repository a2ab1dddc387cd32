//! Built-in interceptors seeded on every client.
//!
//! The built-ins split into two tiers. Executor selection and URL caching
//! run before user interceptors, so a directly injected URL or executor is
//! visible to the rest of the chain. The trailing normalizers (header
//! normalization, default accept header, conflicting-authorization removal
//! and payload handling) run after user interceptors, so defaults never
//! clobber what the caller configured.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CourierError;
use crate::executors::{Executor, StreamExecutor};
use crate::interceptor::Interceptor;
use crate::types::{Request, ResponseType};

/// Fixed priorities for the built-in interceptors.
pub mod priorities {
    pub const SELECT_EXECUTOR: i32 = 1_000;
    pub const BUILD_URL: i32 = 900;
    pub const NORMALIZE_HEADERS: i32 = -100;
    pub const DEFAULT_ACCEPT: i32 = -200;
    pub const STRIP_AUTHORIZATION: i32 = -300;
    pub const HANDLE_PAYLOAD: i32 = -400;
}

/// Factory resolving the default executor for a send.
pub type ExecutorFactory = Arc<dyn Fn() -> Arc<dyn Executor> + Send + Sync>;

/// Assigns the default executor when none has been set.
///
/// The transport choice is a configuration-time decision injected as a
/// factory, not a runtime environment check. Because the interceptor skips
/// when an executor is already assigned, an earlier assignment wins and a
/// later one simply overwrites the default.
pub struct SelectExecutor {
    factory: ExecutorFactory,
}

impl SelectExecutor {
    pub fn new(factory: ExecutorFactory) -> Self {
        Self { factory }
    }

    /// The stock choice: a shared, reusable stream-based executor.
    pub fn stream() -> Self {
        Self::new(Arc::new(|| Arc::new(StreamExecutor::new()) as Arc<dyn Executor>))
    }
}

#[async_trait]
impl Interceptor for SelectExecutor {
    async fn intercept(&self, request: &mut Request) -> Result<(), CourierError> {
        if request.executor.is_none() {
            request.executor = Some((self.factory)());
            tracing::trace!(target: "courier::pipeline", "assigned default executor");
        }
        Ok(())
    }
}

/// Caches the canonical URL on the request so later interceptors and the
/// executor do not redo the parse.
///
/// Skips when a URL was injected directly. Also skips while base and path
/// are both still empty; the executor resolves the URL at dispatch once the
/// lower-priority interceptors have populated the fragments.
pub struct BuildUrl;

#[async_trait]
impl Interceptor for BuildUrl {
    async fn intercept(&self, request: &mut Request) -> Result<(), CourierError> {
        if request.url.is_some() || (request.base.is_empty() && request.path.is_empty()) {
            return Ok(());
        }
        let url = crate::url::build(request)?;
        request.url = Some(url);
        Ok(())
    }
}

/// Lower-cases all header names. The header map already normalizes on
/// insert, so this pass is idempotent by construction.
pub struct NormalizeHeaders;

#[async_trait]
impl Interceptor for NormalizeHeaders {
    async fn intercept(&self, request: &mut Request) -> Result<(), CourierError> {
        request.headers.normalize();
        Ok(())
    }
}

/// Assigns a default `accept` header matching the desired response type,
/// unless the caller already set one.
pub struct DefaultAccept;

#[async_trait]
impl Interceptor for DefaultAccept {
    async fn intercept(&self, request: &mut Request) -> Result<(), CourierError> {
        if request.headers.contains("accept") {
            return Ok(());
        }
        let accept = match request.response.kind {
            ResponseType::Json => "application/json",
            _ => "text/plain */*",
        };
        request.headers.set("accept", accept);
        Ok(())
    }
}

/// Strips a pre-existing `authorization` header when explicit credentials
/// are present, so the transport never sees two competing sources of
/// authentication.
pub struct StripConflictingAuthorization;

#[async_trait]
impl Interceptor for StripConflictingAuthorization {
    async fn intercept(&self, request: &mut Request) -> Result<(), CourierError> {
        if request.authentication.is_set() {
            request.headers.remove("authorization");
        }
        Ok(())
    }
}

/// Normalizes the request payload and its content headers.
///
/// A missing body removes any content headers. A structured body (object
/// or array) is serialized to JSON text with the matching content type.
/// Scalar bodies pass through untouched.
pub struct HandlePayload;

#[async_trait]
impl Interceptor for HandlePayload {
    async fn intercept(&self, request: &mut Request) -> Result<(), CourierError> {
        match &request.body {
            None => {
                request.headers.remove("content-type");
                request.headers.remove("content-length");
            }
            Some(value) if value.is_object() || value.is_array() => {
                let text = serde_json::to_string(value)?;
                request
                    .headers
                    .set("content-type", "application/json;charset=utf-8");
                request.headers.set("content-length", text.len().to_string());
                request.body = Some(serde_json::Value::String(text));
            }
            Some(_) => {}
        }
        Ok(())
    }
}

/// A simple logging interceptor backed by `tracing` (no sensitive data).
#[derive(Clone, Default)]
pub struct LoggingInterceptor;

#[async_trait]
impl Interceptor for LoggingInterceptor {
    async fn intercept(&self, request: &mut Request) -> Result<(), CourierError> {
        tracing::debug!(
            target: "courier::http",
            method = %request.method,
            base = %request.base,
            path = %request.path,
            timeout = request.timeout,
            "prepared request"
        );
        Ok(())
    }
}
