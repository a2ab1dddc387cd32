//! Client facade.
//!
//! Registration is pure data accumulation; nothing executes until a
//! terminal operation runs the pipeline and dispatches to the assigned
//! executor. The client owns one [`Request`] which the pipeline mutates in
//! place on every send.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::CourierError;
use crate::executors::Executor;
use crate::interceptor::{DEFAULT_PRIORITY, Interceptor, Pipeline};
use crate::interceptors::{
    BuildUrl, DefaultAccept, HandlePayload, NormalizeHeaders, SelectExecutor,
    StripConflictingAuthorization, priorities,
};
use crate::types::{Method, Request, Response};

/// The chaining HTTP client.
///
/// ```no_run
/// use courier::Client;
///
/// # async fn run() -> Result<(), courier::CourierError> {
/// let todo: serde_json::Value = Client::new()
///     .mutate(|req| req.base = "http://server.api".to_string())
///     .body("todos/1")
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    pipeline: Pipeline,
    request: Request,
}

impl Client {
    /// A client seeded with the built-in interceptor set.
    pub fn new() -> Self {
        let mut pipeline = Pipeline::new();
        pipeline.register(
            Arc::new(SelectExecutor::stream()),
            priorities::SELECT_EXECUTOR,
        );
        pipeline.register(Arc::new(BuildUrl), priorities::BUILD_URL);
        pipeline.register(Arc::new(NormalizeHeaders), priorities::NORMALIZE_HEADERS);
        pipeline.register(Arc::new(DefaultAccept), priorities::DEFAULT_ACCEPT);
        pipeline.register(
            Arc::new(StripConflictingAuthorization),
            priorities::STRIP_AUTHORIZATION,
        );
        pipeline.register(Arc::new(HandlePayload), priorities::HANDLE_PAYLOAD);

        Self {
            pipeline,
            request: Request::default(),
        }
    }

    /// Register an interceptor at the default priority.
    pub fn intercept(self, interceptor: impl Interceptor + 'static) -> Self {
        self.intercept_with_priority(interceptor, DEFAULT_PRIORITY)
    }

    /// Register an interceptor at an explicit priority. Higher priorities
    /// run earlier; equal priorities run in registration order.
    pub fn intercept_with_priority(
        mut self,
        interceptor: impl Interceptor + 'static,
        priority: i32,
    ) -> Self {
        self.pipeline.register(Arc::new(interceptor), priority);
        self
    }

    /// Register an infallible synchronous mutation at the default priority.
    pub fn mutate<F>(self, f: F) -> Self
    where
        F: Fn(&mut Request) + Send + Sync + 'static,
    {
        self.mutate_with_priority(f, DEFAULT_PRIORITY)
    }

    /// Register an infallible synchronous mutation at an explicit priority.
    pub fn mutate_with_priority<F>(self, f: F, priority: i32) -> Self
    where
        F: Fn(&mut Request) + Send + Sync + 'static,
    {
        self.intercept_with_priority(Mutate(f), priority)
    }

    /// Wire a specific executor, bypassing default selection.
    pub fn executor(self, executor: Arc<dyn Executor>) -> Self {
        self.mutate(move |request| request.executor = Some(executor.clone()))
    }

    /// Drop every registered interceptor, built-ins included. A subsequent
    /// send fails with `NoExecutorProvided` unless the caller re-registers
    /// an executor assignment.
    pub fn discard(mut self) -> Self {
        self.pipeline.clear();
        self
    }

    /// Run the pipeline and dispatch to the assigned executor.
    pub async fn send(&mut self) -> Result<Response, CourierError> {
        self.pipeline.run(&mut self.request).await?;

        let Some(executor) = self.request.executor.clone() else {
            return Err(CourierError::NoExecutorProvided {
                request: Box::new(self.request.clone()),
            });
        };

        tracing::debug!(
            target: "courier::client",
            method = %self.request.method,
            base = %self.request.base,
            path = %self.request.path,
            "dispatching request"
        );

        executor.send(&self.request).await
    }

    /// GET shorthand. An empty path leaves the current one untouched.
    pub async fn get(&mut self, path: impl Into<String>) -> Result<Response, CourierError> {
        self.prepare(Method::Get, path.into(), None).send().await
    }

    /// DELETE shorthand.
    pub async fn delete(&mut self, path: impl Into<String>) -> Result<Response, CourierError> {
        self.prepare(Method::Delete, path.into(), None).send().await
    }

    /// HEAD shorthand.
    pub async fn head(&mut self, path: impl Into<String>) -> Result<Response, CourierError> {
        self.prepare(Method::Head, path.into(), None).send().await
    }

    /// OPTIONS shorthand.
    pub async fn options(&mut self, path: impl Into<String>) -> Result<Response, CourierError> {
        self.prepare(Method::Options, path.into(), None).send().await
    }

    /// POST shorthand with an optional body.
    pub async fn post(
        &mut self,
        path: impl Into<String>,
        body: impl Into<Option<serde_json::Value>>,
    ) -> Result<Response, CourierError> {
        self.prepare(Method::Post, path.into(), body.into())
            .send()
            .await
    }

    /// PUT shorthand with an optional body.
    pub async fn put(
        &mut self,
        path: impl Into<String>,
        body: impl Into<Option<serde_json::Value>>,
    ) -> Result<Response, CourierError> {
        self.prepare(Method::Put, path.into(), body.into())
            .send()
            .await
    }

    /// PATCH shorthand with an optional body.
    pub async fn patch(
        &mut self,
        path: impl Into<String>,
        body: impl Into<Option<serde_json::Value>>,
    ) -> Result<Response, CourierError> {
        self.prepare(Method::Patch, path.into(), body.into())
            .send()
            .await
    }

    /// Send and unwrap the decoded body.
    pub async fn body<T: DeserializeOwned>(
        &mut self,
        path: impl Into<String>,
    ) -> Result<T, CourierError> {
        let path = path.into();
        if !path.is_empty() {
            self.request.path = path;
        }
        let response = self.send().await?;
        response.json()
    }

    /// Send and convert an HTTP-status rejection into an absent value.
    ///
    /// Transport-level failures are re-raised unchanged; only a completed
    /// exchange with status 400 or above resolves to `None`.
    pub async fn optional<T: DeserializeOwned>(
        &mut self,
        path: impl Into<String>,
    ) -> Result<Option<T>, CourierError> {
        match self.body(path).await {
            Ok(value) => Ok(Some(value)),
            Err(CourierError::Status(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Queue the transient interceptors behind a verb shorthand.
    fn prepare(
        &mut self,
        method: Method,
        path: String,
        body: Option<serde_json::Value>,
    ) -> &mut Self {
        if !path.is_empty() {
            self.pipeline.register(
                Arc::new(Mutate(move |request: &mut Request| {
                    request.path = path.clone();
                })),
                DEFAULT_PRIORITY,
            );
        }
        if let Some(body) = body {
            self.pipeline.register(
                Arc::new(Mutate(move |request: &mut Request| {
                    request.body = Some(body.clone());
                })),
                DEFAULT_PRIORITY,
            );
        }
        self.pipeline.register(
            Arc::new(Mutate(move |request: &mut Request| {
                request.method = method;
            })),
            DEFAULT_PRIORITY,
        );
        self
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

struct Mutate<F>(F);

#[async_trait::async_trait]
impl<F> Interceptor for Mutate<F>
where
    F: Fn(&mut Request) + Send + Sync,
{
    async fn intercept(&self, request: &mut Request) -> Result<(), CourierError> {
        (self.0)(request);
        Ok(())
    }
}
