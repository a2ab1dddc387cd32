//! Courier: a configurable, interceptor-driven HTTP client.
//!
//! Every request flows through a priority-ordered pipeline of interceptors
//! that mutate one shared [`Request`] before a pluggable [`Executor`]
//! performs the exchange. The stock pipeline resolves the URL from `base`
//! and `path` fragments, normalizes headers, applies sensible defaults and
//! serializes structured payloads; callers extend it with their own
//! interceptors or replace the transport wholesale.
//!
//! ```no_run
//! use courier::Client;
//!
//! # async fn run() -> Result<(), courier::CourierError> {
//! #[derive(serde::Deserialize)]
//! struct Todo {
//!     title: String,
//! }
//!
//! let todo: Todo = Client::new()
//!     .mutate(|req| req.base = "http://server.api".to_string())
//!     .body("todos/1")
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod executors;
pub mod fields;
pub mod interceptor;
pub mod interceptors;
pub mod types;
pub mod url;

pub use client::Client;
pub use error::{CourierError, Result};
pub use executors::{EventExecutor, Executor, StreamExecutor, finalize};
pub use fields::{Headers, Query};
pub use interceptor::{DEFAULT_PRIORITY, Interceptor};
pub use interceptors::LoggingInterceptor;
pub use types::{
    Authentication, Method, Request, Response, ResponseBody, ResponseConfig, ResponseType,
};
