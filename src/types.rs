//! Request and response data model.
//!
//! `Request` is the mutable state container that lives for exactly one
//! logical call: interceptors mutate it in priority order, the executor
//! consumes it. `Response` is the immutable result of one send.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::CourierError;
use crate::executors::Executor;
use crate::fields::{Headers, Query};

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

/// Desired decoding of the reply body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Json,
    Text,
    Buffer,
}

/// How the executor should decode the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseConfig {
    pub kind: ResponseType,
    /// Text decode charset. Only the UTF-8 family is decoded strictly;
    /// other charsets fall back to a lossy conversion.
    pub encoding: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            kind: ResponseType::Json,
            encoding: "utf8".to_string(),
        }
    }
}

/// Basic-auth credentials applied to the request URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authentication {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Authentication {
    /// Whether either credential field is populated.
    pub fn is_set(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }
}

/// The mutable request state shared by the interceptor pipeline.
///
/// All fields are public: interceptors receive `&mut Request` and may
/// rewrite any of them. The pipeline owns the request exclusively for the
/// duration of one send, so there is no aliasing to guard against.
#[derive(Clone)]
pub struct Request {
    /// Raw, unnormalized base URL fragment.
    pub base: String,
    /// Raw, unnormalized path fragment.
    pub path: String,
    /// Cached canonical URL. Populated by the `BuildUrl` interceptor or by
    /// direct injection; executors fall back to building it when absent.
    pub url: Option<reqwest::Url>,
    pub method: Method,
    pub body: Option<serde_json::Value>,
    pub query: Query,
    pub headers: Headers,
    /// Milliseconds before the send is abandoned; `0` means no timeout.
    pub timeout: u64,
    pub authentication: Authentication,
    pub response: ResponseConfig,
    /// The transport strategy that will perform the send. Exactly one
    /// executor handles a given send; its absence at dispatch is a
    /// configuration failure.
    pub executor: Option<Arc<dyn Executor>>,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            base: String::new(),
            path: String::new(),
            url: None,
            method: Method::Get,
            body: None,
            query: Query::new(),
            headers: Headers::new(),
            timeout: 0,
            authentication: Authentication::default(),
            response: ResponseConfig::default(),
            executor: None,
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("base", &self.base)
            .field("path", &self.path)
            .field("url", &self.url)
            .field("method", &self.method)
            .field("body", &self.body)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("timeout", &self.timeout)
            .field("authentication", &self.authentication)
            .field("response", &self.response)
            .field("executor", &self.executor.is_some())
            .finish()
    }
}

impl Request {
    /// One-line description used in error messages.
    pub fn line(&self) -> String {
        format!("{} {} {}", self.method, self.base, self.path)
    }

    /// The cached canonical URL, or a freshly built one.
    pub fn resolve_url(&self) -> Result<reqwest::Url, CourierError> {
        match &self.url {
            Some(url) => Ok(url.clone()),
            None => crate::url::build(self),
        }
    }
}

/// The decoded body of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
    Buffer(Vec<u8>),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_buffer(&self) -> Option<&[u8]> {
        match self {
            ResponseBody::Buffer(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Deserialize the body into a caller-chosen type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CourierError> {
        let value = match self {
            ResponseBody::Json(value) => value.clone(),
            ResponseBody::Text(text) => serde_json::Value::String(text.clone()),
            ResponseBody::Buffer(bytes) => serde_json::Value::from(bytes.clone()),
        };
        Ok(serde_json::from_value(value)?)
    }
}

/// The immutable result of one send.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub body: ResponseBody,
    pub status: u16,
    /// Response headers with lower-cased keys; multi-value headers are
    /// comma-joined except for the legally single-valued set.
    pub headers: Headers,
}

impl Response {
    /// Deserialize the response body into a caller-chosen type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, CourierError> {
        self.body.decode()
    }
}
