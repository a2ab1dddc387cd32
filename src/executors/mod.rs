//! Executor contract and shared response finalization.
//!
//! An executor is a transport strategy converting a fully-prepared
//! [`Request`] into a [`Response`] or a typed failure. The helpers here are
//! free-standing so every executor shares one resolve-or-reject boundary,
//! one header merge rule and one body decoder without a base class holding
//! state.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::fields::Headers;
use crate::types::{Request, Response, ResponseBody, ResponseConfig, ResponseType};

mod event;
mod stream;

pub use event::EventExecutor;
pub use stream::StreamExecutor;

/// The single transport capability.
///
/// Implementations receive the request with interceptors already applied
/// and must not re-run pipeline logic. Rejection follows the shared rule:
/// transport failures reject with a typed [`CourierError`]; an HTTP status
/// of 400 or above rejects with the response itself via [`finalize`].
#[async_trait]
pub trait Executor: Send + Sync {
    async fn send(&self, request: &Request) -> Result<Response, CourierError>;
}

/// Headers that are legally single-valued per HTTP semantics. For these the
/// first occurrence wins; every other repeated header is comma-joined in
/// encounter order.
const DO_NOT_CONCATENATE: [&str; 17] = [
    "age",
    "authorization",
    "content-length",
    "content-type",
    "etag",
    "expires",
    "from",
    "host",
    "if-modified-since",
    "if-unmodified-since",
    "last-modified",
    "location",
    "max-forwards",
    "proxy-authorization",
    "referer",
    "retry-after",
    "user-agent",
];

/// Map a decoded body, status and headers to the resolve-or-reject
/// boundary: statuses below 400 resolve, everything else rejects with the
/// response itself so callers can inspect it.
pub fn finalize(
    body: ResponseBody,
    status: u16,
    headers: Headers,
) -> Result<Response, CourierError> {
    let response = Response {
        body,
        status,
        headers,
    };
    if response.status < 400 {
        Ok(response)
    } else {
        Err(CourierError::Status(Box::new(response)))
    }
}

/// Collect raw transport headers into the response header map, lower-cased
/// and merged per the single-valued rule.
pub(crate) fn collect_headers(raw: &reqwest::header::HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in raw.iter() {
        let key = name.as_str();
        let Ok(value) = value.to_str() else { continue };

        match headers.get(key).map(str::to_string) {
            None => headers.set(key, value),
            Some(_) if DO_NOT_CONCATENATE.contains(&key) => {}
            Some(existing) => headers.set(key, format!("{existing}, {value}")),
        }
    }
    headers
}

/// Decode the buffered reply per the requested response type.
///
/// JSON decoding falls back to `null` on an empty body and to the raw text
/// when the body does not parse; buffers pass through untouched.
pub(crate) fn decode_body(bytes: &[u8], config: &ResponseConfig) -> ResponseBody {
    match config.kind {
        ResponseType::Buffer => ResponseBody::Buffer(bytes.to_vec()),
        ResponseType::Json => {
            if bytes.is_empty() {
                ResponseBody::Json(serde_json::Value::Null)
            } else {
                match serde_json::from_slice(bytes) {
                    Ok(value) => ResponseBody::Json(value),
                    Err(_) => ResponseBody::Text(decode_text(bytes, &config.encoding)),
                }
            }
        }
        ResponseType::Text => ResponseBody::Text(decode_text(bytes, &config.encoding)),
    }
}

fn decode_text(bytes: &[u8], encoding: &str) -> String {
    if !matches!(encoding, "utf8" | "utf-8" | "") {
        tracing::trace!(
            target: "courier::executor",
            encoding,
            "unsupported charset, decoding lossily"
        );
    }
    String::from_utf8_lossy(bytes).into_owned()
}

/// Build the transport-level request: resolve the URL, move embedded
/// credentials into a basic-auth header and apply headers and body.
pub(crate) fn prepare(
    client: &reqwest::Client,
    request: &Request,
) -> Result<reqwest::RequestBuilder, CourierError> {
    let mut url = request.resolve_url()?;

    let username = url.username().to_string();
    let password = url.password().map(str::to_string);
    if !username.is_empty() || password.is_some() {
        // Credentials never travel inside the URL on the wire.
        let _ = url.set_username("");
        let _ = url.set_password(None);
    }

    let mut builder = client.request(request.method.into(), url);
    if !username.is_empty() || password.is_some() {
        builder = builder.basic_auth(username, password);
    }

    for (key, value) in request.headers.iter() {
        builder = builder.header(key, value);
    }

    if let Some(body) = &request.body {
        let raw = match body {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        builder = builder.body(raw);
    }

    Ok(builder)
}

/// Perform the buffered exchange: send, then gather status, headers and
/// the raw reply bytes.
pub(crate) async fn exchange(
    builder: reqwest::RequestBuilder,
    request: &Request,
) -> Result<(u16, Headers, Vec<u8>), CourierError> {
    let response = builder.send().await.map_err(|e| failure(request, e))?;

    let status = response.status().as_u16();
    let headers = collect_headers(response.headers());
    let bytes = response
        .bytes()
        .await
        .map_err(|e| failure(request, e))?
        .to_vec();

    Ok((status, headers, bytes))
}

/// Map a transport error onto the taxonomy.
pub(crate) fn failure(request: &Request, error: reqwest::Error) -> CourierError {
    if error.is_timeout() {
        CourierError::RequestTimedOut {
            request: Box::new(request.clone()),
        }
    } else {
        CourierError::RequestFailed {
            request: Box::new(request.clone()),
            source: Box::new(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};

    #[test]
    fn finalize_resolves_below_400() {
        let response = finalize(
            ResponseBody::Json(serde_json::Value::Null),
            200,
            Headers::new(),
        )
        .unwrap();
        assert_eq!(response.status, 200);
    }

    #[test]
    fn finalize_rejects_with_the_response_at_400_and_above() {
        let error = finalize(
            ResponseBody::Text("nope".to_string()),
            404,
            Headers::new(),
        )
        .unwrap_err();

        let response = error.response().expect("should carry the response");
        assert_eq!(response.status, 404);
        assert_eq!(response.body.as_text(), Some("nope"));
    }

    #[test]
    fn repeated_headers_are_comma_joined_in_encounter_order() {
        let mut raw = reqwest::header::HeaderMap::new();
        raw.append(
            HeaderName::from_static("set-cookie"),
            HeaderValue::from_static("a=1"),
        );
        raw.append(
            HeaderName::from_static("set-cookie"),
            HeaderValue::from_static("b=2"),
        );

        let headers = collect_headers(&raw);
        assert_eq!(headers.get("set-cookie"), Some("a=1, b=2"));
    }

    #[test]
    fn single_valued_headers_keep_the_first_occurrence() {
        let mut raw = reqwest::header::HeaderMap::new();
        raw.append(
            HeaderName::from_static("content-type"),
            HeaderValue::from_static("application/json"),
        );
        raw.append(
            HeaderName::from_static("content-type"),
            HeaderValue::from_static("text/plain"),
        );

        let headers = collect_headers(&raw);
        assert_eq!(headers.get("content-type"), Some("application/json"));
    }

    #[test]
    fn json_decoding_falls_back_to_null_on_an_empty_body() {
        let body = decode_body(b"", &ResponseConfig::default());
        assert_eq!(body, ResponseBody::Json(serde_json::Value::Null));
    }

    #[test]
    fn json_decoding_falls_back_to_text_when_unparseable() {
        let body = decode_body(b"text", &ResponseConfig::default());
        assert_eq!(body, ResponseBody::Text("text".to_string()));
    }

    #[test]
    fn buffer_bodies_pass_through() {
        let config = ResponseConfig {
            kind: ResponseType::Buffer,
            encoding: "utf8".to_string(),
        };
        let body = decode_body(b"{\"ok\":true}", &config);
        assert_eq!(body.as_buffer(), Some(&b"{\"ok\":true}"[..]));
    }

    #[test]
    fn text_bodies_decode_per_encoding() {
        let config = ResponseConfig {
            kind: ResponseType::Text,
            encoding: "utf8".to_string(),
        };
        let body = decode_body(b"{\"ok\":true}", &config);
        assert_eq!(body.as_text(), Some("{\"ok\":true}"));
    }
}
