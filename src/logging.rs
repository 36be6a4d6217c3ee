//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::Error;

/// The number of bytes of a request or response body that are logged at the
/// `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Fields whose values must never appear in the logs.
const SENSITIVE_FIELDS: [&str; 5] = [
    "password",
    "repeat_password",
    "old_password",
    "new_password",
    "access_token",
];

const REDACTED: &str = "********";

/// The largest request body the middleware will read in order to log it.
///
/// This matches the size limit of the JSON and form extractors. Bodies that
/// are not logged, e.g. uploads, are passed through without being read.
pub const LOGGED_REQUEST_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords, tokens and the `Authorization` header are redacted.
///
/// Only JSON, form and plain text bodies are read. A readable request body
/// larger than [LOGGED_REQUEST_BODY_LIMIT] is rejected with 413 Payload Too
/// Large. Any other body, such as a multipart upload or an image served from
/// the uploads directory, is streamed through untouched.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request = if is_loggable(request.headers()) {
        let (parts, body) = request.into_parts();
        let bytes = match axum::body::to_bytes(body, LOGGED_REQUEST_BODY_LIMIT).await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(
                    "Could not read request body within {LOGGED_REQUEST_BODY_LIMIT} bytes: {error}"
                );
                return Error::RequestBodyTooLarge.into_response();
            }
        };
        let request = Request::from_parts(parts, Body::from(bytes.clone()));
        log_request(&request, &redact_body(request.headers(), &bytes));
        request
    } else {
        log_request(&request, &describe_unlogged_body(request.headers()));
        request
    };

    let response = next.run(request).await;

    if !is_loggable(response.headers()) {
        log_response(&response, &describe_unlogged_body(response.headers()));
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let body_text = redact_body(&parts.headers, &bytes);
    let response = Response::from_parts(parts, Body::from(bytes));
    log_response(&response, &body_text);

    response
}

/// Whether the body described by `headers` is text that is worth logging.
fn is_loggable(headers: &HeaderMap) -> bool {
    let content_type = content_type(headers);

    ["application/json", "application/x-www-form-urlencoded", "text/plain"]
        .iter()
        .any(|loggable| content_type.starts_with(loggable))
}

fn describe_unlogged_body(headers: &HeaderMap) -> String {
    let content_type = content_type(headers);
    let length = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    if content_type.is_empty() && length == "unknown" {
        String::new()
    } else {
        format!("<{content_type} body, {length} bytes>")
    }
}

fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

fn redact_body(headers: &HeaderMap, body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let content_type = content_type(headers);

    if content_type.starts_with("application/json") {
        redact_json(&text)
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        redact_form(&text)
    } else {
        text.into_owned()
    }
}

fn redact_json(text: &str) -> String {
    fn redact_value(value: &mut Value) {
        match value {
            Value::Object(map) => {
                for (key, value) in map.iter_mut() {
                    if SENSITIVE_FIELDS.contains(&key.as_str()) {
                        *value = Value::String(REDACTED.to_owned());
                    } else {
                        redact_value(value);
                    }
                }
            }
            Value::Array(values) => values.iter_mut().for_each(redact_value),
            _ => {}
        }
    }

    match serde_json::from_str::<Value>(text) {
        Ok(mut value) => {
            redact_value(&mut value);
            value.to_string()
        }
        // Not JSON after all.
        Err(_) => text.to_owned(),
    }
}

fn redact_form(text: &str) -> String {
    text.split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if SENSITIVE_FIELDS.contains(&key) => format!("{key}={REDACTED}"),
            _ => pair.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    if headers.contains_key(AUTHORIZATION) {
        headers.insert(AUTHORIZATION, HeaderValue::from_static(REDACTED));
    }

    headers
}

fn truncate(body: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(body.len());
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(request: &Request, body: &str) {
    let method = request.method();
    let uri = request.uri();
    let headers = redact_headers(request.headers());

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {method} {uri} {headers:?}\nbody: {}...",
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {method} {uri} {headers:?}\nbody: {body:?}");
    }
}

fn log_response(response: &Response, body: &str) {
    let status = response.status();
    let headers = response.headers();

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {status} {headers:?}\nbody: {}...",
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {status} {headers:?}\nbody: {body:?}");
    }
}
