//! Content negotiation for request and response bodies.
//!
//! # Data Flow
//! ```text
//! Content-Type → PayloadFormat → RequestBody<T> (serde_json | quick-xml)
//! handler → JSON envelope → negotiate_response
//!     Accept prefers XML → re-encode as <response>…</response>
//! ```
//!
//! # Design Decisions
//! - Handlers and error mapping always build JSON; the middleware converts
//!   the finished body, so every response (errors included) honours `Accept`
//! - The first supported media type in `Accept` wins; `*/*`, an absent header
//!   or no supported entry fall back to JSON
//! - Accept weights (`q=`) are not ranked

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request},
    http::{
        header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::domain::PayloadFormat;
use crate::http::response::{bad_request, ApiResponse};
use crate::orchestrator::ErrorKind;

/// Root element of XML responses.
pub const XML_ROOT: &str = "response";

/// A request body decoded according to its `Content-Type`.
#[derive(Debug, Clone)]
pub struct RequestBody<T>(pub T);

impl<S, T> FromRequest<S> for RequestBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let format = content_type.parse::<PayloadFormat>().map_err(|e| {
            ApiResponse::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                e.to_string(),
                json!({ "kind": ErrorKind::Validation.as_str() }),
            )
            .into_response()
        })?;

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| bad_request(rejection.body_text()))?;

        decode(format, &bytes).map(RequestBody).map_err(bad_request)
    }
}

/// Decode `bytes` in the given format.
pub fn decode<T: DeserializeOwned>(format: PayloadFormat, bytes: &[u8]) -> Result<T, String> {
    match format {
        PayloadFormat::Json => serde_json::from_slice(bytes).map_err(|e| format!("invalid JSON body: {}", e)),
        PayloadFormat::Xml => {
            let text = std::str::from_utf8(bytes).map_err(|e| format!("invalid XML body: {}", e))?;
            quick_xml::de::from_str(text).map_err(|e| format!("invalid XML body: {}", e))
        }
    }
}

/// Response format requested by an `Accept` header value.
pub fn preferred_format(accept: &str) -> PayloadFormat {
    for part in accept.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if part.starts_with("*/*") {
            return PayloadFormat::Json;
        }
        if let Ok(format) = part.parse::<PayloadFormat>() {
            return format;
        }
    }
    PayloadFormat::Json
}

fn requested_format(headers: &HeaderMap) -> PayloadFormat {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map_or(PayloadFormat::Json, preferred_format)
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<PayloadFormat>().ok())
        == Some(PayloadFormat::Json)
}

/// Re-encode a JSON body as XML.
pub fn json_to_xml(bytes: &[u8]) -> Result<String, String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    quick_xml::se::to_string_with_root(XML_ROOT, &value).map_err(|e| e.to_string())
}

/// Middleware that serves XML to clients whose `Accept` header asks for it.
pub async fn negotiate_response(req: Request, next: Next) -> Response {
    let format = requested_format(req.headers());
    let response = next.run(req).await;

    if format == PayloadFormat::Json || !is_json(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "Failed to buffer response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match json_to_xml(&bytes) {
        Ok(xml) => {
            parts
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(format.content_type()));
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(xml))
        }
        Err(e) => {
            tracing::warn!(error = %e, "XML encoding failed, returning JSON");
            Response::from_parts(parts, Body::from(bytes))
        }
    }
}
