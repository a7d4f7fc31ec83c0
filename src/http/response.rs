//! Response builders

use crate::error::ApiError;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::json;

pub type HttpResponse = Response<Full<Bytes>>;

fn with_body(status: StatusCode, content_type: &'static str, body: Bytes) -> HttpResponse {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Serialise `body` as JSON
pub fn json<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    match serde_json::to_vec(body) {
        Ok(bytes) => with_body(status, "application/json", Bytes::from(bytes)),
        Err(e) => error_response(&ApiError::internal("Response serialisation failed", e)),
    }
}

/// `{error: message}` with the error's status
pub fn error_response(err: &ApiError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json(status, &json!({ "error": err.public_message() }))
}

pub fn not_found() -> HttpResponse {
    json(StatusCode::NOT_FOUND, &json!({ "error": "Not found" }))
}

pub fn html(body: Vec<u8>) -> HttpResponse {
    with_body(StatusCode::OK, "text/html; charset=utf-8", Bytes::from(body))
}

pub fn redirect(location: &'static str) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::FOUND;
    response
        .headers_mut()
        .insert(LOCATION, HeaderValue::from_static(location));
    response
}

pub fn no_content() -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
}
