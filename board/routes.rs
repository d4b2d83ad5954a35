use std::io::Cursor;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::handlers;
use crate::state::SharedState;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn content_type(value: &str) -> Vec<Header> {
    Header::from_bytes(&b"Content-Type"[..], value.as_bytes())
        .map(|h| vec![h])
        .unwrap_or_default()
}

fn response(status: u16, mime: &str, body: Vec<u8>) -> Response<Cursor<Vec<u8>>> {
    let len = body.len();
    Response::new(StatusCode(status), content_type(mime), Cursor::new(body), Some(len), None)
}

pub fn html_response(body: String) -> Response<Cursor<Vec<u8>>> {
    response(200, "text/html; charset=utf-8", body.into_bytes())
}

pub fn json_response(body: String) -> Response<Cursor<Vec<u8>>> {
    response(200, "application/json", body.into_bytes())
}

pub fn bad_request(msg: &str) -> Response<Cursor<Vec<u8>>> {
    response(400, "text/plain", msg.as_bytes().to_vec())
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    response(404, "text/plain", b"404 Not Found".to_vec())
}

pub fn server_error(msg: &str) -> Response<Cursor<Vec<u8>>> {
    response(500, "text/plain", msg.as_bytes().to_vec())
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Splits a request URL into its path and raw query string.
pub fn split_url(url: &str) -> (&str, &str) {
    match url.find('?') {
        Some(pos) => (&url[..pos], &url[pos + 1..]),
        None => (url, ""),
    }
}

pub fn dispatch(request: Request, state: SharedState) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let (path, query) = split_url(&url);

    let response = match (method, path) {
        (Method::Get, "/") => handlers::index::handle_get(&state),
        (Method::Get, "/api/runs") => handlers::runs::handle_get(&state),
        (Method::Get, "/api/scalars") => handlers::scalars::handle_get(query, &state),
        _ => not_found(),
    };

    tracing::debug!(url = %url, status = response.status_code().0, "request");
    if let Err(e) = request.respond(response) {
        tracing::warn!(url = %url, "failed to send response: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_url_separates_query() {
        assert_eq!(split_url("/api/scalars?run=a&tag=b"), ("/api/scalars", "run=a&tag=b"));
        assert_eq!(split_url("/"), ("/", ""));
    }
}
