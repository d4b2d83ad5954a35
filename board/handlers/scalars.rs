use std::io::Cursor;
use std::path::Path;

use tiny_http::Response;

use ferrite_metrics::summary::{read_scalars, run_dir, ScalarPoint};

use crate::routes::{bad_request, json_response, not_found, server_error};
use crate::state::BoardState;
use crate::util::query::{parse_query, query_get};

/// Why a scalar lookup produced no series.
#[derive(Debug, PartialEq)]
pub enum Lookup {
    BadRun,
    NoRun,
    NoTag,
}

/// Points logged under `tag` in `run`.
pub fn lookup(log_dir: &Path, run: &str, tag: &str) -> ferrite_metrics::Result<Result<Vec<ScalarPoint>, Lookup>> {
    let dir = match run_dir(log_dir, run) {
        Ok(d) => d,
        Err(_) => return Ok(Err(Lookup::BadRun)),
    };
    if !dir.is_dir() {
        return Ok(Err(Lookup::NoRun));
    }
    let mut series = read_scalars(&dir)?;
    Ok(series.remove(tag).ok_or(Lookup::NoTag))
}

/// `GET /api/scalars?run=<run>&tag=<tag>`
pub fn handle_get(query: &str, state: &BoardState) -> Response<Cursor<Vec<u8>>> {
    let pairs = parse_query(query);
    let (run, tag) = match (query_get(&pairs, "run"), query_get(&pairs, "tag")) {
        (Some(r), Some(t)) => (r, t),
        _ => return bad_request("expected ?run=<run>&tag=<tag>"),
    };

    match lookup(&state.log_dir, run, tag) {
        Ok(Ok(points)) => {
            let body = serde_json::json!({ "run": run, "tag": tag, "points": points });
            json_response(body.to_string())
        }
        Ok(Err(Lookup::BadRun)) => bad_request("invalid run name"),
        Ok(Err(_)) => not_found(),
        Err(e) => {
            tracing::warn!(run, tag, "reading scalars failed: {e}");
            server_error(&e.to_string())
        }
    }
}
