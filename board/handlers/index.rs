use std::io::Cursor;
use tiny_http::Response;

use crate::render::render_page;
use crate::routes::html_response;
use crate::state::BoardState;

/// `GET /`
pub fn handle_get(state: &BoardState) -> Response<Cursor<Vec<u8>>> {
    let log_dir = state.log_dir.display().to_string();
    html_response(render_page(&log_dir, |html| html))
}
