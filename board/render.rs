/// Template renderer for the board page.
///
/// The page is a single HTML template (`board/assets/board.html`) with
/// `{{TOKEN}}` placeholders, loaded at compile time.

const TEMPLATE: &str = include_str!("assets/board.html");

/// Renders the board page. `fill` substitutes page-specific placeholders;
/// anything it leaves behind is blanked.
pub fn render_page<F>(log_dir: &str, fill: F) -> String
where
    F: FnOnce(String) -> String,
{
    let html = TEMPLATE.replace("{{LOG_DIR}}", &html_escape(log_dir));
    blank_remaining(fill(html))
}

/// Replaces any `{{TOKEN}}` that wasn't already substituted with an empty
/// string.
fn blank_remaining(mut html: String) -> String {
    while let Some(start) = html.find("{{") {
        match html[start..].find("}}") {
            Some(end) => html.replace_range(start..start + end + 2, ""),
            None => break,
        }
    }
    html
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
