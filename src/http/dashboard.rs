//! Single-page dashboard served at `/`.

use axum::response::Html;

use crate::platform::{self, PlatformInfo};

const TEMPLATE: &str = include_str!("../../assets/dashboard.html");

pub async fn dashboard() -> Html<String> {
    Html(render(&platform::detect()))
}

/// Fill the platform card of the dashboard template.
pub fn render(info: &PlatformInfo) -> String {
    TEMPLATE
        .replace("__PLATFORM_NAME__", &escape_html(info.name))
        .replace("__PLATFORM_EVIDENCE__", &escape_html(info.evidence))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
