//! Sanitizers for untrusted page content.
//!
//! Everything an editor submits passes through here before it is stored,
//! and stored content passes through again before it is rendered.

mod html;
mod json;

pub use html::{sanitize_css, sanitize_html, sanitize_url, strip_html, ALLOWED_URL_SCHEMES};
pub use json::{
    json_depth, sanitize_json, sanitize_page_content, FORBIDDEN_KEYS, MAX_JSON_DEPTH,
    MAX_STRING_LEN,
};
