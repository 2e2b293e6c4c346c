use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

/// Tags kept by [`sanitize_html`].
const ALLOWED_TAGS: [&str; 34] = [
    "p", "br", "hr", "span", "div", "strong", "b", "em", "i", "u", "s", "sub", "sup", "small",
    "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "a", "blockquote", "pre", "code", "img",
    "table", "thead", "tbody", "tr", "th", "td",
];

/// URL schemes accepted in links, images and URL-valued fields.
pub const ALLOWED_URL_SCHEMES: [&str; 4] = ["http", "https", "mailto", "tel"];

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</\s*script\s*>|<style\b[^>]*>.*?</\s*style\s*>")
        .expect("script/style pattern is valid")
});
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"));
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*/?\s*[A-Za-z!][^>]*>").expect("tag pattern is valid"));
static ENCODED_COLON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)&(?:colon|#0*58|#x0*3a);?").expect("encoded colon pattern is valid")
});
static SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z][a-z0-9+.\-]*):").expect("scheme pattern is valid")
});
static CSS_HAZARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)expression\s*\(|javascript\s*:|vbscript\s*:|@import|</\s*style|behavior\s*:|-moz-binding",
    )
    .expect("css hazard pattern is valid")
});

fn html_builder() -> ammonia::Builder<'static> {
    let mut builder = ammonia::Builder::default();
    builder
        .tags(HashSet::from(ALLOWED_TAGS))
        .tag_attributes(HashMap::from([
            ("a", HashSet::from(["href", "title"])),
            ("img", HashSet::from(["src", "alt", "title", "width", "height"])),
            ("td", HashSet::from(["colspan", "rowspan"])),
            ("th", HashSet::from(["colspan", "rowspan"])),
        ]))
        .url_schemes(HashSet::from(ALLOWED_URL_SCHEMES))
        .link_rel(Some("noopener noreferrer"));
    builder
}

/// Clean rich text against the allowlist.
///
/// Scripts, styles, event handler attributes and disallowed URL schemes are
/// removed; links get `rel="noopener noreferrer"`.
pub fn sanitize_html(input: &str) -> String {
    html_builder().clean(input).to_string()
}

/// Remove all markup and keep the text.
///
/// Script and style bodies are dropped entirely. The output is not
/// entity-escaped; renderers escape plain text themselves.
pub fn strip_html(input: &str) -> String {
    let without_blocks = SCRIPT_OR_STYLE.replace_all(input, "");
    let without_comments = COMMENT.replace_all(&without_blocks, "");
    TAG.replace_all(&without_comments, "").into_owned()
}

/// Validate a URL-valued field.
///
/// Returns `None` for anything a browser could execute. Relative paths,
/// fragments and the [`ALLOWED_URL_SCHEMES`] pass; the scheme check runs on
/// a copy with whitespace, control characters and entity-encoded colons
/// collapsed. Any other `&` before the first `:`, `/`, `?` or `#` is
/// rejected outright.
pub fn sanitize_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Some(String::new());
    }

    let decoded = ENCODED_COLON.replace_all(trimmed, ":");
    let compact: String = decoded
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    let lowered = compact.to_ascii_lowercase();

    // A character reference ahead of the scheme delimiter can spell out a
    // scheme that only the browser decodes.
    let head_end = lowered
        .find(|c: char| matches!(c, ':' | '/' | '?' | '#'))
        .unwrap_or(lowered.len());
    if lowered[..head_end].contains('&') {
        debug!("rejected url with character reference before its scheme");
        return None;
    }

    if let Some(caps) = SCHEME.captures(&lowered) {
        let scheme = &caps[1];
        if !ALLOWED_URL_SCHEMES.contains(&scheme) {
            debug!(scheme, "rejected url with disallowed scheme");
            return None;
        }
        if scheme == "http" || scheme == "https" {
            Url::parse(&compact).ok()?;
        }
        return Some(compact);
    }

    if compact.starts_with("//") {
        Url::parse(&format!("https:{compact}")).ok()?;
        return Some(compact);
    }

    Some(trimmed.to_string())
}

/// Remove constructs from custom CSS that can execute script or pull in
/// remote stylesheets.
pub fn sanitize_css(input: &str) -> String {
    CSS_HAZARD.replace_all(input, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_keeps_formatting() {
        let input = "<p>Hello <strong>world</strong></p>";
        assert_eq!(sanitize_html(input), input);
    }

    #[test]
    fn html_strips_script_and_handlers() {
        let output = sanitize_html(r#"<p onclick="steal()">Hi</p><script>alert(1)</script>"#);
        assert_eq!(output, "<p>Hi</p>");
    }

    #[test]
    fn html_drops_javascript_links() {
        let output = sanitize_html(r#"<a href="javascript:alert(1)">x</a>"#);
        assert!(!output.contains("javascript"));
        assert!(output.contains(">x</a>"));
    }

    #[test]
    fn html_links_get_rel() {
        let output = sanitize_html(r#"<a href="https://example.com">x</a>"#);
        assert!(output.contains(r#"rel="noopener noreferrer""#));
    }

    #[test]
    fn strip_removes_markup_keeps_text() {
        assert_eq!(strip_html("<b>Fern</b> &amp; <i>moss</i>"), "Fern &amp; moss");
        assert_eq!(strip_html("a<script>bad()</script>b<!-- c -->"), "ab");
        assert_eq!(strip_html("1 < 2"), "1 < 2");
    }

    #[test]
    fn url_accepts_safe_forms() {
        assert_eq!(sanitize_url("https://example.com/a").as_deref(), Some("https://example.com/a"));
        assert_eq!(sanitize_url(" /img/a.jpg ").as_deref(), Some("/img/a.jpg"));
        assert_eq!(sanitize_url("#contact").as_deref(), Some("#contact"));
        assert_eq!(sanitize_url("mailto:hi@example.com").as_deref(), Some("mailto:hi@example.com"));
        assert_eq!(sanitize_url("//cdn.example.com/x.png").as_deref(), Some("//cdn.example.com/x.png"));
        assert_eq!(sanitize_url("").as_deref(), Some(""));
    }

    #[test]
    fn url_rejects_script_schemes() {
        assert_eq!(sanitize_url("javascript:alert(1)"), None);
        assert_eq!(sanitize_url("JaVaScRiPt:alert(1)"), None);
        assert_eq!(sanitize_url("java\tscript:alert(1)"), None);
        assert_eq!(sanitize_url("javascript&colon;alert(1)"), None);
        assert_eq!(sanitize_url("javascript&#x3A;alert(1)"), None);
        assert_eq!(sanitize_url("data:text/html;base64,PHNjcmlwdD4="), None);
        assert_eq!(sanitize_url("vbscript:msgbox"), None);
        assert_eq!(sanitize_url("&#106;avascript:alert(1)"), None);
        assert_eq!(sanitize_url("java&Tab;script:alert(1)"), None);
        assert_eq!(sanitize_url("java&#9;script:alert(1)"), None);
        assert_eq!(sanitize_url("&#x6A;avascript&#x3A;alert(1)"), None);
    }

    #[test]
    fn url_ampersands_after_the_scheme_are_fine() {
        assert_eq!(
            sanitize_url("https://example.com/?a=1&b=2").as_deref(),
            Some("https://example.com/?a=1&b=2")
        );
        assert_eq!(sanitize_url("/search?q=fern&page=2").as_deref(), Some("/search?q=fern&page=2"));
    }

    #[test]
    fn css_hazards_removed() {
        let css = "body { width: expression(alert(1)); } @import url(evil.css);";
        let cleaned = sanitize_css(css);
        assert!(!cleaned.contains("expression("));
        assert!(!cleaned.contains("@import"));
        assert!(cleaned.contains("body {"));
    }

    #[test]
    fn css_script_urls_and_style_breakout_removed() {
        let css = "a { background: url(JavaScript:alert(1)); } </style><script>x()</script>";
        let cleaned = sanitize_css(css).to_ascii_lowercase();
        assert!(!cleaned.contains("javascript:"));
        assert!(!cleaned.contains("</style"));
        assert!(cleaned.contains("a { background"));
    }
}
