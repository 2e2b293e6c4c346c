use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::html::{sanitize_css, sanitize_html, sanitize_url, strip_html};
use crate::content::model::{canonical_section_id, ContentSection, PageContent, PageSettings};

/// Deepest container nesting kept in untrusted JSON.
pub const MAX_JSON_DEPTH: usize = 16;

/// Longest string (in chars) kept in untrusted JSON.
pub const MAX_STRING_LEN: usize = 50_000;

/// Keys that JavaScript renderers treat as prototype accessors.
pub const FORBIDDEN_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

const HTML_KEYS: [&str; 6] = ["html", "content", "body", "description", "answer", "bio"];
const URL_KEYS: [&str; 7] = ["url", "href", "src", "link", "image", "images", "avatar"];
const URL_SUFFIXES: [&str; 5] = ["Url", "Link", "Image", "Href", "Src"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Html,
    Url,
    Text,
}

fn classify(key: Option<&str>) -> FieldKind {
    let Some(key) = key else {
        return FieldKind::Text;
    };
    if HTML_KEYS.contains(&key) {
        FieldKind::Html
    } else if URL_KEYS.contains(&key) || URL_SUFFIXES.iter().any(|s| key.ends_with(s)) {
        FieldKind::Url
    } else {
        FieldKind::Text
    }
}

/// Nesting depth of a value: scalars are 0, each container adds one.
pub fn json_depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.iter().map(json_depth).max().unwrap_or(0),
        Value::Object(map) => 1 + map.values().map(json_depth).max().unwrap_or(0),
        _ => 0,
    }
}

/// Recursively sanitize an untrusted JSON tree.
///
/// Strings are cleaned according to the key they sit under (rich text,
/// URL or plain text), prototype keys are dropped, containers nested deeper
/// than [`MAX_JSON_DEPTH`] become `null` and long strings are truncated.
pub fn sanitize_json(value: &Value) -> Value {
    sanitize_value(value, None, 0)
}

fn sanitize_value(value: &Value, key: Option<&str>, depth: usize) -> Value {
    match value {
        Value::Object(_) | Value::Array(_) if depth >= MAX_JSON_DEPTH => {
            warn!(depth, "json nested too deeply; subtree dropped");
            Value::Null
        }
        Value::Object(map) => Value::Object(sanitize_map(map, depth)),
        // Array items are classified by the key holding the array.
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| sanitize_value(item, key, depth + 1))
                .collect(),
        ),
        Value::String(s) => Value::String(sanitize_string(s, classify(key))),
        other => other.clone(),
    }
}

fn sanitize_map(map: &Map<String, Value>, depth: usize) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in map {
        if FORBIDDEN_KEYS.contains(&key.as_str()) {
            debug!(key = %key, "dropped forbidden key");
            continue;
        }
        out.insert(key.clone(), sanitize_value(value, Some(key), depth + 1));
    }
    out
}

fn sanitize_string(input: &str, kind: FieldKind) -> String {
    let truncated: String;
    let input = if input.chars().count() > MAX_STRING_LEN {
        truncated = input.chars().take(MAX_STRING_LEN).collect();
        truncated.as_str()
    } else {
        input
    };
    match kind {
        FieldKind::Html => sanitize_html(input),
        FieldKind::Url => sanitize_url(input).unwrap_or_default(),
        FieldKind::Text => strip_html(input),
    }
}

fn sanitize_section(section: &ContentSection) -> ContentSection {
    ContentSection {
        id: canonical_section_id(&section.id),
        section_type: section.section_type,
        visible: section.visible,
        data: sanitize_map(&section.data, 0),
    }
}

fn sanitize_settings(settings: &PageSettings) -> PageSettings {
    let text = |v: &Option<String>| v.as_deref().map(strip_html);
    PageSettings {
        title: text(&settings.title),
        description: text(&settings.description),
        theme: text(&settings.theme),
        primary_color: text(&settings.primary_color),
        font_family: text(&settings.font_family),
        custom_css: settings.custom_css.as_deref().map(sanitize_css),
        extra: sanitize_map(&settings.extra, 0),
    }
}

/// Sanitize every section payload and the page settings.
pub fn sanitize_page_content(content: &PageContent) -> PageContent {
    PageContent {
        version: content.version.clone(),
        layout: content.layout,
        sections: content.sections.iter().map(sanitize_section).collect(),
        settings: sanitize_settings(&content.settings),
    }
}
