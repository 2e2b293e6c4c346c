//! Content schema migration.
//!
//! Three generations of page documents exist in storage:
//! - Legacy: flat objects (`{ title, subtitle, content, images, ... }`)
//! - V1: `sections` is an object keyed by section id
//! - V2: `sections` is an array of `{ id, type, visible, data }`
//!
//! [`migrate`] walks any of them forward to the current V2 shape.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::model::{
    canonical_section_id, unique_id, ContentSection, LayoutType, PageContent, PageSettings, SectionType,
    CURRENT_VERSION,
};
use super::template;

const V1_VERSION: &str = "1.0";

/// Fields of a V1 section entry that are not part of its data.
const V1_RESERVED: [&str; 5] = ["type", "order", "visible", "id", "data"];

/// Top-level keys of a versioned document.
const DOCUMENT_KEYS: [&str; 4] = ["version", "layout", "sections", "settings"];

/// Detected generation of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "version", rename_all = "camelCase")]
pub enum ContentVersion {
    Empty,
    Legacy,
    V1,
    V2,
    Unknown(String),
}

impl fmt::Display for ContentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentVersion::Empty => f.write_str("empty"),
            ContentVersion::Legacy => f.write_str("legacy"),
            ContentVersion::V1 => f.write_str("v1"),
            ContentVersion::V2 => f.write_str("v2"),
            ContentVersion::Unknown(v) => write!(f, "unknown ({v})"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("unsupported content version: {0}")]
    UnsupportedVersion(String),
    #[error("invalid content shape: {0}")]
    InvalidShape(String),
    #[error("content serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result of bringing a document up to the current version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationOutcome {
    pub content: PageContent,
    pub from: ContentVersion,
    /// False only when the input already serialized to exactly `content`.
    pub changed: bool,
    pub warnings: Vec<String>,
}

/// Read the declared `version` field, accepting strings and numbers.
fn declared_version(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("version")? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Map a declared version string to a known generation.
fn known_version(declared: &str) -> Option<ContentVersion> {
    match declared {
        "1" | "1.0" | "1.0.0" => Some(ContentVersion::V1),
        "2" | "2.0" | "2.0.0" => Some(ContentVersion::V2),
        _ => None,
    }
}

/// Classify a stored document by shape, falling back to its declared
/// version only when the shape says nothing.
pub fn detect_version(value: &Value) -> ContentVersion {
    let Some(obj) = value.as_object() else {
        return ContentVersion::Empty;
    };
    if obj.is_empty() {
        return ContentVersion::Empty;
    }
    match obj.get("sections") {
        Some(Value::Array(_)) => ContentVersion::V2,
        Some(Value::Object(_)) => ContentVersion::V1,
        _ => {
            let has_flat_fields = obj
                .keys()
                .any(|k| !DOCUMENT_KEYS.contains(&k.as_str()));
            match declared_version(obj) {
                Some(declared) => match known_version(&declared) {
                    Some(_) if has_flat_fields => ContentVersion::Legacy,
                    Some(known) => known,
                    None => ContentVersion::Unknown(declared),
                },
                None => ContentVersion::Legacy,
            }
        }
    }
}

/// Bring any stored document up to the current [`PageContent`] shape.
///
/// The input is never modified.
pub fn migrate(value: &Value) -> Result<MigrationOutcome, MigrationError> {
    let from = detect_version(value);
    let mut warnings = Vec::new();
    debug!(from = %from, "migrating page content");

    let content = match (&from, value.as_object()) {
        (ContentVersion::Unknown(v), _) => {
            return Err(MigrationError::UnsupportedVersion(v.clone()));
        }
        (ContentVersion::Empty, _) | (_, None) => {
            let layout = value
                .get("layout")
                .and_then(Value::as_str)
                .and_then(LayoutType::parse)
                .unwrap_or_default();
            template::default_content(layout)
        }
        (_, Some(obj)) => {
            check_sections_shape(obj)?;
            check_declared_version(obj, &from, &mut warnings);
            let v2 = match &from {
                ContentVersion::Legacy => {
                    let v1 = legacy_to_v1(obj, &mut warnings);
                    v1_to_v2(&v1, &mut warnings)
                }
                ContentVersion::V1 => v1_to_v2(obj, &mut warnings),
                _ => obj.clone(),
            };
            normalize_v2(&v2, &mut warnings)
        }
    };

    let changed = serde_json::to_value(&content)? != *value;
    if !warnings.is_empty() {
        warn!(from = %from, count = warnings.len(), "content migrated with warnings");
    }
    Ok(MigrationOutcome {
        content,
        from,
        changed,
        warnings,
    })
}

fn check_sections_shape(obj: &Map<String, Value>) -> Result<(), MigrationError> {
    match obj.get("sections") {
        None | Some(Value::Null) | Some(Value::Array(_)) | Some(Value::Object(_)) => Ok(()),
        Some(other) => Err(MigrationError::InvalidShape(format!(
            "sections must be an array or object, found {}",
            json_kind(other)
        ))),
    }
}

fn check_declared_version(obj: &Map<String, Value>, detected: &ContentVersion, warnings: &mut Vec<String>) {
    let Some(declared) = declared_version(obj) else {
        return;
    };
    match known_version(&declared) {
        Some(known) if known == *detected => {}
        _ => warnings.push(format!(
            "declared version '{declared}' does not match content shape; treated as {detected}"
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Legacy flat keys and the hero field each maps to.
const LEGACY_HERO_FIELDS: [(&str, &str); 5] = [
    ("title", "title"),
    ("subtitle", "subtitle"),
    ("heroImage", "image"),
    ("ctaText", "ctaText"),
    ("ctaLink", "ctaLink"),
];
const LEGACY_TEXT_KEYS: [&str; 4] = ["content", "body", "text", "html"];
const LEGACY_CONTACT_KEYS: [&str; 3] = ["email", "phone", "address"];

/// Lift a flat legacy object into object-keyed V1 sections.
fn legacy_to_v1(obj: &Map<String, Value>, warnings: &mut Vec<String>) -> Map<String, Value> {
    let mut consumed: HashSet<&str> = HashSet::from(["version", "layout", "template", "settings"]);
    let mut sections = Map::new();
    let mut settings = obj
        .get("settings")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let mut hero = Map::new();
    for (legacy, field) in LEGACY_HERO_FIELDS {
        if let Some(v) = obj.get(legacy) {
            consumed.insert(legacy);
            hero.insert(field.to_string(), v.clone());
        }
    }
    push_v1_section(&mut sections, SectionType::Hero, hero);

    let mut text = Map::new();
    for key in LEGACY_TEXT_KEYS {
        if let Some(v) = obj.get(key) {
            consumed.insert(key);
            if text.contains_key("content") {
                warnings.push(format!("legacy field '{key}' dropped; text content already set"));
            } else {
                text.insert("content".to_string(), v.clone());
            }
        }
    }
    push_v1_section(&mut sections, SectionType::Text, text);

    let list_sections: [(&[&str], SectionType, &str); 6] = [
        (&["images", "gallery"], SectionType::Gallery, "images"),
        (&["features"], SectionType::Features, "items"),
        (&["plans", "pricing"], SectionType::Pricing, "plans"),
        (&["testimonials"], SectionType::Testimonials, "items"),
        (&["faq", "faqs"], SectionType::Faq, "items"),
        (&["team"], SectionType::Team, "members"),
    ];
    for (keys, kind, field) in list_sections {
        let mut data = Map::new();
        for &key in keys {
            let Some(v) = obj.get(key) else { continue };
            consumed.insert(key);
            if data.contains_key(field) {
                warnings.push(format!("legacy field '{key}' dropped; {kind} already set"));
                continue;
            }
            let items = match (kind, v) {
                (SectionType::Gallery, Value::Array(items)) => {
                    Value::Array(items.iter().map(legacy_image).collect())
                }
                (_, Value::Array(_)) => v.clone(),
                _ => {
                    warnings.push(format!("legacy field '{key}' is not a list; dropped"));
                    continue;
                }
            };
            data.insert(field.to_string(), items);
        }
        push_v1_section(&mut sections, kind, data);
    }

    let mut contact = Map::new();
    for key in LEGACY_CONTACT_KEYS {
        if let Some(v) = obj.get(key) {
            consumed.insert(key);
            contact.insert(key.to_string(), v.clone());
        }
    }
    push_v1_section(&mut sections, SectionType::Contact, contact);

    for (legacy, setting) in [
        ("theme", "theme"),
        ("primaryColor", "primaryColor"),
        ("font", "fontFamily"),
        ("seoTitle", "title"),
        ("seoDescription", "description"),
    ] {
        if let Some(v) = obj.get(legacy) {
            consumed.insert(legacy);
            settings.insert(setting.to_string(), v.clone());
        }
    }
    if let Some(colors) = obj.get("colors") {
        consumed.insert("colors");
        match colors.get("primary") {
            Some(primary) if !settings.contains_key("primaryColor") => {
                settings.insert("primaryColor".to_string(), primary.clone());
            }
            _ => warnings.push("legacy field 'colors' dropped".to_string()),
        }
    }

    for key in obj.keys() {
        if !consumed.contains(key.as_str()) {
            warnings.push(format!("legacy field '{key}' has no section mapping; dropped"));
        }
    }

    let layout = obj
        .get("layout")
        .or_else(|| obj.get("template"))
        .cloned()
        .unwrap_or(Value::Null);

    let mut v1 = Map::new();
    v1.insert("version".to_string(), json!(V1_VERSION));
    v1.insert("layout".to_string(), layout);
    v1.insert("sections".to_string(), Value::Object(sections));
    v1.insert("settings".to_string(), Value::Object(settings));
    v1
}

fn push_v1_section(sections: &mut Map<String, Value>, kind: SectionType, data: Map<String, Value>) {
    if data.is_empty() {
        return;
    }
    let order = sections.len();
    sections.insert(
        kind.as_str().to_string(),
        json!({ "type": kind.as_str(), "order": order, "data": data }),
    );
}

/// Legacy galleries were lists of bare URL strings.
fn legacy_image(item: &Value) -> Value {
    match item {
        Value::String(url) => json!({ "url": url }),
        other => other.clone(),
    }
}

struct V1Entry {
    order: Option<f64>,
    section: Value,
}

/// Turn object-keyed sections into an ordered array.
fn v1_to_v2(obj: &Map<String, Value>, warnings: &mut Vec<String>) -> Map<String, Value> {
    let mut entries = Vec::new();
    let empty = Map::new();
    let sections = obj
        .get("sections")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    for (key, entry) in sections {
        let Some(fields) = entry.as_object() else {
            warnings.push(format!("section '{key}' is not an object; dropped"));
            continue;
        };
        let declared = fields.get("type").and_then(Value::as_str);
        let kind = declared
            .and_then(SectionType::parse)
            .or_else(|| SectionType::from_key(key));
        let Some(kind) = kind else {
            let shown = declared.unwrap_or(key);
            warnings.push(format!("section '{key}' has unknown type '{shown}'; dropped"));
            continue;
        };
        let data = match fields.get("data") {
            Some(Value::Object(data)) => data.clone(),
            _ => fields
                .iter()
                .filter(|(k, _)| !V1_RESERVED.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        let visible = fields.get("visible").cloned().unwrap_or(Value::Bool(true));
        entries.push(V1Entry {
            order: fields.get("order").and_then(Value::as_f64),
            section: json!({
                "id": key,
                "type": kind.as_str(),
                "visible": visible,
                "data": data,
            }),
        });
    }

    // Stable: unordered entries keep object order after the ordered ones.
    entries.sort_by(|a, b| match (a.order, b.order) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let mut v2 = obj.clone();
    v2.insert("version".to_string(), json!(CURRENT_VERSION));
    v2.insert(
        "sections".to_string(),
        Value::Array(entries.into_iter().map(|e| e.section).collect()),
    );
    v2
}

/// Build a typed document from a V2-shaped object, repairing what can be
/// repaired and dropping what cannot.
fn normalize_v2(obj: &Map<String, Value>, warnings: &mut Vec<String>) -> PageContent {
    let layout = match obj.get("layout") {
        None | Some(Value::Null) => LayoutType::default(),
        Some(Value::String(name)) => LayoutType::parse(name).unwrap_or_else(|| {
            warnings.push(format!("unknown layout '{name}'; using landing"));
            LayoutType::default()
        }),
        Some(other) => {
            warnings.push(format!("layout must be a string, found {}; using landing", json_kind(other)));
            LayoutType::default()
        }
    };

    let mut page = PageContent::new(layout);
    let mut used = HashSet::new();
    let items = obj
        .get("sections")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for (index, item) in items.iter().enumerate() {
        let Some(fields) = item.as_object() else {
            warnings.push(format!("section at index {index} is not an object; dropped"));
            continue;
        };
        let kind = match fields.get("type").and_then(Value::as_str) {
            Some(name) => match SectionType::parse(name) {
                Some(kind) => kind,
                None => {
                    warnings.push(format!("section at index {index} has unknown type '{name}'; dropped"));
                    continue;
                }
            },
            None => {
                warnings.push(format!("section at index {index} has no type; dropped"));
                continue;
            }
        };

        let declared = fields
            .get("id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let base = declared.map(canonical_section_id).filter(|id| !id.is_empty());
        if let Some(raw) = declared {
            match &base {
                Some(base) if base != raw => {
                    warnings.push(format!("section id '{raw}' rewritten to '{base}'"))
                }
                None => warnings.push(format!("section id '{raw}' has no usable characters; replaced")),
                _ => {}
            }
        }
        let id = match base {
            Some(base) => {
                let id = unique_id(&base, &used);
                if id != base {
                    warnings.push(format!("duplicate section id '{base}' renamed to '{id}'"));
                }
                id
            }
            None => unique_id(kind.as_str(), &used),
        };
        used.insert(id.clone());

        let visible = match fields.get("visible") {
            None | Some(Value::Null) => true,
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => false,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => true,
            Some(other) => {
                warnings.push(format!(
                    "section '{id}' visible flag is a {}; treated as visible",
                    json_kind(other)
                ));
                true
            }
        };

        let data = match fields.get("data") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(data)) => data.clone(),
            Some(other) => {
                warnings.push(format!("section '{id}' data is a {}; replaced with empty object", json_kind(other)));
                Map::new()
            }
        };

        page.sections.push(ContentSection {
            id,
            section_type: kind,
            visible,
            data,
        });
    }

    page.settings = match obj.get("settings") {
        Some(Value::Object(settings)) => settings_from_map(settings, warnings),
        None | Some(Value::Null) => PageSettings::default(),
        Some(other) => {
            warnings.push(format!("settings is a {}; ignored", json_kind(other)));
            PageSettings::default()
        }
    };
    page
}

fn settings_from_map(map: &Map<String, Value>, warnings: &mut Vec<String>) -> PageSettings {
    let mut settings = PageSettings::default();
    for (key, value) in map {
        match settings.field_mut(key) {
            Some(slot) => match value {
                Value::String(s) => *slot = Some(s.clone()),
                Value::Null => {}
                other => warnings.push(format!(
                    "setting '{key}' must be a string, found {}; dropped",
                    json_kind(other)
                )),
            },
            None => {
                settings.extra.insert(key.clone(), value.clone());
            }
        }
    }
    settings
}
