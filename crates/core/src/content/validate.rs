//! Structural validation of page documents.
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::migrate::{detect_version, ContentVersion};
use super::model::{ContentSection, PageContent, SectionType, CURRENT_VERSION};
use crate::sanitize::{json_depth, strip_html, MAX_JSON_DEPTH};

/// Most sections a single page may hold.
pub const MAX_SECTIONS: usize = 50;

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
        .expect("hex color pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unsupported content version '{0}', expected '{CURRENT_VERSION}'")]
    UnsupportedVersion(String),
    #[error("section id cannot be empty (section {0})")]
    EmptySectionId(usize),
    #[error("duplicate section id '{0}'")]
    DuplicateSectionId(String),
    #[error("page has {count} sections, at most {max} allowed")]
    TooManySections { count: usize, max: usize },
    #[error("section '{section}': field '{field}' must be {expected}")]
    InvalidField {
        section: String,
        field: &'static str,
        expected: &'static str,
    },
    #[error("content must be a JSON object or null")]
    NotAnObject,
    #[error("sections must be an array or an object")]
    InvalidSections,
    #[error("version must be a string")]
    InvalidVersionField,
    #[error("content is nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Outcome of a validation pass, in the shape the editor expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, err: ValidationError) {
        self.success = false;
        self.errors.push(err.to_string());
    }

    pub fn error_message(&mut self, message: impl Into<String>) {
        self.success = false;
        self.errors.push(message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn extend_warnings<I: IntoIterator<Item = String>>(&mut self, warnings: I) {
        self.warnings.extend(warnings);
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.success &= other.success;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn is_valid(&self) -> bool {
        self.success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    String,
    Array,
    Number,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Array => value.is_array(),
            FieldKind::Number => value.is_number(),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Array => "an array",
            FieldKind::Number => "a number",
        }
    }
}

/// Typed fields per section type. Fields not listed here are free-form.
fn field_schema(section_type: SectionType) -> &'static [(&'static str, FieldKind)] {
    use FieldKind::{Array, Number, String};
    match section_type {
        SectionType::Hero => &[
            ("title", String),
            ("subtitle", String),
            ("image", String),
            ("ctaText", String),
            ("ctaLink", String),
        ],
        SectionType::Text => &[("heading", String), ("content", String)],
        SectionType::Gallery => &[("title", String), ("images", Array)],
        SectionType::Pricing => &[("title", String), ("plans", Array)],
        SectionType::Testimonials | SectionType::Features | SectionType::Faq => {
            &[("title", String), ("items", Array)]
        }
        SectionType::Cta => &[
            ("heading", String),
            ("text", String),
            ("buttonText", String),
            ("link", String),
        ],
        SectionType::Contact => &[
            ("title", String),
            ("email", String),
            ("phone", String),
            ("address", String),
        ],
        SectionType::Team => &[("title", String), ("members", Array)],
        SectionType::PlantShowcase => &[("title", String), ("plants", Array)],
        SectionType::PlantCare => &[
            ("plantName", String),
            ("light", String),
            ("water", String),
            ("temperature", String),
            ("humidity", String),
            ("soil", String),
            ("notes", String),
        ],
        SectionType::PlantGrid => &[("title", String), ("plants", Array), ("columns", Number)],
    }
}

const PLANT_CARE_FIELDS: [&str; 6] = ["light", "water", "temperature", "humidity", "soil", "notes"];

/// Check the typed fields of one section. Null counts as absent.
pub fn validate_section(section: &ContentSection) -> Vec<ValidationError> {
    field_schema(section.section_type)
        .iter()
        .filter_map(|&(field, kind)| {
            let value = section.data.get(field)?;
            if value.is_null() || kind.matches(value) {
                None
            } else {
                Some(ValidationError::InvalidField {
                    section: section.id.clone(),
                    field,
                    expected: kind.expected(),
                })
            }
        })
        .collect()
}

/// Validate a normalized document before it is stored or rendered.
pub fn validate_page_content(content: &PageContent) -> ValidationReport {
    let mut report = ValidationReport::new();

    if content.version != CURRENT_VERSION {
        report.error(ValidationError::UnsupportedVersion(content.version.clone()));
    }
    if content.sections.len() > MAX_SECTIONS {
        report.error(ValidationError::TooManySections {
            count: content.sections.len(),
            max: MAX_SECTIONS,
        });
    }

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for (index, section) in content.sections.iter().enumerate() {
        if section.id.trim().is_empty() {
            report.error(ValidationError::EmptySectionId(index));
        } else if !seen.insert(section.id.as_str()) && reported.insert(section.id.as_str()) {
            report.error(ValidationError::DuplicateSectionId(section.id.clone()));
        }

        for err in validate_section(section) {
            report.error(err);
        }

        if section.visible && is_section_empty(section) {
            report.warn(format!(
                "section '{}' ({}) is visible but has no content",
                section.id, section.section_type
            ));
        }
    }

    if content.visible_sections().next().is_none() {
        report.warn("page has no visible sections");
    }

    if let Some(color) = content.settings.primary_color.as_deref() {
        if !HEX_COLOR.is_match(color) {
            report.warn(format!("primary color '{color}' is not a hex color"));
        }
    }

    report
}

/// Structural checks on an untrusted blob before it is migrated.
pub fn validate_raw(value: &Value) -> ValidationReport {
    let mut report = ValidationReport::new();
    let obj = match value {
        Value::Null => {
            report.warn("empty content will be replaced with layout defaults");
            return report;
        }
        Value::Object(obj) => obj,
        _ => {
            report.error(ValidationError::NotAnObject);
            return report;
        }
    };

    match obj.get("sections") {
        None | Some(Value::Null) | Some(Value::Array(_)) | Some(Value::Object(_)) => {}
        Some(_) => report.error(ValidationError::InvalidSections),
    }
    match obj.get("version") {
        None | Some(Value::Null) | Some(Value::String(_)) | Some(Value::Number(_)) => {}
        Some(_) => report.error(ValidationError::InvalidVersionField),
    }
    if json_depth(value) > MAX_JSON_DEPTH {
        report.error(ValidationError::TooDeep(MAX_JSON_DEPTH));
    }
    if let ContentVersion::Unknown(version) = detect_version(value) {
        report.error(ValidationError::UnsupportedVersion(version));
    }

    report
}

/// Nothing worth rendering: absent, null, whitespace, empty list or object.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

fn all_blank(section: &ContentSection, fields: &[&str]) -> bool {
    fields.iter().all(|f| is_blank(section.data.get(*f)))
}

/// True when some item of the list has a non-blank value under one of `keys`.
/// Bare strings count as items carrying their own value.
fn any_item_has(section: &ContentSection, list: &str, keys: &[&str]) -> bool {
    section.data_array(list).is_some_and(|items| {
        items.iter().any(|item| match item {
            Value::String(s) => !s.trim().is_empty(),
            Value::Object(_) => keys.iter().any(|k| !is_blank(item.get(*k))),
            _ => false,
        })
    })
}

/// Whether a section has nothing to render.
///
/// Independent of the `visible` flag.
pub fn is_section_empty(section: &ContentSection) -> bool {
    match section.section_type {
        SectionType::Hero => all_blank(section, &["title", "subtitle", "image"]),
        SectionType::Text => section
            .data_str("content")
            .map_or(true, |html| strip_html(html).trim().is_empty()),
        SectionType::Gallery => !any_item_has(section, "images", &["url", "src"]),
        SectionType::Pricing => is_blank(section.data.get("plans")),
        SectionType::Testimonials => !any_item_has(section, "items", &["quote", "text"]),
        SectionType::Features | SectionType::Faq => is_blank(section.data.get("items")),
        SectionType::Team => is_blank(section.data.get("members")),
        SectionType::Cta => all_blank(section, &["heading", "text", "link"]),
        SectionType::Contact => all_blank(section, &["email", "phone", "address"]),
        SectionType::PlantShowcase | SectionType::PlantGrid => {
            is_blank(section.data.get("plants"))
        }
        SectionType::PlantCare => all_blank(section, &PLANT_CARE_FIELDS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::LayoutType;
    use crate::content::template::default_section;
    use serde_json::{json, Map};

    fn section(id: &str, kind: SectionType, data: Value) -> ContentSection {
        let data: Map<String, Value> = serde_json::from_value(data).unwrap();
        ContentSection::new(id, kind).with_data(data)
    }

    fn page(sections: Vec<ContentSection>) -> PageContent {
        let mut page = PageContent::new(LayoutType::Landing);
        page.sections = sections;
        page
    }

    #[test]
    fn valid_page_passes() {
        let report = validate_page_content(&page(vec![section(
            "hero",
            SectionType::Hero,
            json!({ "title": "Hello" }),
        )]));
        assert!(report.success, "{:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn duplicate_and_empty_ids_are_errors() {
        let report = validate_page_content(&page(vec![
            section("a", SectionType::Hero, json!({ "title": "x" })),
            section("a", SectionType::Hero, json!({ "title": "y" })),
            section("a", SectionType::Hero, json!({ "title": "z" })),
            section(" ", SectionType::Hero, json!({ "title": "w" })),
        ]));
        assert!(!report.success);
        assert_eq!(
            report.errors,
            vec![
                "duplicate section id 'a'".to_string(),
                "section id cannot be empty (section 3)".to_string(),
            ]
        );
    }

    #[test]
    fn wrong_version_and_field_types() {
        let mut doc = page(vec![section(
            "g",
            SectionType::Gallery,
            json!({ "images": "a.jpg" }),
        )]);
        doc.version = "1.0".to_string();
        let report = validate_page_content(&doc);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[1].contains("'images' must be an array"));
    }

    #[test]
    fn too_many_sections() {
        let sections = (0..=MAX_SECTIONS)
            .map(|i| section(&format!("s{i}"), SectionType::Text, json!({ "content": "x" })))
            .collect();
        let report = validate_page_content(&page(sections));
        assert!(report.errors.iter().any(|e| e.contains("at most 50")));
    }

    #[test]
    fn visible_empty_section_warns() {
        let mut hidden = section("h", SectionType::Text, json!({}));
        hidden.visible = false;
        let report = validate_page_content(&page(vec![hidden]));
        assert!(report.success);
        assert_eq!(report.warnings, vec!["page has no visible sections".to_string()]);

        let report = validate_page_content(&page(vec![section("t", SectionType::Text, json!({}))]));
        assert!(report.warnings[0].contains("'t' (text) is visible but has no content"));
    }

    #[test]
    fn bad_primary_color_warns() {
        let mut doc = page(vec![section("hero", SectionType::Hero, json!({ "title": "x" }))]);
        doc.settings.primary_color = Some("green".to_string());
        let report = validate_page_content(&doc);
        assert!(report.success);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn emptiness_predicates() {
        assert!(is_section_empty(&section("h", SectionType::Hero, json!({ "title": "  " }))));
        assert!(!is_section_empty(&section("h", SectionType::Hero, json!({ "image": "/a.jpg" }))));
        assert!(is_section_empty(&section("t", SectionType::Text, json!({ "content": "<p> </p>" }))));
        assert!(is_section_empty(&section(
            "g",
            SectionType::Gallery,
            json!({ "images": [{ "alt": "no url" }] })
        )));
        assert!(!is_section_empty(&section("g", SectionType::Gallery, json!({ "images": ["/a.jpg"] }))));
        assert!(is_section_empty(&section(
            "q",
            SectionType::Testimonials,
            json!({ "items": [{ "author": "Ann" }] })
        )));
        assert!(!is_section_empty(&section(
            "c",
            SectionType::Contact,
            json!({ "phone": "555-0100" })
        )));
        assert!(is_section_empty(&default_section(SectionType::PlantCare, "care")));
        assert!(!is_section_empty(&default_section(SectionType::Hero, "hero")));
    }

    #[test]
    fn visibility_does_not_affect_emptiness() {
        let mut s = section("h", SectionType::Hero, json!({ "title": "Hi" }));
        s.visible = false;
        assert!(!is_section_empty(&s));
    }

    #[test]
    fn raw_checks() {
        assert!(validate_raw(&Value::Null).success);
        assert!(!validate_raw(&json!([1, 2])).success);
        assert!(!validate_raw(&json!({ "sections": 5 })).success);
        assert!(!validate_raw(&json!({ "version": true })).success);
        assert!(!validate_raw(&json!({ "version": "7.0", "layout": "blog" })).success);
        assert!(validate_raw(&json!({ "version": "2.0", "sections": [] })).success);

        let mut deep = json!(1);
        for _ in 0..=MAX_JSON_DEPTH {
            deep = json!([deep]);
        }
        let report = validate_raw(&json!({ "sections": [], "x": deep }));
        assert!(report.errors.iter().any(|e| e.contains("nested deeper")));
    }
}
