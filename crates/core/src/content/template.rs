//! Starter content for new pages and sections.
use serde_json::{json, Map, Value};

use super::model::{unique_id, ContentSection, LayoutType, PageContent, SectionType};

/// Placeholder `data` for a freshly added section.
pub fn default_data(section_type: SectionType) -> Map<String, Value> {
    let value = match section_type {
        SectionType::Hero => json!({
            "title": "Welcome",
            "subtitle": "",
            "image": "",
            "ctaText": "Get started",
            "ctaLink": "#contact"
        }),
        SectionType::Text => json!({
            "heading": "",
            "content": "<p>Tell your story here.</p>"
        }),
        SectionType::Gallery => json!({ "title": "Gallery", "images": [] }),
        SectionType::Pricing => json!({ "title": "Pricing", "plans": [] }),
        SectionType::Testimonials => json!({ "title": "What people say", "items": [] }),
        SectionType::Features => json!({ "title": "Features", "items": [] }),
        SectionType::Cta => json!({
            "heading": "Ready to get started?",
            "text": "",
            "buttonText": "Contact us",
            "link": "#contact"
        }),
        SectionType::Contact => json!({
            "title": "Contact",
            "email": "",
            "phone": "",
            "address": ""
        }),
        SectionType::Faq => json!({ "title": "FAQ", "items": [] }),
        SectionType::Team => json!({ "title": "Our team", "members": [] }),
        SectionType::PlantShowcase => json!({ "title": "Featured plants", "plants": [] }),
        SectionType::PlantCare => json!({
            "plantName": "",
            "light": "",
            "water": "",
            "temperature": "",
            "humidity": "",
            "soil": "",
            "notes": ""
        }),
        SectionType::PlantGrid => json!({ "title": "Shop plants", "plants": [], "columns": 3 }),
    };
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub fn default_section(section_type: SectionType, id: impl Into<String>) -> ContentSection {
    ContentSection::new(id, section_type).with_data(default_data(section_type))
}

/// Section types a new page of the given layout starts with.
pub fn layout_sections(layout: LayoutType) -> &'static [SectionType] {
    match layout {
        LayoutType::Landing => &[
            SectionType::Hero,
            SectionType::Features,
            SectionType::Testimonials,
            SectionType::Cta,
        ],
        LayoutType::Blog => &[SectionType::Hero, SectionType::Text],
        LayoutType::About => &[SectionType::Hero, SectionType::Text, SectionType::Team],
        LayoutType::Portfolio => &[SectionType::Hero, SectionType::Gallery, SectionType::Contact],
        LayoutType::Shop => &[
            SectionType::Hero,
            SectionType::PlantGrid,
            SectionType::Pricing,
            SectionType::Faq,
        ],
        LayoutType::Contact => &[SectionType::Hero, SectionType::Contact],
        LayoutType::Custom => &[],
    }
}

/// A current-version page pre-filled with the layout's default sections.
pub fn default_content(layout: LayoutType) -> PageContent {
    let mut page = PageContent::new(layout);
    let mut used = page.section_ids();
    for &kind in layout_sections(layout) {
        let id = unique_id(kind.as_str(), &used);
        used.insert(id.clone());
        page.sections.push(default_section(kind, id));
    }
    page
}
