use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version string stamped on every normalized document.
pub const CURRENT_VERSION: &str = "2.0";

/// A page document as stored in the `content` JSONB column.
///
/// One per page. Edits replace the whole document; there is no partial
/// patching at the storage level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub version: String,
    #[serde(default)]
    pub layout: LayoutType,
    #[serde(default)]
    pub sections: Vec<ContentSection>,
    #[serde(default)]
    pub settings: PageSettings,
}

impl PageContent {
    /// Create an empty current-version document for a layout.
    pub fn new(layout: LayoutType) -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            layout,
            sections: Vec::new(),
            settings: PageSettings::default(),
        }
    }

    pub fn is_current(&self) -> bool {
        self.version == CURRENT_VERSION
    }

    pub fn section(&self, id: &str) -> Option<&ContentSection> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }

    pub fn section_ids(&self) -> HashSet<String> {
        self.sections.iter().map(|s| s.id.clone()).collect()
    }

    pub fn visible_sections(&self) -> impl Iterator<Item = &ContentSection> {
        self.sections.iter().filter(|s| s.visible)
    }

    /// Pick an id based on `base` that no section in this page uses yet.
    pub fn unique_section_id(&self, base: &str) -> String {
        unique_id(base, &self.section_ids())
    }
}

/// Keep the characters that are safe in an HTML `id` and a URL fragment.
pub fn canonical_section_id(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Returns `base` if free, otherwise `base-2`, `base-3`, ...
pub fn unique_id(base: &str, used: &HashSet<String>) -> String {
    if !used.contains(base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !used.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// A typed content block on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    pub id: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    /// Independent of whether the section has any content.
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub data: Map<String, Value>,
}

fn default_visible() -> bool {
    true
}

impl ContentSection {
    pub fn new(id: impl Into<String>, section_type: SectionType) -> Self {
        Self {
            id: id.into(),
            section_type,
            visible: true,
            data: Map::new(),
        }
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    pub fn data_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.data.get(key).and_then(Value::as_array)
    }
}

/// Discriminator for [`ContentSection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionType {
    Hero,
    Text,
    Gallery,
    Pricing,
    Testimonials,
    Features,
    Cta,
    Contact,
    Faq,
    Team,
    PlantShowcase,
    PlantCare,
    PlantGrid,
}

impl SectionType {
    pub const ALL: [SectionType; 13] = [
        SectionType::Hero,
        SectionType::Text,
        SectionType::Gallery,
        SectionType::Pricing,
        SectionType::Testimonials,
        SectionType::Features,
        SectionType::Cta,
        SectionType::Contact,
        SectionType::Faq,
        SectionType::Team,
        SectionType::PlantShowcase,
        SectionType::PlantCare,
        SectionType::PlantGrid,
    ];

    /// Wire name, as used in the `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Hero => "hero",
            SectionType::Text => "text",
            SectionType::Gallery => "gallery",
            SectionType::Pricing => "pricing",
            SectionType::Testimonials => "testimonials",
            SectionType::Features => "features",
            SectionType::Cta => "cta",
            SectionType::Contact => "contact",
            SectionType::Faq => "faq",
            SectionType::Team => "team",
            SectionType::PlantShowcase => "plantShowcase",
            SectionType::PlantCare => "plantCare",
            SectionType::PlantGrid => "plantGrid",
        }
    }

    /// Parse a type name, tolerating case, `-`/`_` separators and a few
    /// aliases that older editors wrote.
    pub fn parse(name: &str) -> Option<Self> {
        let folded: String = name
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_' && *c != ' ')
            .flat_map(char::to_lowercase)
            .collect();
        let kind = match folded.as_str() {
            "hero" | "banner" => SectionType::Hero,
            "text" | "richtext" | "content" => SectionType::Text,
            "gallery" | "images" => SectionType::Gallery,
            "pricing" | "plans" => SectionType::Pricing,
            "testimonials" | "testimonial" | "reviews" => SectionType::Testimonials,
            "features" | "feature" => SectionType::Features,
            "cta" | "calltoaction" => SectionType::Cta,
            "contact" => SectionType::Contact,
            "faq" | "faqs" => SectionType::Faq,
            "team" => SectionType::Team,
            "plantshowcase" => SectionType::PlantShowcase,
            "plantcare" => SectionType::PlantCare,
            "plantgrid" => SectionType::PlantGrid,
            _ => return None,
        };
        Some(kind)
    }

    /// Infer a type from an object key such as `hero`, `hero-2`,
    /// `hero_main` or `plant-showcase-1`.
    ///
    /// Tries the longest run of leading segments first.
    pub fn from_key(key: &str) -> Option<Self> {
        let segments: Vec<&str> = key
            .split(|c| c == '-' || c == '_')
            .filter(|s| !s.is_empty())
            .collect();
        (1..=segments.len())
            .rev()
            .find_map(|n| Self::parse(&segments[..n].concat()))
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named page archetype; decides the default sections of a new page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutType {
    #[default]
    Landing,
    Blog,
    About,
    Portfolio,
    Shop,
    Contact,
    Custom,
}

impl LayoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutType::Landing => "landing",
            LayoutType::Blog => "blog",
            LayoutType::About => "about",
            LayoutType::Portfolio => "portfolio",
            LayoutType::Shop => "shop",
            LayoutType::Contact => "contact",
            LayoutType::Custom => "custom",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let layout = match name.trim().to_ascii_lowercase().as_str() {
            "landing" | "home" => LayoutType::Landing,
            "blog" => LayoutType::Blog,
            "about" => LayoutType::About,
            "portfolio" => LayoutType::Portfolio,
            "shop" | "store" => LayoutType::Shop,
            "contact" => LayoutType::Contact,
            "custom" => LayoutType::Custom,
            _ => return None,
        };
        Some(layout)
    }
}

impl fmt::Display for LayoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page-level presentation and SEO settings.
///
/// Keys this struct does not model are kept in `extra` so that a
/// read-modify-write cycle never loses editor data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_css: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageSettings {
    /// Wire names of the modeled fields.
    pub const KNOWN_KEYS: [&'static str; 6] = [
        "title",
        "description",
        "theme",
        "primaryColor",
        "fontFamily",
        "customCss",
    ];

    /// Mutable access to a modeled field by wire name.
    pub fn field_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            "title" => Some(&mut self.title),
            "description" => Some(&mut self.description),
            "theme" => Some(&mut self.theme),
            "primaryColor" => Some(&mut self.primary_color),
            "fontFamily" => Some(&mut self.font_family),
            "customCss" => Some(&mut self.custom_css),
            _ => None,
        }
    }
}
