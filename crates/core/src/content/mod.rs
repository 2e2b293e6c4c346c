pub mod editor;
pub mod ingest;
pub mod migrate;
pub mod model;
pub mod serialize;
pub mod template;
pub mod validate;

pub use model::{ContentSection, LayoutType, PageContent, PageSettings, SectionType, CURRENT_VERSION};
