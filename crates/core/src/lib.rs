//! Page content engine for multi-tenant sites.
//!
//! Pages are stored as versioned JSON documents. This crate normalizes
//! whatever shape comes out of storage (legacy flat blobs, object-keyed
//! sections, array sections) into the current [`content::PageContent`],
//! validates and sanitizes it, and resolves request hosts to tenant sites.

pub mod content;
pub mod events;
pub mod sanitize;
pub mod site;
