//! Section-level editing on whole documents.
//!
//! Every operation takes the current document and returns a new one; the
//! caller stores the result with a full replace.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::model::{ContentSection, PageContent, SectionType};
use super::template::default_section;
use super::validate::MAX_SECTIONS;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("Section not found: {0}")]
    SectionNotFound(String),
    #[error("index {index} is out of range for {len} sections")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("section id '{0}' already exists")]
    DuplicateId(String),
    #[error("a page holds at most {max} sections")]
    TooManySections { max: usize },
}

/// A single edit, as sent by the page editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum EditorCommand {
    #[serde(rename_all = "camelCase")]
    AddSection {
        section_type: SectionType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<usize>,
    },
    RemoveSection {
        id: String,
    },
    UpdateSection {
        id: String,
        data: Map<String, Value>,
    },
    MergeSection {
        id: String,
        patch: Map<String, Value>,
    },
    #[serde(rename_all = "camelCase")]
    MoveSection {
        id: String,
        new_index: usize,
    },
    SetVisibility {
        id: String,
        visible: bool,
    },
    DuplicateSection {
        id: String,
    },
}

fn locate(content: &PageContent, id: &str) -> Result<usize, EditorError> {
    content
        .position(id)
        .ok_or_else(|| EditorError::SectionNotFound(id.to_string()))
}

fn ensure_capacity(content: &PageContent) -> Result<(), EditorError> {
    if content.sections.len() >= MAX_SECTIONS {
        return Err(EditorError::TooManySections { max: MAX_SECTIONS });
    }
    Ok(())
}

pub fn find_section<'a>(content: &'a PageContent, id: &str) -> Result<&'a ContentSection, EditorError> {
    content
        .section(id)
        .ok_or_else(|| EditorError::SectionNotFound(id.to_string()))
}

/// Insert a prepared section at `position`, or append when `None`.
pub fn insert_section(
    content: &PageContent,
    section: ContentSection,
    position: Option<usize>,
) -> Result<PageContent, EditorError> {
    ensure_capacity(content)?;
    if content.section(&section.id).is_some() {
        return Err(EditorError::DuplicateId(section.id));
    }
    let len = content.sections.len();
    let index = position.unwrap_or(len);
    if index > len {
        return Err(EditorError::IndexOutOfRange { index, len });
    }
    let mut next = content.clone();
    next.sections.insert(index, section);
    Ok(next)
}

/// Add a section of `section_type` with placeholder data and a fresh id.
pub fn add_section(
    content: &PageContent,
    section_type: SectionType,
    position: Option<usize>,
) -> Result<PageContent, EditorError> {
    let id = content.unique_section_id(section_type.as_str());
    insert_section(content, default_section(section_type, id), position)
}

pub fn remove_section(content: &PageContent, id: &str) -> Result<PageContent, EditorError> {
    let index = locate(content, id)?;
    let mut next = content.clone();
    next.sections.remove(index);
    Ok(next)
}

/// Replace a section's data wholesale.
pub fn update_section_data(
    content: &PageContent,
    id: &str,
    data: Map<String, Value>,
) -> Result<PageContent, EditorError> {
    let index = locate(content, id)?;
    let mut next = content.clone();
    next.sections[index].data = data;
    Ok(next)
}

/// Shallow merge into a section's data; `null` values remove keys.
pub fn merge_section_data(
    content: &PageContent,
    id: &str,
    patch: Map<String, Value>,
) -> Result<PageContent, EditorError> {
    let index = locate(content, id)?;
    let mut next = content.clone();
    let data = &mut next.sections[index].data;
    for (key, value) in patch {
        if value.is_null() {
            data.remove(&key);
        } else {
            data.insert(key, value);
        }
    }
    Ok(next)
}

pub fn move_section(
    content: &PageContent,
    id: &str,
    new_index: usize,
) -> Result<PageContent, EditorError> {
    let index = locate(content, id)?;
    let len = content.sections.len();
    if new_index >= len {
        return Err(EditorError::IndexOutOfRange {
            index: new_index,
            len,
        });
    }
    let mut next = content.clone();
    let section = next.sections.remove(index);
    next.sections.insert(new_index, section);
    Ok(next)
}

pub fn set_section_visibility(
    content: &PageContent,
    id: &str,
    visible: bool,
) -> Result<PageContent, EditorError> {
    let index = locate(content, id)?;
    let mut next = content.clone();
    next.sections[index].visible = visible;
    Ok(next)
}

/// Copy a section, inserting the copy right after the original.
pub fn duplicate_section(content: &PageContent, id: &str) -> Result<PageContent, EditorError> {
    let index = locate(content, id)?;
    let mut copy = content.sections[index].clone();
    copy.id = content.unique_section_id(id);
    insert_section(content, copy, Some(index + 1))
}

/// Apply one command.
pub fn apply(content: &PageContent, command: &EditorCommand) -> Result<PageContent, EditorError> {
    match command {
        EditorCommand::AddSection {
            section_type,
            position,
        } => add_section(content, *section_type, *position),
        EditorCommand::RemoveSection { id } => remove_section(content, id),
        EditorCommand::UpdateSection { id, data } => update_section_data(content, id, data.clone()),
        EditorCommand::MergeSection { id, patch } => merge_section_data(content, id, patch.clone()),
        EditorCommand::MoveSection { id, new_index } => move_section(content, id, *new_index),
        EditorCommand::SetVisibility { id, visible } => set_section_visibility(content, id, *visible),
        EditorCommand::DuplicateSection { id } => duplicate_section(content, id),
    }
}

/// Apply commands in order. The first failure aborts the whole batch and
/// the input is left as it was.
pub fn apply_all(content: &PageContent, commands: &[EditorCommand]) -> Result<PageContent, EditorError> {
    let mut current = content.clone();
    for (step, command) in commands.iter().enumerate() {
        current = apply(&current, command).inspect_err(|err| {
            debug!(step, error = %err, "editor command rejected");
        })?;
    }
    Ok(current)
}
