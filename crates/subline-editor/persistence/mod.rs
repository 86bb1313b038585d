//! JSON persistence of subtitle records
//!
//! A document is stored as a JSON array of records in display order.
//! Missing record fields take their defaults when loading.

use crate::core::{Document, EditorError, Result};
use std::fs;
use std::path::Path;
use subline_core::EventRecord;
use tracing::info;

/// Read records from `path`
pub fn load_records(path: &Path) -> Result<Vec<EventRecord>> {
    let content = fs::read_to_string(path)
        .map_err(|err| EditorError::io(format!("{}: {err}", path.display())))?;
    let records: Vec<EventRecord> = serde_json::from_str(&content)?;
    Ok(records)
}

/// Write `records` to `path`, replacing the file
pub fn save_records(path: &Path, records: &[EventRecord]) -> Result<()> {
    let content = serde_json::to_string_pretty(records)?;
    fs::write(path, content)
        .map_err(|err| EditorError::io(format!("{}: {err}", path.display())))
}

/// Replace `doc` with the records stored at `path`
///
/// History is cleared and the loaded state becomes the save point.
pub fn load_document(doc: &mut Document, path: &Path) -> Result<()> {
    let records = load_records(path)?;
    doc.load(records)?;
    info!(path = %path.display(), "document opened");
    Ok(())
}

/// Store `doc` at `path` and mark it saved
pub fn save_document(doc: &mut Document, path: &Path) -> Result<()> {
    save_records(path, doc.records())?;
    doc.mark_saved();
    info!(path = %path.display(), records = doc.records().len(), "document saved");
    Ok(())
}
