//! Document model: records, selection, history and their owner

pub mod collection;
pub mod document;
pub mod errors;
pub mod history;
pub mod selection;

pub use collection::{EventCollection, ListEvent, RecordChange};
pub use document::{Bulk, Document, DocumentEvent};
pub use errors::{EditorError, Result};
pub use history::{HistoryStats, Operation, UndoConfig, UndoEngine, UndoUnit};
pub use selection::{SelectionEvent, SelectionState};
