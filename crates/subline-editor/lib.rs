//! Undoable subtitle document model with live multi-view synchronization
//!
//! `subline-editor` keeps an ordered collection of subtitle records, the
//! user's selection and the undo history consistent with each other, and
//! notifies every attached view after each change.
//!
//! # Features
//!
//! - **Three mutation primitives**: insert one, remove a range, scoped update
//! - **Bulk scopes**: any number of changes undo and redo as one step
//! - **Selection remapping**: selected indices follow structural changes
//! - **Ordered observers**: priorities, re-entrancy guard, scoped handlers
//! - **Background cache**: LIFO worker pool with stale-result discarding
//! - **Named commands**: registry with plugin shadowing and modal dialogs
//!
//! # Example
//!
//! ```
//! use subline_core::EventRecord;
//! use subline_editor::{CommandRegistry, Editor, Options};
//!
//! let registry = CommandRegistry::with_core_commands();
//! let mut editor = Editor::new(Options::default());
//! editor.subs.load(vec![
//!     EventRecord::new(0, 1300),
//!     EventRecord::new(1300, 2000),
//! ]).unwrap();
//! editor.subs.set_selection([0, 1]).unwrap();
//!
//! registry.execute(&mut editor, "edit/join-subs/keep-first", &[]).unwrap();
//! assert_eq!(editor.subs.lines().len(), 1);
//! assert_eq!(editor.subs.lines()[0].end, 2000);
//!
//! registry.execute(&mut editor, "edit/undo", &[]).unwrap();
//! assert_eq!(editor.subs.lines().len(), 2);
//! assert_eq!(editor.subs.selected_indices(), &[0, 1]);
//! ```

#![deny(unsafe_code)]

pub mod cache;
pub mod commands;
pub mod config;
pub mod core;
pub mod editor;
pub mod events;
pub mod persistence;
pub mod views;

// Re-export core types as first-class citizens
pub use subline_core::{EventField, EventRecord, FieldKind};

// Public API exports
pub use cache::{
    worker_fn, CacheConfig, CacheEvent, CacheLookup, CacheProvider, CacheStats, Worker,
};
pub use commands::{
    Command, CommandArg, CommandOutcome, CommandRegistry, DialogHost, DialogRequest,
    DialogResponse, NoDialogs, ScriptedDialogs,
};
pub use config::Options;
pub use core::{
    Bulk, Document, DocumentEvent, EditorError, EventCollection, HistoryStats, ListEvent,
    Operation, Result, SelectionEvent, SelectionState, UndoConfig, UndoEngine, UndoUnit,
};
pub use editor::Editor;
pub use events::{EventChannel, EventStats, Subscription, SubscriptionId};
pub use persistence::{load_document, load_records, save_document, save_records};
pub use views::{AudioState, GridModel, SpectrogramView, VideoState};
