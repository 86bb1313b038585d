//! # subline core
//!
//! Data types shared by every layer of the subline subtitle editor: the
//! [`EventRecord`] describing one timed subtitle entry, the [`EventField`]
//! used for single-field writes, and the timing/text helpers the views use
//! to present records.
//!
//! ## Quick Start
//!
//! ```rust
//! use subline_core::{EventField, EventRecord};
//!
//! let mut record = EventRecord::new(0, 1300).with_text("Hello{\\i1} world");
//! record.set(EventField::End(2000));
//!
//! assert_eq!(record.duration(), 2000);
//! assert_eq!(record.plain_text(), "Hello world");
//! ```

#![deny(unsafe_code)]

pub mod record;
pub mod utils;

pub use record::{EventField, EventRecord, FieldKind, DEFAULT_STYLE};
pub use utils::{
    ass_to_plaintext, character_count, format_ms, parse_ms, CoreError, Result,
};

/// Crate version for runtime compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
