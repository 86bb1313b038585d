//! Presentation state kept in sync with the document
//!
//! Views only observe. They change the document through commands or the
//! narrow selection setter on [`Document`](crate::core::Document).

pub mod audio;
pub mod grid;
pub mod spectrogram;
pub mod video;

pub use audio::{AudioState, FOLLOW_MARGIN};
pub use grid::{GridColumn, GridModel, GridRow};
pub use spectrogram::SpectrogramView;
pub use video::{VideoEvent, VideoState};
