//! Spectrogram columns computed in the background
//!
//! Every pixel column of the audio view maps to a timestamp bucket of
//! `resolution` milliseconds. Missing buckets are scheduled right to left so
//! that the last-in first-out cache delivers them left to right.

use super::audio::AudioState;
use crate::cache::{CacheConfig, CacheLookup, CacheProvider, Worker};
use crate::core::Result;
use core::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::trace;

/// One column of spectrum magnitudes
pub type Column = Vec<u8>;

/// Column cache bound to the audio view
#[derive(Debug)]
pub struct SpectrogramView {
    provider: CacheProvider<i64, Column>,
    resolution: i64,
    repaint: Rc<Cell<bool>>,
}

impl SpectrogramView {
    /// Start the column workers
    ///
    /// `resolution` is clamped to at least one millisecond.
    pub fn new<W>(worker: W, resolution: i64, config: CacheConfig) -> Result<Self>
    where
        W: Worker<i64, Column>,
    {
        let provider = CacheProvider::new("spectrogram", worker, config)?;
        let repaint = Rc::new(Cell::new(false));
        let flag = Rc::clone(&repaint);
        provider
            .finished()
            .subscribe(move |_: &CacheProvider<i64, Column>, _: &crate::cache::CacheEvent<i64>| {
                flag.set(true);
            });

        Ok(Self {
            provider,
            resolution: resolution.max(1),
            repaint,
        })
    }

    pub fn resolution(&self) -> i64 {
        self.resolution
    }

    /// Bucket key for a timestamp
    pub fn bucket(&self, pts: i64) -> i64 {
        pts.div_euclid(self.resolution) * self.resolution
    }

    /// Columns for a view `width` pixels wide, scheduling the missing ones
    ///
    /// Returns one entry per pixel column, `None` where the value is not
    /// ready yet.
    pub fn columns(&self, audio: &AudioState, width: usize) -> Vec<Option<Arc<Column>>> {
        let mut columns = vec![None; width];
        for x in (0..width).rev() {
            let key = self.bucket(audio.pts_from_x(x, width));
            if let CacheLookup::Ready(column) = self.provider.lookup_or_schedule(&key) {
                columns[x] = Some(column);
            }
        }
        columns
    }

    /// The view moved: keep ready columns, drop everything still queued
    pub fn on_view_changed(&self) {
        self.provider.clear_tasks();
    }

    /// New audio: forget every column
    pub fn on_audio_loaded(&self) {
        self.provider.invalidate_all();
    }

    /// Pull finished columns; returns how many arrived
    pub fn pump(&mut self) -> usize {
        let finished = self.provider.drain().len();
        if finished > 0 {
            trace!(finished, "spectrogram columns ready");
        }
        finished
    }

    /// Whether new columns arrived since the last call
    pub fn take_repaint(&self) -> bool {
        self.repaint.replace(false)
    }

    pub fn provider(&self) -> &CacheProvider<i64, Column> {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut CacheProvider<i64, Column> {
        &mut self.provider
    }
}
