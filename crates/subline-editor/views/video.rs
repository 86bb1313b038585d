//! Video position and background-loaded frame timecodes

use crate::cache::{CacheConfig, CacheEvent, CacheLookup, CacheProvider, Worker};
use crate::core::Result;
use crate::events::EventChannel;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Notifications from [`VideoState`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoEvent {
    /// A new video was loaded
    Loaded,
    /// The current position moved
    PositionChanged,
    /// Timecodes for the current video arrived (or were cleared)
    TimecodesUpdated,
}

/// Loaded video, current position and frame timecodes
pub struct VideoState {
    path: Option<PathBuf>,
    current_pts: Option<i64>,
    timecodes: Vec<i64>,
    timecode_provider: Option<CacheProvider<PathBuf, Vec<i64>>>,
    changed: EventChannel<VideoState, VideoEvent>,
}

impl core::fmt::Debug for VideoState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VideoState")
            .field("path", &self.path)
            .field("current_pts", &self.current_pts)
            .field("timecodes", &self.timecodes.len())
            .finish()
    }
}

impl Default for VideoState {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoState {
    /// Video state without timecode loading
    pub fn new() -> Self {
        Self {
            path: None,
            current_pts: None,
            timecodes: Vec::new(),
            timecode_provider: None,
            changed: EventChannel::new("video"),
        }
    }

    /// Video state that loads timecodes with `worker` in the background
    pub fn with_timecodes<W>(worker: W, config: CacheConfig) -> Result<Self>
    where
        W: Worker<PathBuf, Vec<i64>>,
    {
        let mut state = Self::new();
        state.timecode_provider = Some(CacheProvider::new("timecodes", worker, config)?);
        Ok(state)
    }

    pub fn changed(&self) -> &EventChannel<VideoState, VideoEvent> {
        &self.changed
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn current_pts(&self) -> Option<i64> {
        self.current_pts
    }

    /// Frame timestamps of the current video; empty until loaded
    pub fn timecodes(&self) -> &[i64] {
        &self.timecodes
    }

    /// Switch to another video and request its timecodes
    pub fn load(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        info!(path = %path.display(), "loading video");

        self.path = Some(path.clone());
        self.current_pts = Some(0);
        if !self.timecodes.is_empty() {
            self.timecodes.clear();
            self.changed.emit(self, VideoEvent::TimecodesUpdated);
        }
        self.changed.emit(self, VideoEvent::Loaded);

        if let Some(provider) = &self.timecode_provider {
            provider.schedule(path);
        }
        self.adopt_timecodes();
    }

    /// Move the playhead
    pub fn seek(&mut self, pts: i64) {
        let pts = pts.max(0);
        if self.current_pts == Some(pts) {
            return;
        }
        self.current_pts = Some(pts);
        self.changed.emit(self, VideoEvent::PositionChanged);
    }

    /// Pull finished timecode loads; results for other paths are ignored
    pub fn pump(&mut self) {
        let Some(provider) = self.timecode_provider.as_mut() else {
            return;
        };
        let finished = provider.drain();
        let current = finished.iter().any(|event| match event {
            CacheEvent::Ready(path) | CacheEvent::Failed(path) => Some(path) == self.path.as_ref(),
        });
        if current {
            self.adopt_timecodes();
        } else if !finished.is_empty() {
            debug!(count = finished.len(), "ignoring timecodes for a stale video");
        }
    }

    /// Block until the current video's timecodes are available
    pub fn wait_for_timecodes(&mut self) {
        let (Some(provider), Some(path)) = (self.timecode_provider.as_mut(), self.path.as_ref())
        else {
            return;
        };
        provider.wait_for(path);
        self.adopt_timecodes();
    }

    fn adopt_timecodes(&mut self) {
        let (Some(provider), Some(path)) = (&self.timecode_provider, &self.path) else {
            return;
        };
        if let CacheLookup::Ready(timecodes) = provider.lookup(path) {
            if *timecodes != self.timecodes {
                self.timecodes = timecodes.as_ref().clone();
                debug!(frames = self.timecodes.len(), "timecodes loaded");
                self.changed.emit(self, VideoEvent::TimecodesUpdated);
            }
        }
    }

    /// Timestamp of the frame at or before `pts`, if timecodes are known
    pub fn align_pts_to_frame(&self, pts: i64) -> Option<i64> {
        match self.timecodes.binary_search(&pts) {
            Ok(index) => Some(self.timecodes[index]),
            Err(0) => self.timecodes.first().copied(),
            Err(index) => Some(self.timecodes[index - 1]),
        }
    }
}
