//! Audio view window and audio selection

use crate::core::EventCollection;
use crate::events::EventChannel;

/// Margin shown around a subtitle the view jumps to, in milliseconds
pub const FOLLOW_MARGIN: i64 = 10_000;

/// Visible window and selection of the audio timeline
///
/// All values are milliseconds. When bounds are known (`min..=max`, usually
/// the audio duration) the view is kept inside them.
pub struct AudioState {
    bounds: Option<(i64, i64)>,
    view_start: i64,
    view_end: i64,
    selection: Option<(i64, i64)>,
    view_changed: EventChannel<AudioState, ()>,
    selection_changed: EventChannel<AudioState, ()>,
}

impl core::fmt::Debug for AudioState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AudioState")
            .field("bounds", &self.bounds)
            .field("view", &(self.view_start, self.view_end))
            .field("selection", &self.selection)
            .finish()
    }
}

impl Default for AudioState {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioState {
    pub fn new() -> Self {
        Self {
            bounds: None,
            view_start: 0,
            view_end: 0,
            selection: None,
            view_changed: EventChannel::new("audio-view"),
            selection_changed: EventChannel::new("audio-selection"),
        }
    }

    pub fn view_changed(&self) -> &EventChannel<AudioState, ()> {
        &self.view_changed
    }

    pub fn selection_changed(&self) -> &EventChannel<AudioState, ()> {
        &self.selection_changed
    }

    /// Set the audio extent and show all of it
    pub fn set_bounds(&mut self, min: i64, max: i64) {
        let max = max.max(min);
        self.bounds = Some((min, max));
        self.view(min, max);
    }

    pub fn min(&self) -> Option<i64> {
        self.bounds.map(|(min, _)| min)
    }

    pub fn max(&self) -> Option<i64> {
        self.bounds.map(|(_, max)| max)
    }

    pub fn view_start(&self) -> i64 {
        self.view_start
    }

    pub fn view_end(&self) -> i64 {
        self.view_end
    }

    pub fn view_size(&self) -> i64 {
        self.view_end - self.view_start
    }

    /// Show `start..end`, clamped to the bounds
    pub fn view(&mut self, start: i64, end: i64) {
        let (mut start, mut end) = (start.min(end), start.max(end));
        if let Some((min, max)) = self.bounds {
            start = start.clamp(min, max);
            end = end.clamp(min, max);
        }
        if (start, end) == (self.view_start, self.view_end) {
            return;
        }
        self.view_start = start;
        self.view_end = end;
        self.view_changed.emit(self, ());
    }

    /// Scale the view around `origin` (0.0 = left edge, 1.0 = right edge)
    pub fn zoom_view(&mut self, factor: f64, origin: f64) {
        if factor <= 0.0 {
            return;
        }
        let size = self.view_size() as f64;
        let pivot = self.view_start as f64 + size * origin.clamp(0.0, 1.0);
        let new_size = size / factor;
        let start = pivot - new_size * origin.clamp(0.0, 1.0);
        self.view(start.round() as i64, (start + new_size).round() as i64);
    }

    /// Pan the view, keeping its size when bounds would cut it
    pub fn move_view(&mut self, distance: i64) {
        let size = self.view_size();
        let mut start = self.view_start + distance;
        if let Some((min, max)) = self.bounds {
            start = start.clamp(min, (max - size).max(min));
        }
        self.view(start, start + size);
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    pub fn selection_start(&self) -> Option<i64> {
        self.selection.map(|(start, _)| start)
    }

    pub fn selection_end(&self) -> Option<i64> {
        self.selection.map(|(_, end)| end)
    }

    /// Select `start..end`; the bounds are ordered
    pub fn select(&mut self, start: i64, end: i64) {
        let selection = Some((start.min(end), start.max(end)));
        if selection == self.selection {
            return;
        }
        self.selection = selection;
        self.selection_changed.emit(self, ());
    }

    pub fn unselect(&mut self) {
        if self.selection.take().is_some() {
            self.selection_changed.emit(self, ());
        }
    }

    /// Mirror a grid selection
    ///
    /// With exactly one selected row the view centers on it with
    /// [`FOLLOW_MARGIN`] on each side and the selection covers it; any other
    /// selection clears the audio selection.
    pub fn follow_selection(&mut self, selected: &[usize], lines: &EventCollection) {
        match selected {
            [index] => match lines.get(*index) {
                Some(record) => {
                    let (start, end) = (record.start, record.end);
                    self.view(start - FOLLOW_MARGIN, end + FOLLOW_MARGIN);
                    self.select(start, end);
                }
                None => self.unselect(),
            },
            _ => self.unselect(),
        }
    }

    /// Horizontal pixel for `pts` in a view `width` pixels wide
    pub fn pts_to_x(&self, pts: i64, width: usize) -> f64 {
        let size = self.view_size();
        if size <= 0 {
            return 0.0;
        }
        (pts - self.view_start) as f64 * width as f64 / size as f64
    }

    /// Timestamp under pixel `x` in a view `width` pixels wide
    pub fn pts_from_x(&self, x: usize, width: usize) -> i64 {
        if width == 0 {
            return self.view_start;
        }
        self.view_start + (x as i64 * self.view_size()) / width as i64
    }
}
