//! Commands that restructure or rewrite selected subtitles

use super::dialog::{DialogRequest, DialogResponse};
use super::{Command, CommandRegistry};
use crate::core::Result;
use crate::editor::Editor;
use subline_core::{EventRecord, DEFAULT_STYLE};
use tracing::debug;

pub(crate) fn register(registry: &mut CommandRegistry) {
    registry.register_unit::<Undo>();
    registry.register_unit::<Redo>();
    registry.register_unit::<InsertAbove>();
    registry.register_unit::<InsertBelow>();
    registry.register_unit::<Duplicate>();
    registry.register_unit::<Delete>();
    registry.register_unit::<SwapTextAndNotes>();
    registry.register_unit::<SplitSubAtVideo>();
    registry.register_unit::<JoinSubsKeepFirst>();
    registry.register_unit::<JoinSubsConcatenate>();
    registry.register_unit::<ShiftSubsWithGui>();
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Undo;

impl Command for Undo {
    fn name(&self) -> &'static str {
        "edit/undo"
    }

    fn menu_name(&self) -> String {
        "Undo".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.subs.has_undo()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        editor.subs.undo()?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Redo;

impl Command for Redo {
    fn name(&self) -> &'static str {
        "edit/redo"
    }

    fn menu_name(&self) -> String {
        "Redo".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.subs.has_redo()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        editor.subs.redo()?;
        Ok(())
    }
}

/// New subtitle ending where the first selected one starts
#[derive(Debug, Default, Clone, Copy)]
pub struct InsertAbove;

impl Command for InsertAbove {
    fn name(&self) -> &'static str {
        "edit/insert-above"
    }

    fn menu_name(&self) -> String {
        "Insert subtitle (above)".to_string()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let duration = editor.options.general.subs.default_duration;
        let lines = editor.subs.lines();
        let (index, prev, current) = match editor.subs.selection().first() {
            Some(index) => (
                index,
                lines.prev(index).map(|record| record.end),
                lines.get(index).map(|record| record.start),
            ),
            None => (0, None, None),
        };

        let end = current.unwrap_or(duration);
        let mut start = (end - duration).max(0);
        if let Some(prev_end) = prev {
            start = start.max(prev_end);
        }
        let start = start.min(end);

        let mut edit = editor.subs.bulk(&self.menu_name());
        edit.insert_one(index, EventRecord::new(start, end).with_style(DEFAULT_STYLE))?;
        edit.set_selection([index])
    }
}

/// New subtitle starting where the last selected one ends
#[derive(Debug, Default, Clone, Copy)]
pub struct InsertBelow;

impl Command for InsertBelow {
    fn name(&self) -> &'static str {
        "edit/insert-below"
    }

    fn menu_name(&self) -> String {
        "Insert subtitle (below)".to_string()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let duration = editor.options.general.subs.default_duration;
        let lines = editor.subs.lines();
        let (index, current) = match editor.subs.selection().last() {
            Some(index) => (index + 1, lines.get(index).map(|record| record.end)),
            None => (0, None),
        };
        let next = lines.get(index).map(|record| record.start);

        let start = current.unwrap_or(0);
        let mut end = start + duration;
        if let Some(next_start) = next {
            end = end.min(next_start);
        }
        let end = end.max(start);

        let mut edit = editor.subs.bulk(&self.menu_name());
        edit.insert_one(index, EventRecord::new(start, end).with_style(DEFAULT_STYLE))?;
        edit.set_selection([index])
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Duplicate;

impl Command for Duplicate {
    fn name(&self) -> &'static str {
        "edit/duplicate"
    }

    fn menu_name(&self) -> String {
        "Duplicate selected subtitles".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.subs.has_selection()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let selected = editor.subs.selected_indices().to_vec();
        let mut edit = editor.subs.bulk(&self.menu_name());

        // Copies go in bottom-up; each copy above shifts the later ones down
        let mut duplicates = Vec::with_capacity(selected.len());
        for &index in selected.iter().rev() {
            let copy = edit.lines().at(index)?.clone();
            edit.insert_one(index + 1, copy)?;
            duplicates.push(index + selected.len() - duplicates.len());
        }
        edit.set_selection(duplicates)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Delete;

impl Command for Delete {
    fn name(&self) -> &'static str {
        "edit/delete"
    }

    fn menu_name(&self) -> String {
        "Delete selected subtitles".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.subs.has_selection()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let selected = editor.subs.selected_indices().to_vec();
        let mut edit = editor.subs.bulk(&self.menu_name());
        for &index in selected.iter().rev() {
            edit.remove(index, 1)?;
        }
        edit.set_selection([])
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SwapTextAndNotes;

impl Command for SwapTextAndNotes {
    fn name(&self) -> &'static str {
        "edit/swap-text-and-notes"
    }

    fn menu_name(&self) -> String {
        "Swap notes with subtitle text".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.subs.has_selection()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let selected = editor.subs.selected_indices().to_vec();
        let mut edit = editor.subs.bulk(&self.menu_name());
        for index in selected {
            edit.update(index, |record| {
                core::mem::swap(&mut record.text, &mut record.note);
            })?;
        }
        Ok(())
    }
}

/// Cut the selected subtitle in two at the video position
#[derive(Debug, Default, Clone, Copy)]
pub struct SplitSubAtVideo;

impl Command for SplitSubAtVideo {
    fn name(&self) -> &'static str {
        "edit/split-sub-at-video"
    }

    fn menu_name(&self) -> String {
        "Split selected subtitle at video frame".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.subs.selection().len() == 1 && editor.video.current_pts().is_some()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let (Some(index), Some(pts)) = (editor.subs.selection().first(), editor.video.current_pts())
        else {
            return Ok(());
        };
        let record = editor.subs.lines().at(index)?.clone();
        if pts < record.start || pts > record.end {
            debug!(pts, start = record.start, end = record.end, "split point outside subtitle");
            return Ok(());
        }

        let mut edit = editor.subs.bulk(&self.menu_name());
        edit.insert_one(index + 1, record)?;
        edit.update(index, |record| record.end = pts)?;
        edit.update(index + 1, |record| record.start = pts)?;
        edit.set_selection([index, index + 1])
    }
}

/// Extend the first selected subtitle over the others and drop them
#[derive(Debug, Default, Clone, Copy)]
pub struct JoinSubsKeepFirst;

impl Command for JoinSubsKeepFirst {
    fn name(&self) -> &'static str {
        "edit/join-subs/keep-first"
    }

    fn menu_name(&self) -> String {
        "Join subtitles (keep first)".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.subs.selection().len() > 1
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let selected = editor.subs.selected_indices().to_vec();
        let [first, rest @ ..] = selected.as_slice() else {
            return Ok(());
        };
        let Some(&last) = rest.last() else {
            return Ok(());
        };

        let mut edit = editor.subs.bulk(&self.menu_name());
        let end = edit.lines().at(last)?.end;
        edit.update(*first, |record| record.end = end)?;
        for &index in rest.iter().rev() {
            edit.remove(index, 1)?;
        }
        edit.set_selection([*first])
    }
}

/// Join selected subtitles, appending their text and notes to the first
#[derive(Debug, Default, Clone, Copy)]
pub struct JoinSubsConcatenate;

impl Command for JoinSubsConcatenate {
    fn name(&self) -> &'static str {
        "edit/join-subs/concatenate"
    }

    fn menu_name(&self) -> String {
        "Join subtitles (concatenate)".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.subs.selection().len() > 1
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let selected = editor.subs.selected_indices().to_vec();
        let [first, rest @ ..] = selected.as_slice() else {
            return Ok(());
        };
        let Some(&last) = rest.last() else {
            return Ok(());
        };

        let mut edit = editor.subs.bulk(&self.menu_name());
        let end = edit.lines().at(last)?.end;
        let mut text = String::new();
        let mut note = String::new();
        for &index in rest {
            let record = edit.lines().at(index)?;
            text.push_str(&record.text);
            note.push_str(&record.note);
        }

        for &index in rest.iter().rev() {
            edit.remove(index, 1)?;
        }
        edit.update(*first, |record| {
            record.end = end;
            record.text.push_str(&text);
            record.note.push_str(&note);
        })?;
        edit.set_selection([*first])
    }
}

/// Move selected subtitles by an amount asked from the user
#[derive(Debug, Default, Clone, Copy)]
pub struct ShiftSubsWithGui;

impl Command for ShiftSubsWithGui {
    fn name(&self) -> &'static str {
        "edit/shift-subs-with-gui"
    }

    fn menu_name(&self) -> String {
        "Shift times...".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.subs.has_selection()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let request = DialogRequest::TimeJump {
            value: 0,
            relative_checked: true,
        };
        let Some(DialogResponse::TimeJump { value, is_relative }) = editor.ask(request) else {
            return Ok(());
        };

        let selected = editor.subs.selected_indices().to_vec();
        let Some(&first) = selected.first() else {
            return Ok(());
        };
        let delta = if is_relative {
            value
        } else {
            value - editor.subs.lines().at(first)?.start
        };

        let mut edit = editor.subs.bulk(&self.menu_name());
        for index in selected {
            edit.update(index, |record| {
                record.start += delta;
                record.end += delta;
            })?;
        }
        Ok(())
    }
}
