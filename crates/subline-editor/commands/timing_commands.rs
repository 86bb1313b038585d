//! Commands that retime subtitles or adjust the audio selection

use super::{Command, CommandRegistry};
use crate::core::Result;
use crate::editor::Editor;

pub(crate) fn register(registry: &mut CommandRegistry) {
    registry.register_unit::<SnapSubsStartToVideo>();
    registry.register_unit::<SnapSubsEndToVideo>();
    registry.register_unit::<SnapSubsToVideo>();
    registry.register_unit::<SnapSubsStartToPrevSub>();
    registry.register_unit::<SnapSubsEndToNextSub>();
    registry.register_delta("edit/shift-subs-start", |ms| ShiftSubsStart { ms });
    registry.register_delta("edit/shift-subs-end", |ms| ShiftSubsEnd { ms });
    registry.register_delta("edit/shift-subs", |ms| ShiftSubs { ms });
    registry.register_delta("edit/move-sel-start", |ms| MoveSelStart { ms });
    registry.register_delta("edit/move-sel-end", |ms| MoveSelEnd { ms });
    registry.register_unit::<CommitSel>();
    registry.register_unit::<GlueSelStart>();
    registry.register_unit::<GlueSelEnd>();
}

/// Write `edit` into every selected record as one undo unit
fn retime_selected<F>(editor: &mut Editor, description: &str, mut edit: F) -> Result<()>
where
    F: FnMut(&mut subline_core::EventRecord),
{
    let selected = editor.subs.selected_indices().to_vec();
    let mut bulk = editor.subs.bulk(description);
    for index in selected {
        bulk.update(index, &mut edit)?;
    }
    Ok(())
}

fn video_ready(editor: &Editor) -> bool {
    editor.subs.has_selection() && editor.video.current_pts().is_some()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SnapSubsStartToVideo;

impl Command for SnapSubsStartToVideo {
    fn name(&self) -> &'static str {
        "edit/snap-subs-start-to-video"
    }

    fn menu_name(&self) -> String {
        "Snap subtitles start to video".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        video_ready(editor)
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let Some(pts) = editor.video.current_pts() else {
            return Ok(());
        };
        retime_selected(editor, &self.menu_name(), |record| record.start = pts)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SnapSubsEndToVideo;

impl Command for SnapSubsEndToVideo {
    fn name(&self) -> &'static str {
        "edit/snap-subs-end-to-video"
    }

    fn menu_name(&self) -> String {
        "Snap subtitles end to video".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        video_ready(editor)
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let Some(pts) = editor.video.current_pts() else {
            return Ok(());
        };
        retime_selected(editor, &self.menu_name(), |record| record.end = pts)
    }
}

/// Start at the video position and last the default duration
#[derive(Debug, Default, Clone, Copy)]
pub struct SnapSubsToVideo;

impl Command for SnapSubsToVideo {
    fn name(&self) -> &'static str {
        "edit/snap-subs-to-video"
    }

    fn menu_name(&self) -> String {
        "Snap subtitles to video".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        video_ready(editor)
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let Some(pts) = editor.video.current_pts() else {
            return Ok(());
        };
        let duration = editor.options.general.subs.default_duration;
        retime_selected(editor, &self.menu_name(), |record| {
            record.start = pts;
            record.end = pts + duration;
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SnapSubsStartToPrevSub;

impl SnapSubsStartToPrevSub {
    fn anchor(editor: &Editor) -> Option<i64> {
        let first = editor.subs.selection().first()?;
        editor.subs.lines().prev(first).map(|record| record.end)
    }
}

impl Command for SnapSubsStartToPrevSub {
    fn name(&self) -> &'static str {
        "edit/snap-subs-start-to-prev-sub"
    }

    fn menu_name(&self) -> String {
        "Snap subtitles start to previous subtitle".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        Self::anchor(editor).is_some()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let Some(end) = Self::anchor(editor) else {
            return Ok(());
        };
        retime_selected(editor, &self.menu_name(), |record| record.start = end)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SnapSubsEndToNextSub;

impl SnapSubsEndToNextSub {
    fn anchor(editor: &Editor) -> Option<i64> {
        let last = editor.subs.selection().last()?;
        editor.subs.lines().next(last).map(|record| record.start)
    }
}

impl Command for SnapSubsEndToNextSub {
    fn name(&self) -> &'static str {
        "edit/snap-subs-end-to-next-sub"
    }

    fn menu_name(&self) -> String {
        "Snap subtitles end to next subtitle".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        Self::anchor(editor).is_some()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let Some(start) = Self::anchor(editor) else {
            return Ok(());
        };
        retime_selected(editor, &self.menu_name(), |record| record.end = start)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ShiftSubsStart {
    pub ms: i64,
}

impl Command for ShiftSubsStart {
    fn name(&self) -> &'static str {
        "edit/shift-subs-start"
    }

    fn menu_name(&self) -> String {
        format!("Shift subtitles start ({:+} ms)", self.ms)
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.subs.has_selection()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let ms = self.ms;
        retime_selected(editor, &self.menu_name(), |record| {
            record.start = (record.start + ms).max(0);
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ShiftSubsEnd {
    pub ms: i64,
}

impl Command for ShiftSubsEnd {
    fn name(&self) -> &'static str {
        "edit/shift-subs-end"
    }

    fn menu_name(&self) -> String {
        format!("Shift subtitles end ({:+} ms)", self.ms)
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.subs.has_selection()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let ms = self.ms;
        retime_selected(editor, &self.menu_name(), |record| {
            record.end = (record.end + ms).max(0);
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ShiftSubs {
    pub ms: i64,
}

impl Command for ShiftSubs {
    fn name(&self) -> &'static str {
        "edit/shift-subs"
    }

    fn menu_name(&self) -> String {
        format!("Shift subtitles ({:+} ms)", self.ms)
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.subs.has_selection()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let ms = self.ms;
        retime_selected(editor, &self.menu_name(), |record| {
            record.start = (record.start + ms).max(0);
            record.end = (record.end + ms).max(0);
        })
    }
}

/// Move the audio selection start; never past its end
#[derive(Debug, Clone, Copy)]
pub struct MoveSelStart {
    pub ms: i64,
}

impl Command for MoveSelStart {
    fn name(&self) -> &'static str {
        "edit/move-sel-start"
    }

    fn menu_name(&self) -> String {
        format!("Shift selection start ({:+} ms)", self.ms)
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.audio().has_selection()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let mut audio = editor.audio_mut();
        if let (Some(start), Some(end)) = (audio.selection_start(), audio.selection_end()) {
            audio.select((start + self.ms).clamp(0, end.max(0)), end);
        }
        Ok(())
    }
}

/// Move the audio selection end; never before its start
#[derive(Debug, Clone, Copy)]
pub struct MoveSelEnd {
    pub ms: i64,
}

impl Command for MoveSelEnd {
    fn name(&self) -> &'static str {
        "edit/move-sel-end"
    }

    fn menu_name(&self) -> String {
        format!("Shift selection end ({:+} ms)", self.ms)
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.audio().has_selection()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let mut audio = editor.audio_mut();
        if let (Some(start), Some(end)) = (audio.selection_start(), audio.selection_end()) {
            audio.select(start, (end + self.ms).max(start));
        }
        Ok(())
    }
}

/// Write the audio selection into every selected subtitle
#[derive(Debug, Default, Clone, Copy)]
pub struct CommitSel;

impl Command for CommitSel {
    fn name(&self) -> &'static str {
        "edit/commit-sel"
    }

    fn menu_name(&self) -> String {
        "Commit selection to subtitle".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.subs.has_selection() && editor.audio().has_selection()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let span = {
            let audio = editor.audio();
            audio.selection_start().zip(audio.selection_end())
        };
        let Some((start, end)) = span else {
            return Ok(());
        };
        retime_selected(editor, &self.menu_name(), |record| {
            record.start = start;
            record.end = end;
        })
    }
}

/// Snap the audio selection start to the previous subtitle's end
#[derive(Debug, Default, Clone, Copy)]
pub struct GlueSelStart;

impl Command for GlueSelStart {
    fn name(&self) -> &'static str {
        "edit/glue-sel-start"
    }

    fn menu_name(&self) -> String {
        "Glue selection start to previous subtitle".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.audio().has_selection() && SnapSubsStartToPrevSub::anchor(editor).is_some()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let Some(prev_end) = SnapSubsStartToPrevSub::anchor(editor) else {
            return Ok(());
        };
        let mut audio = editor.audio_mut();
        if let Some(end) = audio.selection_end() {
            audio.select(prev_end, end);
        }
        Ok(())
    }
}

/// Snap the audio selection end to the next subtitle's start
#[derive(Debug, Default, Clone, Copy)]
pub struct GlueSelEnd;

impl Command for GlueSelEnd {
    fn name(&self) -> &'static str {
        "edit/glue-sel-end"
    }

    fn menu_name(&self) -> String {
        "Glue selection end to next subtitle".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        editor.audio().has_selection() && SnapSubsEndToNextSub::anchor(editor).is_some()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let Some(next_start) = SnapSubsEndToNextSub::anchor(editor) else {
            return Ok(());
        };
        let mut audio = editor.audio_mut();
        if let Some(start) = audio.selection_start() {
            audio.select(start, next_start);
        }
        Ok(())
    }
}
