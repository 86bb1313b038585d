//! Selection commands for the subtitle grid

use super::{Command, CommandRegistry};
use crate::core::Result;
use crate::editor::Editor;

pub(crate) fn register(registry: &mut CommandRegistry) {
    registry.register_unit::<SelectPrevSubtitle>();
    registry.register_unit::<SelectNextSubtitle>();
    registry.register_unit::<SelectAll>();
    registry.register_unit::<SelectNothing>();
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SelectPrevSubtitle;

impl Command for SelectPrevSubtitle {
    fn name(&self) -> &'static str {
        "grid/select-prev-subtitle"
    }

    fn menu_name(&self) -> String {
        "Select previous subtitle".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        !editor.subs.lines().is_empty()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let len = editor.subs.lines().len();
        let target = match editor.subs.selection().first() {
            Some(first) => first.saturating_sub(1),
            None => len.saturating_sub(1),
        };
        editor.subs.set_selection([target])
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SelectNextSubtitle;

impl Command for SelectNextSubtitle {
    fn name(&self) -> &'static str {
        "grid/select-next-subtitle"
    }

    fn menu_name(&self) -> String {
        "Select next subtitle".to_string()
    }

    fn enabled(&self, editor: &Editor) -> bool {
        !editor.subs.lines().is_empty()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let len = editor.subs.lines().len();
        let target = match editor.subs.selection().last() {
            Some(last) => (last + 1).min(len.saturating_sub(1)),
            None => 0,
        };
        editor.subs.set_selection([target])
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SelectAll;

impl Command for SelectAll {
    fn name(&self) -> &'static str {
        "grid/select-all"
    }

    fn menu_name(&self) -> String {
        "Select all subtitles".to_string()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        let len = editor.subs.lines().len();
        editor.subs.set_selection(0..len)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SelectNothing;

impl Command for SelectNothing {
    fn name(&self) -> &'static str {
        "grid/select-nothing"
    }

    fn menu_name(&self) -> String {
        "Clear selection".to_string()
    }

    fn run(&self, editor: &mut Editor) -> Result<()> {
        editor.subs.set_selection([])
    }
}
