//! Named editor commands
//!
//! Commands are trait objects created by name from a [`CommandRegistry`].
//! A command reports whether it can run against the current editor state
//! ([`Command::enabled`]) and performs its work in [`Command::run`],
//! normally inside one bulk scope so it undoes as a single step.
//!
//! # Examples
//!
//! ```rust
//! use subline_core::EventRecord;
//! use subline_editor::commands::{CommandOutcome, CommandRegistry};
//! use subline_editor::{Editor, Options};
//!
//! let registry = CommandRegistry::with_core_commands();
//! let mut editor = Editor::new(Options::default());
//! editor.subs.load(vec![EventRecord::new(0, 1000)]).unwrap();
//! editor.subs.set_selection([0]).unwrap();
//!
//! let outcome = registry.execute(&mut editor, "edit/insert-below", &[]).unwrap();
//! assert_eq!(outcome, CommandOutcome::Ran);
//! assert_eq!(editor.subs.lines().len(), 2);
//! assert_eq!(editor.subs.lines()[1].start, 1000);
//! ```

pub mod dialog;
pub mod edit_commands;
pub mod grid_commands;
pub mod timing_commands;

pub use dialog::{DialogHost, DialogRequest, DialogResponse, NoDialogs, ScriptedDialogs};
pub use edit_commands::{
    Delete, Duplicate, InsertAbove, InsertBelow, JoinSubsConcatenate, JoinSubsKeepFirst, Redo,
    ShiftSubsWithGui, SplitSubAtVideo, SwapTextAndNotes, Undo,
};
pub use grid_commands::{SelectAll, SelectNextSubtitle, SelectNothing, SelectPrevSubtitle};
pub use timing_commands::{
    CommitSel, GlueSelEnd, GlueSelStart, MoveSelEnd, MoveSelStart, ShiftSubs, ShiftSubsEnd,
    ShiftSubsStart, SnapSubsEndToNextSub, SnapSubsEndToVideo, SnapSubsStartToPrevSub,
    SnapSubsStartToVideo, SnapSubsToVideo,
};

use crate::core::{EditorError, Result};
use crate::editor::Editor;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

/// Positional command argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandArg {
    Int(i64),
    Text(String),
}

impl CommandArg {
    /// Integers become [`CommandArg::Int`], anything else text
    pub fn parse(text: &str) -> Self {
        text.parse()
            .map_or_else(|_| Self::Text(text.to_string()), Self::Int)
    }
}

impl fmt::Display for CommandArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// An operation invocable by name
pub trait Command: fmt::Debug {
    /// Registry name, e.g. `edit/undo`
    fn name(&self) -> &'static str;

    /// Label for menus
    fn menu_name(&self) -> String {
        self.name().to_string()
    }

    /// Whether the command can run in the current state
    fn enabled(&self, _editor: &Editor) -> bool {
        true
    }

    /// Perform the command
    fn run(&self, editor: &mut Editor) -> Result<()>;
}

/// Builds a command from its arguments
pub type CommandFactory = Box<dyn Fn(&[CommandArg]) -> Result<Box<dyn Command>>>;

/// What happened to a command handed to [`CommandRegistry::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Ran,
    /// `enabled()` returned false; nothing was done
    Disabled,
}

/// Name table of command factories
///
/// Plugin registrations shadow core ones with the same name.
#[derive(Default)]
pub struct CommandRegistry {
    core: BTreeMap<String, CommandFactory>,
    plugins: BTreeMap<String, CommandFactory>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("core", &self.core.keys().collect::<Vec<_>>())
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in command
    pub fn with_core_commands() -> Self {
        let mut registry = Self::new();
        edit_commands::register(&mut registry);
        timing_commands::register(&mut registry);
        grid_commands::register(&mut registry);
        registry
    }

    /// Register a core command factory, replacing any previous one
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&[CommandArg]) -> Result<Box<dyn Command>> + 'static,
    {
        self.core.insert(name.to_string(), Box::new(factory));
    }

    /// Register a command that takes no arguments
    pub fn register_unit<C>(&mut self)
    where
        C: Command + Default + 'static,
    {
        let name = C::default().name();
        self.register(name, move |args| {
            expect_no_args(name, args)?;
            Ok(Box::new(C::default()))
        });
    }

    /// Register a command taking one millisecond delta
    pub fn register_delta<C>(&mut self, name: &'static str, build: fn(i64) -> C)
    where
        C: Command + 'static,
    {
        self.register(name, move |args| {
            let delta = int_arg(name, args)?;
            Ok(Box::new(build(delta)))
        });
    }

    /// Register a plugin command; shadows a core command of the same name
    pub fn register_plugin<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&[CommandArg]) -> Result<Box<dyn Command>> + 'static,
    {
        self.plugins.insert(name.to_string(), Box::new(factory));
    }

    /// Forget every plugin command
    pub fn clear_plugins(&mut self) {
        self.plugins.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name) || self.core.contains_key(name)
    }

    /// All registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .core
            .keys()
            .chain(self.plugins.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Instantiate a command
    ///
    /// # Errors
    ///
    /// [`EditorError::CommandNotFound`] for unknown names, or the factory's
    /// argument error.
    pub fn get(&self, name: &str, args: &[CommandArg]) -> Result<Box<dyn Command>> {
        let factory = self
            .plugins
            .get(name)
            .or_else(|| self.core.get(name))
            .ok_or_else(|| EditorError::CommandNotFound {
                name: name.to_string(),
            })?;
        factory(args)
    }

    /// Run a command if it is enabled, logging how long it took
    pub fn run(&self, editor: &mut Editor, command: &dyn Command) -> Result<CommandOutcome> {
        if !command.enabled(editor) {
            info!(command = command.name(), "not available right now");
            return Ok(CommandOutcome::Disabled);
        }

        info!(command = command.name(), "running");
        let started = Instant::now();
        command.run(editor)?;
        info!(
            command = command.name(),
            "ran in {:.02} s",
            started.elapsed().as_secs_f64()
        );
        Ok(CommandOutcome::Ran)
    }

    /// Instantiate and run a command by name
    pub fn execute(
        &self,
        editor: &mut Editor,
        name: &str,
        args: &[CommandArg],
    ) -> Result<CommandOutcome> {
        let command = self.get(name, args)?;
        self.run(editor, command.as_ref())
    }
}

pub(crate) fn expect_no_args(name: &str, args: &[CommandArg]) -> Result<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(EditorError::invalid_arguments(
            name,
            format!("expected no arguments, got {}", args.len()),
        ))
    }
}

pub(crate) fn int_arg(name: &str, args: &[CommandArg]) -> Result<i64> {
    match args {
        [CommandArg::Int(value)] => Ok(*value),
        [other] => Err(EditorError::invalid_arguments(
            name,
            format!("expected an integer, got {other:?}"),
        )),
        _ => Err(EditorError::invalid_arguments(
            name,
            format!("expected one argument, got {}", args.len()),
        )),
    }
}
