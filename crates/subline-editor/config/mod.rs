//! Editor options
//!
//! Options live in three JSON files inside one directory: `general.json`
//! for tunables, `hotkey.json` for key bindings per context and `menu.json`
//! for the menu layout. A missing file keeps the built-in defaults.

use crate::cache::CacheConfig;
use crate::commands::{CommandArg, CommandRegistry};
use crate::core::{Result, UndoConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const GENERAL_FILE: &str = "general.json";
const HOTKEY_FILE: &str = "hotkey.json";
const MENU_FILE: &str = "menu.json";

/// Subtitle editing tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsOptions {
    /// Duration of freshly inserted subtitles in milliseconds
    pub default_duration: i64,
    /// Reading speed above which the grid flags a line
    pub max_characters_per_second: f64,
}

impl Default for SubsOptions {
    fn default() -> Self {
        Self {
            default_duration: 2000,
            max_characters_per_second: 15.0,
        }
    }
}

/// Audio view tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioOptions {
    /// Width of one spectrogram column in milliseconds
    pub spectrogram_resolution: i64,
    /// How often the spectrogram polls for finished columns, in milliseconds
    pub spectrogram_sync_interval: u64,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            spectrogram_resolution: 10,
            spectrogram_sync_interval: 65,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryOptions {
    /// Maximum retained undo units (0 = unlimited)
    pub max_units: usize,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            max_units: UndoConfig::default().max_units,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Worker threads per background cache
    pub workers: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            workers: CacheConfig::default().workers,
        }
    }
}

/// Contents of `general.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralOptions {
    pub subs: SubsOptions,
    pub audio: AudioOptions,
    pub history: HistoryOptions,
    pub cache: CacheOptions,
}

/// One key binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotkey {
    pub key: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<CommandArg>,
}

/// One menu entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MenuItem {
    Command {
        label: String,
        command: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<CommandArg>,
    },
    /// Encoded as `null`
    Separator,
}

/// A titled group of menu entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuSection {
    pub title: String,
    pub items: Vec<MenuItem>,
}

/// All editor options
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub general: GeneralOptions,
    /// Key bindings per context (`global`, `audio`)
    pub hotkeys: BTreeMap<String, Vec<Hotkey>>,
    pub menu: Vec<MenuSection>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            general: GeneralOptions::default(),
            hotkeys: default_hotkeys(),
            menu: default_menu(),
        }
    }
}

impl Options {
    /// Platform configuration directory for subline, if one exists
    pub fn default_location() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("subline"))
    }

    /// Load options from `location`, keeping defaults for missing files
    ///
    /// # Errors
    ///
    /// Fails if a present file cannot be read or parsed.
    pub fn load(location: &Path) -> Result<Self> {
        let mut options = Self::default();
        if let Some(general) = read_json(&location.join(GENERAL_FILE))? {
            options.general = general;
        }
        if let Some(hotkeys) = read_json(&location.join(HOTKEY_FILE))? {
            options.hotkeys = hotkeys;
        }
        if let Some(menu) = read_json(&location.join(MENU_FILE))? {
            options.menu = menu;
        }
        debug!(location = %location.display(), "options loaded");
        Ok(options)
    }

    /// Write all three files, creating `location` if needed
    pub fn save(&self, location: &Path) -> Result<()> {
        fs::create_dir_all(location)?;
        fs::write(
            location.join(GENERAL_FILE),
            serde_json::to_string_pretty(&self.general)?,
        )?;
        fs::write(
            location.join(HOTKEY_FILE),
            serde_json::to_string_pretty(&self.hotkeys)?,
        )?;
        fs::write(
            location.join(MENU_FILE),
            serde_json::to_string_pretty(&self.menu)?,
        )?;
        debug!(location = %location.display(), "options saved");
        Ok(())
    }

    /// History retention derived from these options
    pub fn undo_config(&self) -> UndoConfig {
        UndoConfig {
            max_units: self.general.history.max_units,
        }
    }

    /// Background cache configuration derived from these options
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            workers: self.general.cache.workers,
        }
    }

    /// Command names referenced by hotkeys or menu entries that `registry` lacks
    pub fn unknown_commands(&self, registry: &CommandRegistry) -> Vec<String> {
        let hotkey_commands = self
            .hotkeys
            .values()
            .flatten()
            .map(|hotkey| hotkey.command.as_str());
        let menu_commands = self
            .menu
            .iter()
            .flat_map(|section| &section.items)
            .filter_map(|item| match item {
                MenuItem::Command { command, .. } => Some(command.as_str()),
                MenuItem::Separator => None,
            });

        let mut unknown: Vec<String> = hotkey_commands
            .chain(menu_commands)
            .filter(|name| !registry.contains(name))
            .map(str::to_string)
            .collect();
        unknown.sort();
        unknown.dedup();
        unknown
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&text)?))
}

fn hotkey(key: &str, command: &str, args: &[i64]) -> Hotkey {
    Hotkey {
        key: key.to_string(),
        command: command.to_string(),
        args: args.iter().copied().map(CommandArg::Int).collect(),
    }
}

fn entry(label: &str, command: &str, args: &[i64]) -> MenuItem {
    MenuItem::Command {
        label: label.to_string(),
        command: command.to_string(),
        args: args.iter().copied().map(CommandArg::Int).collect(),
    }
}

fn default_hotkeys() -> BTreeMap<String, Vec<Hotkey>> {
    let global = vec![
        hotkey("Ctrl+K", "grid/select-prev-subtitle", &[]),
        hotkey("Ctrl+J", "grid/select-next-subtitle", &[]),
        hotkey("Ctrl+A", "grid/select-all", &[]),
        hotkey("Ctrl+Shift+A", "grid/select-nothing", &[]),
        hotkey("Ctrl+Z", "edit/undo", &[]),
        hotkey("Ctrl+Y", "edit/redo", &[]),
        hotkey("Ctrl+Return", "edit/insert-below", &[]),
        hotkey("Ctrl+Delete", "edit/delete", &[]),
    ];
    let audio = vec![
        hotkey("Shift+1", "edit/move-sel-start", &[-250]),
        hotkey("Shift+2", "edit/move-sel-start", &[250]),
        hotkey("Shift+3", "edit/move-sel-end", &[-250]),
        hotkey("Shift+4", "edit/move-sel-end", &[250]),
        hotkey("1", "edit/move-sel-start", &[-25]),
        hotkey("2", "edit/move-sel-start", &[25]),
        hotkey("3", "edit/move-sel-end", &[-25]),
        hotkey("4", "edit/move-sel-end", &[25]),
        hotkey("G", "edit/commit-sel", &[]),
        hotkey("K", "edit/insert-above", &[]),
        hotkey("J", "edit/insert-below", &[]),
        hotkey("Shift+K", "grid/select-prev-subtitle", &[]),
        hotkey("Shift+J", "grid/select-next-subtitle", &[]),
    ];

    BTreeMap::from([
        ("global".to_string(), global),
        ("audio".to_string(), audio),
    ])
}

fn default_menu() -> Vec<MenuSection> {
    vec![
        MenuSection {
            title: "&Playback".to_string(),
            items: vec![
                entry("Select previous subtitle", "grid/select-prev-subtitle", &[]),
                entry("Select next subtitle", "grid/select-next-subtitle", &[]),
                entry("Select all subtitles", "grid/select-all", &[]),
                entry("Clear selection", "grid/select-nothing", &[]),
            ],
        },
        MenuSection {
            title: "&Edit".to_string(),
            items: vec![
                entry("Undo", "edit/undo", &[]),
                entry("Redo", "edit/redo", &[]),
                MenuItem::Separator,
                entry("Glue selection start to previous subtitle", "edit/glue-sel-start", &[]),
                entry("Glue selection end to next subtitle", "edit/glue-sel-end", &[]),
                entry("Shift selected subtitles", "edit/shift-subs-with-gui", &[]),
                entry("Shift selection start (-250 ms)", "edit/move-sel-start", &[-250]),
                entry("Shift selection start (+250 ms)", "edit/move-sel-start", &[250]),
                entry("Shift selection end (-250 ms)", "edit/move-sel-end", &[-250]),
                entry("Shift selection end (+250 ms)", "edit/move-sel-end", &[250]),
                entry("Shift selection start (-25 ms)", "edit/move-sel-start", &[-25]),
                entry("Shift selection start (+25 ms)", "edit/move-sel-start", &[25]),
                entry("Shift selection end (-25 ms)", "edit/move-sel-end", &[-25]),
                entry("Shift selection end (+25 ms)", "edit/move-sel-end", &[25]),
                entry("Commit selection to subtitle", "edit/commit-sel", &[]),
                MenuItem::Separator,
                entry("Add new subtitle above current line", "edit/insert-above", &[]),
                entry("Add new subtitle below current line", "edit/insert-below", &[]),
                entry("Duplicate selected subtitles", "edit/duplicate", &[]),
                entry("Delete selected subtitles", "edit/delete", &[]),
                entry("Swap notes with subtitle text", "edit/swap-text-and-notes", &[]),
                entry("Split selection at current video frame", "edit/split-sub-at-video", &[]),
                entry("Join subtitles (keep first)", "edit/join-subs/keep-first", &[]),
                entry("Join subtitles (concatenate)", "edit/join-subs/concatenate", &[]),
                MenuItem::Separator,
                entry("Snap start to video", "edit/snap-subs-start-to-video", &[]),
                entry("Snap end to video", "edit/snap-subs-end-to-video", &[]),
                entry("Snap to video", "edit/snap-subs-to-video", &[]),
                entry("Snap start to previous subtitle", "edit/snap-subs-start-to-prev-sub", &[]),
                entry("Snap end to next subtitle", "edit/snap-subs-end-to-next-sub", &[]),
            ],
        },
    ]
}
