//! `subline` command-line driver
//!
//! Loads a JSON subtitle document, applies a selection and video position,
//! runs editor commands by name, prints the resulting grid and optionally
//! saves the document.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fmt::Write as _;
use std::path::PathBuf;
use subline_editor::views::{GridColumn, GridModel};
use subline_editor::{
    load_document, save_document, CommandArg, CommandOutcome, CommandRegistry, Editor, Options,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Edit subtitle documents from the command line
#[derive(Parser, Debug)]
#[command(name = "subline", version, about, long_about = None)]
struct Cli {
    /// JSON document to open
    document: PathBuf,

    /// Rows to select before running commands, e.g. `0,1`
    #[arg(long, value_delimiter = ',')]
    select: Vec<usize>,

    /// Video position in milliseconds
    #[arg(long)]
    pts: Option<i64>,

    /// Command to run, name followed by arguments; may be repeated
    #[arg(long = "run", value_name = "COMMAND")]
    commands: Vec<String>,

    /// Where to save the result
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Options directory (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let options = load_options(cli.config.as_ref())?;
    let registry = CommandRegistry::with_core_commands();
    for name in options.unknown_commands(&registry) {
        warn!(command = %name, "options refer to an unknown command");
    }
    let max_cps = options.general.subs.max_characters_per_second;

    let mut editor = Editor::new(options);
    load_document(&mut editor.subs, &cli.document)
        .with_context(|| format!("cannot open {}", cli.document.display()))?;
    let grid = GridModel::attach(editor.subs.lines(), max_cps);

    if !cli.select.is_empty() {
        editor.subs.set_selection(cli.select.iter().copied())?;
    }
    if let Some(pts) = cli.pts {
        editor.video.seek(pts);
    }

    for spec in &cli.commands {
        let (name, args) = parse_invocation(spec)?;
        match registry.execute(&mut editor, &name, &args)? {
            CommandOutcome::Ran => info!(command = %name, "done"),
            CommandOutcome::Disabled => eprintln!("{name}: not available right now"),
        }
    }

    print!("{}", render_table(&editor, &grid));

    if let Some(output) = &cli.output {
        save_document(&mut editor.subs, output)
            .with_context(|| format!("cannot save {}", output.display()))?;
    }
    Ok(())
}

fn load_options(location: Option<&PathBuf>) -> Result<Options> {
    let location = match location {
        Some(location) => Some(location.clone()),
        None => Options::default_location().filter(|location| location.exists()),
    };
    match location {
        Some(location) => Options::load(&location)
            .with_context(|| format!("cannot read options from {}", location.display())),
        None => Ok(Options::default()),
    }
}

/// Split `"edit/shift-subs -250"` into a name and arguments
fn parse_invocation(spec: &str) -> Result<(String, Vec<CommandArg>)> {
    let mut words = spec.split_whitespace();
    let Some(name) = words.next() else {
        bail!("empty command");
    };
    Ok((name.to_string(), words.map(CommandArg::parse).collect()))
}

/// Grid as plain text; selected rows are marked with `*`
fn render_table(editor: &Editor, grid: &GridModel) -> String {
    let lines = editor.subs.lines();
    let rows: Vec<Vec<String>> = (0..grid.row_count())
        .filter_map(|index| grid.row(index, lines).map(|row| (index, row)))
        .map(|(index, row)| {
            let marker = if editor.subs.selection().contains(index) {
                "*"
            } else {
                " "
            };
            let mut cells = vec![format!("{marker}{}", row.number)];
            cells.extend(GridColumn::ALL.iter().map(|&column| row.cell(column).to_string()));
            cells
        })
        .collect();

    let mut header = vec!["#".to_string()];
    header.extend(grid.headers().into_iter().map(str::to_string));

    let mut widths: Vec<usize> = header.iter().map(|cell| cell.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&header).chain(&rows) {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        let _ = writeln!(out, "{}", cells.join("  ").trim_end());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use subline_core::EventRecord;

    #[test]
    fn invocation_parsing() {
        let (name, args) = parse_invocation("edit/shift-subs -250").unwrap();
        assert_eq!(name, "edit/shift-subs");
        assert_eq!(args, vec![CommandArg::Int(-250)]);
        assert!(parse_invocation("   ").is_err());
    }

    #[test]
    fn table_marks_selected_rows() {
        let mut editor = Editor::new(Options::default());
        editor
            .subs
            .load(vec![
                EventRecord::new(0, 1300).with_text("Hello"),
                EventRecord::new(1300, 2000).with_text("{\\i1}world"),
            ])
            .unwrap();
        let grid = GridModel::attach(editor.subs.lines(), 15.0);
        editor.subs.set_selection([1]).unwrap();

        let table = render_table(&editor, &grid);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("#"));
        assert!(lines[1].starts_with(" 1"));
        assert!(lines[2].starts_with("*2"));
        assert!(lines[2].contains("\u{FF0A}world"));
    }

    #[test]
    fn cli_parses_repeated_commands() {
        let cli = Cli::parse_from([
            "subline",
            "doc.json",
            "--select",
            "0,1",
            "--run",
            "edit/join-subs/keep-first",
            "--run",
            "edit/shift-subs 100",
            "-o",
            "out.json",
        ]);
        assert_eq!(cli.select, vec![0, 1]);
        assert_eq!(cli.commands.len(), 2);
        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn end_to_end_on_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.json");
        subline_editor::save_records(
            &input,
            &[EventRecord::new(0, 1300), EventRecord::new(1300, 2000)],
        )
        .unwrap();

        let cli = Cli::parse_from([
            "subline".into(),
            input.clone().into_os_string(),
            "--select".into(),
            "0,1".into(),
            "--run".into(),
            "edit/join-subs/keep-first".into(),
            "--output".into(),
            output.clone().into_os_string(),
            "--config".into(),
            dir.path().join("no-options").into_os_string(),
        ]);
        run(cli).unwrap();

        let saved = subline_editor::load_records(&output).unwrap();
        assert_eq!(saved, vec![EventRecord::new(0, 2000)]);
    }
}
