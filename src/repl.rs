use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::Path;
use tracing::debug;

use crate::cli::OutputFormat;
use crate::command;
use crate::search::SearchIndex;

const PROMPT: &str = "> ";

/// Reads commands until `exit`, `quit`, Ctrl-C or end of input.
///
/// A failing command prints its error and the loop carries on.
pub fn run(
    index: &SearchIndex,
    format: OutputFormat,
    limit: Option<usize>,
    history: Option<&Path>,
) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    if let Some(path) = history
        && let Err(err) = editor.load_history(path)
    {
        debug!(path = %path.display(), error = %err, "no REPL history loaded");
    }

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(input);
        if is_exit(input) {
            break;
        }

        match command::run(index, input, format, limit) {
            Ok(output) => print!("{output}"),
            Err(err) => println!("{err}"),
        }
    }

    if let Some(path) = history {
        save_history(&mut editor, path);
    }
    Ok(())
}

fn is_exit(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn save_history(editor: &mut DefaultEditor, path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(err) = std::fs::create_dir_all(parent)
    {
        debug!(path = %parent.display(), error = %err, "cannot create history directory");
        return;
    }
    if let Err(err) = editor.save_history(path) {
        debug!(path = %path.display(), error = %err, "cannot save REPL history");
    }
}
