use std::env;
use std::path::PathBuf;

use crate::cli::{Cli, OutputFormat};

pub const DUMP_PATH_ENV: &str = "IL2CPP_DUMP_PATH";
pub const DEFAULT_DUMP_DIR: &str = "game_il2cpp_dump";

pub fn resolve_dump_path(cli: &Cli) -> PathBuf {
    if let Some(p) = cli.path.clone() {
        return p;
    }

    if let Ok(p) = env::var(DUMP_PATH_ENV)
        && !p.trim().is_empty()
    {
        return PathBuf::from(p);
    }

    PathBuf::from(DEFAULT_DUMP_DIR)
}

pub fn resolve_output_format(cli: &Cli) -> OutputFormat {
    if cli.ts {
        OutputFormat::Ts
    } else if cli.json {
        OutputFormat::Json
    } else {
        cli.format
    }
}

/// `None` means no truncation.
pub fn resolve_limit(cli: &Cli) -> Option<usize> {
    (cli.limit > 0).then_some(cli.limit)
}

/// REPL history location; `None` disables history.
pub fn history_path() -> Option<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::cache_dir)
        .or_else(dirs::home_dir)?;
    Some(base.join("il2cpp-finder").join("history.txt"))
}
