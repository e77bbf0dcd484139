use anyhow::{Result, bail};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

pub const DUMP_FILE_NAME: &str = "dump.cs";

/// Resolves a user-supplied path to the dump file.
///
/// A file is used as is. A folder resolves to its `dump.cs`, or failing that
/// to the shallowest `dump.cs` anywhere below it.
pub fn locate_dump(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    if !path.is_dir() {
        bail!("{DUMP_FILE_NAME} not found at {}", path.display());
    }

    let direct = path.join(DUMP_FILE_NAME);
    if direct.is_file() {
        return Ok(direct);
    }

    match find_dump_files(path).into_iter().next() {
        Some(found) => Ok(found),
        None => bail!("{DUMP_FILE_NAME} not found under {}", path.display()),
    }
}

/// Every `dump.cs` below `root`, shallowest first, then by path.
pub fn find_dump_files(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build();

    let mut found: Vec<PathBuf> = walker
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter(|entry| entry.file_name() == DUMP_FILE_NAME)
        .map(|entry| entry.into_path())
        .collect();

    found.sort_by(|a, b| {
        a.components()
            .count()
            .cmp(&b.components().count())
            .then_with(|| a.cmp(b))
    });
    found
}
