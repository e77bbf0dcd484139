//! Reads a dump from disk and hands its lines to the parser.
//!
//! Dumps of large games run to hundreds of megabytes, so the file is
//! memory-mapped instead of copied into a buffer first.

use anyhow::{Context, Result};
use memmap2::Mmap;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::model::ClassEntry;
use crate::parse::parse_dump;

#[derive(Debug, Clone)]
pub struct LoadedDump {
    pub path: PathBuf,
    pub content_hash: String,
    pub line_count: usize,
    pub classes: Vec<ClassEntry>,
    pub duration_ms: u64,
}

pub fn load_dump(path: &Path) -> Result<LoadedDump> {
    let start = Instant::now();
    let file =
        File::open(path).with_context(|| format!("Failed to open dump: {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("Failed to read dump metadata: {}", path.display()))?
        .len();

    let (classes, line_count, content_hash) = if len == 0 {
        (Vec::new(), 0, hash_content(&[]))
    } else {
        // SAFETY: The file is opened read-only and the map is dropped before
        // this function returns. Concurrent truncation by another process is
        // outside what this tool guards against.
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to mmap dump: {}", path.display()))?;
        let text = String::from_utf8_lossy(&mmap);
        (parse_dump(&text), text.lines().count(), hash_content(&mmap))
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        path = %path.display(),
        content_hash = %content_hash,
        lines = line_count,
        classes = classes.len(),
        duration_ms,
        "dump loaded"
    );

    Ok(LoadedDump {
        path: path.to_path_buf(),
        content_hash,
        line_count,
        classes,
        duration_ms,
    })
}

pub fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
