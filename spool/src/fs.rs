//! Directory helpers: path preparation, listing, and oldest-first eviction.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A regular file seen by [`list_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub len: u64,
}

/// Create `path` (and its parent directories) if missing. Existing files are
/// left untouched.
pub fn ensure_file(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    Ok(())
}

pub fn ensure_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// List regular, non-hidden files in `dir`, oldest modification time first.
///
/// Equal timestamps are ordered by path. A missing directory lists as empty.
pub fn list_files(dir: &Path) -> io::Result<Vec<FileEntry>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        // Follows symlinks. Entry may vanish between readdir and stat
        let meta = match fs::metadata(entry.path()) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        if !meta.is_file() {
            continue;
        }
        files.push(FileEntry {
            path: entry.path(),
            modified: meta.modified()?,
            len: meta.len(),
        });
    }

    files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}

/// Total size of `files` in bytes.
pub fn total_len(files: &[FileEntry]) -> u64 {
    files.iter().map(|f| f.len).sum()
}

/// Delete files oldest-first until their total size is at most `cap`.
///
/// `files` must be sorted oldest-first (as returned by [`list_files`]).
/// `keep` is never deleted. Returns the removed paths in deletion order.
pub fn evict_oldest(files: &[FileEntry], cap: u64, keep: Option<&Path>) -> io::Result<Vec<PathBuf>> {
    let mut total = total_len(files);
    let mut removed = Vec::new();

    for file in files {
        if total <= cap {
            break;
        }
        if keep == Some(file.path.as_path()) {
            continue;
        }
        match fs::remove_file(&file.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        total -= file.len;
        removed.push(file.path.clone());
    }

    Ok(removed)
}
