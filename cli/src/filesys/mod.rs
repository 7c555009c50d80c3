//! Filesystem helpers

pub mod file;

use std::path::{Path, PathBuf};

/// Walk up from `start` and return the first directory containing `name`
pub fn find_in_ancestors(start: &Path, name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(name).exists())
        .map(Path::to_path_buf)
}
