//! Path normalization utilities
//!
//! All paths shown to the user or written into templates use '/' as separator
//! and are relative to the session root.

use std::path::{Path, PathBuf};

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Make a path relative to the session root
pub fn make_relative(path: &Path, root: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(normalize_path)
}

/// Resolve a '/'-separated relative path against the session root
pub fn resolve_relative(root: &Path, relative: &str) -> PathBuf {
    root.join(relative.replace('/', std::path::MAIN_SEPARATOR_STR))
}

/// Get the .treemark state directory for a given root
pub fn state_dir(root: &Path) -> PathBuf {
    root.join(".treemark")
}
