//! Filesystem tree provider
//!
//! Walks the disk once per session (or per refresh) and returns an immutable
//! tree snapshot. Uses the ignore crate's walker, so .gitignore and hidden
//! rules match what developers expect from search tooling. Unreadable
//! entries inside the tree are skipped and counted; only a bad root fails
//! the load.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::core::tree::{DirectoryNode, FileNode, Node};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct WalkOptions {
    /// Include hidden files/directories (dotfiles).
    pub hidden: bool,
    /// Respect .gitignore and friends.
    pub respect_ignore: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            hidden: false,
            respect_ignore: true,
        }
    }
}

/// A loaded snapshot plus the number of entries the walk had to skip.
#[derive(Debug)]
pub struct LoadedTree {
    pub tree: Node,
    pub skipped: usize,
}

/// Walk `root` into a tree snapshot.
///
/// Children are ordered directories-first, then case-insensitive by name,
/// so the tree renders identically across runs and platforms.
pub fn load_tree(root: &Path, options: &WalkOptions) -> Result<LoadedTree> {
    let meta = fs::metadata(root).map_err(|e| Error::from_io(e, root))?;
    if !meta.is_dir() {
        return Err(Error::NotFound(root.to_path_buf()));
    }

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(!options.hidden)
        .git_ignore(options.respect_ignore)
        .git_global(options.respect_ignore)
        .git_exclude(options.respect_ignore);

    // parent path -> (child path, is_dir); directories also get their own
    // (possibly empty) entry so childless directories survive
    let mut children_of: BTreeMap<PathBuf, Vec<(PathBuf, bool)>> = BTreeMap::new();
    let mut skipped = 0usize;

    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        let path = entry.path();
        if path == root {
            continue;
        }
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            children_of.entry(path.to_path_buf()).or_default();
        }
        if let Some(parent) = path.parent() {
            children_of
                .entry(parent.to_path_buf())
                .or_default()
                .push((path.to_path_buf(), is_dir));
        }
    }

    let tree = Node::Directory(build_directory(root, root, &children_of));
    Ok(LoadedTree { tree, skipped })
}

fn build_directory(
    path: &Path,
    root: &Path,
    children_of: &BTreeMap<PathBuf, Vec<(PathBuf, bool)>>,
) -> DirectoryNode {
    let mut dir = DirectoryNode::new(path.to_path_buf(), root);
    let Some(entries) = children_of.get(path) else {
        return dir;
    };

    let mut entries = entries.clone();
    entries.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| sort_name(&a.0).cmp(&sort_name(&b.0)))
    });

    for (child, is_dir) in entries {
        if is_dir {
            dir.children
                .push(Node::Directory(build_directory(&child, root, children_of)));
        } else {
            dir.children.push(Node::File(FileNode::new(child, root)));
        }
    }
    dir
}

fn sort_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Read one file's content for preview or export. Non-UTF-8 bytes are
/// lossily converted; a file that vanished since the walk is NotFound.
pub fn read_file_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::from_io(e, path))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
