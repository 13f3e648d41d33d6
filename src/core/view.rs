//! Expansion state and the flattened row view
//!
//! Expansion is purely a view concern: membership in the open set never
//! affects selection. The flattened view is a full recompute, never an
//! incremental patch, so its order always matches on-screen row order and
//! the cursor is just an index into it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::core::tree::Node;

/// Set of directory identities currently open in the full-tree view.
///
/// The root is implicitly always expanded, whether or not it is a member.
#[derive(Debug, Clone, Default)]
pub struct ExpansionState {
    open: BTreeSet<PathBuf>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, path: &Path) -> bool {
        self.open.contains(path)
    }

    /// Flip a directory's open state. Files are ignored.
    pub fn toggle(&mut self, node: &Node) {
        if node.as_directory().is_none() {
            return;
        }
        let path = node.path();
        if !self.open.remove(path) {
            self.open.insert(path.to_path_buf());
        }
    }

    #[allow(dead_code)]
    pub fn expand(&mut self, path: &Path) {
        self.open.insert(path.to_path_buf());
    }

    /// Open a directory and every ancestor up to the session root, so a
    /// freshly revealed location is visible without manual re-expansion.
    pub fn expand_with_ancestors(&mut self, path: &Path, root: &Path) {
        for ancestor in path.ancestors() {
            if !ancestor.starts_with(root) {
                break;
            }
            self.open.insert(ancestor.to_path_buf());
        }
    }
}

/// One visible row: a node and its indentation depth.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    pub node: &'a Node,
    pub depth: usize,
}

/// Depth-first, expansion-aware linearization of the tree.
///
/// Descends into a directory's children iff it is expanded; the root is
/// always descended. The resulting order is the authoritative mapping from
/// cursor row to node.
pub fn flatten<'a>(root: &'a Node, expansion: &ExpansionState) -> Vec<Row<'a>> {
    let mut rows = Vec::new();
    rows.push(Row {
        node: root,
        depth: 0,
    });
    if let Some(dir) = root.as_directory() {
        for child in &dir.children {
            push_subtree(child, 1, expansion, &mut rows);
        }
    }
    rows
}

fn push_subtree<'a>(
    node: &'a Node,
    depth: usize,
    expansion: &ExpansionState,
    rows: &mut Vec<Row<'a>>,
) {
    rows.push(Row { node, depth });
    if let Some(dir) = node.as_directory() {
        if expansion.is_expanded(&dir.path) {
            for child in &dir.children {
                push_subtree(child, depth + 1, expansion, rows);
            }
        }
    }
}

/// Bounds-checked row lookup; out-of-range indices answer None.
pub fn node_at<'a>(rows: &[Row<'a>], index: usize) -> Option<&'a Node> {
    rows.get(index).map(|row| row.node)
}

/// Row index of a node by identity.
pub fn index_of(rows: &[Row<'_>], path: &Path) -> Option<usize> {
    rows.iter().position(|row| row.node.path() == path)
}
