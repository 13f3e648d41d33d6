//! Search overlay
//!
//! Matching walks every node regardless of expansion state; a collapsed
//! directory's contents must still be searchable. The projection is a
//! display-only grouping; it never mutates the tree or the expansion set,
//! and selection state for each row is read live from the one
//! `SelectionState`, so changes made inside the overlay are visible in the
//! full tree the moment the overlay closes.

use crate::core::tree::Node;

/// Ordered matches plus the parent linkage the projection needs.
#[derive(Debug, Default)]
pub struct SearchMatches<'a> {
    /// Matching nodes in pre-order traversal order.
    pub nodes: Vec<&'a Node>,
    /// (parent directory, matching file) pairs, in traversal order.
    file_pairs: Vec<(&'a Node, &'a Node)>,
    /// Matching directory nodes, in traversal order.
    dir_matches: Vec<&'a Node>,
}

impl SearchMatches<'_> {
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Case-insensitive substring match against each node's name (not its full
/// path), collected by a pre-order walk of the whole tree.
pub fn search<'a>(root: &'a Node, query: &str) -> SearchMatches<'a> {
    let needle = query.to_lowercase();
    let mut matches = SearchMatches::default();
    visit(None, root, &needle, &mut matches);
    matches
}

fn visit<'a>(
    parent: Option<&'a Node>,
    node: &'a Node,
    needle: &str,
    out: &mut SearchMatches<'a>,
) {
    if node.name().to_lowercase().contains(needle) {
        out.nodes.push(node);
        match node {
            Node::File(_) => {
                if let Some(parent) = parent {
                    out.file_pairs.push((parent, node));
                }
            }
            Node::Directory(_) => out.dir_matches.push(node),
        }
    }
    if let Some(dir) = node.as_directory() {
        for child in &dir.children {
            visit(Some(node), child, needle, out);
        }
    }
}

/// One row in the overlay projection.
#[derive(Debug, Clone, Copy)]
pub enum OverlayRow<'a> {
    /// Synthetic directory header. Present for every directory that matched
    /// or contains a matching file, even if the directory itself did not
    /// match. It exists for path context.
    Group(&'a Node),
    /// A matching file, listed beneath its parent's header.
    File(&'a Node),
}

impl<'a> OverlayRow<'a> {
    pub fn node(&self) -> &'a Node {
        match *self {
            OverlayRow::Group(node) | OverlayRow::File(node) => node,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, OverlayRow::Group(_))
    }
}

/// Build the grouped, display-only projection of a match set.
///
/// Groups are ordered by relative path, compared case-insensitively so
/// nested groups sort stably; each group's files keep traversal order.
pub fn project<'a>(matches: &SearchMatches<'a>) -> Vec<OverlayRow<'a>> {
    struct Group<'a> {
        dir: &'a Node,
        files: Vec<&'a Node>,
    }

    let mut groups: Vec<Group<'a>> = Vec::new();
    let group_index = |groups: &mut Vec<Group<'a>>, dir: &'a Node| -> usize {
        match groups.iter().position(|g| g.dir.path() == dir.path()) {
            Some(i) => i,
            None => {
                groups.push(Group {
                    dir,
                    files: Vec::new(),
                });
                groups.len() - 1
            }
        }
    };

    for &dir in &matches.dir_matches {
        group_index(&mut groups, dir);
    }
    for &(parent, file) in &matches.file_pairs {
        let idx = group_index(&mut groups, parent);
        groups[idx].files.push(file);
    }

    groups.sort_by(|a, b| {
        let ka = a.dir.relative().to_lowercase();
        let kb = b.dir.relative().to_lowercase();
        ka.cmp(&kb).then_with(|| a.dir.relative().cmp(b.dir.relative()))
    });

    let mut rows = Vec::new();
    for group in groups {
        rows.push(OverlayRow::Group(group.dir));
        for file in group.files {
            rows.push(OverlayRow::File(file));
        }
    }
    rows
}

/// The file rows of a projection: the node list bulk toggles operate on in
/// overlay mode (directory headers are context, not bulk-toggle targets).
pub fn projected_files<'a>(rows: &[OverlayRow<'a>]) -> Vec<&'a Node> {
    rows.iter()
        .filter(|row| !row.is_group())
        .map(|row| row.node())
        .collect()
}
