//! Tree snapshot model
//!
//! An immutable-per-snapshot representation of the directory hierarchy. The
//! walker produces one snapshot per session (or per refresh); everything else
//! reads it. Nodes are keyed by identity (absolute path), never by row index,
//! so lookups stay stable across re-renders.

use std::path::{Path, PathBuf};

use crate::core::paths::make_relative;

/// A file entry in a tree snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// Absolute path; unique within one snapshot.
    pub path: PathBuf,
    /// Last path segment.
    pub name: String,
    /// Path relative to the session root, '/'-separated.
    pub relative: String,
}

/// A directory entry in a tree snapshot.
///
/// `children` is an ordered sequence; an empty sequence means a childless
/// directory, which is selectable in its own right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNode {
    pub path: PathBuf,
    pub name: String,
    pub relative: String,
    pub children: Vec<Node>,
}

/// One filesystem entry: a file or a directory, nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    File(FileNode),
    Directory(DirectoryNode),
}

fn segment_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

impl FileNode {
    pub fn new(path: PathBuf, root: &Path) -> Self {
        let name = segment_name(&path);
        let relative = make_relative(&path, root).unwrap_or_else(|| name.clone());
        Self {
            path,
            name,
            relative,
        }
    }
}

impl DirectoryNode {
    pub fn new(path: PathBuf, root: &Path) -> Self {
        let name = segment_name(&path);
        let relative = make_relative(&path, root).unwrap_or_else(|| name.clone());
        Self {
            path,
            name,
            relative,
            children: Vec::new(),
        }
    }

    pub fn is_childless(&self) -> bool {
        self.children.is_empty()
    }
}

impl Node {
    pub fn path(&self) -> &Path {
        match self {
            Node::File(f) => &f.path,
            Node::Directory(d) => &d.path,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::File(f) => &f.name,
            Node::Directory(d) => &d.name,
        }
    }

    pub fn relative(&self) -> &str {
        match self {
            Node::File(f) => &f.relative,
            Node::Directory(d) => &d.relative,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            Node::File(f) => Some(f),
            Node::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&DirectoryNode> {
        match self {
            Node::File(_) => None,
            Node::Directory(d) => Some(d),
        }
    }

    /// Find a node by identity. Descends only into directories whose path is
    /// a prefix of the target, so the walk is proportional to tree depth.
    #[allow(dead_code)]
    pub fn find(&self, path: &Path) -> Option<&Node> {
        if self.path() == path {
            return Some(self);
        }
        let dir = self.as_directory()?;
        if !path.starts_with(&dir.path) {
            return None;
        }
        dir.children.iter().find_map(|child| child.find(path))
    }

    /// Collect the selectable entities at or beneath this node.
    ///
    /// A file contributes itself; a childless directory contributes itself; a
    /// directory with children contributes whatever its children contribute,
    /// never itself.
    pub fn collect_targets<'a>(&'a self, out: &mut Targets<'a>) {
        match self {
            Node::File(f) => out.files.push(f),
            Node::Directory(d) if d.is_childless() => out.empty_dirs.push(d),
            Node::Directory(d) => {
                for child in &d.children {
                    child.collect_targets(out);
                }
            }
        }
    }

    pub fn targets(&self) -> Targets<'_> {
        let mut out = Targets::default();
        self.collect_targets(&mut out);
        out
    }
}

/// The selectable entities beneath a set of nodes: files plus childless
/// directories, in traversal order.
#[derive(Debug, Clone, Default)]
pub struct Targets<'a> {
    pub files: Vec<&'a FileNode>,
    pub empty_dirs: Vec<&'a DirectoryNode>,
}

impl<'a> Targets<'a> {
    /// Union of targets over a node list (used for bulk toggles).
    pub fn of_nodes(nodes: &[&'a Node]) -> Self {
        let mut out = Targets::default();
        for node in nodes {
            node.collect_targets(&mut out);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.empty_dirs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len() + self.empty_dirs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::sample_tree;

    #[test]
    fn test_file_node_relative_path() {
        let root = Path::new("/project");
        let file = FileNode::new(PathBuf::from("/project/src/main.rs"), root);
        assert_eq!(file.name, "main.rs");
        assert_eq!(file.relative, "src/main.rs");
    }

    #[test]
    fn test_directory_node_childless() {
        let root = Path::new("/project");
        let dir = DirectoryNode::new(PathBuf::from("/project/empty"), root);
        assert!(dir.is_childless());
    }

    #[test]
    fn test_find_by_identity() {
        let tree = sample_tree();
        let node = tree.find(Path::new("/project/src/utils/search.js"));
        assert!(matches!(node, Some(Node::File(_))));
        assert_eq!(node.unwrap().name(), "search.js");
    }

    #[test]
    fn test_find_missing_path() {
        let tree = sample_tree();
        assert!(tree.find(Path::new("/project/src/nope.txt")).is_none());
        assert!(tree.find(Path::new("/elsewhere/file.txt")).is_none());
    }

    #[test]
    fn test_targets_of_full_tree() {
        let tree = sample_tree();
        let targets = tree.targets();
        // 5 files and the one empty directory
        assert_eq!(targets.files.len(), 5);
        assert_eq!(targets.empty_dirs.len(), 1);
        assert_eq!(targets.empty_dirs[0].relative, "docs");
    }

    #[test]
    fn test_targets_of_file_is_itself() {
        let tree = sample_tree();
        let file = tree.find(Path::new("/project/README.md")).unwrap();
        let targets = file.targets();
        assert_eq!(targets.files.len(), 1);
        assert!(targets.empty_dirs.is_empty());
    }

    #[test]
    fn test_directory_with_children_is_not_its_own_target() {
        let tree = sample_tree();
        let src = tree.find(Path::new("/project/src")).unwrap();
        let targets = src.targets();
        assert_eq!(targets.files.len(), 4);
        assert!(targets
            .files
            .iter()
            .all(|f| f.relative.starts_with("src/")));
        assert!(targets.empty_dirs.is_empty());
    }

    #[test]
    fn test_targets_of_nodes_unions() {
        let tree = sample_tree();
        let readme = tree.find(Path::new("/project/README.md")).unwrap();
        let docs = tree.find(Path::new("/project/docs")).unwrap();
        let targets = Targets::of_nodes(&[readme, docs]);
        assert_eq!(targets.len(), 2);
    }
}
