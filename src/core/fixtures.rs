//! Shared tree fixtures for module tests.

use std::path::{Path, PathBuf};

use crate::core::tree::{DirectoryNode, FileNode, Node};

pub const ROOT: &str = "/project";

pub fn file(path: &str) -> Node {
    Node::File(FileNode::new(PathBuf::from(path), Path::new(ROOT)))
}

pub fn dir(path: &str, children: Vec<Node>) -> Node {
    let mut node = DirectoryNode::new(PathBuf::from(path), Path::new(ROOT));
    node.children = children;
    Node::Directory(node)
}

/// The canonical test tree, in walker order (directories first, then files,
/// case-insensitive by name):
///
/// ```text
/// /project
///   docs/                  (childless)
///   src/
///     utils/
///       parse.js
///       search.js
///     main.js
///     Utilities.md
///   README.md
/// ```
pub fn sample_tree() -> Node {
    dir(
        "/project",
        vec![
            dir("/project/docs", vec![]),
            dir(
                "/project/src",
                vec![
                    dir(
                        "/project/src/utils",
                        vec![
                            file("/project/src/utils/parse.js"),
                            file("/project/src/utils/search.js"),
                        ],
                    ),
                    file("/project/src/main.js"),
                    file("/project/src/Utilities.md"),
                ],
            ),
            file("/project/README.md"),
        ],
    )
}
