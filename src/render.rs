//! Document renderer
//!
//! Turns `(SelectionState, tree snapshot, optional prompt)` into one output
//! document. Selected files are emitted in tree order, each path and content
//! exactly once. A file that fails to read degrades to an inline note; the
//! rest of the document is still produced.

use crate::core::selection::SelectionState;
use crate::core::tokenizer::{count_tokens, TokenModel};
use crate::core::tree::{FileNode, Node};
use crate::walker::read_file_text;

/// Output document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Cypher,
    Sexpr,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "cypher" => Ok(OutputFormat::Cypher),
            "sexpr" | "sexp" | "s-expression" => Ok(OutputFormat::Sexpr),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub token_model: TokenModel,
    /// Free-text prompt appended near the top of the document.
    pub prompt: Option<String>,
}

/// A produced document plus its bookkeeping.
#[derive(Debug)]
pub struct RenderedDocument {
    pub text: String,
    pub file_count: usize,
    pub token_estimate: usize,
    /// Relative paths whose content could not be read.
    pub degraded: Vec<String>,
}

struct PackedFile<'a> {
    file: &'a FileNode,
    content: Option<String>,
    error: Option<String>,
}

/// Render the marked files into a single document.
pub fn render_document(
    selection: &SelectionState,
    tree: &Node,
    options: &RenderOptions,
) -> RenderedDocument {
    let mut packed = Vec::new();
    collect_selected(tree, selection, &mut packed);

    let mut token_estimate = 0usize;
    let mut degraded = Vec::new();
    for item in &packed {
        token_estimate += count_tokens(&item.file.relative, options.token_model);
        if let Some(content) = &item.content {
            token_estimate += count_tokens(content, options.token_model);
        }
        if item.error.is_some() {
            degraded.push(item.file.relative.clone());
        }
    }
    if let Some(prompt) = &options.prompt {
        token_estimate += count_tokens(prompt, options.token_model);
    }

    let text = match options.format {
        OutputFormat::Markdown => render_markdown(tree, &packed, options, token_estimate),
        OutputFormat::Cypher => render_cypher(tree, &packed, options, token_estimate),
        OutputFormat::Sexpr => render_sexpr(tree, &packed, options, token_estimate),
    };

    RenderedDocument {
        text,
        file_count: packed.len(),
        token_estimate,
        degraded,
    }
}

/// Pre-order walk collecting selected files in tree order. Identity-keyed
/// lookups mean each selected file is visited exactly once.
fn collect_selected<'a>(
    node: &'a Node,
    selection: &SelectionState,
    out: &mut Vec<PackedFile<'a>>,
) {
    match node {
        Node::File(file) => {
            if selection.is_file_selected(&file.path) {
                match read_file_text(&file.path) {
                    Ok(content) => out.push(PackedFile {
                        file,
                        content: Some(content),
                        error: None,
                    }),
                    Err(err) => out.push(PackedFile {
                        file,
                        content: None,
                        error: Some(err.to_string()),
                    }),
                }
            }
        }
        Node::Directory(dir) => {
            for child in &dir.children {
                collect_selected(child, selection, out);
            }
        }
    }
}

fn fence_language(relative: &str) -> &str {
    let name = relative.rsplit('/').next().unwrap_or(relative);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= 12 => ext,
        _ => "",
    }
}

fn render_markdown(
    tree: &Node,
    packed: &[PackedFile<'_>],
    options: &RenderOptions,
    tokens: usize,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Context: {}\n\n", tree.name()));

    if let Some(prompt) = &options.prompt {
        out.push_str("## Prompt\n\n");
        out.push_str(prompt);
        out.push_str("\n\n");
    }

    out.push_str("## Files\n\n");
    for item in packed {
        out.push_str(&format!("### `{}`\n\n", item.file.relative));
        match (&item.content, &item.error) {
            (Some(content), _) => {
                out.push_str(&format!("```{}\n", fence_language(&item.file.relative)));
                out.push_str(content);
                if !content.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str("```\n\n");
            }
            (None, Some(error)) => {
                out.push_str(&format!("> unavailable: {}\n\n", error));
            }
            (None, None) => {}
        }
    }

    out.push_str(&format!(
        "---\n{} files, ~{} tokens ({})\n",
        packed.len(),
        tokens,
        options.token_model
    ));
    out
}

fn escape_quoted(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn render_cypher(
    tree: &Node,
    packed: &[PackedFile<'_>],
    options: &RenderOptions,
    tokens: usize,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("// Context graph: {}\n", tree.name()));
    if let Some(prompt) = &options.prompt {
        out.push_str(&format!(
            "MERGE (p:Prompt {{text: \"{}\"}});\n",
            escape_quoted(prompt)
        ));
    }

    // one node per distinct parent directory, in first-use order
    let mut dirs: Vec<String> = Vec::new();
    for item in packed {
        let parent = parent_relative(&item.file.relative);
        if !dirs.contains(&parent) {
            dirs.push(parent);
        }
    }
    for (i, dir) in dirs.iter().enumerate() {
        out.push_str(&format!(
            "MERGE (d{}:Directory {{path: \"{}\"}});\n",
            i,
            escape_quoted(dir)
        ));
    }

    for (i, item) in packed.iter().enumerate() {
        out.push_str(&format!(
            "MERGE (f{}:File {{path: \"{}\"}});\n",
            i,
            escape_quoted(&item.file.relative)
        ));
        match (&item.content, &item.error) {
            (Some(content), _) => out.push_str(&format!(
                "SET f{}.content = \"{}\";\n",
                i,
                escape_quoted(content)
            )),
            (None, Some(error)) => {
                out.push_str(&format!("// f{} unavailable: {}\n", i, error))
            }
            (None, None) => {}
        }
        let parent = parent_relative(&item.file.relative);
        if let Some(d) = dirs.iter().position(|p| *p == parent) {
            out.push_str(&format!("MERGE (d{})-[:CONTAINS]->(f{});\n", d, i));
        }
    }

    out.push_str(&format!(
        "// {} files, ~{} tokens ({})\n",
        packed.len(),
        tokens,
        options.token_model
    ));
    out
}

fn parent_relative(relative: &str) -> String {
    match relative.rsplit_once('/') {
        Some((parent, _)) => parent.to_string(),
        None => ".".to_string(),
    }
}

fn render_sexpr(
    tree: &Node,
    packed: &[PackedFile<'_>],
    options: &RenderOptions,
    tokens: usize,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("(context (root \"{}\")\n", escape_quoted(tree.name())));
    if let Some(prompt) = &options.prompt {
        out.push_str(&format!("  (prompt \"{}\")\n", escape_quoted(prompt)));
    }
    for item in packed {
        out.push_str(&format!(
            "  (file (path \"{}\")",
            escape_quoted(&item.file.relative)
        ));
        match (&item.content, &item.error) {
            (Some(content), _) => {
                out.push_str(&format!(" (content \"{}\")", escape_quoted(content)))
            }
            (None, Some(error)) => {
                out.push_str(&format!(" (error \"{}\")", escape_quoted(error)))
            }
            (None, None) => {}
        }
        out.push_str(")\n");
    }
    out.push_str(&format!(
        "  (summary (files {}) (tokens {})))\n",
        packed.len(),
        tokens
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::selection::SelectionState;
    use crate::walker::{load_tree, WalkOptions};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn fixture() -> (tempfile::TempDir, Node) {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/main.js"), "console.log(1);\n").unwrap();
        fs::write(temp.path().join("README.md"), "# readme\n").unwrap();
        let tree = load_tree(temp.path(), &WalkOptions::default()).unwrap().tree;
        (temp, tree)
    }

    fn select_all_files(tree: &Node) -> SelectionState {
        let mut sel = SelectionState::new();
        let targets = tree.targets();
        sel.replace_files(targets.files.iter().map(|f| f.path.clone()));
        sel
    }

    #[test]
    fn test_markdown_lists_each_file_once() {
        let (_temp, tree) = fixture();
        let sel = select_all_files(&tree);
        let doc = render_document(&sel, &tree, &RenderOptions::default());

        assert_eq!(doc.file_count, 2);
        assert_eq!(doc.text.matches("### `src/main.js`").count(), 1);
        assert_eq!(doc.text.matches("### `README.md`").count(), 1);
        assert!(doc.text.contains("console.log(1);"));
        assert!(doc.degraded.is_empty());
        assert!(doc.token_estimate > 0);
    }

    #[test]
    fn test_markdown_prompt_section() {
        let (_temp, tree) = fixture();
        let sel = select_all_files(&tree);
        let options = RenderOptions {
            prompt: Some("Explain the build".to_string()),
            ..Default::default()
        };
        let doc = render_document(&sel, &tree, &options);
        assert!(doc.text.contains("## Prompt"));
        assert!(doc.text.contains("Explain the build"));
    }

    #[test]
    fn test_unselected_files_are_excluded() {
        let (_temp, tree) = fixture();
        let mut sel = SelectionState::new();
        let readme = tree
            .targets()
            .files
            .iter()
            .find(|f| f.relative == "README.md")
            .map(|f| f.path.clone())
            .unwrap();
        sel.replace_files(vec![readme]);

        let doc = render_document(&sel, &tree, &RenderOptions::default());
        assert_eq!(doc.file_count, 1);
        assert!(!doc.text.contains("src/main.js"));
    }

    #[test]
    fn test_vanished_file_degrades_not_aborts() {
        let (temp, tree) = fixture();
        let sel = select_all_files(&tree);
        fs::remove_file(temp.path().join("src/main.js")).unwrap();

        let doc = render_document(&sel, &tree, &RenderOptions::default());
        assert_eq!(doc.file_count, 2);
        assert_eq!(doc.degraded, vec!["src/main.js".to_string()]);
        assert!(doc.text.contains("> unavailable:"));
        // the healthy file still rendered
        assert!(doc.text.contains("# readme"));
    }

    #[test]
    fn test_cypher_merges_files_and_parents() {
        let (_temp, tree) = fixture();
        let sel = select_all_files(&tree);
        let options = RenderOptions {
            format: OutputFormat::Cypher,
            ..Default::default()
        };
        let doc = render_document(&sel, &tree, &options);
        assert!(doc.text.contains(":Directory {path: \"src\"}"));
        assert!(doc.text.contains(":File {path: \"src/main.js\"}"));
        assert!(doc.text.contains("-[:CONTAINS]->"));
    }

    #[test]
    fn test_cypher_escapes_quotes() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("q.txt"), "say \"hi\"\n").unwrap();
        let tree = load_tree(temp.path(), &WalkOptions::default()).unwrap().tree;
        let sel = select_all_files(&tree);

        let options = RenderOptions {
            format: OutputFormat::Cypher,
            ..Default::default()
        };
        let doc = render_document(&sel, &tree, &options);
        assert!(doc.text.contains("say \\\"hi\\\""));
    }

    #[test]
    fn test_sexpr_document_shape() {
        let (_temp, tree) = fixture();
        let sel = select_all_files(&tree);
        let options = RenderOptions {
            format: OutputFormat::Sexpr,
            ..Default::default()
        };
        let doc = render_document(&sel, &tree, &options);
        assert!(doc.text.starts_with("(context (root"));
        assert!(doc.text.contains("(file (path \"src/main.js\")"));
        assert!(doc.text.contains("(summary (files 2)"));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!(
            "cypher".parse::<OutputFormat>().unwrap(),
            OutputFormat::Cypher
        );
        assert_eq!("sexpr".parse::<OutputFormat>().unwrap(), OutputFormat::Sexpr);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_fence_language_from_extension() {
        assert_eq!(fence_language("src/main.js"), "js");
        assert_eq!(fence_language("Makefile"), "");
        assert_eq!(fence_language("a/b.tar.gz"), "gz");
    }

    #[test]
    fn test_empty_selection_renders_empty_document() {
        let (_temp, tree) = fixture();
        let sel = SelectionState::new();
        let doc = render_document(&sel, &tree, &RenderOptions::default());
        assert_eq!(doc.file_count, 0);
        assert!(doc.text.contains("0 files"));
    }

    #[test]
    fn test_selected_path_missing_from_tree_is_ignored() {
        let (_temp, tree) = fixture();
        let mut sel = SelectionState::new();
        sel.replace_files(vec![PathBuf::from("/nowhere/ghost.txt")]);
        let doc = render_document(&sel, &tree, &RenderOptions::default());
        assert_eq!(doc.file_count, 0);
    }
}
