//! CLI module - Command-line interface definitions and handlers

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::core::session::Session;
use crate::core::tokenizer::TokenModel;
use crate::error::Error;
use crate::render::{render_document, OutputFormat, RenderOptions, RenderedDocument};
use crate::templates::TemplateStore;
use crate::tui;
use crate::walker::{load_tree, WalkOptions};

/// treemark - browse a tree, mark files, emit a context document.
#[derive(Parser, Debug)]
#[command(name = "treemark")]
#[command(
    author,
    version,
    about,
    long_about = r#"treemark opens an interactive terminal browser over a directory tree.
Mark files one by one, per directory, by shift-range, or from a saved
template, then quit with 'q' to emit every marked file as one document.

Output formats:
- markdown: fenced code block per file (best for LLM prompts)
- cypher: graph MERGE statements (File/Directory nodes, CONTAINS edges)
- sexpr: a single S-expression document

Examples:
    treemark
    treemark ./service --query handler
    treemark --template review --print > context.md
    treemark templates list
"#
)]
pub struct Cli {
    /// Root directory to browse.
    #[arg(
        value_name = "ROOT",
        default_value = ".",
        long_help = "Root directory to browse (defaults to the current directory).\n\n\
All paths in the emitted document and in saved templates are relative to\n\
this root."
    )]
    pub root: PathBuf,

    /// Preload a saved template into the selection.
    #[arg(
        long,
        value_name = "NAME",
        long_help = "Preload a saved template into the selection before the session starts.\n\n\
Entries that no longer exist on disk are reported on stderr and skipped;\n\
the session continues with the ones that validated."
    )]
    pub template: Option<String>,

    /// Start with the search overlay open on this query.
    #[arg(
        long,
        value_name = "QUERY",
        long_help = "Open the session with the search overlay already populated.\n\n\
Matching is a case-insensitive substring test against entry names."
    )]
    pub query: Option<String>,

    /// Output document format (markdown/cypher/sexpr).
    #[arg(
        long,
        default_value = "markdown",
        value_name = "FORMAT",
        long_help = "Select the output document format.\n\n\
Supported values:\n\
- markdown (default)\n\
- cypher\n\
- sexpr"
    )]
    pub format: String,

    /// Token model for estimates (cl100k/o200k/heuristic).
    #[arg(
        long,
        default_value = "cl100k",
        value_name = "MODEL",
        long_help = "Token model used for the document's token estimate.\n\n\
Supported values: cl100k (default), o200k, heuristic."
    )]
    pub model: String,

    /// Free-text prompt appended to the document.
    #[arg(long, value_name = "TEXT")]
    pub prompt: Option<String>,

    /// Write the document to a file instead of stdout.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Include hidden files/directories (dotfiles).
    #[arg(
        long,
        long_help = "Include hidden files and directories (dotfiles).\n\n\
By default, hidden entries are skipped."
    )]
    pub hidden: bool,

    /// Disable .gitignore and other ignore rules.
    #[arg(
        long,
        long_help = "Disable respect for ignore files (.gitignore, .ignore, global ignores).\n\n\
Use this to browse all paths, even those normally ignored."
    )]
    pub no_ignore: bool,

    /// Disable colored stderr output.
    #[arg(long)]
    pub no_color: bool,

    /// Non-interactive: emit the template's files and exit.
    #[arg(
        long,
        requires = "template",
        long_help = "Skip the interactive session entirely: load --template, render the\n\
document, and exit. This is the scriptable path.\n\n\
Example:\n\
  treemark --template review --print --format markdown"
    )]
    pub print: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage saved templates without entering the browser.
    #[command(
        long_about = "Templates are named selection sets stored under <ROOT>/.treemark/.\n\n\
Examples:\n\
  treemark templates list\n\
  treemark templates delete review\n"
    )]
    Templates {
        #[command(subcommand)]
        action: TemplateCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// List saved templates.
    List,
    /// Delete a template by name.
    Delete {
        /// Template name.
        #[arg(value_name = "NAME")]
        name: String,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Get absolute root path
    let root = cli.root.canonicalize().unwrap_or_else(|_| cli.root.clone());

    if let Some(command) = cli.command {
        return match command {
            Commands::Templates { action } => run_templates(&root, action),
        };
    }

    let format: OutputFormat = cli
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let token_model: TokenModel = cli.model.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let walk_options = WalkOptions {
        hidden: cli.hidden,
        respect_ignore: !cli.no_ignore,
    };

    let loaded = load_tree(&root, &walk_options)
        .with_context(|| format!("failed to load tree at {}", root.display()))?;
    if loaded.skipped > 0 {
        eprintln!(
            "{}",
            format!("warning: {} unreadable entries skipped", loaded.skipped).yellow()
        );
    }

    let mut session = Session::new(root.clone(), loaded.tree);
    let store = TemplateStore::new(&root);

    if let Some(name) = &cli.template {
        match store.load(name)? {
            Some(template) => {
                if !template.missing.is_empty() {
                    let err = Error::Validation {
                        missing: template.missing.clone(),
                    };
                    eprintln!(
                        "{}",
                        format!(
                            "warning: '{}' {}: {}",
                            name,
                            err,
                            template.missing.join(", ")
                        )
                        .yellow()
                    );
                }
                session.preload_files(template.files);
            }
            None if cli.print => bail!("template '{}' not found", name),
            None => eprintln!("{}", format!("warning: template '{}' not found", name).yellow()),
        }
    }

    let render_options = RenderOptions {
        format,
        token_model,
        prompt: cli.prompt.clone(),
    };

    if cli.print {
        let doc = render_document(session.selection(), session.tree(), &render_options);
        report_degraded(&doc);
        report_packed(&doc);
        return write_output(&doc.text, cli.output.as_deref());
    }

    if let Some(query) = &cli.query {
        session.begin_search();
        session.set_query(query);
    }

    let (session, outcome) = tui::run(session, store, walk_options)?;
    match outcome {
        tui::Outcome::Emit => {
            let doc = render_document(session.selection(), session.tree(), &render_options);
            report_degraded(&doc);
            report_packed(&doc);
            write_output(&doc.text, cli.output.as_deref())
        }
        // explicit quit: success with empty output
        tui::Outcome::Discard => Ok(()),
    }
}

fn run_templates(root: &Path, action: TemplateCommands) -> Result<()> {
    let store = TemplateStore::new(root);
    match action {
        TemplateCommands::List => {
            for info in store.list()? {
                println!(
                    "{}\t{} files\t{}",
                    info.name,
                    info.file_count,
                    info.saved_at.format("%Y-%m-%d %H:%M")
                );
            }
            Ok(())
        }
        TemplateCommands::Delete { name } => {
            if store.delete(&name)? {
                println!("deleted '{}'", name);
                Ok(())
            } else {
                bail!("template '{}' not found", name)
            }
        }
    }
}

fn report_packed(doc: &RenderedDocument) {
    eprintln!(
        "{}",
        format!(
            "packed {} files (~{} tokens)",
            doc.file_count, doc.token_estimate
        )
        .green()
    );
}

fn report_degraded(doc: &RenderedDocument) {
    if !doc.degraded.is_empty() {
        eprintln!(
            "{}",
            format!(
                "warning: {} files could not be read: {}",
                doc.degraded.len(),
                doc.degraded.join(", ")
            )
            .yellow()
        );
    }
}

fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}
