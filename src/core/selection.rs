//! Selection state and the operations that read and write it
//!
//! `SelectionState` is the single source of truth for "what is marked": a set
//! of explicitly selected files plus a set of explicitly selected childless
//! directories. A directory with children is never stored; its selection is a
//! derived predicate over its descendants.
//!
//! Batch toggles are two-phase: the fully-selected decision is computed once
//! over the whole batch, then one uniform action is applied to every target.
//! Recomputing the decision per target would observe partially mutated state
//! and apply inconsistent actions.
//!
//! All operations are total. A node of the wrong kind is a silent no-op, not
//! an error, since it can only come from stale UI state.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::core::tree::{Node, Targets};

/// Tri-state selection answer for one rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// Every selectable entity at or beneath the node is selected.
    Full,
    /// At least one, but not all, selectable descendants are selected.
    Partial,
    /// Nothing at or beneath the node is selected.
    None,
}

/// The uniform action a batch toggle applies to every target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Select,
    Clear,
}

/// The mutations a batch toggle will perform, fixed before any of them runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TogglePlan {
    pub action: ToggleAction,
    pub files: Vec<PathBuf>,
    pub empty_dirs: Vec<PathBuf>,
}

/// Pure planning step: given the selectable targets of a batch and the
/// already-made decision, list the identities to mutate. Decoupled from the
/// traversal so the decision cannot drift while state mutates mid-batch.
pub fn plan_toggle(targets: &Targets<'_>, action: ToggleAction) -> TogglePlan {
    TogglePlan {
        action,
        files: targets.files.iter().map(|f| f.path.clone()).collect(),
        empty_dirs: targets.empty_dirs.iter().map(|d| d.path.clone()).collect(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected_files: BTreeSet<PathBuf>,
    selected_empty_dirs: BTreeSet<PathBuf>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_file_selected(&self, path: &Path) -> bool {
        self.selected_files.contains(path)
    }

    pub fn is_empty_dir_selected(&self, path: &Path) -> bool {
        self.selected_empty_dirs.contains(path)
    }

    /// Derived selection predicate.
    ///
    /// Files and childless directories answer by membership. A directory with
    /// children is selected iff it has at least one selectable descendant and
    /// every one of them is selected; with zero selectable descendants there
    /// is nothing to select and the answer is false.
    pub fn is_selected(&self, node: &Node) -> bool {
        match node {
            Node::File(f) => self.is_file_selected(&f.path),
            Node::Directory(d) if d.is_childless() => self.is_empty_dir_selected(&d.path),
            Node::Directory(_) => {
                let targets = node.targets();
                !targets.is_empty() && self.count_selected(&targets) == targets.len()
            }
        }
    }

    /// Tri-state answer for rendering row markers.
    pub fn mark_of(&self, node: &Node) -> Mark {
        match node {
            Node::File(f) => {
                if self.is_file_selected(&f.path) {
                    Mark::Full
                } else {
                    Mark::None
                }
            }
            Node::Directory(d) if d.is_childless() => {
                if self.is_empty_dir_selected(&d.path) {
                    Mark::Full
                } else {
                    Mark::None
                }
            }
            Node::Directory(_) => {
                let targets = node.targets();
                if targets.is_empty() {
                    return Mark::None;
                }
                match self.count_selected(&targets) {
                    0 => Mark::None,
                    n if n == targets.len() => Mark::Full,
                    _ => Mark::Partial,
                }
            }
        }
    }

    /// Flip one file's membership. No effect on siblings or ancestors; a
    /// directory node is ignored.
    pub fn toggle_file(&mut self, node: &Node) {
        let Some(file) = node.as_file() else {
            return;
        };
        if !self.selected_files.remove(&file.path) {
            self.selected_files.insert(file.path.clone());
        }
    }

    /// Toggle a whole subtree with one pre-computed decision.
    ///
    /// If the directory was fully selected, every target is cleared;
    /// otherwise every target is selected. A file node is ignored, and a
    /// directory with zero selectable descendants has nothing to toggle.
    pub fn toggle_directory(&mut self, node: &Node) {
        if node.as_directory().is_none() {
            return;
        }
        self.toggle_targets(&node.targets());
    }

    /// Same semantics as [`toggle_directory`](Self::toggle_directory), but
    /// the fully-selected snapshot is computed over the given node list.
    /// Used for bulk "select everything visible" in both the full tree and
    /// the search overlay.
    pub fn toggle_all_visible(&mut self, nodes: &[&Node]) {
        self.toggle_targets(&Targets::of_nodes(nodes));
    }

    fn toggle_targets(&mut self, targets: &Targets<'_>) {
        if targets.is_empty() {
            return;
        }
        let action = if self.count_selected(targets) == targets.len() {
            ToggleAction::Clear
        } else {
            ToggleAction::Select
        };
        let plan = plan_toggle(targets, action);
        self.apply(&plan);
    }

    /// Apply a planned batch mutation.
    pub fn apply(&mut self, plan: &TogglePlan) {
        match plan.action {
            ToggleAction::Select => {
                self.selected_files.extend(plan.files.iter().cloned());
                self.selected_empty_dirs
                    .extend(plan.empty_dirs.iter().cloned());
            }
            ToggleAction::Clear => {
                for path in &plan.files {
                    self.selected_files.remove(path);
                }
                for path in &plan.empty_dirs {
                    self.selected_empty_dirs.remove(path);
                }
            }
        }
    }

    fn count_selected(&self, targets: &Targets<'_>) -> usize {
        let files = targets
            .files
            .iter()
            .filter(|f| self.selected_files.contains(&f.path))
            .count();
        let dirs = targets
            .empty_dirs
            .iter()
            .filter(|d| self.selected_empty_dirs.contains(&d.path))
            .count();
        files + dirs
    }

    /// Replace the file selection wholesale (template preload).
    pub fn replace_files(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.selected_files = paths.into_iter().collect();
        self.selected_empty_dirs.clear();
    }

    pub fn selected_file_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.selected_files.iter()
    }

    pub fn selected_file_count(&self) -> usize {
        self.selected_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_files.is_empty() && self.selected_empty_dirs.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected_files.clear();
        self.selected_empty_dirs.clear();
    }
}
