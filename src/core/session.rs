//! Session context
//!
//! One object owns every piece of mutable session state: the tree snapshot,
//! expansion, selection, the search overlay, the range selector, and the
//! cursor. No ambient globals; the UI adapter holds a `Session` and drives
//! it through command methods, then reads the row projections back for
//! rendering.
//!
//! Two orthogonal state dimensions: Browsing vs Searching (which projection
//! the cursor travels), and range idle vs active. A range can be built in
//! either projection; any plain navigation clears it.

use std::path::{Path, PathBuf};

use crate::core::range::RangeSelector;
use crate::core::search::{self, OverlayRow};
use crate::core::selection::{Mark, SelectionState};
use crate::core::tree::Node;
use crate::core::view::{self, ExpansionState, Row};

/// Which projection the cursor currently travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    Searching,
}

#[derive(Debug)]
struct Overlay {
    query: String,
    /// Full-tree cursor at overlay entry, restored on cancel. A second
    /// search while the overlay is active reuses this reference instead of
    /// re-snapshotting.
    saved_cursor: usize,
}

/// Ticket tying an in-flight tree load to the request that started it.
/// Completions carrying a superseded ticket are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

pub struct Session {
    root_path: PathBuf,
    tree: Node,
    expansion: ExpansionState,
    selection: SelectionState,
    range: RangeSelector,
    overlay: Option<Overlay>,
    cursor: usize,
    load_seq: u64,
    /// Bumped on every selection mutation; cheap cache invalidation for
    /// derived displays like the token estimate.
    version: u64,
}

impl Session {
    pub fn new(root_path: PathBuf, tree: Node) -> Self {
        Self {
            root_path,
            tree,
            expansion: ExpansionState::new(),
            selection: SelectionState::new(),
            range: RangeSelector::new(),
            overlay: None,
            cursor: 0,
            load_seq: 0,
            version: 0,
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn tree(&self) -> &Node {
        &self.tree
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn mode(&self) -> Mode {
        if self.overlay.is_some() {
            Mode::Searching
        } else {
            Mode::Browsing
        }
    }

    pub fn query(&self) -> Option<&str> {
        self.overlay.as_ref().map(|o| o.query.as_str())
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn range(&self) -> &RangeSelector {
        &self.range
    }

    /// View-side answer for drawing expansion arrows; the root is always
    /// open.
    pub fn is_expanded(&self, path: &Path) -> bool {
        path == self.tree.path() || self.expansion.is_expanded(path)
    }

    /// Rows of the full-tree projection.
    pub fn tree_rows(&self) -> Vec<Row<'_>> {
        view::flatten(&self.tree, &self.expansion)
    }

    /// Rows of the overlay projection; empty outside search mode.
    pub fn overlay_rows(&self) -> Vec<OverlayRow<'_>> {
        match &self.overlay {
            Some(overlay) => search::project(&search::search(&self.tree, &overlay.query)),
            None => Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        match self.mode() {
            Mode::Browsing => self.tree_rows().len(),
            Mode::Searching => self.overlay_rows().len(),
        }
    }

    pub fn mark_of(&self, node: &Node) -> Mark {
        self.selection.mark_of(node)
    }

    fn clamp_cursor(&mut self) {
        let count = self.row_count();
        self.cursor = self.cursor.min(count.saturating_sub(1));
    }

    /// Plain cursor movement; leaves range mode.
    pub fn move_cursor(&mut self, delta: isize) {
        self.range.clear();
        self.step_cursor(delta);
    }

    /// Range cursor movement: anchors at the current row if no range is
    /// active, then drags the highlight to the new position.
    pub fn move_cursor_range(&mut self, delta: isize) {
        self.range.begin(self.cursor);
        self.step_cursor(delta);
        self.range.extend(self.cursor);
    }

    fn step_cursor(&mut self, delta: isize) {
        let count = self.row_count();
        if count == 0 {
            self.cursor = 0;
            return;
        }
        let max = count - 1;
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, max as isize) as usize;
    }

    /// Space: commit the active range, or toggle the row under the cursor.
    pub fn toggle_at_cursor(&mut self) {
        if self.range.is_active() {
            self.commit_range();
            return;
        }
        match self.mode() {
            Mode::Browsing => {
                let rows = view::flatten(&self.tree, &self.expansion);
                let Some(node) = view::node_at(&rows, self.cursor) else {
                    return;
                };
                if node.is_dir() {
                    self.selection.toggle_directory(node);
                } else {
                    self.selection.toggle_file(node);
                }
                self.version += 1;
            }
            Mode::Searching => {
                let overlay = self.overlay.as_ref().expect("searching mode has overlay");
                let rows = search::project(&search::search(&self.tree, &overlay.query));
                let Some(row) = rows.get(self.cursor) else {
                    return;
                };
                match row {
                    OverlayRow::Group(node) => self.selection.toggle_directory(node),
                    OverlayRow::File(node) => self.selection.toggle_file(node),
                }
                self.version += 1;
            }
        }
    }

    fn commit_range(&mut self) {
        let Some((lo, hi)) = self.range.bounds() else {
            return;
        };
        match self.mode() {
            Mode::Browsing => {
                let rows = view::flatten(&self.tree, &self.expansion);
                let nodes: Vec<&Node> = rows
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i >= lo && *i <= hi)
                    .map(|(_, row)| row.node)
                    .collect();
                self.range.commit(&mut self.selection, &nodes);
            }
            Mode::Searching => {
                let overlay = self.overlay.as_ref().expect("searching mode has overlay");
                let rows = search::project(&search::search(&self.tree, &overlay.query));
                let nodes: Vec<&Node> = rows
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i >= lo && *i <= hi)
                    .map(|(_, row)| row.node())
                    .collect();
                self.range.commit(&mut self.selection, &nodes);
            }
        }
        self.version += 1;
    }

    /// Enter: expand/collapse a directory row, navigate out of the overlay
    /// into a matched directory, or toggle a matched file.
    pub fn activate_at_cursor(&mut self) {
        match self.mode() {
            Mode::Browsing => {
                self.range.clear();
                let rows = view::flatten(&self.tree, &self.expansion);
                let Some(node) = view::node_at(&rows, self.cursor) else {
                    return;
                };
                // the root row is always expanded; toggling it is meaningless
                if node.path() != self.tree.path() {
                    self.expansion.toggle(node);
                    self.clamp_cursor();
                }
            }
            Mode::Searching => {
                let overlay = self.overlay.as_ref().expect("searching mode has overlay");
                let rows = search::project(&search::search(&self.tree, &overlay.query));
                let Some(row) = rows.get(self.cursor) else {
                    return;
                };
                match row {
                    OverlayRow::Group(node) => {
                        let target = node.path().to_path_buf();
                        self.reveal(&target);
                    }
                    OverlayRow::File(node) => {
                        self.selection.toggle_file(node);
                        self.version += 1;
                    }
                }
            }
        }
    }

    /// Bulk toggle over everything currently visible: the full-tree rows in
    /// browsing mode (minus the root row, which would drag the entire tree
    /// in regardless of visibility), the matched file rows in search mode.
    pub fn toggle_visible(&mut self) {
        self.range.clear();
        match self.mode() {
            Mode::Browsing => {
                let rows = view::flatten(&self.tree, &self.expansion);
                let nodes: Vec<&Node> = rows.iter().skip(1).map(|row| row.node).collect();
                self.selection.toggle_all_visible(&nodes);
            }
            Mode::Searching => {
                let overlay = self.overlay.as_ref().expect("searching mode has overlay");
                let rows = search::project(&search::search(&self.tree, &overlay.query));
                let files = search::projected_files(&rows);
                self.selection.toggle_all_visible(&files);
            }
        }
        self.version += 1;
    }

    /// Enter search mode with an empty query. Reuses the existing overlay
    /// reference if one is already active.
    pub fn begin_search(&mut self) {
        if self.overlay.is_none() {
            self.overlay = Some(Overlay {
                query: String::new(),
                saved_cursor: self.cursor,
            });
            self.cursor = 0;
        }
        self.range.clear();
    }

    /// Replace the active query. The projection changes, so the cursor
    /// resets and any range highlight is meaningless.
    pub fn set_query(&mut self, query: &str) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.query = query.to_string();
            self.cursor = 0;
            self.range.clear();
        }
    }

    /// Cancel the overlay: matches and grouped rows are discarded, the
    /// full-tree view returns with its saved cursor, and whatever was
    /// expanded stays expanded.
    pub fn cancel_search(&mut self) {
        if let Some(overlay) = self.overlay.take() {
            self.cursor = overlay.saved_cursor;
            self.range.clear();
            self.clamp_cursor();
        }
    }

    /// Leave the overlay by navigating to a directory: expand it and every
    /// ancestor up to the root so the target is immediately on screen.
    pub fn reveal(&mut self, dir_path: &Path) {
        let root = self.root_path.clone();
        self.expansion.expand_with_ancestors(dir_path, &root);
        self.overlay = None;
        self.range.clear();
        let rows = view::flatten(&self.tree, &self.expansion);
        self.cursor = view::index_of(&rows, dir_path).unwrap_or(0);
    }

    /// Pre-populate the selection from a template's validated paths.
    pub fn preload_files(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.selection.replace_files(paths);
        self.version += 1;
    }

    /// Drop every mark.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.range.clear();
        self.version += 1;
    }

    /// Start a tree reload; the returned ticket must accompany completion.
    pub fn begin_tree_load(&mut self) -> LoadTicket {
        self.load_seq += 1;
        LoadTicket(self.load_seq)
    }

    /// Install a freshly loaded tree, unless a newer load has been started
    /// since; stale completions are dropped without touching any state.
    /// Selection and expansion survive a refresh by identity.
    pub fn complete_tree_load(&mut self, ticket: LoadTicket, tree: Node) -> bool {
        if ticket.0 != self.load_seq {
            return false;
        }
        self.tree = tree;
        self.range.clear();
        self.clamp_cursor();
        true
    }
}
