//! Terminal UI
//!
//! ratatui + crossterm adapter over the core session. This layer holds no
//! selection logic of its own: every key press translates into a session
//! command, and every frame reads the current projection back out. The core
//! stays testable with no terminal present.

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::core::paths::make_relative;
use crate::core::search::OverlayRow;
use crate::core::selection::Mark;
use crate::core::session::{Mode, Session};
use crate::core::tokenizer::estimate_tokens_heuristic;
use crate::templates::TemplateStore;
use crate::walker::{load_tree, read_file_text, WalkOptions};

const CURSOR_STYLE: Modifier = Modifier::REVERSED;
const RANGE_COLOR: Color = Color::Yellow;
const GROUP_COLOR: Color = Color::Cyan;
const DIR_COLOR: Color = Color::LightBlue;
const FOOTER_KEY_COLOR: Color = Color::Cyan;
const FOOTER_LABEL_COLOR: Color = Color::Gray;

/// How the interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Quit and emit the marked files as a document.
    Emit,
    /// Quit without producing output.
    Discard,
}

/// Drive the interactive session until the user quits; hands the session
/// back so the caller can render the document after the terminal is
/// restored.
pub fn run(
    session: Session,
    store: TemplateStore,
    walk_options: WalkOptions,
) -> Result<(Session, Outcome)> {
    let mut terminal = TerminalSession::new()?;
    let mut app = App::new(session, store, walk_options);

    while !app.should_quit {
        app.refresh_token_estimate();
        terminal.draw(|frame| draw(frame, &mut app))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }
    }

    Ok((app.session, app.outcome))
}

enum Input {
    None,
    SaveName(String),
}

struct App {
    session: Session,
    store: TemplateStore,
    walk_options: WalkOptions,
    input: Input,
    toast: Option<String>,
    should_quit: bool,
    outcome: Outcome,
    token_estimate: usize,
    token_version: Option<u64>,
}

impl App {
    fn new(session: Session, store: TemplateStore, walk_options: WalkOptions) -> Self {
        Self {
            session,
            store,
            walk_options,
            input: Input::None,
            toast: None,
            should_quit: false,
            outcome: Outcome::Discard,
            token_estimate: 0,
            token_version: None,
        }
    }

    /// Recompute the running token estimate when the selection changed.
    /// Uses the heuristic model; the accurate count happens at export.
    fn refresh_token_estimate(&mut self) {
        let version = self.session.version();
        if self.token_version == Some(version) {
            return;
        }
        let mut total = 0usize;
        for path in self.session.selection().selected_file_paths() {
            if let Ok(text) = read_file_text(path) {
                total += estimate_tokens_heuristic(&text);
            }
        }
        self.token_estimate = total;
        self.token_version = Some(version);
    }

    fn set_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(message.into());
    }

    fn handle_key(&mut self, key: KeyEvent) {
        self.toast = None;
        if matches!(self.input, Input::SaveName(_)) {
            self.handle_save_input(key.code);
            return;
        }
        match self.session.mode() {
            Mode::Browsing => self.handle_browse_key(key),
            Mode::Searching => self.handle_search_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Char('q') => {
                self.outcome = Outcome::Emit;
                self.should_quit = true;
            }
            KeyCode::Char('Q') => {
                self.outcome = Outcome::Discard;
                self.should_quit = true;
            }
            KeyCode::Down if shift => self.session.move_cursor_range(1),
            KeyCode::Up if shift => self.session.move_cursor_range(-1),
            KeyCode::Char('J') => self.session.move_cursor_range(1),
            KeyCode::Char('K') => self.session.move_cursor_range(-1),
            KeyCode::Down | KeyCode::Char('j') => self.session.move_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.session.move_cursor(-1),
            KeyCode::PageDown => self.session.move_cursor(10),
            KeyCode::PageUp => self.session.move_cursor(-10),
            KeyCode::Char(' ') => self.session.toggle_at_cursor(),
            KeyCode::Enter => self.session.activate_at_cursor(),
            KeyCode::Char('a') => self.session.toggle_visible(),
            KeyCode::Char('c') => {
                if !self.session.selection().is_empty() {
                    self.session.clear_selection();
                    self.set_toast("cleared all marks");
                }
            }
            KeyCode::Char('/') => self.session.begin_search(),
            KeyCode::Char('s') => self.input = Input::SaveName(String::new()),
            KeyCode::Char('r') => self.reload_tree(),
            KeyCode::Esc => self.session.move_cursor(0),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.session.cancel_search(),
            KeyCode::Enter => self.session.activate_at_cursor(),
            KeyCode::Down if shift => self.session.move_cursor_range(1),
            KeyCode::Up if shift => self.session.move_cursor_range(-1),
            KeyCode::Down => self.session.move_cursor(1),
            KeyCode::Up => self.session.move_cursor(-1),
            KeyCode::Tab => self.session.toggle_at_cursor(),
            KeyCode::Char('a') if ctrl => self.session.toggle_visible(),
            KeyCode::Backspace => {
                let mut query = self.session.query().unwrap_or_default().to_string();
                query.pop();
                self.session.set_query(&query);
            }
            KeyCode::Char(c) if !ctrl => {
                let mut query = self.session.query().unwrap_or_default().to_string();
                query.push(c);
                self.session.set_query(&query);
            }
            _ => {}
        }
    }

    fn handle_save_input(&mut self, code: KeyCode) {
        let Input::SaveName(name) = &mut self.input else {
            return;
        };
        match code {
            KeyCode::Esc => self.input = Input::None,
            KeyCode::Enter => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    self.input = Input::None;
                    return;
                }
                let root = self.session.root_path().to_path_buf();
                let files: Vec<String> = self
                    .session
                    .selection()
                    .selected_file_paths()
                    .filter_map(|p| make_relative(p, &root))
                    .collect();
                match self.store.save(&name, &files) {
                    Ok(()) => {
                        self.set_toast(format!("saved template '{}' ({} files)", name, files.len()))
                    }
                    Err(err) => self.set_toast(format!("save failed: {}", err)),
                }
                self.input = Input::None;
            }
            KeyCode::Backspace => {
                name.pop();
            }
            KeyCode::Char(c) => name.push(c),
            _ => {}
        }
    }

    fn reload_tree(&mut self) {
        let ticket = self.session.begin_tree_load();
        match load_tree(self.session.root_path(), &self.walk_options) {
            Ok(loaded) => {
                if loaded.skipped > 0 {
                    self.set_toast(format!("reloaded ({} entries skipped)", loaded.skipped));
                }
                self.session.complete_tree_load(ticket, loaded.tree);
            }
            Err(err) => self.set_toast(format!("reload failed: {}", err)),
        }
    }
}

fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.size());

    match app.session.mode() {
        Mode::Browsing => draw_tree(frame, layout[0], app),
        Mode::Searching => draw_overlay(frame, layout[0], app),
    }
    draw_footer(frame, layout[1], app);
}

fn mark_str(mark: Mark) -> &'static str {
    match mark {
        Mark::Full => "[x] ",
        Mark::Partial => "[~] ",
        Mark::None => "[ ] ",
    }
}

fn draw_tree(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let rows = app.session.tree_rows();
    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let node = row.node;
            let indent = "  ".repeat(row.depth);
            let mark = mark_str(app.session.mark_of(node));
            let line = if node.is_dir() {
                let arrow = if app.session.is_expanded(node.path()) {
                    "▾ "
                } else {
                    "▸ "
                };
                Line::from(vec![
                    Span::raw(format!("{}{}", indent, mark)),
                    Span::styled(
                        format!("{}{}/", arrow, node.name()),
                        Style::default().fg(DIR_COLOR),
                    ),
                ])
            } else {
                Line::from(format!("{}{}{}", indent, mark, node.name()))
            };
            let mut item = ListItem::new(line);
            if app.session.range().contains(i) {
                item = item.style(Style::default().fg(RANGE_COLOR).add_modifier(Modifier::BOLD));
            }
            item
        })
        .collect();

    let title = format!(" {} ", app.session.root_path().display());
    render_list(frame, area, items, title, app.session.cursor());
}

fn draw_overlay(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let rows = app.session.overlay_rows();
    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let line = match row {
                OverlayRow::Group(node) => {
                    let label = if node.relative().is_empty() {
                        ".".to_string()
                    } else {
                        node.relative().to_string()
                    };
                    Line::from(vec![
                        Span::raw(mark_str(app.session.mark_of(node))),
                        Span::styled(
                            format!("{}/", label),
                            Style::default().fg(GROUP_COLOR).add_modifier(Modifier::BOLD),
                        ),
                    ])
                }
                OverlayRow::File(node) => Line::from(format!(
                    "  {}{}",
                    mark_str(app.session.mark_of(node)),
                    node.name()
                )),
            };
            let mut item = ListItem::new(line);
            if app.session.range().contains(i) {
                item = item.style(Style::default().fg(RANGE_COLOR).add_modifier(Modifier::BOLD));
            }
            item
        })
        .collect();

    let title = format!(" search: {}_ ", app.session.query().unwrap_or_default());
    render_list(frame, area, items, title, app.session.cursor());
}

fn render_list(frame: &mut Frame<'_>, area: Rect, items: Vec<ListItem>, title: String, cursor: usize) {
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(CURSOR_STYLE));
    let mut state = ListState::default();
    state.select(Some(cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn footer_hints(app: &App) -> Vec<Span<'static>> {
    let pairs: &[(&str, &str)] = if matches!(app.input, Input::SaveName(_)) {
        &[("enter", "save"), ("esc", "cancel")]
    } else {
        match app.session.mode() {
            Mode::Browsing => &[
                ("space", "mark"),
                ("enter", "open"),
                ("shift+↕", "range"),
                ("/", "search"),
                ("a", "all"),
                ("s", "save"),
                ("q", "emit"),
                ("Q", "quit"),
            ],
            Mode::Searching => &[
                ("enter", "go"),
                ("tab", "mark"),
                ("shift+↕", "range"),
                ("esc", "back"),
            ],
        }
    };
    let mut spans = Vec::new();
    for (key, label) in pairs {
        spans.push(Span::styled(
            format!(" {}", key),
            Style::default().fg(FOOTER_KEY_COLOR),
        ));
        spans.push(Span::styled(
            format!(" {} ", label),
            Style::default().fg(FOOTER_LABEL_COLOR),
        ));
    }
    spans
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let status = format!(
        "{} files · ~{} tok ",
        app.session.selection().selected_file_count(),
        app.token_estimate
    );
    let left = if let Input::SaveName(name) = &app.input {
        Line::from(vec![
            Span::styled(" template name: ", Style::default().fg(FOOTER_LABEL_COLOR)),
            Span::raw(format!("{}_", name)),
        ])
    } else if let Some(toast) = &app.toast {
        Line::from(Span::styled(
            format!(" {}", toast),
            Style::default().fg(RANGE_COLOR),
        ))
    } else {
        Line::from(footer_hints(app))
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(status.len() as u16)])
        .split(area);
    frame.render_widget(Paragraph::new(left), columns[0]);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            status,
            Style::default().fg(FOOTER_LABEL_COLOR),
        ))),
        columns[1],
    );
}

struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|err| {
            teardown_terminal();
            err
        })?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(|err| {
            teardown_terminal();
            err
        })?;
        terminal.clear().map_err(|err| {
            teardown_terminal();
            err
        })?;

        Ok(Self { terminal })
    }

    fn draw(&mut self, draw_fn: impl FnOnce(&mut Frame<'_>)) -> io::Result<()> {
        self.terminal.draw(draw_fn)?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        teardown_terminal();
    }
}

fn teardown_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_str_variants() {
        assert_eq!(mark_str(Mark::Full), "[x] ");
        assert_eq!(mark_str(Mark::Partial), "[~] ");
        assert_eq!(mark_str(Mark::None), "[ ] ");
    }
}
