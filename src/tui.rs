use super::*;
use crate::output::{function_lines, import_export_lines, path_check_lines, tree_lines};
use crate::report::{FunctionIndexView, function_index_view};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs, Wrap};
use std::io;
use std::time::Duration;

const PAGE: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Structure,
    Functions,
    ImportsExports,
    PathCheck,
}

impl Tab {
    const ALL: [Tab; 4] = [
        Tab::Structure,
        Tab::Functions,
        Tab::ImportsExports,
        Tab::PathCheck,
    ];

    fn title(self) -> &'static str {
        match self {
            Tab::Structure => "1 Structure",
            Tab::Functions => "2 Functions",
            Tab::ImportsExports => "3 Imports & Exports",
            Tab::PathCheck => "4 Path Check",
        }
    }

    fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn prev(self) -> Self {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

#[derive(Debug)]
struct DashboardState {
    tab: Tab,
    scroll: [u16; 4],
    search_query: String,
    search_input: String,
    editing_search: bool,
    functions: FunctionIndexView,
}

impl DashboardState {
    fn new(dashboard: &Dashboard, search: &str) -> Self {
        Self {
            tab: Tab::Structure,
            scroll: [0; 4],
            search_query: search.trim().to_string(),
            search_input: String::new(),
            editing_search: false,
            functions: dashboard.functions.clone(),
        }
    }

    fn scroll(&self) -> u16 {
        self.scroll[self.tab.index()]
    }

    fn scroll_by(&mut self, delta: i32, max: usize) {
        let max = u16::try_from(max.saturating_sub(1)).unwrap_or(u16::MAX);
        let slot = &mut self.scroll[self.tab.index()];
        let next = (*slot as i32 + delta).clamp(0, max as i32);
        *slot = next as u16;
    }

    fn apply_search(&mut self, reconciliation: &Reconciliation) {
        self.search_query = self.search_input.trim().to_string();
        self.functions = function_index_view(
            &reconciliation.index,
            &reconciliation.documents,
            &SearchFilter::new(&self.search_query),
        );
        self.scroll[Tab::Functions.index()] = 0;
    }
}

pub(crate) fn print_tui_report(
    dashboard: &Dashboard,
    reconciliation: &Reconciliation,
    search: &str,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut state = DashboardState::new(dashboard, search);

    let result = run_tui_loop(&mut terminal, dashboard, reconciliation, &mut state);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_tui_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    dashboard: &Dashboard,
    reconciliation: &Reconciliation,
    state: &mut DashboardState,
) -> Result<()> {
    loop {
        terminal.draw(|frame| draw_page(frame, dashboard, state))?;

        if event::poll(Duration::from_millis(200))? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            let line_count = tab_lines(dashboard, state).len();
            if handle_key(key.code, state, reconciliation, line_count) {
                break;
            }
        }
    }

    Ok(())
}

/// Returns true when the dashboard should close.
fn handle_key(
    code: KeyCode,
    state: &mut DashboardState,
    reconciliation: &Reconciliation,
    line_count: usize,
) -> bool {
    if state.editing_search {
        match code {
            KeyCode::Enter => {
                state.editing_search = false;
                state.apply_search(reconciliation);
            }
            KeyCode::Esc => {
                state.editing_search = false;
                state.search_input.clear();
            }
            KeyCode::Backspace => {
                state.search_input.pop();
            }
            KeyCode::Char(c) => state.search_input.push(c),
            _ => {}
        }
        return false;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => state.tab = state.tab.next(),
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => state.tab = state.tab.prev(),
        KeyCode::Char(c @ '1'..='4') => {
            let idx = c as usize - '1' as usize;
            state.tab = Tab::ALL[idx];
        }
        KeyCode::Down | KeyCode::Char('j') => state.scroll_by(1, line_count),
        KeyCode::Up | KeyCode::Char('k') => state.scroll_by(-1, line_count),
        KeyCode::PageDown => state.scroll_by(PAGE as i32, line_count),
        KeyCode::PageUp => state.scroll_by(-(PAGE as i32), line_count),
        KeyCode::Home | KeyCode::Char('g') => state.scroll[state.tab.index()] = 0,
        KeyCode::Char('/') => {
            state.tab = Tab::Functions;
            state.editing_search = true;
            state.search_input = state.search_query.clone();
        }
        _ => {}
    }
    false
}

fn tab_lines(dashboard: &Dashboard, state: &DashboardState) -> Vec<String> {
    match state.tab {
        Tab::Structure => tree_lines(&dashboard.tree),
        Tab::Functions => function_lines(&state.functions),
        Tab::ImportsExports => import_export_lines(&dashboard.imports_exports),
        Tab::PathCheck => path_check_lines(&dashboard.path_check),
    }
}

fn draw_page(frame: &mut Frame, dashboard: &Dashboard, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let titles: Vec<&str> = Tab::ALL.iter().map(|t| t.title()).collect();
    let tabs = Tabs::new(titles)
        .select(state.tab.index())
        .block(Block::default().borders(Borders::ALL).title("usedex"))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, chunks[0]);

    let lines: Vec<Line> = tab_lines(dashboard, state)
        .into_iter()
        .map(Line::from)
        .collect();
    let body = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(state.tab.title()),
        )
        .scroll((state.scroll(), 0));
    frame.render_widget(body, chunks[1]);

    let status = if state.editing_search {
        format!("Search: {}_  (Enter apply | Esc cancel)", state.search_input)
    } else {
        format!(
            "search='{}' | tab/1-4 switch | j/k scroll | / search | q quit",
            if state.search_query.is_empty() {
                "(none)"
            } else {
                state.search_query.as_str()
            }
        )
    };
    let footer = Paragraph::new(status)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Dashboard, Reconciliation) {
        let mut doc = SidecarDocument::default();
        doc.functions.insert("fetchRates".into(), FunctionRecord::default());
        doc.functions.insert("render".into(), FunctionRecord::default());

        let mut reconciliation = Reconciliation::default();
        reconciliation.index.insert_document("a.js", &doc);
        reconciliation.documents.insert("a.js".into(), doc.clone());

        let live: BTreeMap<String, SidecarDocument> = [("a.js".to_string(), doc)].into();
        let dashboard = crate::report::build_dashboard(&live, &reconciliation, &SearchFilter::default());
        (dashboard, reconciliation)
    }

    #[test]
    fn tabs_cycle_in_both_directions() {
        assert_eq!(Tab::Structure.next(), Tab::Functions);
        assert_eq!(Tab::PathCheck.next(), Tab::Structure);
        assert_eq!(Tab::Structure.prev(), Tab::PathCheck);
    }

    #[test]
    fn search_input_narrows_function_tab() {
        let (dashboard, reconciliation) = fixture();
        let mut state = DashboardState::new(&dashboard, "");
        assert_eq!(state.functions.total, 2);

        handle_key(KeyCode::Char('/'), &mut state, &reconciliation, 0);
        assert_eq!(state.tab, Tab::Functions);
        for c in "RATE".chars() {
            handle_key(KeyCode::Char(c), &mut state, &reconciliation, 0);
        }
        assert!(!handle_key(KeyCode::Char('q'), &mut state, &reconciliation, 0));
        handle_key(KeyCode::Backspace, &mut state, &reconciliation, 0);
        handle_key(KeyCode::Enter, &mut state, &reconciliation, 0);

        assert_eq!(state.search_query, "RATE");
        assert_eq!(state.functions.total, 1);
        assert_eq!(state.functions.entries[0].name, "fetchRates");
    }

    #[test]
    fn scrolling_is_clamped_to_content() {
        let (dashboard, reconciliation) = fixture();
        let mut state = DashboardState::new(&dashboard, "");

        handle_key(KeyCode::Up, &mut state, &reconciliation, 5);
        assert_eq!(state.scroll(), 0);
        handle_key(KeyCode::PageDown, &mut state, &reconciliation, 5);
        assert_eq!(state.scroll(), 4);
    }

    #[test]
    fn quit_keys_close_dashboard() {
        let (dashboard, reconciliation) = fixture();
        let mut state = DashboardState::new(&dashboard, "");
        assert!(handle_key(KeyCode::Char('q'), &mut state, &reconciliation, 0));
    }
}
