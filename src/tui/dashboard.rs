//! Live dashboard: metric panels over a filterable task table.
//!
//! The app owns the [`Store`] and subscribes to it, so any committed mutation
//! marks the cached analytics and task view stale. Search input is debounced
//! before it reaches the filter pipeline.

use std::cell::Cell;
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell as TableCell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};

use crate::analytics::Dashboard;
use crate::display::{format_due_relative, format_priority, format_status, truncate};
use crate::fields::{TaskId, TaskStatus};
use crate::query::{self, QueryContext, TaskFilter, TaskSort};
use crate::store::Store;
use crate::tui::colors::{priority_color, status_color, utilization_color, GOLD};
use crate::tui::input::InputField;
use crate::debounce::SearchDebounce;

const FILTERS: [TaskFilter; 10] = [
    TaskFilter::All,
    TaskFilter::AssignedToMe,
    TaskFilter::Status(TaskStatus::Todo),
    TaskFilter::Status(TaskStatus::InProgress),
    TaskFilter::Status(TaskStatus::Review),
    TaskFilter::Status(TaskStatus::Completed),
    TaskFilter::Status(TaskStatus::Blocked),
    TaskFilter::Status(TaskStatus::Cancelled),
    TaskFilter::Overdue,
    TaskFilter::DueThisWeek,
];

fn filter_label(filter: TaskFilter) -> String {
    match filter {
        TaskFilter::All => "All".into(),
        TaskFilter::AssignedToMe => "Mine".into(),
        TaskFilter::Status(s) => format_status(s).into(),
        TaskFilter::Overdue => "Overdue".into(),
        TaskFilter::DueThisWeek => "This week".into(),
    }
}

fn sort_label(sort: TaskSort) -> &'static str {
    match sort {
        TaskSort::Created => "Newest",
        TaskSort::Due => "Due date",
        TaskSort::Priority => "Priority",
        TaskSort::Title => "Title",
        TaskSort::Status => "Status",
    }
}

pub struct DashboardApp {
    store: Store,
    stale: Rc<Cell<bool>>,
    metrics: Dashboard,
    search: InputField,
    debounce: SearchDebounce,
    filter_index: usize,
    sort: TaskSort,
    view: Vec<TaskId>,
    table_state: TableState,
    status_message: Option<String>,
}

impl DashboardApp {
    pub fn new(mut store: Store, search_quiet: Duration) -> Self {
        let stale = Rc::new(Cell::new(false));
        let flag = Rc::clone(&stale);
        store.subscribe(move |_| flag.set(true));
        let metrics = Dashboard::from_store(&store);
        let mut app = DashboardApp {
            store,
            stale,
            metrics,
            search: InputField::new(),
            debounce: SearchDebounce::new(search_quiet),
            filter_index: 0,
            sort: TaskSort::Created,
            view: Vec::new(),
            table_state: TableState::default(),
            status_message: None,
        };
        app.refresh_view();
        app
    }

    pub fn filter(&self) -> TaskFilter {
        FILTERS[self.filter_index]
    }

    /// Task ids currently shown, in display order.
    pub fn view(&self) -> &[TaskId] {
        &self.view
    }

    pub fn metrics(&self) -> &Dashboard {
        &self.metrics
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn refresh_view(&mut self) {
        let ctx = QueryContext { current_user: self.store.current_user_id(), now: self.store.now() };
        self.view = query::apply(self.store.tasks(), self.debounce.applied(), &self.filter(), self.sort, &ctx)
            .into_iter()
            .map(|t| t.id)
            .collect();
        let selected = match self.table_state.selected() {
            _ if self.view.is_empty() => None,
            Some(i) => Some(i.min(self.view.len() - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    /// Apply due search text and pick up store changes.
    pub fn tick(&mut self, now: Instant) {
        let search_changed = self.debounce.poll(now);
        if self.stale.replace(false) {
            self.metrics = Dashboard::from_store(&self.store);
            self.refresh_view();
        } else if search_changed {
            self.refresh_view();
        }
    }

    fn selected_task(&self) -> Option<TaskId> {
        self.table_state.selected().and_then(|i| self.view.get(i)).copied()
    }

    fn toggle_selected(&mut self) {
        let Some(id) = self.selected_task() else {
            return;
        };
        let Some(task) = self.store.task(id) else {
            return;
        };
        let next = if task.is_completed() { TaskStatus::Todo } else { TaskStatus::Completed };
        let title = task.title.clone();
        self.store.set_task_status(id, next);
        self.status_message = Some(format!("{} -> {}", truncate(&title, 30), format_status(next)));
    }

    fn move_selection(&mut self, down: bool) {
        if self.view.is_empty() {
            return;
        }
        let last = self.view.len() - 1;
        let i = self.table_state.selected().unwrap_or(0);
        let next = if down { (i + 1).min(last) } else { i.saturating_sub(1) };
        self.table_state.select(Some(next));
    }

    /// Handle one key press. Returns true when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode, now: Instant) -> bool {
        self.status_message = None;
        if self.search.active {
            match code {
                KeyCode::Enter | KeyCode::Esc => self.search.active = false,
                KeyCode::Char(c) => self.search.handle_char(c),
                KeyCode::Backspace => self.search.handle_backspace(),
                KeyCode::Delete => self.search.handle_delete(),
                KeyCode::Left => self.search.move_cursor_left(),
                KeyCode::Right => self.search.move_cursor_right(),
                _ => return false,
            }
            self.debounce.input(&self.search.value, now);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('/') => self.search.active = true,
            KeyCode::Char('x') => {
                self.search.clear();
                self.debounce.input("", now);
            }
            KeyCode::Char('f') => {
                self.filter_index = (self.filter_index + 1) % FILTERS.len();
                self.refresh_view();
            }
            KeyCode::Char('s') => {
                let sorts = TaskSort::value_variants();
                let i = sorts.iter().position(|s| *s == self.sort).unwrap_or(0);
                self.sort = sorts[(i + 1) % sorts.len()];
                self.refresh_view();
            }
            KeyCode::Char('c') | KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
            _ => {}
        }
        false
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.tick(Instant::now());
            terminal.draw(|f| self.render(f))?;
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key(key.code, Instant::now()) {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(8),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_metrics(f, chunks[1]);
        self.render_tasks(f, chunks[2]);
        self.render_search(f, chunks[3]);
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let user = self
            .store
            .current_user()
            .map(|u| u.name.clone())
            .unwrap_or_else(|| "no user".into());
        let line = Line::from(vec![
            Span::styled("WORKBOARD", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("{user}  View: {}  Sort: {}", filter_label(self.filter()), sort_label(self.sort)),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]);
        let header = Paragraph::new(line)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_metrics(&self, f: &mut Frame, area: Rect) {
        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)])
            .split(area);

        let p = &self.metrics.productivity;
        let productivity = vec![
            Line::from(format!("Tasks: {}  Overdue: {}", p.total_tasks, p.overdue)),
            Line::from(format!("Completion: {:.1}%", p.completion_rate)),
            Line::from(format!("Avg time: {:.1}h", p.average_completion_hours)),
            Line::from(format!("This week: {} (last {})", p.completed_this_week, p.completed_last_week)),
            Line::from(Span::styled(
                format!("Trend: {:+.0}%", p.trend),
                Style::default().fg(if p.trend < 0.0 { Color::Red } else { Color::Green }),
            )),
        ];
        f.render_widget(
            Paragraph::new(productivity).block(Block::default().borders(Borders::ALL).title("Productivity")),
            panels[0],
        );

        let fin = &self.metrics.financial;
        let mut budget = vec![
            Line::from(format!("Budget: {:.2}", fin.total_budget)),
            Line::from(Span::styled(
                format!("Spent: {:.2} ({:.1}%)", fin.total_spent, fin.budget_utilization),
                Style::default().fg(utilization_color(fin.budget_utilization)),
            )),
            Line::from(format!("Remaining: {:.2}", fin.remaining)),
            Line::from(format!("Over budget: {}", fin.projects_over_budget)),
        ];
        if let Some(first) = fin.savings_opportunities.first() {
            budget.push(Line::from(Span::styled(first.clone(), Style::default().fg(GOLD))));
        }
        f.render_widget(
            Paragraph::new(budget).block(Block::default().borders(Borders::ALL).title("Budget")),
            panels[1],
        );

        let team = &self.metrics.team;
        let mut lines = vec![
            Line::from(format!("Collaboration: {:.0}/100", team.collaboration_score)),
            Line::from(format!("Velocity: {:.1}h/week", team.team_velocity)),
        ];
        for m in team.members.iter().take(3) {
            lines.push(Line::from(format!(
                "{} {}/{} ({:.0}%)",
                truncate(&m.name, 14),
                m.completed,
                m.total,
                m.efficiency * 100.0
            )));
        }
        f.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Team")),
            panels[2],
        );
    }

    fn render_tasks(&mut self, f: &mut Frame, area: Rect) {
        let now = self.store.now();
        let header = Row::new(["Status", "Pri", "Due", "Title"].iter().map(|h| {
            TableCell::from(*h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(Color::Blue).fg(Color::White))
        .height(1);

        let rows: Vec<Row> = self
            .view
            .iter()
            .filter_map(|id| self.store.task(*id))
            .map(|t| {
                let due_style = if t.is_overdue(now) {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default()
                };
                let title = if t.tags.is_empty() {
                    t.title.clone()
                } else {
                    format!("{} [{}]", t.title, t.tags.join(","))
                };
                Row::new(vec![
                    TableCell::from(format_status(t.status)).style(Style::default().fg(status_color(t.status))),
                    TableCell::from(format_priority(t.priority))
                        .style(Style::default().fg(priority_color(t.priority))),
                    TableCell::from(format_due_relative(t.due_date, now)).style(due_style),
                    TableCell::from(title),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(12),
            Constraint::Length(7),
            Constraint::Length(10),
            Constraint::Min(20),
        ];
        let title = match &self.status_message {
            Some(msg) => msg.clone(),
            None => format!(
                "Tasks ({}/{})  f filter  s sort  / search  c complete  q quit",
                self.view.len(),
                self.store.tasks().len()
            ),
        };
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");
        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_search(&self, f: &mut Frame, area: Rect) {
        let style = if self.search.active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let title = if self.debounce.is_pending() { "Search ..." } else { "Search" };
        let input = Paragraph::new(self.search.value.as_str())
            .style(style)
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(input, area);
        if self.search.active {
            let x = area.x + 1 + self.search.cursor as u16;
            f.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
        }
    }
}
