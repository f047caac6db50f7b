//! Command implementations for the CLI interface.
//!
//! Each handler validates its input before touching the store, resolves entity
//! arguments by id, id prefix or name, and prints a short confirmation.

use std::fmt::Display;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{CommandFactory, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};

use crate::analytics::{project_analytics, Dashboard};
use crate::cli::Cli;
use crate::display::*;
use crate::fields::*;
use crate::parse::{end_of_day, parse_date_input, split_and_normalise_tags, start_of_day};
use crate::project::{Project, ProjectPatch};
use crate::query::{self, ProjectFilter, ProjectSort, QueryContext, TaskFilter, TaskSort};
use crate::store::Store;
use crate::task::{Task, TaskPatch};
use crate::user::{Preferences, User, UserPatch};
use crate::validate::*;

#[derive(Subcommand)]
pub enum Commands {
    /// Create your user and make it current.
    Onboard {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, value_enum, default_value_t = Role::Member)]
        role: Role,
        /// Hour the working day starts (0-23).
        #[arg(long, default_value_t = 9)]
        work_start: u8,
        /// Hour the working day ends (1-24).
        #[arg(long, default_value_t = 17)]
        work_end: u8,
        /// Minutes between break reminders, 0 to disable.
        #[arg(long, default_value_t = 60)]
        break_interval: u32,
        #[arg(long, value_enum, default_value_t = Theme::System)]
        theme: Theme,
        /// Turn reminders off.
        #[arg(long)]
        no_notifications: bool,
    },

    /// Manage users.
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Show productivity, budget and team analytics.
    Stats {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Launch the interactive dashboard.
    Dashboard,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Add a user without switching to them.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, value_enum, default_value_t = Role::Member)]
        role: Role,
    },
    /// List users.
    List,
    /// Make a user current.
    Switch {
        /// User id, id prefix or name.
        user: String,
    },
    /// Update a user's details.
    Update {
        user: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, value_enum)]
        role: Option<Role>,
    },
    /// Change preferences of the current user (or --user).
    Prefs {
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        notifications: Option<bool>,
        #[arg(long)]
        work_start: Option<u8>,
        #[arg(long)]
        work_end: Option<u8>,
        #[arg(long)]
        break_interval: Option<u32>,
        #[arg(long, value_enum)]
        theme: Option<Theme>,
    },
    /// Delete a user.
    Delete { user: String },
}

/// Task list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskView {
    All,
    Mine,
    Todo,
    InProgress,
    Review,
    Completed,
    Blocked,
    Cancelled,
    Overdue,
    ThisWeek,
}

impl From<TaskView> for TaskFilter {
    fn from(view: TaskView) -> Self {
        match view {
            TaskView::All => TaskFilter::All,
            TaskView::Mine => TaskFilter::AssignedToMe,
            TaskView::Todo => TaskFilter::Status(TaskStatus::Todo),
            TaskView::InProgress => TaskFilter::Status(TaskStatus::InProgress),
            TaskView::Review => TaskFilter::Status(TaskStatus::Review),
            TaskView::Completed => TaskFilter::Status(TaskStatus::Completed),
            TaskView::Blocked => TaskFilter::Status(TaskStatus::Blocked),
            TaskView::Cancelled => TaskFilter::Status(TaskStatus::Cancelled),
            TaskView::Overdue => TaskFilter::Overdue,
            TaskView::ThisWeek => TaskFilter::DueThisWeek,
        }
    }
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Project id, id prefix or name.
        #[arg(long)]
        project: Option<String>,
        /// Assignee id, id prefix or name.
        #[arg(long)]
        assignee: Option<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "friday", or "in Nd".
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Estimated hours.
        #[arg(long)]
        estimate: Option<f64>,
        #[arg(long)]
        budget: Option<f64>,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// List tasks.
    List {
        /// Case-insensitive text matched against title, description and tags.
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_enum, default_value_t = TaskView::All)]
        filter: TaskView,
        #[arg(long, value_enum, default_value_t = TaskSort::Created)]
        sort: TaskSort,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task.
    View { task: String },

    /// Update fields on a task.
    Update {
        task: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        status: Option<TaskStatus>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        clear_project: bool,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        unassign: bool,
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        estimate: Option<f64>,
        /// Hours actually spent.
        #[arg(long)]
        actual_hours: Option<f64>,
        #[arg(long)]
        budget: Option<f64>,
        /// Actual cost so far.
        #[arg(long)]
        cost: Option<f64>,
        /// Add tags. May be repeated and comma-separated.
        #[arg(long = "add-tag")]
        add_tags: Vec<String>,
        /// Remove tags. May be repeated and comma-separated.
        #[arg(long = "rm-tag")]
        rm_tags: Vec<String>,
    },

    /// Mark a task completed.
    Complete { task: String },

    /// Move a task back to todo.
    Reopen { task: String },

    /// Comment on a task as the current user.
    Comment { task: String, body: String },

    /// Delete a task.
    Delete { task: String },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Add a project owned by the current user.
    Add {
        name: String,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum, default_value_t = ProjectStatus::Planning)]
        status: ProjectStatus,
        /// Start date, defaults to today.
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        budget: Option<f64>,
        /// Member id, id prefix or name. May be repeated.
        #[arg(long = "member")]
        members: Vec<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// List projects.
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_enum, default_value_t = ProjectFilter::All)]
        filter: ProjectFilter,
        #[arg(long, value_enum, default_value_t = ProjectSort::Created)]
        sort: ProjectSort,
    },

    /// View a project with its analytics.
    View { project: String },

    /// Update fields on a project.
    Update {
        project: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        status: Option<ProjectStatus>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        clear_end: bool,
        #[arg(long)]
        budget: Option<f64>,
        /// Actual cost so far.
        #[arg(long)]
        cost: Option<f64>,
        #[arg(long = "add-member")]
        add_members: Vec<String>,
        #[arg(long = "rm-member")]
        rm_members: Vec<String>,
        #[arg(long = "add-tag")]
        add_tags: Vec<String>,
        #[arg(long = "rm-tag")]
        rm_tags: Vec<String>,
    },

    /// Hide a project from the default views.
    Archive { project: String },

    /// Restore an archived project.
    Unarchive { project: String },

    /// Delete a project and all of its tasks.
    Delete { project: String },
}

/// Resolve an entity by unique case-insensitive name, full id, or unique id prefix.
///
/// An exact name wins over an id prefix, so names made of hex digits stay reachable.
fn resolve<'a, T, I: Display>(
    items: &'a [T],
    identifier: &str,
    kind: &str,
    id_of: impl Fn(&T) -> I,
    name_of: impl Fn(&T) -> &str,
) -> Result<&'a T> {
    let ident = identifier.trim().to_lowercase();
    if ident.is_empty() {
        bail!("No {kind} given");
    }
    let by_name: Vec<&T> = items.iter().filter(|it| name_of(it).to_lowercase() == ident).collect();
    if by_name.len() == 1 {
        return Ok(by_name[0]);
    }
    let by_id: Vec<&T> = items.iter().filter(|it| id_of(it).to_string().starts_with(&ident)).collect();
    match (by_id.len(), by_name.len()) {
        (1, _) => Ok(by_id[0]),
        (0, 0) => bail!("No {kind} found matching '{identifier}'"),
        (_, 0) => bail!("Ambiguous {kind} id prefix '{identifier}'; use more characters"),
        _ => {
            let mut msg = format!("Multiple {kind}s named '{identifier}':\n");
            for it in by_name {
                msg.push_str(&format!("  {} {}\n", short_id(&id_of(it)), name_of(it)));
            }
            msg.push_str("Please use the id instead.");
            Err(anyhow!(msg))
        }
    }
}

fn find_task<'a>(store: &'a Store, ident: &str) -> Result<&'a Task> {
    resolve(store.tasks(), ident, "task", |t: &Task| t.id, |t: &Task| t.title.as_str())
}

fn find_project<'a>(store: &'a Store, ident: &str) -> Result<&'a Project> {
    resolve(store.projects(), ident, "project", |p: &Project| p.id, |p: &Project| p.name.as_str())
}

fn find_user<'a>(store: &'a Store, ident: &str) -> Result<&'a User> {
    resolve(store.users(), ident, "user", |u: &User| u.id, |u: &User| u.name.as_str())
}

fn require_current_user(store: &Store) -> Result<UserId> {
    store
        .current_user_id()
        .ok_or_else(|| anyhow!("No current user. Run `wb onboard --name <NAME> --email <EMAIL>` first."))
}

fn parse_date(input: &str, now: DateTime<Utc>) -> Result<NaiveDate> {
    parse_date_input(input, now.date_naive()).ok_or_else(|| {
        anyhow!("Unrecognised date '{input}'. Use YYYY-MM-DD, 'today', 'tomorrow', a weekday, or 'in Nd'.")
    })
}

fn ctx(store: &Store) -> QueryContext {
    QueryContext { current_user: store.current_user_id(), now: store.now() }
}

fn user_name(store: &Store, id: Option<UserId>) -> String {
    match id {
        Some(id) => store.user(id).map(|u| u.name.clone()).unwrap_or_else(|| short_id(&id)),
        None => "-".into(),
    }
}

/// Create the current user.
#[allow(clippy::too_many_arguments)]
pub fn cmd_onboard(
    store: &mut Store,
    name: String,
    email: String,
    role: Role,
    work_start: u8,
    work_end: u8,
    break_interval: u32,
    theme: Theme,
    no_notifications: bool,
) -> Result<()> {
    let preferences = Preferences {
        notifications: !no_notifications,
        work_start_hour: work_start,
        work_end_hour: work_end,
        break_interval_minutes: break_interval,
        theme,
    };
    let draft = UserForm { name, email, role, preferences }.validate()?;
    let id = store.onboard(draft);
    println!("Welcome, {}! You are user {}.", user_name(store, Some(id)), short_id(&id));
    Ok(())
}

pub fn cmd_user(store: &mut Store, action: UserAction) -> Result<()> {
    match action {
        UserAction::Add { name, email, role } => {
            let draft = UserForm { name, email, role, ..Default::default() }.validate()?;
            let id = store.create_user(draft);
            println!("Added user {}", short_id(&id));
        }
        UserAction::List => {
            let current = store.current_user_id();
            println!("{:<2} {:<9} {:<8} {:<24} {}", "", "ID", "Role", "Name", "Email");
            for u in store.users() {
                println!(
                    "{:<2} {:<9} {:<8} {:<24} {}",
                    if Some(u.id) == current { "*" } else { "" },
                    short_id(&u.id),
                    format_role(u.role),
                    truncate(&u.name, 24),
                    u.email
                );
            }
        }
        UserAction::Switch { user } => {
            let id = find_user(store, &user)?.id;
            store.set_current_user(Some(id));
            println!("Current user is now {}", user_name(store, Some(id)));
        }
        UserAction::Update { user, name, email, role } => {
            let id = find_user(store, &user)?.id;
            let patch = UserPatch {
                name: name.map(|n| require_text(&n, "Name")).transpose()?,
                email: email.map(|e| validate_email(&e)).transpose()?,
                role,
            };
            store.update_user(id, patch);
            println!("Updated user {}", short_id(&id));
        }
        UserAction::Prefs { user, notifications, work_start, work_end, break_interval, theme } => {
            let id = match user {
                Some(ident) => find_user(store, &ident)?.id,
                None => require_current_user(store)?,
            };
            let mut prefs = store.user(id).map(|u| u.preferences.clone()).unwrap_or_default();
            if let Some(v) = notifications { prefs.notifications = v; }
            if let Some(v) = work_start { prefs.work_start_hour = v; }
            if let Some(v) = work_end { prefs.work_end_hour = v; }
            if let Some(v) = break_interval { prefs.break_interval_minutes = v; }
            if let Some(v) = theme { prefs.theme = v; }
            validate_preferences(&prefs)?;
            println!(
                "Notifications: {}, work hours {:02}:00-{:02}:00, break every {} min, theme {}",
                if prefs.notifications { "on" } else { "off" },
                prefs.work_start_hour,
                prefs.work_end_hour,
                prefs.break_interval_minutes,
                format_theme(prefs.theme)
            );
            store.set_preferences(id, prefs);
        }
        UserAction::Delete { user } => {
            let id = find_user(store, &user)?.id;
            store.delete_user(id);
            println!("Deleted user {}", short_id(&id));
        }
    }
    Ok(())
}

pub fn cmd_task(store: &mut Store, action: TaskAction) -> Result<()> {
    let now = store.now();
    match action {
        TaskAction::Add { title, desc, project, assignee, due, priority, estimate, budget, tags } => {
            let project = project.map(|p| find_project(store, &p).map(|p| p.id)).transpose()?;
            let assignee = assignee.map(|a| find_user(store, &a).map(|u| u.id)).transpose()?;
            let due_date = due.map(|d| parse_date(&d, now).map(end_of_day)).transpose()?;
            let draft = TaskForm {
                title,
                description: desc.unwrap_or_default(),
                priority,
                assignee,
                project,
                due_date,
                estimated_hours: estimate,
                tags,
                budget,
            }
            .validate()?;
            let id = store.create_task(draft);
            println!("Added task {}", short_id(&id));
        }

        TaskAction::List { search, filter, sort, limit } => {
            let ctx = ctx(store);
            let mut view = query::apply(store.tasks(), &search, &TaskFilter::from(filter), sort, &ctx);
            if let Some(n) = limit {
                view.truncate(n);
            }
            print_task_table(&view, now);
        }

        TaskAction::View { task } => {
            let t = find_task(store, &task)?;
            let project = t.project.and_then(|p| store.project(p)).map(|p| p.name.clone());
            println!("ID:           {}", t.id);
            println!("Title:        {}", t.title);
            println!("Status:       {}", format_status(t.status));
            println!("Priority:     {}", format_priority(t.priority));
            println!("Project:      {}", project.unwrap_or_else(|| "-".into()));
            println!("Assignee:     {}", user_name(store, t.assignee));
            println!(
                "Due:          {}",
                match t.due_date {
                    Some(d) => format!("{} ({})", d.format("%Y-%m-%d"), format_due_relative(Some(d), now)),
                    None => "-".into(),
                }
            );
            println!(
                "Hours:        {} estimated, {} actual",
                format_money(t.estimated_hours),
                format_money(t.actual_hours)
            );
            println!("Budget:       {} (spent {})", format_money(t.budget), format_money(t.actual_cost));
            println!("Tags:         {}", if t.tags.is_empty() { "-".into() } else { t.tags.join(",") });
            println!("Created:      {}", t.created_at.to_rfc3339());
            println!("Updated:      {}", t.updated_at.to_rfc3339());
            if let Some(done) = t.completed_at {
                println!("Completed:    {}", done.to_rfc3339());
            }
            println!("Description:\n{}\n", if t.description.is_empty() { "-" } else { t.description.as_str() });
            if !t.comments.is_empty() {
                println!("Comments:");
                for c in &t.comments {
                    println!("  [{}] {}: {}", c.created_at.format("%Y-%m-%d %H:%M"), user_name(store, Some(c.author)), c.body);
                }
            }
        }

        TaskAction::Update {
            task, title, desc, status, priority, project, clear_project, assignee, unassign,
            due, clear_due, estimate, actual_hours, budget, cost, add_tags, rm_tags,
        } => {
            let id = find_task(store, &task)?.id;
            let project = match (project, clear_project) {
                (_, true) => Some(None),
                (Some(p), false) => Some(Some(find_project(store, &p)?.id)),
                (None, false) => None,
            };
            let assignee = match (assignee, unassign) {
                (_, true) => Some(None),
                (Some(a), false) => Some(Some(find_user(store, &a)?.id)),
                (None, false) => None,
            };
            let due_date = match (due, clear_due) {
                (_, true) => Some(None),
                (Some(d), false) => Some(Some(end_of_day(parse_date(&d, now)?))),
                (None, false) => None,
            };
            let patch = TaskPatch {
                title: title.map(|t| require_text(&t, "Title")).transpose()?,
                description: desc.map(|d| d.trim().to_string()),
                status,
                priority,
                assignee,
                project,
                due_date,
                estimated_hours: validate_amount(estimate, "Estimated hours")?.map(Some),
                actual_hours: validate_amount(actual_hours, "Actual hours")?.map(Some),
                budget: validate_amount(budget, "Budget")?.map(Some),
                actual_cost: validate_amount(cost, "Cost")?.map(Some),
                add_tags: split_and_normalise_tags(&add_tags),
                remove_tags: split_and_normalise_tags(&rm_tags),
            };
            store.update_task(id, patch);
            println!("Updated task {}", short_id(&id));
        }

        TaskAction::Complete { task } => {
            let id = find_task(store, &task)?.id;
            store.set_task_status(id, TaskStatus::Completed);
            println!("Completed task {}", short_id(&id));
        }

        TaskAction::Reopen { task } => {
            let id = find_task(store, &task)?.id;
            store.set_task_status(id, TaskStatus::Todo);
            println!("Reopened task {}", short_id(&id));
        }

        TaskAction::Comment { task, body } => {
            let author = require_current_user(store)?;
            let id = find_task(store, &task)?.id;
            let body = require_text(&body, "Comment")?;
            store.add_comment(id, author, &body);
            println!("Commented on task {}", short_id(&id));
        }

        TaskAction::Delete { task } => {
            let id = find_task(store, &task)?.id;
            store.delete_task(id);
            println!("Deleted task {}", short_id(&id));
        }
    }
    Ok(())
}

pub fn cmd_project(store: &mut Store, action: ProjectAction) -> Result<()> {
    let now = store.now();
    match action {
        ProjectAction::Add { name, desc, status, start, end, budget, members, tags } => {
            let owner = require_current_user(store)?;
            let start_date = match start {
                Some(s) => start_of_day(parse_date(&s, now)?),
                None => start_of_day(now.date_naive()),
            };
            let end_date = end.map(|e| parse_date(&e, now).map(end_of_day)).transpose()?;
            let members = members
                .iter()
                .map(|m| find_user(store, m).map(|u| u.id))
                .collect::<Result<Vec<_>>>()?;
            let draft = ProjectForm {
                name,
                description: desc.unwrap_or_default(),
                status,
                owner,
                members,
                start_date,
                end_date,
                budget,
                tags,
            }
            .validate()?;
            let id = store.create_project(draft);
            println!("Added project {}", short_id(&id));
        }

        ProjectAction::List { search, filter, sort } => {
            let ctx = ctx(store);
            let view = query::apply(store.projects(), &search, &filter, sort, &ctx);
            print_project_table(&view, now);
        }

        ProjectAction::View { project } => {
            let p = find_project(store, &project)?;
            let a = project_analytics(p, store.tasks(), now);
            println!("ID:           {}", p.id);
            println!("Name:         {}{}", p.name, if p.archived { " (archived)" } else { "" });
            println!("Status:       {}", format_project_status(p.status));
            println!("Owner:        {}", user_name(store, Some(p.owner)));
            let members: Vec<String> = p.members.iter().map(|m| user_name(store, Some(*m))).collect();
            println!("Members:      {}", if members.is_empty() { "-".into() } else { members.join(", ") });
            println!("Start:        {}", p.start_date.format("%Y-%m-%d"));
            println!(
                "End:          {}",
                p.end_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "-".into())
            );
            println!("Progress:     {:.0}% ({}/{} tasks, {} overdue)", a.progress * 100.0, a.completed_tasks, a.total_tasks, a.overdue_tasks);
            println!("Hours:        {:.1} estimated, {:.1} actual", a.estimated_hours, a.actual_hours);
            println!(
                "Budget:       {} (spent {}{})",
                format_money(p.budget),
                format_money(p.actual_cost),
                a.budget_utilization.map(|u| format!(", {u:.0}%")).unwrap_or_default()
            );
            println!(
                "Prediction:   {}",
                match (a.predicted_completion, a.on_track) {
                    (Some(d), Some(true)) => format!("{} (on track)", d.format("%Y-%m-%d")),
                    (Some(d), Some(false)) => format!("{} (behind schedule)", d.format("%Y-%m-%d")),
                    (Some(d), None) => d.format("%Y-%m-%d").to_string(),
                    (None, _) => "-".into(),
                }
            );
            println!("Tags:         {}", if p.tags.is_empty() { "-".into() } else { p.tags.join(",") });
            println!("Description:\n{}\n", if p.description.is_empty() { "-" } else { p.description.as_str() });
        }

        ProjectAction::Update {
            project, name, desc, status, owner, start, end, clear_end, budget, cost,
            add_members, rm_members, add_tags, rm_tags,
        } => {
            let current = find_project(store, &project)?.clone();
            let start_date = start.map(|s| parse_date(&s, now).map(start_of_day)).transpose()?;
            let end_date = match (end, clear_end) {
                (_, true) => Some(None),
                (Some(e), false) => Some(Some(end_of_day(parse_date(&e, now)?))),
                (None, false) => None,
            };
            validate_schedule(
                start_date.unwrap_or(current.start_date),
                end_date.unwrap_or(current.end_date),
            )?;
            let users = |idents: &[String]| -> Result<Vec<UserId>> {
                idents.iter().map(|m| find_user(store, m).map(|u| u.id)).collect()
            };
            let patch = ProjectPatch {
                name: name.map(|n| require_text(&n, "Name")).transpose()?,
                description: desc.map(|d| d.trim().to_string()),
                status,
                owner: owner.map(|o| find_user(store, &o).map(|u| u.id)).transpose()?,
                add_members: users(&add_members)?,
                remove_members: users(&rm_members)?,
                start_date,
                end_date,
                budget: validate_amount(budget, "Budget")?.map(Some),
                actual_cost: validate_amount(cost, "Cost")?.map(Some),
                add_tags: split_and_normalise_tags(&add_tags),
                remove_tags: split_and_normalise_tags(&rm_tags),
            };
            store.update_project(current.id, patch);
            println!("Updated project {}", short_id(&current.id));
        }

        ProjectAction::Archive { project } => {
            let id = find_project(store, &project)?.id;
            store.set_archived(id, true);
            println!("Archived project {}", short_id(&id));
        }

        ProjectAction::Unarchive { project } => {
            let id = find_project(store, &project)?.id;
            store.set_archived(id, false);
            println!("Restored project {}", short_id(&id));
        }

        ProjectAction::Delete { project } => {
            let id = find_project(store, &project)?.id;
            let tasks = store.project_tasks(id).count();
            store.delete_project(id);
            println!("Deleted project {} and {} task(s)", short_id(&id), tasks);
        }
    }
    Ok(())
}

/// Print the analytics summary.
pub fn cmd_stats(store: &Store, json: bool) -> Result<()> {
    let dash = Dashboard::from_store(store);
    if json {
        println!("{}", serde_json::to_string_pretty(&dash)?);
        return Ok(());
    }

    let p = &dash.productivity;
    println!("Productivity");
    println!("  Tasks:            {} ({} overdue)", p.total_tasks, p.overdue);
    for status in TaskStatus::ALL {
        println!("    {:<14} {}", format_status(status), p.by_status.get(status));
    }
    println!("  Completion rate:  {:.1}%", p.completion_rate);
    println!("  Avg completion:   {:.1}h", p.average_completion_hours);
    println!("  This week:        {} completed (last week {}, trend {:+.0}%)", p.completed_this_week, p.completed_last_week, p.trend);

    let f = &dash.financial;
    println!("\nBudget");
    println!("  Budget:           {:.2}", f.total_budget);
    println!("  Spent:            {:.2} ({:.1}%)", f.total_spent, f.budget_utilization);
    println!("  Remaining:        {:.2}", f.remaining);
    println!("  Over budget:      {} project(s)", f.projects_over_budget);
    println!("  Cost per task:    {:.2}", f.cost_per_task);
    println!("  Projected spend:  {:.2}", f.projected_spend);
    for s in &f.savings_opportunities {
        println!("  ! {s}");
    }

    let t = &dash.team;
    println!("\nTeam");
    for m in &t.members {
        println!(
            "  {:<24} {:>3}/{:<3} done ({:.0}%)",
            truncate(&m.name, 24),
            m.completed,
            m.total,
            m.efficiency * 100.0
        );
    }
    println!("  Collaboration:    {:.0}/100", t.collaboration_score);
    println!("  Velocity:         {:.1}h this week", t.team_velocity);
    for b in &t.bottlenecks {
        println!("  ! {b}");
    }
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick<'a>(items: &'a [(&'a str, &'a str)], ident: &str) -> Result<&'a str> {
        resolve(items, ident, "task", |it| it.0, |it| it.1).map(|it| it.1)
    }

    #[test]
    fn test_name_wins_over_id_prefix() {
        let items = [("abc00000-0000", "other"), ("12345678-0000", "abc")];
        assert_eq!(pick(&items, "abc").unwrap(), "abc");
        assert_eq!(pick(&items, "ABC").unwrap(), "abc");
        assert_eq!(pick(&items, "abc0").unwrap(), "other");
        assert_eq!(pick(&items, "1234").unwrap(), "abc");
    }

    #[test]
    fn test_ambiguous_and_missing() {
        let items = [("aa000000", "one"), ("aa111111", "two"), ("bb000000", "dup"), ("cc000000", "dup")];
        let err = pick(&items, "aa").unwrap_err().to_string();
        assert!(err.contains("Ambiguous"), "{err}");
        let err = pick(&items, "dup").unwrap_err().to_string();
        assert!(err.contains("Multiple tasks named"), "{err}");
        assert_eq!(pick(&items, "cc").unwrap(), "dup");
        let err = pick(&items, "zzz").unwrap_err().to_string();
        assert!(err.contains("No task found"), "{err}");
        assert!(pick(&items, "  ").is_err());
    }
}
