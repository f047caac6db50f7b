//! Presentation mapping for domain values: labels, relative dates and tables.

use chrono::{DateTime, Utc};

use crate::fields::*;
use crate::project::Project;
use crate::task::Task;

/// Format a task status for display.
pub fn format_status(s: TaskStatus) -> &'static str {
    match s {
        TaskStatus::Todo => "To Do",
        TaskStatus::InProgress => "In Progress",
        TaskStatus::Review => "Review",
        TaskStatus::Completed => "Completed",
        TaskStatus::Blocked => "Blocked",
        TaskStatus::Cancelled => "Cancelled",
    }
}

/// Format a priority for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
        Priority::Urgent => "Urgent",
    }
}

pub fn format_project_status(s: ProjectStatus) -> &'static str {
    match s {
        ProjectStatus::Planning => "Planning",
        ProjectStatus::Active => "Active",
        ProjectStatus::OnHold => "On Hold",
        ProjectStatus::Completed => "Completed",
        ProjectStatus::Cancelled => "Cancelled",
    }
}

pub fn format_role(r: Role) -> &'static str {
    match r {
        Role::Admin => "Admin",
        Role::Manager => "Manager",
        Role::Member => "Member",
        Role::Viewer => "Viewer",
    }
}

pub fn format_theme(t: Theme) -> &'static str {
    match t {
        Theme::Light => "Light",
        Theme::Dark => "Dark",
        Theme::System => "System",
    }
}

/// Format a date relative to `now` ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let days = (d.date_naive() - now.date_naive()).num_days();
            if days == 0 {
                if d < now { "due".into() } else { "today".into() }
            } else if days == 1 {
                "tomorrow".into()
            } else if days > 1 {
                format!("in {days}d")
            } else {
                format!("{}d late", -days)
            }
        }
    }
}

pub fn format_money(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".into())
}

/// Short form of an id for tables.
pub fn short_id(id: &impl std::fmt::Display) -> String {
    id.to_string().chars().take(8).collect()
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Print tasks as a table.
pub fn print_task_table(tasks: &[&Task], now: DateTime<Utc>) {
    println!(
        "{:<9} {:<12} {:<7} {:<10} {}",
        "ID", "Status", "Pri", "Due", "Title [tags]"
    );
    for t in tasks {
        let tags = if t.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", t.tags.join(","))
        };
        println!(
            "{:<9} {:<12} {:<7} {:<10} {}{}",
            short_id(&t.id),
            format_status(t.status),
            format_priority(t.priority),
            format_due_relative(t.due_date, now),
            t.title,
            tags
        );
    }
}

/// Print projects as a table.
pub fn print_project_table(projects: &[&Project], now: DateTime<Utc>) {
    println!(
        "{:<9} {:<10} {:>5} {:>7} {:<10} {:>10} {}",
        "ID", "Status", "Done", "Tasks", "Ends", "Spent", "Name"
    );
    for p in projects {
        println!(
            "{:<9} {:<10} {:>4.0}% {:>3}/{:<3} {:<10} {:>10} {}{}",
            short_id(&p.id),
            format_project_status(p.status),
            p.progress * 100.0,
            p.completed_tasks,
            p.total_tasks,
            format_due_relative(p.end_date, now),
            format_money(p.actual_cost),
            truncate(&p.name, 40),
            if p.archived { " (archived)" } else { "" }
        );
    }
}
