//! Filter/sort pipeline over tasks and projects.
//!
//! [`apply`] is a pure function of the entities, the search text, the chosen
//! filter and sort, and a [`QueryContext`] carrying the current user and the
//! evaluation instant. Sorting is stable, so equal keys keep store order.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use clap::ValueEnum;

use crate::fields::*;
use crate::project::Project;
use crate::task::Task;

/// Inputs a filter may depend on besides the entity itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryContext {
    pub current_user: Option<UserId>,
    pub now: DateTime<Utc>,
}

/// An entity the pipeline can search, filter and sort.
pub trait Queryable {
    type Filter;
    type Sort: Copy;

    /// `needle` is already lowercased and non-empty.
    fn matches_search(&self, needle: &str) -> bool;

    fn matches_filter(&self, filter: &Self::Filter, ctx: &QueryContext) -> bool;

    fn compare(a: &Self, b: &Self, sort: Self::Sort) -> Ordering;
}

/// Search, filter and sort `entities` into a new ordered view.
pub fn apply<'a, T: Queryable>(
    entities: &'a [T],
    search: &str,
    filter: &T::Filter,
    sort: T::Sort,
    ctx: &QueryContext,
) -> Vec<&'a T> {
    let needle = search.trim().to_lowercase();
    let mut view: Vec<&T> = entities
        .iter()
        .filter(|e| needle.is_empty() || e.matches_search(&needle))
        .filter(|e| e.matches_filter(filter, ctx))
        .collect();
    view.sort_by(|a, b| T::compare(a, b, sort));
    view
}

fn text_matches(needle: &str, title: &str, description: &str, tags: &[String]) -> bool {
    title.to_lowercase().contains(needle)
        || description.to_lowercase().contains(needle)
        || tags.iter().any(|t| t.to_lowercase().contains(needle))
}

/// Ascending by date, entries without a date last.
fn cmp_optional_date(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Task views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    All,
    AssignedToMe,
    Status(TaskStatus),
    Overdue,
    /// Due no later than seven days from now.
    DueThisWeek,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskSort {
    /// Newest first.
    Created,
    /// Earliest due first, undated last.
    Due,
    /// Urgent first.
    Priority,
    Title,
    Status,
}

impl Queryable for Task {
    type Filter = TaskFilter;
    type Sort = TaskSort;

    fn matches_search(&self, needle: &str) -> bool {
        text_matches(needle, &self.title, &self.description, &self.tags)
    }

    fn matches_filter(&self, filter: &TaskFilter, ctx: &QueryContext) -> bool {
        match *filter {
            TaskFilter::All => true,
            TaskFilter::AssignedToMe => ctx.current_user.is_some() && self.assignee == ctx.current_user,
            TaskFilter::Status(status) => self.status == status,
            TaskFilter::Overdue => self.is_overdue(ctx.now),
            TaskFilter::DueThisWeek => {
                matches!(self.due_date, Some(due) if due <= ctx.now + Duration::days(7))
            }
        }
    }

    fn compare(a: &Task, b: &Task, sort: TaskSort) -> Ordering {
        match sort {
            TaskSort::Created => b.created_at.cmp(&a.created_at),
            TaskSort::Due => cmp_optional_date(a.due_date, b.due_date),
            TaskSort::Priority => b.priority.rank().cmp(&a.priority.rank()),
            TaskSort::Title => cmp_text(&a.title, &b.title),
            TaskSort::Status => a.status.rank().cmp(&b.status.rank()),
        }
    }
}

/// Project views. Everything but `Archived` hides archived projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProjectFilter {
    All,
    Active,
    Planning,
    Completed,
    OverBudget,
    /// Owned by or shared with the current user.
    Mine,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProjectSort {
    Created,
    EndDate,
    Name,
    Status,
}

impl Queryable for Project {
    type Filter = ProjectFilter;
    type Sort = ProjectSort;

    fn matches_search(&self, needle: &str) -> bool {
        text_matches(needle, &self.name, &self.description, &self.tags)
    }

    fn matches_filter(&self, filter: &ProjectFilter, ctx: &QueryContext) -> bool {
        match filter {
            ProjectFilter::Archived => self.archived,
            _ if self.archived => false,
            ProjectFilter::All => true,
            ProjectFilter::Active => self.status == ProjectStatus::Active,
            ProjectFilter::Planning => self.status == ProjectStatus::Planning,
            ProjectFilter::Completed => self.status == ProjectStatus::Completed,
            ProjectFilter::OverBudget => self.is_over_budget(),
            ProjectFilter::Mine => ctx.current_user.is_some_and(|me| self.involves(me)),
        }
    }

    fn compare(a: &Project, b: &Project, sort: ProjectSort) -> Ordering {
        match sort {
            ProjectSort::Created => b.created_at.cmp(&a.created_at),
            ProjectSort::EndDate => cmp_optional_date(a.end_date, b.end_date),
            ProjectSort::Name => cmp_text(&a.name, &b.name),
            ProjectSort::Status => a.status.rank().cmp(&b.status.rank()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::NewProject;
    use crate::task::NewTask;
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    fn ctx(user: Option<UserId>) -> QueryContext {
        QueryContext { current_user: user, now: now() }
    }

    fn task(title: &str, hours_ago: i64) -> Task {
        Task::from_draft(NewTask { title: title.into(), ..Default::default() }, now() - Duration::hours(hours_ago))
    }

    fn titles(view: &[&Task]) -> Vec<String> {
        view.iter().map(|t| t.title.clone()).collect()
    }

    fn project(name: &str, owner: UserId) -> Project {
        Project::from_draft(
            NewProject {
                name: name.into(),
                description: String::new(),
                status: ProjectStatus::Active,
                owner,
                members: BTreeSet::new(),
                start_date: now() - Duration::days(30),
                end_date: None,
                budget: Some(1000.0),
                tags: Vec::new(),
            },
            now(),
        )
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_description_tags() {
        let mut a = task("Fix LOGIN bug", 1);
        a.tags = vec!["auth".into()];
        let mut b = task("Write docs", 2);
        b.description = "Explain the login flow".into();
        let mut c = task("Refactor", 3);
        c.tags = vec!["Login-page".into()];
        let d = task("Unrelated", 4);
        let tasks = vec![a, b, c, d];

        let view = apply(&tasks, "login", &TaskFilter::All, TaskSort::Created, &ctx(None));
        assert_eq!(titles(&view), vec!["Fix LOGIN bug", "Write docs", "Refactor"]);

        let all = apply(&tasks, "   ", &TaskFilter::All, TaskSort::Created, &ctx(None));
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_overdue_filter_matches_definition() {
        let mut tasks = Vec::new();
        for (i, offset) in [-3i64, -1, 1, 5].iter().enumerate() {
            let mut t = task(&format!("t{i}"), 10);
            t.due_date = Some(now() + Duration::hours(*offset));
            tasks.push(t);
        }
        tasks[0].set_status(TaskStatus::Completed, now());
        tasks.push(task("undated", 1));

        let view = apply(&tasks, "", &TaskFilter::Overdue, TaskSort::Created, &ctx(None));
        let expected = tasks
            .iter()
            .filter(|t| matches!(t.due_date, Some(d) if d < now()) && t.status != TaskStatus::Completed)
            .count();
        assert_eq!(view.len(), expected);
        assert_eq!(titles(&view), vec!["t1"]);
    }

    #[test]
    fn test_due_this_week_and_assigned() {
        let me = UserId::new();
        let mut soon = task("soon", 1);
        soon.due_date = Some(now() + Duration::days(6));
        soon.assignee = Some(me);
        let mut later = task("later", 2);
        later.due_date = Some(now() + Duration::days(8));
        let undated = task("undated", 3);
        let mut late = task("late", 4);
        late.due_date = Some(now() - Duration::days(2));
        let tasks = vec![soon, later, undated, late];

        let week = apply(&tasks, "", &TaskFilter::DueThisWeek, TaskSort::Created, &ctx(None));
        assert_eq!(titles(&week), vec!["soon", "late"]);

        let mine = apply(&tasks, "", &TaskFilter::AssignedToMe, TaskSort::Created, &ctx(Some(me)));
        assert_eq!(titles(&mine), vec!["soon"]);
        let nobody = apply(&tasks, "", &TaskFilter::AssignedToMe, TaskSort::Created, &ctx(None));
        assert!(nobody.is_empty());
    }

    #[test]
    fn test_sorts() {
        let mut a = task("beta", 3);
        a.priority = Priority::Low;
        a.due_date = Some(now() + Duration::days(2));
        let mut b = task("Alpha", 2);
        b.priority = Priority::Urgent;
        b.set_status(TaskStatus::Blocked, now());
        let mut c = task("gamma", 1);
        c.priority = Priority::High;
        c.due_date = Some(now() + Duration::days(1));
        c.set_status(TaskStatus::Review, now());
        let tasks = vec![a, b, c];
        let run = |sort: TaskSort| titles(&apply(&tasks, "", &TaskFilter::All, sort, &ctx(None)));

        assert_eq!(run(TaskSort::Created), vec!["gamma", "Alpha", "beta"]);
        assert_eq!(run(TaskSort::Due), vec!["gamma", "beta", "Alpha"]);
        assert_eq!(run(TaskSort::Priority), vec!["Alpha", "gamma", "beta"]);
        assert_eq!(run(TaskSort::Title), vec!["Alpha", "beta", "gamma"]);
        assert_eq!(run(TaskSort::Status), vec!["beta", "gamma", "Alpha"]);
    }

    #[test]
    fn test_sort_is_stable_and_idempotent() {
        let created = now() - Duration::hours(1);
        let tasks: Vec<Task> = (0..6)
            .map(|i| {
                let mut t = task(&format!("t{i}"), 1);
                t.created_at = created;
                t
            })
            .collect();
        let first = apply(&tasks, "", &TaskFilter::All, TaskSort::Priority, &ctx(None));
        let second = apply(&tasks, "", &TaskFilter::All, TaskSort::Priority, &ctx(None));
        assert_eq!(titles(&first), vec!["t0", "t1", "t2", "t3", "t4", "t5"]);
        assert_eq!(titles(&first), titles(&second));
    }

    #[test]
    fn test_project_filters() {
        let me = UserId::new();
        let other = UserId::new();
        let mut over = project("Over", other);
        over.actual_cost = Some(1100.0);
        over.members.insert(me);
        let mut planning = project("Plan", me);
        planning.status = ProjectStatus::Planning;
        let mut archived = project("Old", me);
        archived.archived = true;
        let projects = vec![over, planning, archived];
        let names = |f: ProjectFilter| {
            apply(&projects, "", &f, ProjectSort::Name, &ctx(Some(me)))
                .iter()
                .map(|p| p.name.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(names(ProjectFilter::All), vec!["Over", "Plan"]);
        assert_eq!(names(ProjectFilter::OverBudget), vec!["Over"]);
        assert_eq!(names(ProjectFilter::Planning), vec!["Plan"]);
        assert_eq!(names(ProjectFilter::Active), vec!["Over"]);
        assert_eq!(names(ProjectFilter::Mine), vec!["Over", "Plan"]);
        assert_eq!(names(ProjectFilter::Archived), vec!["Old"]);
    }

    #[test]
    fn test_project_end_date_sort_missing_last() {
        let owner = UserId::new();
        let mut a = project("a", owner);
        a.end_date = Some(now() + Duration::days(9));
        let b = project("b", owner);
        let mut c = project("c", owner);
        c.end_date = Some(now() + Duration::days(3));
        let projects = vec![a, b, c];
        let view = apply(&projects, "", &ProjectFilter::All, ProjectSort::EndDate, &ctx(None));
        let names: Vec<&str> = view.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
