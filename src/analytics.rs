//! Derived analytics over the entity collections.
//!
//! Every function here is pure: the same entities and `now` always give the same
//! result. Calendar weeks start Monday 00:00 UTC regardless of locale.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::fields::*;
use crate::parse::{start_of_day, week_bounds};
use crate::project::Project;
use crate::store::Store;
use crate::task::Task;
use crate::user::User;

/// Spend above this fraction of budget is flagged outright.
const BUDGET_ALERT_RATIO: f64 = 0.9;
/// Spend above this fraction while less than half done is flagged.
const EARLY_SPEND_RATIO: f64 = 0.6;
/// More in-progress tasks than this marks a user as overloaded.
const IN_PROGRESS_LIMIT: usize = 5;

/// Monday 00:00 UTC of the week containing `now`.
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(week_bounds(now.date_naive()).0)
}

fn within(at: Option<DateTime<Utc>>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    matches!(at, Some(at) if at >= start && at < end)
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 { 0.0 } else { part as f64 / whole as f64 }
}

/// Week-over-week change in percent.
pub fn trend_percent(this_week: usize, last_week: usize) -> f64 {
    if last_week == 0 {
        if this_week > 0 { 100.0 } else { 0.0 }
    } else {
        (this_week as f64 - last_week as f64) / last_week as f64 * 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub review: usize,
    pub completed: usize,
    pub blocked: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut counts = StatusCounts::default();
        for task in tasks {
            *counts.slot(task.status) += 1;
        }
        counts
    }

    fn slot(&mut self, status: TaskStatus) -> &mut usize {
        match status {
            TaskStatus::Todo => &mut self.todo,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Review => &mut self.review,
            TaskStatus::Completed => &mut self.completed,
            TaskStatus::Blocked => &mut self.blocked,
            TaskStatus::Cancelled => &mut self.cancelled,
        }
    }

    pub fn get(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Todo => self.todo,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Review => self.review,
            TaskStatus::Completed => self.completed,
            TaskStatus::Blocked => self.blocked,
            TaskStatus::Cancelled => self.cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductivityMetrics {
    pub total_tasks: usize,
    pub by_status: StatusCounts,
    pub overdue: usize,
    /// Completed share of all tasks, in percent.
    pub completion_rate: f64,
    /// Mean hours from creation to completion over tasks with a completion time.
    pub average_completion_hours: f64,
    pub completed_this_week: usize,
    pub completed_last_week: usize,
    /// Week-over-week change of completions, in percent.
    pub trend: f64,
}

pub fn productivity_metrics(tasks: &[Task], now: DateTime<Utc>) -> ProductivityMetrics {
    let by_status = StatusCounts::tally(tasks);
    let overdue = tasks.iter().filter(|t| t.is_overdue(now)).count();

    let durations: Vec<f64> = tasks
        .iter()
        .filter_map(|t| t.completed_at.map(|done| (done - t.created_at).num_seconds() as f64 / 3600.0))
        .collect();
    let average_completion_hours = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<f64>() / durations.len() as f64
    };

    let this_start = week_start(now);
    let last_start = this_start - Duration::weeks(1);
    let next_start = this_start + Duration::weeks(1);
    let completed_this_week = tasks.iter().filter(|t| within(t.completed_at, this_start, next_start)).count();
    let completed_last_week = tasks.iter().filter(|t| within(t.completed_at, last_start, this_start)).count();

    ProductivityMetrics {
        total_tasks: tasks.len(),
        completion_rate: ratio(by_status.completed, tasks.len()) * 100.0,
        by_status,
        overdue,
        average_completion_hours,
        completed_this_week,
        completed_last_week,
        trend: trend_percent(completed_this_week, completed_last_week),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialInsights {
    pub total_budget: f64,
    pub total_spent: f64,
    pub remaining: f64,
    /// Spent share of budget, in percent.
    pub budget_utilization: f64,
    pub projects_over_budget: usize,
    pub cost_per_task: f64,
    /// Spend extrapolated to 100% completion for active projects.
    pub projected_spend: f64,
    pub savings_opportunities: Vec<String>,
}

pub fn financial_insights(projects: &[Project]) -> FinancialInsights {
    let total_budget: f64 = projects.iter().filter_map(|p| p.budget).sum();
    let total_spent: f64 = projects.iter().filter_map(|p| p.actual_cost).sum();
    let task_count: usize = projects.iter().map(|p| p.total_tasks).sum();

    let projected_spend: f64 = projects
        .iter()
        .filter(|p| p.status == ProjectStatus::Active && p.progress > 0.0)
        .filter_map(|p| p.actual_cost.map(|cost| cost / p.progress))
        .sum();

    let mut savings_opportunities = Vec::new();
    for p in projects {
        let (Some(budget), Some(cost)) = (p.budget, p.actual_cost) else {
            continue;
        };
        if budget <= 0.0 {
            continue;
        }
        let used = cost / budget * 100.0;
        if cost > BUDGET_ALERT_RATIO * budget {
            savings_opportunities.push(format!(
                "{} has used {:.0}% of its budget; review remaining expenses",
                p.name, used
            ));
        } else if p.progress < 0.5 && cost > EARLY_SPEND_RATIO * budget {
            savings_opportunities.push(format!(
                "{} is {:.0}% complete but has spent {:.0}% of its budget",
                p.name,
                p.progress * 100.0,
                used
            ));
        }
    }

    FinancialInsights {
        total_budget,
        total_spent,
        remaining: total_budget - total_spent,
        budget_utilization: if total_budget > 0.0 { total_spent / total_budget * 100.0 } else { 0.0 },
        projects_over_budget: projects.iter().filter(|p| p.is_over_budget()).count(),
        cost_per_task: if task_count > 0 { total_spent / task_count as f64 } else { 0.0 },
        projected_spend,
        savings_opportunities,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberPerformance {
    pub user: UserId,
    pub name: String,
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub blocked: usize,
    pub overdue: usize,
    /// Completed over assigned, in `[0, 1]`.
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamPerformance {
    pub members: Vec<MemberPerformance>,
    /// 0-100.
    pub collaboration_score: f64,
    /// Estimated hours of tasks completed this week.
    pub team_velocity: f64,
    pub bottlenecks: Vec<String>,
}

pub fn team_performance(tasks: &[Task], users: &[User], now: DateTime<Utc>) -> TeamPerformance {
    let mut by_user: HashMap<UserId, Vec<&Task>> = HashMap::new();
    for task in tasks {
        if let Some(assignee) = task.assignee {
            by_user.entry(assignee).or_default().push(task);
        }
    }

    let mut members = Vec::with_capacity(users.len());
    let mut bottlenecks = Vec::new();
    for user in users {
        let assigned = by_user.get(&user.id).map(Vec::as_slice).unwrap_or_default();
        let counts = StatusCounts::tally(assigned.iter().copied());
        let overdue = assigned.iter().filter(|t| t.is_overdue(now)).count();

        if counts.in_progress > IN_PROGRESS_LIMIT {
            bottlenecks.push(format!("{} has {} tasks in progress", user.name, counts.in_progress));
        }
        if counts.blocked > 0 {
            bottlenecks.push(format!("{} has {} blocked tasks", user.name, counts.blocked));
        }
        if overdue > 0 {
            bottlenecks.push(format!("{} has {} overdue tasks", user.name, overdue));
        }

        members.push(MemberPerformance {
            user: user.id,
            name: user.name.clone(),
            total: assigned.len(),
            completed: counts.completed,
            in_progress: counts.in_progress,
            blocked: counts.blocked,
            overdue,
            efficiency: ratio(counts.completed, assigned.len()),
        });
    }

    let commented = tasks.iter().filter(|t| !t.comments.is_empty()).count();
    let shared = tasks.iter().filter(|t| t.comment_authors() > 1).count();
    let collaboration_score = if tasks.is_empty() {
        0.0
    } else {
        (ratio(commented, tasks.len()) + ratio(shared, tasks.len())) / 2.0 * 100.0
    };

    let this_start = week_start(now);
    let team_velocity: f64 = tasks
        .iter()
        .filter(|t| within(t.completed_at, this_start, this_start + Duration::weeks(1)))
        .filter_map(|t| t.estimated_hours)
        .sum();

    TeamPerformance { members, collaboration_score, team_velocity, bottlenecks }
}

/// Extrapolate the finish date from elapsed time and progress.
///
/// `None` without progress, before the project has started, or when the
/// extrapolated date is out of range.
pub fn predict_completion(project: &Project, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if project.progress <= 0.0 {
        return None;
    }
    let elapsed = now - project.start_date;
    if elapsed < Duration::zero() {
        return None;
    }
    let total_ms = elapsed.num_milliseconds() as f64 / project.progress;
    let total = Duration::try_milliseconds(total_ms.round() as i64)?;
    project.start_date.checked_add_signed(total)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectAnalytics {
    pub project: ProjectId,
    pub name: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub overdue_tasks: usize,
    pub progress: f64,
    pub by_status: StatusCounts,
    pub estimated_hours: f64,
    pub actual_hours: f64,
    /// Spent share of budget in percent, when a positive budget exists.
    pub budget_utilization: Option<f64>,
    pub predicted_completion: Option<DateTime<Utc>>,
    /// Predicted completion no later than the end date.
    pub on_track: Option<bool>,
}

pub fn project_analytics(project: &Project, tasks: &[Task], now: DateTime<Utc>) -> ProjectAnalytics {
    let own: Vec<&Task> = tasks.iter().filter(|t| t.project == Some(project.id)).collect();
    let predicted_completion = predict_completion(project, now);
    let on_track = match (predicted_completion, project.end_date) {
        (Some(predicted), Some(end)) => Some(predicted <= end),
        _ => None,
    };
    let budget_utilization = project
        .budget
        .filter(|b| *b > 0.0)
        .map(|b| project.actual_cost.unwrap_or(0.0) / b * 100.0);

    ProjectAnalytics {
        project: project.id,
        name: project.name.clone(),
        total_tasks: project.total_tasks,
        completed_tasks: project.completed_tasks,
        overdue_tasks: project.overdue_tasks,
        progress: project.progress,
        by_status: StatusCounts::tally(own.iter().copied()),
        estimated_hours: own.iter().filter_map(|t| t.estimated_hours).sum(),
        actual_hours: own.iter().filter_map(|t| t.actual_hours).sum(),
        budget_utilization,
        predicted_completion,
        on_track,
    }
}

/// Everything the dashboard shows, computed in one pass over a store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub productivity: ProductivityMetrics,
    pub financial: FinancialInsights,
    pub team: TeamPerformance,
    pub projects: Vec<ProjectAnalytics>,
}

impl Dashboard {
    pub fn compute(users: &[User], tasks: &[Task], projects: &[Project], now: DateTime<Utc>) -> Self {
        Dashboard {
            generated_at: now,
            productivity: productivity_metrics(tasks, now),
            financial: financial_insights(projects),
            team: team_performance(tasks, users, now),
            projects: projects
                .iter()
                .filter(|p| !p.archived)
                .map(|p| project_analytics(p, tasks, now))
                .collect(),
        }
    }

    pub fn from_store(store: &Store) -> Self {
        Self::compute(store.users(), store.tasks(), store.projects(), store.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::NewProject;
    use crate::task::{Comment, NewTask};
    use crate::user::NewUser;
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    /// A Wednesday.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    fn task(status: TaskStatus) -> Task {
        let mut t = Task::from_draft(NewTask { title: "t".into(), ..Default::default() }, now() - Duration::days(20));
        t.set_status(status, now());
        t
    }

    fn completed_at(at: DateTime<Utc>) -> Task {
        let mut t = task(TaskStatus::Todo);
        t.created_at = at - Duration::hours(1);
        t.set_status(TaskStatus::Completed, at);
        t
    }

    fn project(budget: Option<f64>, cost: Option<f64>) -> Project {
        let mut p = Project::from_draft(
            NewProject {
                name: "Relaunch".into(),
                description: String::new(),
                status: ProjectStatus::Active,
                owner: UserId::new(),
                members: BTreeSet::new(),
                start_date: now() - Duration::days(10),
                end_date: None,
                budget,
                tags: Vec::new(),
            },
            now(),
        );
        p.actual_cost = cost;
        p
    }

    fn user(name: &str) -> User {
        User::from_draft(NewUser { name: name.into(), email: "x@example.com".into(), ..Default::default() }, now())
    }

    #[test]
    fn test_completion_rate() {
        let tasks = vec![task(TaskStatus::Todo), task(TaskStatus::Completed), task(TaskStatus::Completed)];
        let m = productivity_metrics(&tasks, now());
        assert!((m.completion_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.by_status.completed, 2);
        assert_eq!(m.by_status.todo, 1);
        assert_eq!(format!("{:.1}", m.completion_rate), "66.7");
    }

    #[test]
    fn test_empty_metrics() {
        let m = productivity_metrics(&[], now());
        assert_eq!(m.completion_rate, 0.0);
        assert_eq!(m.average_completion_hours, 0.0);
        assert_eq!(m.trend, 0.0);
    }

    #[test]
    fn test_trend() {
        assert_eq!(trend_percent(0, 0), 0.0);
        assert_eq!(trend_percent(5, 0), 100.0);
        assert_eq!(trend_percent(3, 6), -50.0);
        assert_eq!(trend_percent(6, 3), 100.0);
    }

    #[test]
    fn test_average_completion_hours() {
        let mut t = task(TaskStatus::Todo);
        t.created_at = now() - Duration::hours(2);
        t.set_status(TaskStatus::Completed, now());
        let open = task(TaskStatus::InProgress);
        let m = productivity_metrics(&[t, open], now());
        assert_eq!(m.average_completion_hours, 2.0);
    }

    #[test]
    fn test_weekly_counts_use_monday_boundary() {
        let monday = Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap();
        assert_eq!(week_start(now()), monday);
        let tasks = vec![
            completed_at(monday),
            completed_at(monday + Duration::hours(30)),
            completed_at(monday - Duration::seconds(1)),
            completed_at(monday - Duration::days(7)),
            completed_at(monday - Duration::days(8)),
        ];
        let m = productivity_metrics(&tasks, now());
        assert_eq!(m.completed_this_week, 2);
        assert_eq!(m.completed_last_week, 2);
        assert_eq!(m.trend, 0.0);
    }

    #[test]
    fn test_overdue_count() {
        let mut late = task(TaskStatus::InProgress);
        late.due_date = Some(now() - Duration::days(1));
        let mut late_done = task(TaskStatus::Completed);
        late_done.due_date = Some(now() - Duration::days(1));
        let mut future = task(TaskStatus::Todo);
        future.due_date = Some(now() + Duration::days(1));
        let m = productivity_metrics(&[late, late_done, future], now());
        assert_eq!(m.overdue, 1);
    }

    #[test]
    fn test_budget_adjacent_and_over_budget() {
        let near = project(Some(1000.0), Some(950.0));
        let insights = financial_insights(&[near]);
        assert_eq!(insights.projects_over_budget, 0);
        assert_eq!(insights.savings_opportunities.len(), 1);
        assert!(insights.savings_opportunities[0].contains("95%"));

        let over = project(Some(1000.0), Some(1100.0));
        let insights = financial_insights(&[over]);
        assert_eq!(insights.projects_over_budget, 1);
        assert!((insights.budget_utilization - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_early_spend_flagged() {
        let mut p = project(Some(1000.0), Some(700.0));
        p.progress = 0.25;
        let insights = financial_insights(&[p]);
        assert_eq!(insights.savings_opportunities.len(), 1);
        assert!(insights.savings_opportunities[0].contains("25% complete"));
    }

    #[test]
    fn test_financial_totals_skip_undefined() {
        let mut a = project(Some(1000.0), Some(500.0));
        a.total_tasks = 4;
        a.progress = 0.5;
        let mut b = project(None, Some(100.0));
        b.total_tasks = 1;
        let c = project(Some(500.0), None);
        let insights = financial_insights(&[a, b, c]);
        assert_eq!(insights.total_budget, 1500.0);
        assert_eq!(insights.total_spent, 600.0);
        assert_eq!(insights.remaining, 900.0);
        assert!((insights.budget_utilization - 40.0).abs() < 1e-9);
        assert_eq!(insights.cost_per_task, 120.0);
        assert_eq!(insights.projected_spend, 1000.0);

        let empty = financial_insights(&[]);
        assert_eq!(empty.budget_utilization, 0.0);
        assert_eq!(empty.cost_per_task, 0.0);
    }

    #[test]
    fn test_team_performance() {
        let ada = user("Ada");
        let bob = user("Bob");
        let mut tasks = Vec::new();
        for i in 0..6 {
            let mut t = task(TaskStatus::InProgress);
            t.assignee = Some(ada.id);
            if i == 0 {
                t.comments.push(Comment { id: CommentId::new(), author: ada.id, body: "a".into(), created_at: now() });
                t.comments.push(Comment { id: CommentId::new(), author: bob.id, body: "b".into(), created_at: now() });
            }
            tasks.push(t);
        }
        let mut done = task(TaskStatus::Todo);
        done.assignee = Some(bob.id);
        done.estimated_hours = Some(3.5);
        done.set_status(TaskStatus::Completed, now());
        tasks.push(done);
        let mut blocked = task(TaskStatus::Blocked);
        blocked.assignee = Some(bob.id);
        blocked.comments.push(Comment { id: CommentId::new(), author: bob.id, body: "c".into(), created_at: now() });
        tasks.push(blocked);

        let perf = team_performance(&tasks, &[ada.clone(), bob.clone()], now());
        assert_eq!(perf.members[0].total, 6);
        assert_eq!(perf.members[0].efficiency, 0.0);
        assert_eq!(perf.members[1].completed, 1);
        assert_eq!(perf.members[1].efficiency, 0.5);
        assert_eq!(perf.team_velocity, 3.5);
        // 2 of 8 commented, 1 of 8 with two authors.
        assert!((perf.collaboration_score - (0.25 + 0.125) / 2.0 * 100.0).abs() < 1e-9);
        assert_eq!(
            perf.bottlenecks,
            vec!["Ada has 6 tasks in progress".to_string(), "Bob has 1 blocked tasks".to_string()]
        );
    }

    #[test]
    fn test_user_without_tasks() {
        let perf = team_performance(&[], &[user("Ada")], now());
        assert_eq!(perf.members[0].efficiency, 0.0);
        assert_eq!(perf.collaboration_score, 0.0);
        assert!(perf.bottlenecks.is_empty());
    }

    #[test]
    fn test_predict_completion() {
        let mut p = project(None, None);
        assert_eq!(predict_completion(&p, now()), None);
        p.progress = 0.5;
        assert_eq!(predict_completion(&p, now()), Some(now() + Duration::days(10)));
        p.start_date = now() + Duration::days(1);
        assert_eq!(predict_completion(&p, now()), None);
    }

    #[test]
    fn test_predict_completion_out_of_range() {
        let mut p = project(None, None);
        p.start_date = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap();
        p.progress = 1.0 / 500.0;
        assert_eq!(predict_completion(&p, now()), None);
        assert_eq!(project_analytics(&p, &[], now()).predicted_completion, None);

        p.progress = f64::MIN_POSITIVE;
        assert_eq!(predict_completion(&p, now()), None);
    }

    #[test]
    fn test_project_analytics_on_track() {
        let mut p = project(Some(200.0), Some(50.0));
        p.progress = 0.5;
        p.end_date = Some(now() + Duration::days(5));
        let a = project_analytics(&p, &[], now());
        assert_eq!(a.on_track, Some(false));
        assert_eq!(a.budget_utilization, Some(25.0));

        p.end_date = Some(now() + Duration::days(15));
        assert_eq!(project_analytics(&p, &[], now()).on_track, Some(true));
    }
}
