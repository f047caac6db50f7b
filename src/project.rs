//! Project data structure and derived counter maintenance.
//!
//! Projects reference their tasks only through each task's `project` field, so
//! the counters stored here are always recomputed from the task collection.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::*;
use crate::task::Task;

/// A project grouping tasks under an owner, schedule and budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: ProjectStatus,
    pub owner: UserId,
    #[serde(default)]
    pub members: BTreeSet<UserId>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub actual_cost: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Fraction of completed tasks, in `[0, 1]`.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub total_tasks: usize,
    #[serde(default)]
    pub completed_tasks: usize,
    #[serde(default)]
    pub overdue_tasks: usize,
}

impl Project {
    pub fn from_draft(draft: NewProject, now: DateTime<Utc>) -> Self {
        Project {
            id: ProjectId::new(),
            name: draft.name,
            description: draft.description,
            status: draft.status,
            owner: draft.owner,
            members: draft.members,
            start_date: draft.start_date,
            end_date: draft.end_date,
            budget: draft.budget,
            actual_cost: None,
            tags: draft.tags,
            archived: false,
            created_at: now,
            updated_at: now,
            progress: 0.0,
            total_tasks: 0,
            completed_tasks: 0,
            overdue_tasks: 0,
        }
    }

    /// Recompute the derived counters and progress from the full task list.
    pub fn recompute_counters(&mut self, tasks: &[Task], now: DateTime<Utc>) {
        let mut total = 0;
        let mut completed = 0;
        let mut overdue = 0;
        for task in tasks.iter().filter(|t| t.project == Some(self.id)) {
            total += 1;
            if task.is_completed() {
                completed += 1;
            }
            if task.is_overdue(now) {
                overdue += 1;
            }
        }
        self.total_tasks = total;
        self.completed_tasks = completed;
        self.overdue_tasks = overdue;
        self.progress = if total > 0 { completed as f64 / total as f64 } else { 0.0 };
    }

    /// Spent more than budgeted. Needs both values to be defined.
    pub fn is_over_budget(&self) -> bool {
        matches!((self.actual_cost, self.budget), (Some(cost), Some(budget)) if cost > budget)
    }

    pub fn involves(&self, user: UserId) -> bool {
        self.owner == user || self.members.contains(&user)
    }
}

/// Validated input for creating a project.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub owner: UserId,
    pub members: BTreeSet<UserId>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub tags: Vec<String>,
}

/// A partial update to a project. Derived counters are not patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub owner: Option<UserId>,
    pub add_members: Vec<UserId>,
    pub remove_members: Vec<UserId>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub budget: Option<Option<f64>>,
    pub actual_cost: Option<Option<f64>>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
}

impl ProjectPatch {
    /// Apply the patch. Returns true when the end date changed.
    pub fn apply(self, project: &mut Project, now: DateTime<Utc>) -> bool {
        if let Some(name) = self.name { project.name = name; }
        if let Some(desc) = self.description { project.description = desc; }
        if let Some(status) = self.status { project.status = status; }
        if let Some(owner) = self.owner { project.owner = owner; }
        project.members.extend(self.add_members);
        for m in &self.remove_members {
            project.members.remove(m);
        }
        if let Some(start) = self.start_date { project.start_date = start; }
        let end_changed = match self.end_date {
            Some(end) if end != project.end_date => {
                project.end_date = end;
                true
            }
            _ => false,
        };
        if let Some(b) = self.budget { project.budget = b; }
        if let Some(c) = self.actual_cost { project.actual_cost = c; }
        if !self.add_tags.is_empty() || !self.remove_tags.is_empty() {
            let mut tags: BTreeSet<String> = project.tags.drain(..).collect();
            tags.extend(self.add_tags);
            for tag in &self.remove_tags {
                tags.remove(tag);
            }
            project.tags = tags.into_iter().collect();
        }
        project.updated_at = now;
        end_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    fn project() -> Project {
        Project::from_draft(
            NewProject {
                name: "Website relaunch".into(),
                description: String::new(),
                status: ProjectStatus::Active,
                owner: UserId::new(),
                members: BTreeSet::new(),
                start_date: now() - Duration::days(10),
                end_date: None,
                budget: Some(1000.0),
                tags: Vec::new(),
            },
            now(),
        )
    }

    fn task_in(project: ProjectId, status: TaskStatus) -> Task {
        let mut t = Task::from_draft(
            NewTask { title: "t".into(), project: Some(project), ..Default::default() },
            now() - Duration::days(3),
        );
        t.set_status(status, now());
        t
    }

    #[test]
    fn test_counters_empty_project() {
        let mut p = project();
        p.recompute_counters(&[], now());
        assert_eq!(p.total_tasks, 0);
        assert_eq!(p.progress, 0.0);
    }

    #[test]
    fn test_counters_and_progress() {
        let mut p = project();
        let mut late = task_in(p.id, TaskStatus::Todo);
        late.due_date = Some(now() - Duration::days(1));
        let tasks = vec![
            task_in(p.id, TaskStatus::Completed),
            task_in(p.id, TaskStatus::InProgress),
            late,
            task_in(ProjectId::new(), TaskStatus::Completed),
        ];
        p.recompute_counters(&tasks, now());
        assert_eq!(p.total_tasks, 3);
        assert_eq!(p.completed_tasks, 1);
        assert_eq!(p.overdue_tasks, 1);
        assert!(p.completed_tasks <= p.total_tasks);
        assert!((p.progress - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_over_budget_needs_both_values() {
        let mut p = project();
        assert!(!p.is_over_budget());
        p.actual_cost = Some(1100.0);
        assert!(p.is_over_budget());
        p.budget = None;
        assert!(!p.is_over_budget());
    }

    #[test]
    fn test_patch_members() {
        let mut p = project();
        let a = UserId::new();
        let b = UserId::new();
        ProjectPatch { add_members: vec![a, b], ..Default::default() }.apply(&mut p, now());
        ProjectPatch { remove_members: vec![a], ..Default::default() }.apply(&mut p, now());
        assert!(p.involves(b));
        assert!(!p.involves(a));
        assert!(p.involves(p.owner));
    }
}
