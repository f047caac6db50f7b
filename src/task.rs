//! Task data structure and related functionality.
//!
//! This module defines the core `Task` struct that represents a single work item
//! with its assignment, scheduling, effort and cost metadata, along with the
//! draft and patch types used to create and modify tasks through the store.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// A comment left on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub author: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A unit of work.
///
/// `completed_at` is set exactly when `status` is [`TaskStatus::Completed`];
/// use [`Task::set_status`] rather than assigning `status` directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee: Option<UserId>,
    pub project: Option<ProjectId>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub actual_cost: Option<f64>,
}

impl Task {
    /// Build a new `todo` task from a validated draft.
    pub fn from_draft(draft: NewTask, now: DateTime<Utc>) -> Self {
        Task {
            id: TaskId::new(),
            title: draft.title,
            description: draft.description,
            status: TaskStatus::Todo,
            priority: draft.priority,
            assignee: draft.assignee,
            project: draft.project,
            due_date: draft.due_date,
            estimated_hours: draft.estimated_hours,
            actual_hours: None,
            tags: draft.tags,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            budget: draft.budget,
            actual_cost: None,
        }
    }

    /// Change status while keeping `completed_at` consistent with it.
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        if status == TaskStatus::Completed {
            if self.status != TaskStatus::Completed || self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
        self.status = status;
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Due before `now` and not completed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => due < now && !self.is_completed(),
            None => false,
        }
    }

    /// Number of distinct comment authors.
    pub fn comment_authors(&self) -> usize {
        self.comments.iter().map(|c| c.author).collect::<HashSet<_>>().len()
    }
}

/// Validated input for creating a task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub assignee: Option<UserId>,
    pub project: Option<ProjectId>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub tags: Vec<String>,
    pub budget: Option<f64>,
}

/// A partial update to a task. `None` leaves a field untouched; the nested
/// `Option` on clearable fields distinguishes "clear" from "leave".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub assignee: Option<Option<UserId>>,
    pub project: Option<Option<ProjectId>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub estimated_hours: Option<Option<f64>>,
    pub actual_hours: Option<Option<f64>>,
    pub budget: Option<Option<f64>>,
    pub actual_cost: Option<Option<f64>>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
}

impl TaskPatch {
    /// Apply the patch. Returns true when the due date changed.
    pub fn apply(self, task: &mut Task, now: DateTime<Utc>) -> bool {
        if let Some(title) = self.title { task.title = title; }
        if let Some(desc) = self.description { task.description = desc; }
        if let Some(status) = self.status { task.set_status(status, now); }
        if let Some(priority) = self.priority { task.priority = priority; }
        if let Some(assignee) = self.assignee { task.assignee = assignee; }
        if let Some(project) = self.project { task.project = project; }
        let due_changed = match self.due_date {
            Some(due) if due != task.due_date => {
                task.due_date = due;
                true
            }
            _ => false,
        };
        if let Some(h) = self.estimated_hours { task.estimated_hours = h; }
        if let Some(h) = self.actual_hours { task.actual_hours = h; }
        if let Some(b) = self.budget { task.budget = b; }
        if let Some(c) = self.actual_cost { task.actual_cost = c; }
        if !self.add_tags.is_empty() || !self.remove_tags.is_empty() {
            let mut tags: std::collections::BTreeSet<String> = task.tags.drain(..).collect();
            tags.extend(self.add_tags);
            for tag in &self.remove_tags {
                tags.remove(tag);
            }
            task.tags = tags.into_iter().collect();
        }
        task.updated_at = now;
        due_changed
    }
}
