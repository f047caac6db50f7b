//! Form validation performed before the store is invoked.
//!
//! Each form holds raw user input; `validate` either yields the draft the store
//! accepts or a [`ValidationError`] describing the rejected attempt.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex_lite::Regex;

use crate::error::ValidationError;
use crate::fields::*;
use crate::parse::split_and_normalise_tags;
use crate::project::NewProject;
use crate::task::NewTask;
use crate::user::{NewUser, Preferences};

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("email regex")
    })
}

/// Trimmed `value`, rejecting blank input.
pub fn require_text(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Reject negative and non-finite hours and amounts.
pub fn validate_amount(value: Option<f64>, field: &'static str) -> Result<Option<f64>, ValidationError> {
    match value {
        Some(v) if !v.is_finite() => Err(ValidationError::NotFinite(field)),
        Some(v) if v < 0.0 => Err(ValidationError::Negative(field)),
        other => Ok(other),
    }
}

/// Check an email address. Returns the trimmed address.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = require_text(email, "Email")?;
    if email_regex().is_match(&email) {
        Ok(email)
    } else {
        Err(ValidationError::InvalidEmail(email))
    }
}

pub fn validate_preferences(prefs: &Preferences) -> Result<(), ValidationError> {
    if prefs.work_start_hour >= prefs.work_end_hour || prefs.work_end_hour > 24 {
        return Err(ValidationError::InvalidWorkHours {
            start: prefs.work_start_hour,
            end: prefs.work_end_hour,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub preferences: Preferences,
}

impl UserForm {
    pub fn validate(self) -> Result<NewUser, ValidationError> {
        let name = require_text(&self.name, "Name")?;
        let email = validate_email(&self.email)?;
        validate_preferences(&self.preferences)?;
        Ok(NewUser { name, email, role: self.role, preferences: self.preferences })
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskForm {
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

impl TaskForm {
    pub fn validate(self) -> Result<NewTask, ValidationError> {
        Ok(NewTask {
            title: require_text(&self.title, "Title")?,
            description: self.description.trim().to_string(),
            priority: self.priority,
            assignee: self.assignee,
            project: self.project,
            due_date: self.due_date,
            estimated_hours: validate_amount(self.estimated_hours, "Estimated hours")?,
            tags: split_and_normalise_tags(&self.tags),
            budget: validate_amount(self.budget, "Budget")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProjectForm {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub owner: UserId,
    pub members: Vec<UserId>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub tags: Vec<String>,
}

impl ProjectForm {
    pub fn validate(self) -> Result<NewProject, ValidationError> {
        let name = require_text(&self.name, "Name")?;
        validate_schedule(self.start_date, self.end_date)?;
        Ok(NewProject {
            name,
            description: self.description.trim().to_string(),
            status: self.status,
            owner: self.owner,
            members: self.members.into_iter().collect::<BTreeSet<_>>(),
            start_date: self.start_date,
            end_date: self.end_date,
            budget: validate_amount(self.budget, "Budget")?,
            tags: split_and_normalise_tags(&self.tags),
        })
    }
}

pub fn validate_schedule(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match end {
        Some(end) if end < start => Err(ValidationError::EndBeforeStart),
        _ => Ok(()),
    }
}
