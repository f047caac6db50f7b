//! Reminder scheduling collaborator.
//!
//! The store hands alerts to a [`Notifier`] whenever a due date, an end date or
//! a break-interval preference changes. Delivery is the notifier's business; the
//! store never looks at the outcome.

use chrono::{DateTime, Duration, Utc};

use crate::fields::{ProjectId, TaskId, UserId};

/// What an alert is about. At most one pending alert exists per subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertSubject {
    TaskDue(TaskId),
    ProjectDeadline(ProjectId),
    Break(UserId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub subject: AlertSubject,
    pub fire_at: DateTime<Utc>,
    pub message: String,
    /// Fire again after this interval, or once when `None`.
    pub repeat_every: Option<Duration>,
}

pub trait Notifier {
    /// Schedule `alert`, replacing any pending alert for the same subject.
    fn schedule(&mut self, alert: Alert);

    /// Drop the pending alert for `subject`, if any.
    fn cancel(&mut self, subject: AlertSubject);
}

/// Discards every alert.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn schedule(&mut self, _alert: Alert) {}

    fn cancel(&mut self, _subject: AlertSubject) {}
}

/// Reports alerts through `tracing` instead of the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn schedule(&mut self, alert: Alert) {
        tracing::info!(
            subject = ?alert.subject,
            fire_at = %alert.fire_at.to_rfc3339(),
            repeat_minutes = ?alert.repeat_every.map(|d| d.num_minutes()),
            "reminder scheduled: {}",
            alert.message
        );
    }

    fn cancel(&mut self, subject: AlertSubject) {
        tracing::info!(?subject, "reminder cancelled");
    }
}
