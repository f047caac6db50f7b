//! Users and their preferences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// Per-user preferences captured during onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub notifications: bool,
    /// Hour of day (0-23) the working day starts.
    pub work_start_hour: u8,
    /// Hour of day (1-24) the working day ends.
    pub work_end_hour: u8,
    /// Minutes between break reminders. Zero disables them.
    pub break_interval_minutes: u32,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            notifications: true,
            work_start_hour: 9,
            work_end_hour: 17,
            break_interval_minutes: 60,
            theme: Theme::System,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
    /// Snapshots written before this field existed load as the epoch.
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn from_draft(draft: NewUser, now: DateTime<Utc>) -> Self {
        User {
            id: UserId::new(),
            name: draft.name,
            email: draft.email,
            role: draft.role,
            preferences: draft.preferences,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validated input for creating a user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub preferences: Preferences,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl UserPatch {
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name { user.name = name; }
        if let Some(email) = self.email { user.email = email; }
        if let Some(role) = self.role { user.role = role; }
    }
}
