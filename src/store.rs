//! The entity store: authoritative collections of users, tasks and projects.
//!
//! Every mutation runs the same sequence: apply the change, recompute derived
//! project counters, persist all snapshots, bump the revision, then notify
//! listeners. Listeners receive only the event and cannot reenter the store.
//! Lookup misses are no-ops and report `false` / `None`.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::*;
use crate::fields::*;
use crate::notify::{Alert, AlertSubject, Notifier};
use crate::project::{NewProject, Project, ProjectPatch};
use crate::task::{Comment, NewTask, Task, TaskPatch};
use crate::user::{NewUser, Preferences, User, UserPatch};

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually advanced clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock(Rc<Cell<DateTime<Utc>>>);

impl ManualClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        ManualClock(Rc::new(Cell::new(at)))
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.0.set(at);
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.get()
    }
}

/// What changed in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    UserCreated(UserId),
    UserUpdated(UserId),
    UserDeleted(UserId),
    CurrentUserChanged(Option<UserId>),
    TaskCreated(TaskId),
    TaskUpdated(TaskId),
    TaskDeleted(TaskId),
    ProjectCreated(ProjectId),
    ProjectUpdated(ProjectId),
    ProjectDeleted { id: ProjectId, removed_tasks: Vec<TaskId> },
}

type Listener = Box<dyn FnMut(&StoreEvent)>;

pub struct Store {
    storage: Box<dyn Storage>,
    notifier: Box<dyn Notifier>,
    clock: Box<dyn Clock>,
    users: Vec<User>,
    tasks: Vec<Task>,
    projects: Vec<Project>,
    current_user: Option<UserId>,
    reminder_lead: Duration,
    revision: u64,
    listeners: Vec<Listener>,
}

fn load<T: DeserializeOwned + Default>(storage: &dyn Storage, key: &str) -> T {
    match storage.read(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "undecodable snapshot, starting fresh");
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "unreadable snapshot, starting fresh");
            T::default()
        }
    }
}

fn save<T: Serialize + ?Sized>(storage: &mut dyn Storage, key: &str, value: &T) {
    let result = serde_json::to_string_pretty(value)
        .map_err(Into::into)
        .and_then(|data| storage.write(key, &data));
    if let Err(e) = result {
        tracing::error!(key, error = %e, "failed to persist snapshot");
    }
}

impl Store {
    /// Hydrate a store from `storage`. Missing or corrupt snapshots start empty.
    pub fn open(
        storage: impl Storage + 'static,
        notifier: impl Notifier + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        let users: Vec<User> = load(&storage, USERS_KEY);
        let tasks: Vec<Task> = load(&storage, TASKS_KEY);
        let projects: Vec<Project> = load(&storage, PROJECTS_KEY);
        let current: Option<UserId> = load(&storage, CURRENT_USER_KEY);
        let current_user = current.filter(|id| users.iter().any(|u| u.id == *id));
        tracing::debug!(
            users = users.len(),
            tasks = tasks.len(),
            projects = projects.len(),
            "store hydrated"
        );

        let mut store = Store {
            storage: Box::new(storage),
            notifier: Box::new(notifier),
            clock: Box::new(clock),
            users,
            tasks,
            projects,
            current_user,
            reminder_lead: Duration::minutes(60),
            revision: 0,
            listeners: Vec::new(),
        };
        store.recompute_counters();
        store
    }

    /// How long before a task's due date its reminder fires.
    pub fn with_reminder_lead(mut self, lead: Duration) -> Self {
        self.reminder_lead = lead;
        self
    }

    /// Register a callback run after every committed mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Incremented on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.current_user
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.and_then(|id| self.user(id))
    }

    /// No current user means the onboarding flow has to run.
    pub fn needs_onboarding(&self) -> bool {
        self.current_user.is_none()
    }

    /// Tasks belonging to `project`.
    pub fn project_tasks(&self, project: ProjectId) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.project == Some(project))
    }

    // ---- users ----

    pub fn create_user(&mut self, draft: NewUser) -> UserId {
        let user = User::from_draft(draft, self.now());
        let id = user.id;
        self.users.push(user);
        self.commit(StoreEvent::UserCreated(id));
        id
    }

    /// Create a user and make them current.
    pub fn onboard(&mut self, draft: NewUser) -> UserId {
        let id = self.create_user(draft);
        self.set_current_user(Some(id));
        id
    }

    pub fn update_user(&mut self, id: UserId, patch: UserPatch) -> bool {
        let now = self.now();
        let Some(user) = self.users.iter_mut().find(|u| u.id == id) else {
            return false;
        };
        patch.apply(user);
        user.updated_at = now;
        self.commit(StoreEvent::UserUpdated(id));
        true
    }

    pub fn set_preferences(&mut self, id: UserId, preferences: Preferences) -> bool {
        let now = self.now();
        let Some(user) = self.users.iter_mut().find(|u| u.id == id) else {
            return false;
        };
        let reschedule = user.preferences.break_interval_minutes != preferences.break_interval_minutes
            || user.preferences.notifications != preferences.notifications;
        user.preferences = preferences;
        user.updated_at = now;
        if reschedule && self.current_user == Some(id) {
            self.sync_break_reminder(id);
        }
        self.commit(StoreEvent::UserUpdated(id));
        true
    }

    /// Switch the current user. Unknown ids are ignored.
    pub fn set_current_user(&mut self, id: Option<UserId>) -> bool {
        if let Some(id) = id {
            if self.user(id).is_none() {
                return false;
            }
        }
        if let Some(previous) = self.current_user {
            if Some(previous) != id {
                self.notifier.cancel(AlertSubject::Break(previous));
            }
        }
        self.current_user = id;
        if let Some(id) = id {
            self.sync_break_reminder(id);
        }
        self.commit(StoreEvent::CurrentUserChanged(id));
        true
    }

    /// Remove a user, clearing assignments and memberships that point at them.
    /// Project ownership is left as a dangling back-reference.
    pub fn delete_user(&mut self, id: UserId) -> bool {
        let before = self.users.len();
        self.users.retain(|u| u.id != id);
        if self.users.len() == before {
            return false;
        }
        for task in self.tasks.iter_mut().filter(|t| t.assignee == Some(id)) {
            task.assignee = None;
        }
        for project in self.projects.iter_mut() {
            project.members.remove(&id);
        }
        if self.current_user == Some(id) {
            self.notifier.cancel(AlertSubject::Break(id));
            self.current_user = None;
        }
        self.commit(StoreEvent::UserDeleted(id));
        true
    }

    // ---- tasks ----

    pub fn create_task(&mut self, draft: NewTask) -> TaskId {
        let task = Task::from_draft(draft, self.now());
        let id = task.id;
        self.sync_task_reminder(&task);
        self.tasks.push(task);
        self.commit(StoreEvent::TaskCreated(id));
        id
    }

    pub fn update_task(&mut self, id: TaskId, patch: TaskPatch) -> bool {
        let now = self.now();
        let status_changed = patch.status.is_some();
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        let due_changed = patch.apply(task, now);
        if due_changed || status_changed {
            let task = task.clone();
            self.sync_task_reminder(&task);
        }
        self.commit(StoreEvent::TaskUpdated(id));
        true
    }

    pub fn set_task_status(&mut self, id: TaskId, status: TaskStatus) -> bool {
        self.update_task(id, TaskPatch { status: Some(status), ..Default::default() })
    }

    pub fn add_comment(&mut self, task: TaskId, author: UserId, body: &str) -> Option<CommentId> {
        let now = self.now();
        let task = self.tasks.iter_mut().find(|t| t.id == task)?;
        let comment = Comment { id: CommentId::new(), author, body: body.trim().to_string(), created_at: now };
        let id = comment.id;
        task.comments.push(comment);
        task.updated_at = now;
        let task_id = task.id;
        self.commit(StoreEvent::TaskUpdated(task_id));
        Some(id)
    }

    pub fn delete_task(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return false;
        }
        self.notifier.cancel(AlertSubject::TaskDue(id));
        self.commit(StoreEvent::TaskDeleted(id));
        true
    }

    // ---- projects ----

    pub fn create_project(&mut self, draft: NewProject) -> ProjectId {
        let project = Project::from_draft(draft, self.now());
        let id = project.id;
        self.sync_project_reminder(&project);
        self.projects.push(project);
        self.commit(StoreEvent::ProjectCreated(id));
        id
    }

    pub fn update_project(&mut self, id: ProjectId, patch: ProjectPatch) -> bool {
        let now = self.now();
        let status_changed = patch.status.is_some();
        let Some(project) = self.projects.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        let end_changed = patch.apply(project, now);
        if end_changed || status_changed {
            let project = project.clone();
            self.sync_project_reminder(&project);
        }
        self.commit(StoreEvent::ProjectUpdated(id));
        true
    }

    pub fn set_archived(&mut self, id: ProjectId, archived: bool) -> bool {
        let now = self.now();
        let Some(project) = self.projects.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        project.archived = archived;
        project.updated_at = now;
        let project = project.clone();
        self.sync_project_reminder(&project);
        self.commit(StoreEvent::ProjectUpdated(id));
        true
    }

    /// Delete a project together with all of its tasks.
    pub fn delete_project(&mut self, id: ProjectId) -> bool {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        if self.projects.len() == before {
            return false;
        }
        let removed_tasks: Vec<TaskId> = self.project_tasks(id).map(|t| t.id).collect();
        self.tasks.retain(|t| t.project != Some(id));
        for task in &removed_tasks {
            self.notifier.cancel(AlertSubject::TaskDue(*task));
        }
        self.notifier.cancel(AlertSubject::ProjectDeadline(id));
        tracing::debug!(project = %id, tasks = removed_tasks.len(), "project deleted with its tasks");
        self.commit(StoreEvent::ProjectDeleted { id, removed_tasks });
        true
    }

    // ---- internals ----

    fn commit(&mut self, event: StoreEvent) {
        self.recompute_counters();
        self.persist();
        self.revision += 1;
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    fn recompute_counters(&mut self) {
        let now = self.now();
        for project in self.projects.iter_mut() {
            project.recompute_counters(&self.tasks, now);
        }
    }

    fn persist(&mut self) {
        save(self.storage.as_mut(), USERS_KEY, &self.users);
        save(self.storage.as_mut(), TASKS_KEY, &self.tasks);
        save(self.storage.as_mut(), PROJECTS_KEY, &self.projects);
        save(self.storage.as_mut(), CURRENT_USER_KEY, &self.current_user);
        tracing::debug!(revision = self.revision + 1, "snapshots persisted");
    }

    fn sync_task_reminder(&mut self, task: &Task) {
        let subject = AlertSubject::TaskDue(task.id);
        let now = self.now();
        match task.due_date {
            Some(due) if !task.is_completed() && due - self.reminder_lead > now => {
                self.notifier.schedule(Alert {
                    subject,
                    fire_at: due - self.reminder_lead,
                    message: format!("Task '{}' is due at {}", task.title, due.format("%Y-%m-%d %H:%M")),
                    repeat_every: None,
                });
            }
            _ => self.notifier.cancel(subject),
        }
    }

    fn sync_project_reminder(&mut self, project: &Project) {
        let subject = AlertSubject::ProjectDeadline(project.id);
        let open = !project.archived
            && !matches!(project.status, ProjectStatus::Completed | ProjectStatus::Cancelled);
        let now = self.now();
        match project.end_date {
            Some(end) if open && end - Duration::days(1) > now => {
                self.notifier.schedule(Alert {
                    subject,
                    fire_at: end - Duration::days(1),
                    message: format!("Project '{}' ends tomorrow", project.name),
                    repeat_every: None,
                });
            }
            _ => self.notifier.cancel(subject),
        }
    }

    fn sync_break_reminder(&mut self, user: UserId) {
        let subject = AlertSubject::Break(user);
        let Some(prefs) = self.user(user).map(|u| u.preferences.clone()) else {
            return;
        };
        if prefs.notifications && prefs.break_interval_minutes > 0 {
            let every = Duration::minutes(i64::from(prefs.break_interval_minutes));
            self.notifier.schedule(Alert {
                subject,
                fire_at: self.now() + every,
                message: "Time for a break".to_string(),
                repeat_every: Some(every),
            });
        } else {
            self.notifier.cancel(subject);
        }
    }
}
