use std::collections::BTreeSet;

use chrono::{Duration, TimeZone, Utc};

use workboard::analytics::Dashboard;
use workboard::db::{JsonDirStorage, Storage, TASKS_KEY};
use workboard::fields::*;
use workboard::notify::NullNotifier;
use workboard::project::{NewProject, ProjectPatch};
use workboard::query::{self, ProjectFilter, ProjectSort, QueryContext};
use workboard::store::{Clock, ManualClock, Store};
use workboard::task::NewTask;
use workboard::user::NewUser;

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap())
}

fn open(dir: &std::path::Path, clock: &ManualClock) -> Store {
    Store::open(JsonDirStorage::open(dir).unwrap(), NullNotifier, clock.clone())
}

fn ada() -> NewUser {
    NewUser { name: "Ada".into(), email: "ada@example.com".into(), ..Default::default() }
}

fn project(owner: UserId, name: &str, budget: f64) -> NewProject {
    NewProject {
        name: name.into(),
        description: String::new(),
        status: ProjectStatus::Active,
        owner,
        members: BTreeSet::new(),
        start_date: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        end_date: None,
        budget: Some(budget),
        tags: Vec::new(),
    }
}

fn add_project(store: &mut Store, owner: UserId, name: &str, budget: f64, cost: f64) -> ProjectId {
    let id = store.create_project(project(owner, name, budget));
    store.update_project(id, ProjectPatch { actual_cost: Some(Some(cost)), ..Default::default() });
    id
}

#[test]
fn snapshot_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let clock = clock();

    let (user, task) = {
        let mut store = open(dir.path(), &clock);
        let user = store.onboard(ada());
        let pid = add_project(&mut store, user, "Relaunch", 1000.0, 100.0);
        let task = store.create_task(NewTask {
            title: "Draft copy".into(),
            project: Some(pid),
            assignee: Some(user),
            due_date: Some(clock.now() + Duration::days(2)),
            tags: vec!["writing".into()],
            ..Default::default()
        });
        store.set_task_status(task, TaskStatus::InProgress);
        store.add_comment(task, user, "started");
        (user, task)
    };

    assert!(dir.path().join(format!("{TASKS_KEY}.json")).exists());

    let reopened = open(dir.path(), &clock);
    assert_eq!(reopened.current_user_id(), Some(user));
    assert!(!reopened.needs_onboarding());
    let t = reopened.task(task).unwrap();
    assert_eq!(t.status, TaskStatus::InProgress);
    assert_eq!(t.comments.len(), 1);
    assert_eq!(t.tags, vec!["writing".to_string()]);
    let p = &reopened.projects()[0];
    assert_eq!(p.total_tasks, 1);
    assert_eq!(p.actual_cost, Some(100.0));
}

#[test]
fn deleting_project_drops_it_from_analytics() {
    let dir = tempfile::tempdir().unwrap();
    let clock = clock();
    let mut store = open(dir.path(), &clock);
    let user = store.onboard(ada());

    let keep = add_project(&mut store, user, "Keep", 1000.0, 200.0);
    let gone = add_project(&mut store, user, "Gone", 500.0, 480.0);
    for (title, pid) in [("a", keep), ("b", gone), ("c", gone)] {
        store.create_task(NewTask { title: title.into(), project: Some(pid), ..Default::default() });
    }

    let before = Dashboard::from_store(&store);
    assert_eq!(before.projects.len(), 2);
    assert_eq!(before.productivity.total_tasks, 3);
    assert_eq!(before.financial.savings_opportunities.len(), 1);

    store.delete_project(gone);

    let after = Dashboard::from_store(&store);
    assert_eq!(after.projects.len(), 1);
    assert!(after.projects.iter().all(|p| p.project != gone));
    assert_eq!(after.productivity.total_tasks, 1);
    assert!(store.tasks().iter().all(|t| t.project != Some(gone)));
    assert!((after.financial.total_budget - 1000.0).abs() < 1e-9);
    assert!(after.financial.savings_opportunities.is_empty());

    let reopened = open(dir.path(), &clock);
    assert_eq!(reopened.tasks().len(), 1);
    assert!(reopened.project(gone).is_none());
}

#[test]
fn archived_projects_only_in_archived_view() {
    let dir = tempfile::tempdir().unwrap();
    let clock = clock();
    let mut store = open(dir.path(), &clock);
    let user = store.onboard(ada());
    let a = add_project(&mut store, user, "Alpha", 100.0, 0.0);
    let b = add_project(&mut store, user, "Beta", 100.0, 0.0);
    store.set_archived(b, true);

    let ctx = QueryContext { current_user: Some(user), now: store.now() };
    let all = query::apply(store.projects(), "", &ProjectFilter::All, ProjectSort::Name, &ctx);
    assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![a]);
    let mine = query::apply(store.projects(), "", &ProjectFilter::Mine, ProjectSort::Name, &ctx);
    assert_eq!(mine.len(), 1);
    let archived = query::apply(store.projects(), "", &ProjectFilter::Archived, ProjectSort::Name, &ctx);
    assert_eq!(archived.iter().map(|p| p.id).collect::<Vec<_>>(), vec![b]);
}

#[test]
fn corrupt_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = JsonDirStorage::open(dir.path()).unwrap();
    storage.write(TASKS_KEY, "{ not json").unwrap();

    let store = Store::open(storage, NullNotifier, clock());
    assert!(store.tasks().is_empty());
    assert!(store.needs_onboarding());
}
