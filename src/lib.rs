//! # workboard
//!
//! A single-user task and project tracker with derived analytics.
//!
//! ## Key Features
//!
//! - **Entity Store**: users, tasks and projects with whole-snapshot JSON persistence
//!   after every mutation, derived project counters, and reminder scheduling hooks
//! - **Filter/Sort Pipeline**: search, filter and stable sort for task and project views
//! - **Analytics**: productivity trend, budget utilization, team performance and
//!   project completion prediction
//! - **Onboarding**: the store reports when no current user exists yet
//! - **Terminal front-ends**: the `wb` CLI and a live dashboard
//!
//! ## Quick Start
//!
//! ```bash
//! wb onboard --name "Ada Lovelace" --email ada@example.com
//! wb project add "Website relaunch" --budget 5000 --end "in 4w"
//! wb task add "Draft landing copy" --project "website relaunch" --due friday --priority high
//! wb task list --filter this-week --sort due
//! wb stats
//! wb dashboard
//! ```
//!
//! Data lives in `~/.workboard/` as one JSON file per collection.

pub mod analytics;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod debounce;
pub mod display;
pub mod error;
pub mod fields;
pub mod notify;
pub mod parse;
pub mod project;
pub mod query;
pub mod store;
pub mod task;
pub mod user;
pub mod validate;
pub mod tui {
    pub mod colors;
    pub mod dashboard;
    pub mod input;
    pub mod run;
}
