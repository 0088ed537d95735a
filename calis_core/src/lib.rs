#![forbid(unsafe_code)]

//! Core domain model and business logic for the Calis workout planner.
//!
//! This crate provides:
//! - Domain types (exercise steps, routines, skill levels, sessions)
//! - Exercise catalog and routine recommendation
//! - Interval session engine with spoken countdown cues
//! - Persistence (key-value store, repository, history log)
//! - Accounts and the administrator overview

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod routine;
pub mod recommend;
pub mod cue;
pub mod session;
pub mod store;
pub mod repository;
pub mod history;
pub mod account;
pub mod admin;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use recommend::{recommend, Recommendation, RecommendationRequest};
pub use cue::{CommandCueSink, CueSettings, CueSink, SilentCueSink};
pub use session::{SessionEngine, SessionEvent, SessionSnapshot};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use repository::Repository;
pub use history::WorkoutLog;
pub use account::Accounts;
pub use admin::AdminOverview;
