//! Core domain types for the Calis workout planner.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercise steps and routines
//! - Skill levels and exercise categories
//! - Session phases, status and completed-session records
//! - Accounts and stored credentials

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Routine Types
// ============================================================================

/// One exercise with its assigned work and rest durations
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseStep {
    pub id: Uuid,
    pub name: String,
    pub work_seconds: u32,
    pub rest_seconds: u32,
}

impl ExerciseStep {
    /// Seconds this step contributes to a full run (work plus rest)
    ///
    /// `None` if the sum does not fit in a `u32`.
    pub fn cycle_seconds(&self) -> Option<u32> {
        self.work_seconds.checked_add(self.rest_seconds)
    }
}

/// Ordered list of exercise steps; insertion order is execution order
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Routine {
    pub(crate) steps: Vec<ExerciseStep>,
}

/// Exercise category used to balance recommendations
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    UpperBody,
    LowerBody,
    FullBody,
}

impl Category {
    /// Categories in the order recommendations cycle through them
    pub const CYCLE: [Category; 3] = [Category::UpperBody, Category::LowerBody, Category::FullBody];

    pub fn label(&self) -> &'static str {
        match self {
            Category::UpperBody => "Upper body",
            Category::LowerBody => "Lower body",
            Category::FullBody => "Full body",
        }
    }
}

/// Training level, each mapping to a fixed work/rest pair
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl SkillLevel {
    /// `(work_seconds, rest_seconds)` for this level
    pub fn durations(&self) -> (u32, u32) {
        match self {
            SkillLevel::Beginner => (30, 30),
            SkillLevel::Intermediate => (45, 15),
            SkillLevel::Advanced => (50, 10),
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
        };
        f.write_str(name)
    }
}

impl FromStr for SkillLevel {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(SkillLevel::Beginner),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "advanced" => Ok(SkillLevel::Advanced),
            other => Err(crate::Error::Validation(format!(
                "Unknown skill level: {} (expected beginner, intermediate or advanced)",
                other
            ))),
        }
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// Which interval of the current step is being timed
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    Rest,
}

/// Lifecycle of a session engine
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Aborted,
}

/// A finished workout as it is stored in a user's history
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletedSession {
    pub id: Uuid,
    pub performed_at: DateTime<Utc>,
    pub routine: Routine,
    pub total_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl CompletedSession {
    /// Build the summary for a finished routine (no memo yet)
    pub fn from_routine(routine: Routine, performed_at: DateTime<Utc>) -> Self {
        let total_seconds = routine.total_seconds();
        Self {
            id: Uuid::new_v4(),
            performed_at,
            routine,
            total_seconds,
            memo: None,
        }
    }

    /// Attach a memo; blank text means no memo
    pub fn with_memo(mut self, memo: &str) -> Self {
        let trimmed = memo.trim();
        self.memo = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// Total duration rendered as "Xm Ys"
    pub fn duration_label(&self) -> String {
        format!("{}m {}s", self.total_seconds / 60, self.total_seconds % 60)
    }
}

// ============================================================================
// Account Types
// ============================================================================

/// Stored credential for one user (plaintext, not a security design)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PasswordRecord {
    pub password: String,
}

/// Credentials keyed by email
pub type Credentials = BTreeMap<String, PasswordRecord>;

/// A logged-in identity
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Account {
    Admin(String),
    Member(String),
}

impl Account {
    pub fn email(&self) -> &str {
        match self {
            Account::Admin(email) | Account::Member(email) => email,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Account::Admin(_))
    }
}
