//! Routine recommendation.
//!
//! Builds a balanced routine for a skill level and target duration:
//! - Work/rest come from the level table
//! - Step count is the target time divided by one work+rest cycle (at least 3)
//! - Steps cycle upper body → lower body → full body, each pool shuffled once

use crate::catalog::{get_default_catalog, Catalog};
use crate::{Category, Error, ExerciseStep, Result, Routine, SkillLevel};
use rand_core::{OsRng, RngCore};
use uuid::Uuid;

/// Explanation shown alongside every recommendation
pub const RECOMMENDATION_REASON: &str =
    "A balanced routine mixing upper body, lower body and full body movements for even development.";

/// Shortest routine we ever recommend (one exercise per category)
pub const MIN_STEPS: usize = 3;

pub const MIN_TARGET_MINUTES: u32 = 1;
pub const MAX_TARGET_MINUTES: u32 = 60;

/// Validated input to the recommender
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecommendationRequest {
    level: SkillLevel,
    target_minutes: u32,
}

impl RecommendationRequest {
    /// Create a request; `target_minutes` must be within 1..=60
    pub fn new(level: SkillLevel, target_minutes: u32) -> Result<Self> {
        if !(MIN_TARGET_MINUTES..=MAX_TARGET_MINUTES).contains(&target_minutes) {
            return Err(Error::Validation(format!(
                "Target duration must be between {} and {} minutes, got {}",
                MIN_TARGET_MINUTES, MAX_TARGET_MINUTES, target_minutes
            )));
        }
        Ok(Self {
            level,
            target_minutes,
        })
    }

    pub fn level(&self) -> SkillLevel {
        self.level
    }

    pub fn target_minutes(&self) -> u32 {
        self.target_minutes
    }

    /// Number of steps the recommendation will contain
    pub fn step_count(&self) -> usize {
        let (work, rest) = self.level.durations();
        let cycle = work + rest;
        let total = self.target_minutes * 60;
        // round half up
        let rounded = (2 * total + cycle) / (2 * cycle);
        (rounded as usize).max(MIN_STEPS)
    }
}

/// A candidate routine, not yet applied
#[derive(Clone, Debug)]
pub struct Recommendation {
    pub reason: String,
    pub routine: Routine,
}

/// Generate a recommendation using the operating system's randomness
pub fn recommend(request: &RecommendationRequest) -> Recommendation {
    generate(get_default_catalog(), request, &mut OsRng)
}

/// Generate a recommendation from `catalog` with an injected randomness source
pub fn generate<R: RngCore + ?Sized>(
    catalog: &Catalog,
    request: &RecommendationRequest,
    rng: &mut R,
) -> Recommendation {
    let (work, rest) = request.level().durations();
    let step_count = request.step_count();

    let pools: Vec<Vec<&'static str>> = Category::CYCLE
        .iter()
        .map(|&category| {
            let mut pool = catalog.pool(category).to_vec();
            shuffle(&mut pool, rng);
            pool
        })
        .collect();

    let steps = (0..step_count)
        .filter_map(|i| {
            let pool = &pools[i % pools.len()];
            if pool.is_empty() {
                return None;
            }
            Some(ExerciseStep {
                id: Uuid::new_v4(),
                name: pool[(i / pools.len()) % pool.len()].to_string(),
                work_seconds: work,
                rest_seconds: rest,
            })
        })
        .collect();

    tracing::debug!(
        "Recommended {} steps for {} over {} minutes",
        step_count,
        request.level(),
        request.target_minutes()
    );

    Recommendation {
        reason: RECOMMENDATION_REASON.to_string(),
        routine: Routine::from_steps(steps),
    }
}

/// Fisher-Yates shuffle
fn shuffle<T, R: RngCore + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = (rng.next_u32() as usize) % (i + 1);
        items.swap(i, j);
    }
}
