//! Working routine editing.
//!
//! The working routine is what the user builds before a session starts. The
//! session engine takes its own copy, so edits here never reach a run that is
//! already in progress.

use crate::{Error, ExerciseStep, Result, Routine};
use uuid::Uuid;

impl Routine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<ExerciseStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[ExerciseStep] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&ExerciseStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sum of work and rest over every step
    ///
    /// Saturates at `u32::MAX`; `add_step` and `validate` keep real routines
    /// below that.
    pub fn total_seconds(&self) -> u32 {
        self.checked_total_seconds().unwrap_or(u32::MAX)
    }

    /// Sum of work and rest over every step, `None` on overflow
    pub fn checked_total_seconds(&self) -> Option<u32> {
        self.steps
            .iter()
            .try_fold(0u32, |total, step| total.checked_add(step.cycle_seconds()?))
    }

    /// Check a routine before running it
    ///
    /// Routines read back from storage never went through `add_step`, so the
    /// same rules are applied again here.
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(Error::Validation("Cannot start an empty routine".into()));
        }
        if let Some(step) = self.steps.iter().find(|s| s.work_seconds == 0) {
            return Err(Error::Validation(format!(
                "Step {} has no work time",
                step.name
            )));
        }
        if self.checked_total_seconds().is_none() {
            return Err(Error::Validation("Routine is too long".into()));
        }
        Ok(())
    }

    /// Append a validated step and return its id
    ///
    /// The name must not be blank and work must be at least one second.
    pub fn add_step(&mut self, name: &str, work_seconds: u32, rest_seconds: u32) -> Result<Uuid> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Exercise name must not be empty".into()));
        }
        if work_seconds == 0 {
            return Err(Error::Validation(
                "Work duration must be at least 1 second".into(),
            ));
        }

        let step = ExerciseStep {
            id: Uuid::new_v4(),
            name: name.to_string(),
            work_seconds,
            rest_seconds,
        };
        let fits = step
            .cycle_seconds()
            .zip(self.checked_total_seconds())
            .and_then(|(cycle, total)| total.checked_add(cycle))
            .is_some();
        if !fits {
            return Err(Error::Validation(format!(
                "Step {} would make the routine too long",
                name
            )));
        }

        let id = step.id;
        self.steps.push(step);

        tracing::debug!(
            "Added step {} ({}s work / {}s rest) at position {}",
            name,
            work_seconds,
            rest_seconds,
            self.steps.len()
        );
        Ok(id)
    }

    /// Remove the step with the given id; returns whether one was removed
    pub fn remove_step(&mut self, id: Uuid) -> bool {
        let before = self.steps.len();
        self.steps.retain(|s| s.id != id);
        before != self.steps.len()
    }

    /// Replace the whole routine, e.g. when accepting a recommendation
    pub fn replace_with(&mut self, other: &Routine) {
        self.steps = other.steps.clone();
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_step_trims_name_and_keeps_order() {
        let mut routine = Routine::new();
        routine.add_step("  Squat ", 45, 15).unwrap();
        routine.add_step("Push-up", 30, 0).unwrap();

        assert_eq!(routine.len(), 2);
        assert_eq!(routine.steps()[0].name, "Squat");
        assert_eq!(routine.steps()[1].name, "Push-up");
        assert_eq!(routine.total_seconds(), 90);
    }

    #[test]
    fn test_add_step_rejects_invalid_input() {
        let mut routine = Routine::new();

        assert!(matches!(
            routine.add_step("   ", 30, 10),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            routine.add_step("Plank", 0, 10),
            Err(Error::Validation(_))
        ));
        assert!(routine.is_empty());
    }

    #[test]
    fn test_add_step_rejects_overflowing_durations() {
        let mut routine = Routine::new();

        assert!(matches!(
            routine.add_step("Long", u32::MAX, 1),
            Err(Error::Validation(_))
        ));
        assert!(routine.is_empty());

        routine.add_step("Hold", u32::MAX - 10, 5).unwrap();
        assert!(matches!(
            routine.add_step("Squat", 10, 0),
            Err(Error::Validation(_))
        ));
        assert_eq!(routine.len(), 1);
        assert_eq!(routine.total_seconds(), u32::MAX - 5);
    }

    #[test]
    fn test_stored_routine_with_overflowing_total_fails_validation() {
        let long = |name: &str| ExerciseStep {
            id: Uuid::new_v4(),
            name: name.to_string(),
            work_seconds: u32::MAX / 2 + 1,
            rest_seconds: 0,
        };
        let routine = Routine::from_steps(vec![long("A"), long("B")]);

        assert_eq!(routine.checked_total_seconds(), None);
        assert_eq!(routine.total_seconds(), u32::MAX);
        assert!(matches!(routine.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_empty_and_zero_work() {
        assert!(matches!(Routine::new().validate(), Err(Error::Validation(_))));

        let rest_only = Routine::from_steps(vec![ExerciseStep {
            id: Uuid::new_v4(),
            name: "Rest".into(),
            work_seconds: 0,
            rest_seconds: 30,
        }]);
        assert!(matches!(rest_only.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_replace_with_copies_other_routine() {
        let mut working = Routine::new();
        working.add_step("Handstand", 20, 40).unwrap();

        let mut recommended = Routine::new();
        recommended.add_step("Push-up", 50, 10).unwrap();
        recommended.add_step("Squat", 50, 10).unwrap();

        working.replace_with(&recommended);
        assert_eq!(working, recommended);
        assert!(working.steps().iter().all(|s| s.name != "Handstand"));
    }

    #[test]
    fn test_remove_step_by_id() {
        let mut routine = Routine::new();
        let first = routine.add_step("Lunge", 30, 30).unwrap();
        routine.add_step("Superman", 30, 30).unwrap();

        assert!(routine.remove_step(first));
        assert!(!routine.remove_step(first));
        assert_eq!(routine.len(), 1);
        assert_eq!(routine.steps()[0].name, "Superman");
    }

    #[test]
    fn test_routine_serializes_as_plain_array() {
        let mut routine = Routine::new();
        routine.add_step("Jumping Jack", 20, 10).unwrap();

        let json = serde_json::to_value(&routine).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["work_seconds"], 20);
    }
}
