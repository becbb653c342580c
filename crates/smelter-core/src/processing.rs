//! Timer-driven processing of a single recipe.
//!
//! A [`ResourceProcessing`] runs one recipe cycle at a time. It knows nothing
//! about storages or blocks: the owning building decides when to start,
//! stop and resume it, and reacts to the [`ProcessingTick::Completed`]
//! signal returned from [`ResourceProcessing::update`].

use crate::fixed::Seconds;
use crate::recipe::ResourceRecipe;
use crate::resource::ResourceType;

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Observable state derived from the `(stopped, completed)` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ProcessingState {
    /// Stopped and not completed. Initial state; also entered via `stop()`.
    Stopped,
    Running,
    /// The cycle finished. Only `start()` leaves this state.
    Completed,
}

/// Outcome of one `update` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingTick {
    /// Stopped or completed: time did not advance.
    Idle,
    /// Time advanced but the cycle is not done yet.
    Progressed,
    /// The cycle finished during this call. Returned once per `start()`.
    Completed,
}

// ---------------------------------------------------------------------------
// ResourceProcessing
// ---------------------------------------------------------------------------

/// Mutable processing state over an immutable recipe.
///
/// Invariant: `is_completed() ⇒ is_stopped()`.
#[derive(Debug, Clone)]
pub struct ResourceProcessing {
    recipe: ResourceRecipe,
    elapsed: Seconds,
    completed: bool,
    stopped: bool,
}

impl ResourceProcessing {
    pub fn new(recipe: ResourceRecipe) -> Self {
        Self {
            recipe,
            elapsed: Seconds::ZERO,
            completed: false,
            stopped: true,
        }
    }

    /// Begin a fresh cycle from zero. Valid from any state.
    pub fn start(&mut self) {
        self.elapsed = Seconds::ZERO;
        self.completed = false;
        self.stopped = false;
    }

    /// Freeze the timer without resetting it.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Continue a stopped cycle where it left off. No-op once completed.
    pub fn resume(&mut self) {
        if self.completed {
            return;
        }
        self.stopped = false;
    }

    /// Advance the timer by `dt`. Completion is reported exactly once per
    /// cycle; the caller may `start()` again immediately after.
    pub fn update(&mut self, dt: Seconds) -> ProcessingTick {
        if self.completed || self.stopped {
            return ProcessingTick::Idle;
        }

        self.elapsed += dt;
        if self.elapsed >= self.recipe.time {
            self.completed = true;
            self.stopped = true;
            ProcessingTick::Completed
        } else {
            ProcessingTick::Progressed
        }
    }

    /// Input resource types of the recipe.
    pub fn required(&self) -> &[ResourceType] {
        &self.recipe.input
    }

    /// Output resource types of the recipe.
    pub fn result(&self) -> &[ResourceType] {
        &self.recipe.output
    }

    pub fn recipe(&self) -> &ResourceRecipe {
        &self.recipe
    }

    pub fn elapsed(&self) -> Seconds {
        self.elapsed
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn state(&self) -> ProcessingState {
        match (self.stopped, self.completed) {
            (_, true) => ProcessingState::Completed,
            (true, false) => ProcessingState::Stopped,
            (false, false) => ProcessingState::Running,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::seconds;

    fn smelt() -> ResourceProcessing {
        ResourceProcessing::new(ResourceRecipe::new(
            vec![ResourceType::Ore],
            vec![ResourceType::Ingot],
            seconds(2.0),
        ))
    }

    #[test]
    fn starts_stopped() {
        let p = smelt();
        assert!(p.is_stopped());
        assert!(!p.is_completed());
        assert_eq!(p.state(), ProcessingState::Stopped);
    }

    #[test]
    fn update_is_noop_while_stopped() {
        let mut p = smelt();
        assert_eq!(p.update(seconds(5.0)), ProcessingTick::Idle);
        assert_eq!(p.elapsed(), Seconds::ZERO);
    }

    #[test]
    fn completes_after_recipe_time() {
        let mut p = smelt();
        p.start();
        assert_eq!(p.update(seconds(1.5)), ProcessingTick::Progressed);
        assert_eq!(p.state(), ProcessingState::Running);
        assert_eq!(p.update(seconds(0.5)), ProcessingTick::Completed);
        assert!(p.is_completed());
        assert!(p.is_stopped());
    }

    #[test]
    fn completion_fires_once_per_start() {
        let mut p = smelt();
        p.start();
        assert_eq!(p.update(seconds(3.0)), ProcessingTick::Completed);
        assert_eq!(p.update(seconds(3.0)), ProcessingTick::Idle);
        assert_eq!(p.update(seconds(3.0)), ProcessingTick::Idle);

        p.start();
        assert_eq!(p.update(seconds(3.0)), ProcessingTick::Completed);
    }

    #[test]
    fn stop_then_resume_keeps_elapsed() {
        let mut p = smelt();
        p.start();
        p.update(seconds(1.25));
        p.stop();
        assert_eq!(p.update(seconds(10.0)), ProcessingTick::Idle);
        p.resume();
        assert_eq!(p.elapsed(), seconds(1.25));
        assert_eq!(p.update(seconds(0.75)), ProcessingTick::Completed);
    }

    #[test]
    fn start_restarts_from_zero() {
        let mut p = smelt();
        p.start();
        p.update(seconds(1.5));
        p.start();
        assert_eq!(p.elapsed(), Seconds::ZERO);
        assert_eq!(p.update(seconds(1.5)), ProcessingTick::Progressed);
    }

    #[test]
    fn resume_after_completion_keeps_invariant() {
        let mut p = smelt();
        p.start();
        p.update(seconds(2.0));
        p.resume();
        assert!(p.is_completed());
        assert!(p.is_stopped());
        assert_eq!(p.update(seconds(1.0)), ProcessingTick::Idle);
    }

    #[test]
    fn zero_time_recipe_completes_on_first_update() {
        let mut p = ResourceProcessing::new(ResourceRecipe::new(vec![], vec![ResourceType::Ore], seconds(0.0)));
        p.start();
        assert_eq!(p.update(Seconds::ZERO), ProcessingTick::Completed);
    }

    #[test]
    fn accessors_return_recipe_lists() {
        let p = smelt();
        assert_eq!(p.required(), &[ResourceType::Ore]);
        assert_eq!(p.result(), &[ResourceType::Ingot]);
    }
}
