// crates/kie-core/src/core/rails.rs
// ============================================================================
// Module: Rails State
// Description: Persistent workflow position and conditional stage transitions.
// Purpose: Capture deterministic workflow evolution; forbid silent progression.
// Dependencies: crate::core::{artifact, stage, time}, serde, thiserror
// ============================================================================

//! ## Overview
//! The rails state tracks the current workflow position across the ordered
//! stage sequence. Advancement requires explicit command success; there is no
//! auto-progression and no regression without an explicit reset. A failed or
//! blocked command leaves the state untouched. Partial artifacts are recorded
//! in the evidence ledger but never satisfy transition preconditions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::artifact::ArtifactRef;
use crate::core::stage::BuildTarget;
use crate::core::stage::STAGE_ORDER;
use crate::core::stage::Stage;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Rails transition errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Every error leaves the state unchanged.
#[derive(Debug, Error)]
pub enum RailsError {
    /// Target stage does not immediately follow the latest completed stage.
    #[error("cannot advance to {target}: next stage on the rails is {expected}")]
    NotNextStage {
        /// Requested target stage.
        target: Stage,
        /// Stage the rails actually permit next.
        expected: Stage,
    },
    /// Target stage is already completed and regression was not requested.
    #[error("stage {0} is already completed; use `kie spec --repair` to reset")]
    AlreadyCompleted(Stage),
    /// Transition was attempted without the command succeeding.
    #[error("cannot advance to {0}: producing command did not succeed")]
    CommandFailed(Stage),
}

// ============================================================================
// SECTION: Rails State
// ============================================================================

/// Persistent workflow tracker.
///
/// # Invariants
/// - `completed_stages` is a prefix of [`STAGE_ORDER`].
/// - `current_stage` equals the latest completed stage.
/// - Mutated only by the rails state machine; blocks never mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RailsState {
    /// Latest completed stage (the current rails position).
    pub current_stage: Stage,
    /// Completed stages, in rails order.
    pub completed_stages: Vec<Stage>,
    /// Artifact pointers recorded per completed stage.
    pub artifacts: BTreeMap<Stage, Vec<ArtifactRef>>,
    /// Build sub-goals recorded within the `build` stage.
    pub sub_goals: Vec<BuildTarget>,
    /// Creation time of the rails state.
    pub created_at: Timestamp,
    /// Last mutation time.
    pub updated_at: Timestamp,
}

impl RailsState {
    /// Creates a fresh rails state positioned at `startkie`.
    #[must_use]
    pub fn new(now: Timestamp) -> Self {
        Self {
            current_stage: Stage::Startkie,
            completed_stages: vec![Stage::Startkie],
            artifacts: BTreeMap::new(),
            sub_goals: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true when the stage has been completed.
    #[must_use]
    pub fn is_completed(&self, stage: Stage) -> bool {
        self.completed_stages.contains(&stage)
    }

    /// Returns the stage the rails permit next, if the sequence is unfinished.
    #[must_use]
    pub fn next_stage(&self) -> Option<Stage> {
        self.current_stage.next()
    }

    /// Attempts a transition to `target` with the artifacts it produced.
    ///
    /// The transition succeeds only if `target` immediately follows the
    /// latest completed stage and `command_succeeded` is true. Preconditions
    /// on artifact presence are enforced by the pre-gate before the producing
    /// command runs; this method enforces ordering and success.
    ///
    /// # Errors
    ///
    /// Returns [`RailsError`] and leaves the state unchanged when the
    /// transition is not permitted.
    pub fn attempt_transition(
        &mut self,
        target: Stage,
        produced_artifacts: Vec<ArtifactRef>,
        command_succeeded: bool,
        now: Timestamp,
    ) -> Result<(), RailsError> {
        if !command_succeeded {
            return Err(RailsError::CommandFailed(target));
        }
        if self.is_completed(target) {
            // Re-running a completed stage recomputes artifacts in place.
            self.artifacts.insert(target, produced_artifacts);
            self.updated_at = now;
            return Ok(());
        }
        let Some(expected) = self.next_stage() else {
            return Err(RailsError::AlreadyCompleted(self.current_stage));
        };
        if target != expected {
            return Err(RailsError::NotNextStage {
                target,
                expected,
            });
        }
        self.completed_stages.push(target);
        self.current_stage = target;
        self.artifacts.insert(target, produced_artifacts);
        self.updated_at = now;
        Ok(())
    }

    /// Records a build sub-goal (deliverable target) within the build stage.
    pub fn record_sub_goal(&mut self, target: BuildTarget, now: Timestamp) {
        if !self.sub_goals.contains(&target) {
            self.sub_goals.push(target);
        }
        self.updated_at = now;
    }

    /// Resets the rails back to `stage`, discarding later completions.
    ///
    /// Only the documented `spec --repair` path calls this; it is the sole
    /// legal regression.
    pub fn reset_to(&mut self, stage: Stage, now: Timestamp) {
        let keep = stage.index() + 1;
        self.completed_stages = STAGE_ORDER.iter().copied().take(keep).collect();
        self.current_stage = stage;
        self.artifacts.retain(|recorded, _| recorded.index() < keep);
        if stage < Stage::Build {
            self.sub_goals.clear();
        }
        self.updated_at = now;
    }

    /// Returns the artifacts recorded for a completed stage.
    #[must_use]
    pub fn stage_artifacts(&self, stage: Stage) -> &[ArtifactRef] {
        self.artifacts.get(&stage).map_or(&[], Vec::as_slice)
    }
}
