//! Wizard state: active step, completion flags, autosave status, errors.

use std::collections::BTreeMap;

use adwizard_core::error::{ValidationError, WizardError};
use adwizard_core::step::StepKind;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::gate::CompletionGate;
use crate::domain::notices::NoticeBoard;
use crate::domain::steps::StepSequence;

/// Autosave indicator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AutosaveStatus {
    /// Nothing saved yet.
    #[default]
    Idle,
    /// A save is in flight.
    Saving {
        /// When it started.
        since: DateTime<Utc>,
    },
    /// The last save succeeded.
    Success {
        /// When it finished.
        at: DateTime<Utc>,
    },
    /// The last save failed; stays until the next success.
    Error {
        /// When it failed.
        at: DateTime<Utc>,
        /// Error kind tag.
        kind: &'static str,
    },
}

/// Lifecycle of the wizard as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// On one of the steps.
    #[default]
    Editing,
    /// Submit in flight.
    Publishing,
    /// Terminal: the listing is live.
    Published {
        /// Canonical detail page.
        detail_url: String,
    },
    /// Publish was rejected; recoverable by editing and retrying.
    Failed,
}

/// Everything the UI renders, apart from the draft and media list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardState {
    sequence: StepSequence,
    current: usize,
    gate: CompletionGate,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Autosave indicator.
    pub autosave: AutosaveStatus,
    /// Errors from the last rejected publish, kept until dismissed or fixed.
    pub publish_errors: Vec<ValidationError>,
    /// Local validation errors per step, in document order.
    pub inline_errors: BTreeMap<StepKind, Vec<ValidationError>>,
    /// Banner and field notices.
    pub notices: NoticeBoard,
}

impl WizardState {
    /// Fresh state on step 1 with nothing complete.
    #[must_use]
    pub fn new(sequence: StepSequence) -> Self {
        Self {
            gate: CompletionGate::new(sequence.len()),
            sequence,
            current: 1,
            phase: Phase::Editing,
            autosave: AutosaveStatus::Idle,
            publish_errors: Vec::new(),
            inline_errors: BTreeMap::new(),
            notices: NoticeBoard::default(),
        }
    }

    /// Active step sequence.
    #[must_use]
    pub fn sequence(&self) -> StepSequence {
        self.sequence
    }

    /// 1-based active step.
    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Kind of the active step.
    #[must_use]
    pub fn current_step(&self) -> Option<StepKind> {
        self.sequence.step_at(self.current)
    }

    /// Completion flags.
    #[must_use]
    pub fn gate(&self) -> &CompletionGate {
        &self.gate
    }

    pub(crate) fn gate_mut(&mut self) -> &mut CompletionGate {
        &mut self.gate
    }

    /// Whether "Next" is enabled on 1-based `step`.
    #[must_use]
    pub fn is_next_enabled(&self, step: usize) -> bool {
        self.gate.is_next_enabled(step)
    }

    /// Moves the active step.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::NavigationBlocked` when moving forward past an
    /// incomplete step, or past the end of the sequence.
    pub fn goto(&mut self, target: usize) -> Result<(), WizardError> {
        if target == 0 || target > self.sequence.len() {
            return Err(WizardError::NavigationBlocked {
                target,
                required: self.sequence.len(),
            });
        }
        self.gate
            .check_move(self.current, target)
            .map_err(|required| WizardError::NavigationBlocked { target, required })?;
        self.current = target;
        Ok(())
    }

    /// Swaps in a different sequence (after the category changed module).
    /// Step 1 stays complete; the pointer stays on step 1.
    pub fn resequence(&mut self, sequence: StepSequence) {
        if sequence == self.sequence {
            return;
        }
        self.sequence = sequence;
        self.gate.resize_keeping_first(sequence.len());
        self.current = 1;
        self.inline_errors
            .retain(|step, _| sequence.number_of(*step).is_some());
    }

    /// Errors shown inline for `step`.
    #[must_use]
    pub fn inline_errors_for(&self, step: StepKind) -> &[ValidationError] {
        self.inline_errors.get(&step).map_or(&[], Vec::as_slice)
    }

    /// First inline error of the active step, to scroll into focus.
    #[must_use]
    pub fn focus_target(&self) -> Option<&ValidationError> {
        self.current_step()
            .and_then(|step| self.inline_errors_for(step).first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::steps::resolve_steps;

    #[test]
    fn test_goto_forward_requires_previous_step_complete() {
        // Arrange
        let mut state = WizardState::new(resolve_steps("vehicle"));

        // Act
        let blocked = state.goto(3);
        state.gate_mut().mark_complete(1);
        state.gate_mut().mark_complete(2);
        let allowed = state.goto(3);

        // Assert
        assert_eq!(
            blocked,
            Err(WizardError::NavigationBlocked {
                target: 3,
                required: 2
            })
        );
        assert_eq!(allowed, Ok(()));
        assert_eq!(state.current(), 3);
        assert_eq!(state.current_step(), Some(StepKind::Model));
    }

    #[test]
    fn test_goto_backward_is_always_allowed() {
        let mut state = WizardState::new(resolve_steps("vehicle"));
        state.gate_mut().mark_complete(1);
        state.goto(2).unwrap();
        state.gate_mut().mark_incomplete(1);

        assert_eq!(state.goto(1), Ok(()));
    }

    #[test]
    fn test_goto_outside_sequence_is_refused() {
        let mut state = WizardState::new(resolve_steps("real_estate"));

        assert!(state.goto(0).is_err());
        assert!(state.goto(5).is_err());
    }

    #[test]
    fn test_resequence_keeps_step_one_and_drops_foreign_errors() {
        let mut state = WizardState::new(resolve_steps("vehicle"));
        state.gate_mut().mark_complete(1);
        state
            .inline_errors
            .insert(StepKind::Brand, vec![ValidationError::new("make_id", "REQUIRED", "x")]);

        state.resequence(resolve_steps("real_estate"));

        assert_eq!(state.sequence().len(), 4);
        assert!(state.gate().is_complete(1));
        assert!(state.inline_errors_for(StepKind::Brand).is_empty());
    }
}
