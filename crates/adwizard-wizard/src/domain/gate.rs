//! Per-step completion flags and the forward-navigation rule.

use serde::Serialize;

/// Completion flags for steps `1..=N`.
///
/// Marking step `k` complete resets every later step, since later answers
/// may depend on it (a model depends on its brand).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionGate {
    completed: Vec<bool>,
}

impl CompletionGate {
    /// A gate for `steps` steps, all incomplete.
    #[must_use]
    pub fn new(steps: usize) -> Self {
        Self {
            completed: vec![false; steps],
        }
    }

    /// Number of steps tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.completed.len()
    }

    /// True when no steps are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Whether 1-based `step` is complete. Out-of-range steps are not.
    #[must_use]
    pub fn is_complete(&self, step: usize) -> bool {
        step.checked_sub(1)
            .and_then(|idx| self.completed.get(idx))
            .copied()
            .unwrap_or(false)
    }

    /// "Next" is enabled on `step` exactly when `step` is complete.
    #[must_use]
    pub fn is_next_enabled(&self, step: usize) -> bool {
        self.is_complete(step)
    }

    /// Marks `step` complete and resets every later step. Returns the steps
    /// whose flag was actually cleared.
    pub fn mark_complete(&mut self, step: usize) -> Vec<usize> {
        let Some(idx) = step.checked_sub(1).filter(|idx| *idx < self.completed.len()) else {
            return Vec::new();
        };
        self.completed[idx] = true;
        self.reset_from(idx + 1)
    }

    /// Sets `step` complete and leaves later steps alone. Used when a save
    /// re-commits exactly what was already committed.
    pub fn mark_complete_without_cascade(&mut self, step: usize) {
        if let Some(flag) = step.checked_sub(1).and_then(|idx| self.completed.get_mut(idx)) {
            *flag = true;
        }
    }

    /// Marks `step` and every later step incomplete. Returns the steps whose
    /// flag was actually cleared.
    pub fn mark_incomplete(&mut self, step: usize) -> Vec<usize> {
        match step.checked_sub(1) {
            Some(idx) => self.reset_from(idx),
            None => Vec::new(),
        }
    }

    /// Whether a move from `current` to `target` is allowed. Backward moves
    /// always are; forward moves need `target - 1` complete. On refusal the
    /// step that must be completed first is returned.
    ///
    /// # Errors
    ///
    /// Returns the 1-based step that blocks the move.
    pub fn check_move(&self, current: usize, target: usize) -> Result<(), usize> {
        if target <= current || target == 1 {
            return Ok(());
        }
        let required = target - 1;
        if self.is_complete(required) {
            Ok(())
        } else {
            Err(required)
        }
    }

    /// First incomplete step among `1..until`, if any.
    #[must_use]
    pub fn first_incomplete_before(&self, until: usize) -> Option<usize> {
        (1..until).find(|step| !self.is_complete(*step))
    }

    /// Resizes to `steps`. Step 1 keeps its flag; every other step restarts
    /// incomplete.
    pub fn resize_keeping_first(&mut self, steps: usize) {
        let first = self.is_complete(1);
        self.completed = vec![false; steps];
        if first && steps > 0 {
            self.completed[0] = true;
        }
    }

    fn reset_from(&mut self, idx: usize) -> Vec<usize> {
        let mut cleared = Vec::new();
        for (i, flag) in self.completed.iter_mut().enumerate().skip(idx) {
            if std::mem::replace(flag, false) {
                cleared.push(i + 1);
            }
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate_with(steps: usize, complete_through: usize) -> CompletionGate {
        let mut gate = CompletionGate::new(steps);
        for step in 1..=complete_through {
            gate.mark_complete(step);
        }
        gate
    }

    #[test]
    fn test_mark_complete_resets_later_steps() {
        // Arrange
        let mut gate = gate_with(7, 4);

        // Act
        let cleared = gate.mark_complete(2);

        // Assert
        assert_eq!(cleared, vec![3, 4]);
        assert!(gate.is_complete(2));
        assert!(!gate.is_next_enabled(3));
        assert!(!gate.is_complete(4));
    }

    #[test]
    fn test_check_move_allows_backward_and_gates_forward() {
        let gate = gate_with(7, 2);

        assert_eq!(gate.check_move(3, 1), Ok(()));
        assert_eq!(gate.check_move(2, 3), Ok(()));
        assert_eq!(gate.check_move(3, 4), Err(3));
        assert_eq!(gate.check_move(1, 5), Err(4));
    }

    #[test]
    fn test_mark_incomplete_clears_step_and_later() {
        let mut gate = gate_with(4, 4);

        let cleared = gate.mark_incomplete(3);

        assert_eq!(cleared, vec![3, 4]);
        assert!(gate.is_complete(2));
    }

    #[test]
    fn test_out_of_range_steps_are_never_complete() {
        let mut gate = gate_with(4, 4);

        assert!(gate.mark_complete(9).is_empty());
        assert!(!gate.is_complete(0));
        assert!(!gate.is_complete(5));
    }

    #[test]
    fn test_resize_keeps_only_first_step() {
        let mut gate = gate_with(7, 3);

        gate.resize_keeping_first(4);

        assert_eq!(gate.len(), 4);
        assert!(gate.is_complete(1));
        assert_eq!(gate.first_incomplete_before(4), Some(2));
    }
}
