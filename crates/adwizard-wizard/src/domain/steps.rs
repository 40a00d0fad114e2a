//! Step sequences per content module.

use adwizard_core::draft::ModuleKind;
use adwizard_core::step::StepKind;
use serde::Serialize;

/// Vehicle categories walk the make/model/year taxonomy.
pub const VEHICLE_STEPS: [StepKind; 7] = [
    StepKind::Category,
    StepKind::Brand,
    StepKind::Model,
    StepKind::YearTrim,
    StepKind::CoreFields,
    StepKind::FeaturesMedia,
    StepKind::Review,
];

/// Every other category skips the taxonomy.
pub const GENERIC_STEPS: [StepKind; 4] = [
    StepKind::Category,
    StepKind::CoreFields,
    StepKind::FeaturesMedia,
    StepKind::Review,
];

/// Ordered steps of one wizard run. Step numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepSequence {
    module: ModuleKind,
    steps: &'static [StepKind],
}

/// Returns the step sequence for a module key.
#[must_use]
pub fn resolve_steps(module_key: &str) -> StepSequence {
    StepSequence::for_module(ModuleKind::from_key(module_key))
}

impl StepSequence {
    /// Sequence for a module family.
    #[must_use]
    pub fn for_module(module: ModuleKind) -> Self {
        let steps: &'static [StepKind] = match module {
            ModuleKind::Vehicle => &VEHICLE_STEPS,
            ModuleKind::Generic => &GENERIC_STEPS,
        };
        Self { module, steps }
    }

    /// Module family the sequence was resolved for.
    #[must_use]
    pub fn module(&self) -> ModuleKind {
        self.module
    }

    /// Steps in order.
    #[must_use]
    pub fn steps(&self) -> &'static [StepKind] {
        self.steps
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; every sequence ends in review.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step at 1-based `number`.
    #[must_use]
    pub fn step_at(&self, number: usize) -> Option<StepKind> {
        number.checked_sub(1).and_then(|idx| self.steps.get(idx)).copied()
    }

    /// 1-based number of `step`, if the sequence contains it.
    #[must_use]
    pub fn number_of(&self, step: StepKind) -> Option<usize> {
        self.steps.iter().position(|s| *s == step).map(|idx| idx + 1)
    }

    /// Number of the final review step.
    #[must_use]
    pub fn review(&self) -> usize {
        self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_vehicle_returns_seven_steps_ending_in_review() {
        let sequence = resolve_steps("vehicle");

        assert_eq!(sequence.len(), 7);
        assert_eq!(sequence.step_at(7), Some(StepKind::Review));
        assert_eq!(sequence.number_of(StepKind::Brand), Some(2));
    }

    #[test]
    fn test_resolve_any_other_module_returns_four_steps_ending_in_review() {
        for key in ["real_estate", "services", "", "vehicles"] {
            let sequence = resolve_steps(key);

            assert_eq!(sequence.len(), 4, "module {key:?}");
            assert_eq!(sequence.step_at(4), Some(StepKind::Review));
            assert_eq!(sequence.number_of(StepKind::Brand), None);
        }
    }

    #[test]
    fn test_step_at_is_one_based() {
        let sequence = resolve_steps("real_estate");

        assert_eq!(sequence.step_at(0), None);
        assert_eq!(sequence.step_at(1), Some(StepKind::Category));
        assert_eq!(sequence.step_at(5), None);
    }
}
