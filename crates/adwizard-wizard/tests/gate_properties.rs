use adwizard_wizard::domain::gate::CompletionGate;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Complete(usize),
    Invalidate(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1usize..=7).prop_map(Op::Complete),
        (1usize..=7).prop_map(Op::Invalidate),
    ]
}

proptest! {
    #[test]
    fn next_enabled_tracks_completion_after_every_history(ops in proptest::collection::vec(op(), 0..48)) {
        let mut gate = CompletionGate::new(7);
        let mut model = [false; 7];

        for op in ops {
            match op {
                Op::Complete(step) => {
                    gate.mark_complete(step);
                    model[step - 1] = true;
                    for flag in &mut model[step..] {
                        *flag = false;
                    }
                }
                Op::Invalidate(step) => {
                    gate.mark_incomplete(step);
                    for flag in &mut model[step - 1..] {
                        *flag = false;
                    }
                }
            }

            for k in 1..=7 {
                prop_assert_eq!(gate.is_next_enabled(k), model[k - 1]);
                prop_assert_eq!(gate.is_next_enabled(k), gate.is_complete(k));
            }
        }
    }

    #[test]
    fn completing_steps_in_reachable_order_keeps_a_completed_prefix(picks in proptest::collection::vec(1usize..=7, 0..48)) {
        let mut gate = CompletionGate::new(7);

        for step in picks {
            // Only steps the user can stand on may be completed.
            if gate.check_move(1, step).is_ok() {
                gate.mark_complete(step);
            }

            let flags: Vec<bool> = (1..=7).map(|k| gate.is_complete(k)).collect();
            let first_gap = flags.iter().position(|f| !f).unwrap_or(7);
            prop_assert!(flags[first_gap..].iter().all(|f| !f));
        }
    }
}
