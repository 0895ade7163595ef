use anvil_types::{DofReport, SolveOutcome};

/// Classify a finished solve.
///
/// Non-convergence and negative DOF both read as over-constrained;
/// neither blocks the rebuild — the caller reports the status and
/// continues with whatever geometry the solve produced.
pub fn classify(
    converged: bool,
    _max_error: f64,
    dof: &DofReport,
    warnings: &[String],
) -> SolveOutcome {
    if !converged || dof.remaining < 0 {
        SolveOutcome::OverConstrained
    } else if dof.remaining > 0 {
        SolveOutcome::UnderConstrained
    } else if warnings.is_empty() {
        SolveOutcome::Solved
    } else {
        SolveOutcome::SolvedWithWarnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dof(remaining: i32) -> DofReport {
        DofReport {
            total: 8,
            constrained: 8 - remaining,
            remaining,
            is_fully_constrained: remaining == 0,
            is_over_constrained: remaining < 0,
        }
    }

    #[test]
    fn classification_table() {
        assert_eq!(classify(true, 0.0, &dof(0), &[]), SolveOutcome::Solved);
        assert_eq!(
            classify(true, 0.0, &dof(2), &[]),
            SolveOutcome::UnderConstrained
        );
        assert_eq!(
            classify(true, 0.0, &dof(-1), &[]),
            SolveOutcome::OverConstrained
        );
        assert_eq!(
            classify(false, 0.5, &dof(0), &[]),
            SolveOutcome::OverConstrained
        );
        assert_eq!(
            classify(true, 0.0, &dof(0), &["loose".into()]),
            SolveOutcome::SolvedWithWarnings
        );
    }
}
