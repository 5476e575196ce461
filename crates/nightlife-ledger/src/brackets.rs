//! Commission bracket schedules
//!
//! A schedule is an ordered list of `[from, to)` tiers. It is applied in one of
//! two ways:
//! - Tiered: every bracket takes its percentage of the slice of revenue that
//!   falls inside it (like income tax bands).
//! - Single bracket: the bracket containing the revenue figure applies its
//!   percentage to the whole figure.
//!
//! Calculation never re-sorts or repairs a schedule. Gapped or overlapping
//! schedules give a best-effort result; `validate_brackets` is what rejects
//! them when an event is saved.

use crate::model::CommissionBracket;
use crate::money::percent_of;

/// How a bracket schedule is applied to a revenue figure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketMode {
    Tiered,
    SingleBracket,
}

impl BracketMode {
    /// Map the persisted `isPaidFromEachBracket` flag
    pub fn from_paid_from_each_bracket(paid_from_each: bool) -> Self {
        if paid_from_each {
            BracketMode::Tiered
        } else {
            BracketMode::SingleBracket
        }
    }
}

/// Outcome of applying a schedule to one revenue figure
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BracketShare {
    Earned(f64),
    /// No bracket covers the revenue (e.g. schedule does not start at 0).
    /// Counts as 0 but is reported as a configuration problem.
    Unmatched,
}

impl BracketShare {
    pub fn amount(&self) -> f64 {
        match self {
            BracketShare::Earned(amount) => *amount,
            BracketShare::Unmatched => 0.0,
        }
    }
}

/// First bracket in list order whose interval contains `revenue`
pub fn matching_bracket(brackets: &[CommissionBracket], revenue: f64) -> Option<&CommissionBracket> {
    brackets.iter().find(|b| b.contains(revenue))
}

/// Apply a bracket schedule to `revenue`
pub fn bracket_share(brackets: &[CommissionBracket], revenue: f64, mode: BracketMode) -> BracketShare {
    // NaN and negative revenue both collapse to 0
    let revenue = revenue.max(0.0);
    if revenue == 0.0 {
        return BracketShare::Earned(0.0);
    }

    match mode {
        BracketMode::Tiered => {
            let mut earned = 0.0;
            let mut matched = false;

            for bracket in brackets {
                let upper = bracket.to_amount.unwrap_or(f64::INFINITY);
                let slice = (revenue.min(upper) - bracket.from_amount).max(0.0);
                if slice > 0.0 {
                    matched = true;
                    earned += percent_of(slice, bracket.percentage.max(0.0));
                }
            }

            if matched {
                BracketShare::Earned(earned)
            } else {
                BracketShare::Unmatched
            }
        }
        BracketMode::SingleBracket => match matching_bracket(brackets, revenue) {
            Some(bracket) => BracketShare::Earned(percent_of(revenue, bracket.percentage.max(0.0))),
            None => BracketShare::Unmatched,
        },
    }
}

/// Problems with a bracket schedule, caught when an event is created or edited
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BracketError {
    #[error("schedule has no brackets")]
    Empty,

    #[error("first bracket must start at 0 (starts at {0})")]
    DoesNotStartAtZero(f64),

    #[error("bracket {index}: percentage must be in (0, 100] (got {percentage})")]
    InvalidPercentage { index: usize, percentage: f64 },

    #[error("bracket {index}: upper bound {to} must be above lower bound {from}")]
    EmptyRange { index: usize, from: f64, to: f64 },

    #[error("bracket {index}: starts at {from} but the previous bracket ends at {previous_to}")]
    NotContiguous { index: usize, previous_to: f64, from: f64 },

    #[error("bracket {index} has no upper bound but is not the last bracket")]
    UnboundedNotLast { index: usize },

    #[error("last bracket must have no upper bound (ends at {0})")]
    LastBracketBounded(f64),
}

/// Check that a schedule covers `[0, ∞)` with contiguous, ascending brackets
pub fn validate_brackets(brackets: &[CommissionBracket]) -> Result<(), BracketError> {
    let Some(first) = brackets.first() else {
        return Err(BracketError::Empty);
    };
    if first.from_amount != 0.0 {
        return Err(BracketError::DoesNotStartAtZero(first.from_amount));
    }

    let last_index = brackets.len() - 1;
    let mut previous_to: Option<f64> = None;

    for (index, bracket) in brackets.iter().enumerate() {
        if bracket.percentage.is_nan() || bracket.percentage <= 0.0 || bracket.percentage > 100.0 {
            return Err(BracketError::InvalidPercentage {
                index,
                percentage: bracket.percentage,
            });
        }

        if let Some(previous_to) = previous_to {
            if bracket.from_amount != previous_to {
                return Err(BracketError::NotContiguous {
                    index,
                    previous_to,
                    from: bracket.from_amount,
                });
            }
        }

        match bracket.to_amount {
            Some(to) if to <= bracket.from_amount => {
                return Err(BracketError::EmptyRange {
                    index,
                    from: bracket.from_amount,
                    to,
                });
            }
            Some(to) if index == last_index => return Err(BracketError::LastBracketBounded(to)),
            Some(to) => previous_to = Some(to),
            None if index != last_index => return Err(BracketError::UnboundedNotLast { index }),
            None => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tier() -> Vec<CommissionBracket> {
        vec![
            CommissionBracket::new(15.0, 0.0, Some(40_000.0)),
            CommissionBracket::new(20.0, 40_000.0, None),
        ]
    }

    fn three_tier() -> Vec<CommissionBracket> {
        vec![
            CommissionBracket::new(10.0, 0.0, Some(10_000.0)),
            CommissionBracket::new(15.0, 10_000.0, Some(30_000.0)),
            CommissionBracket::new(25.0, 30_000.0, None),
        ]
    }

    #[test]
    fn test_tiered_splits_revenue_across_brackets() {
        // 0.15 * 40000 + 0.20 * 10000
        let share = bracket_share(&two_tier(), 50_000.0, BracketMode::Tiered);
        assert_eq!(share, BracketShare::Earned(8000.0));
    }

    #[test]
    fn test_single_bracket_applies_to_full_revenue() {
        let share = bracket_share(&two_tier(), 50_000.0, BracketMode::SingleBracket);
        assert_eq!(share, BracketShare::Earned(10_000.0));
    }

    #[test]
    fn test_tiered_on_boundary_takes_nothing_from_upper_bracket() {
        let share = bracket_share(&two_tier(), 40_000.0, BracketMode::Tiered);
        assert_eq!(share, BracketShare::Earned(6000.0));
    }

    #[test]
    fn test_single_bracket_boundary_belongs_to_upper_bracket() {
        let share = bracket_share(&two_tier(), 40_000.0, BracketMode::SingleBracket);
        assert_eq!(share, BracketShare::Earned(8000.0));

        let below = bracket_share(&two_tier(), 39_999.0, BracketMode::SingleBracket);
        assert_eq!(below, BracketShare::Earned(39_999.0 * 15.0 / 100.0));
    }

    #[test]
    fn test_three_tiers() {
        // 1000 + 3000 + 0.25 * 20000
        let tiered = bracket_share(&three_tier(), 50_000.0, BracketMode::Tiered);
        assert_eq!(tiered, BracketShare::Earned(9000.0));

        // Middle bracket matches 20000
        let single = bracket_share(&three_tier(), 20_000.0, BracketMode::SingleBracket);
        assert_eq!(single, BracketShare::Earned(3000.0));
    }

    #[test]
    fn test_modes_agree_with_one_unbounded_bracket() {
        let flat = vec![CommissionBracket::new(12.5, 0.0, None)];
        for revenue in [0.0, 1.0, 799.99, 40_000.0, 1_250_000.0] {
            let tiered = bracket_share(&flat, revenue, BracketMode::Tiered);
            let single = bracket_share(&flat, revenue, BracketMode::SingleBracket);
            assert_eq!(tiered, single, "revenue {}", revenue);
            assert_eq!(tiered.amount(), revenue * 12.5 / 100.0);
        }
    }

    #[test]
    fn test_zero_revenue_earns_nothing() {
        assert_eq!(bracket_share(&two_tier(), 0.0, BracketMode::Tiered), BracketShare::Earned(0.0));
        assert_eq!(
            bracket_share(&two_tier(), 0.0, BracketMode::SingleBracket),
            BracketShare::Earned(0.0)
        );
        // Even with a schedule that would not match
        let gapped = vec![CommissionBracket::new(10.0, 500.0, None)];
        assert_eq!(bracket_share(&gapped, 0.0, BracketMode::SingleBracket), BracketShare::Earned(0.0));
    }

    #[test]
    fn test_revenue_below_first_bracket_is_unmatched() {
        let gapped = vec![CommissionBracket::new(10.0, 500.0, None)];
        assert_eq!(bracket_share(&gapped, 200.0, BracketMode::Tiered), BracketShare::Unmatched);
        assert_eq!(
            bracket_share(&gapped, 200.0, BracketMode::SingleBracket),
            BracketShare::Unmatched
        );
        assert_eq!(BracketShare::Unmatched.amount(), 0.0);
    }

    #[test]
    fn test_empty_schedule_is_unmatched() {
        assert_eq!(bracket_share(&[], 1000.0, BracketMode::Tiered), BracketShare::Unmatched);
        assert_eq!(bracket_share(&[], 1000.0, BracketMode::SingleBracket), BracketShare::Unmatched);
    }

    #[test]
    fn test_overlapping_schedule_uses_first_match_in_list_order() {
        let overlapping = vec![
            CommissionBracket::new(30.0, 0.0, None),
            CommissionBracket::new(10.0, 0.0, Some(5000.0)),
        ];
        let share = bracket_share(&overlapping, 1000.0, BracketMode::SingleBracket);
        assert_eq!(share, BracketShare::Earned(300.0));
    }

    #[test]
    fn test_tiered_sum_ignores_list_order() {
        let mut reversed = two_tier();
        reversed.reverse();
        assert_eq!(bracket_share(&reversed, 50_000.0, BracketMode::Tiered), BracketShare::Earned(8000.0));

        // 0.10 * 10000 + 0.15 * 20000 + 0.25 * 20000
        let mut reversed = three_tier();
        reversed.reverse();
        assert_eq!(
            bracket_share(&reversed, 50_000.0, BracketMode::Tiered),
            bracket_share(&three_tier(), 50_000.0, BracketMode::Tiered)
        );
        assert_eq!(bracket_share(&reversed, 50_000.0, BracketMode::Tiered), BracketShare::Earned(9000.0));
    }

    #[test]
    fn test_tiered_counts_overlapping_revenue_twice() {
        // 0..100 pays 10 and 50..100 pays another 5
        let overlapping = vec![
            CommissionBracket::new(10.0, 0.0, Some(100.0)),
            CommissionBracket::new(10.0, 50.0, Some(150.0)),
        ];
        assert_eq!(bracket_share(&overlapping, 100.0, BracketMode::Tiered), BracketShare::Earned(15.0));

        // Single-bracket mode takes the first match only
        let overlapping = vec![
            CommissionBracket::new(30.0, 0.0, None),
            CommissionBracket::new(10.0, 0.0, Some(5000.0)),
        ];
        assert_eq!(bracket_share(&overlapping, 1000.0, BracketMode::Tiered), BracketShare::Earned(400.0));
        assert_eq!(bracket_share(&overlapping, 1000.0, BracketMode::SingleBracket), BracketShare::Earned(300.0));
    }

    #[test]
    fn test_gap_in_schedule_single_bracket() {
        let gapped = vec![
            CommissionBracket::new(10.0, 0.0, Some(1000.0)),
            CommissionBracket::new(20.0, 2000.0, None),
        ];
        assert_eq!(bracket_share(&gapped, 1500.0, BracketMode::SingleBracket), BracketShare::Unmatched);
        // Tiered still collects the lower slice
        assert_eq!(bracket_share(&gapped, 1500.0, BracketMode::Tiered), BracketShare::Earned(100.0));
    }

    #[test]
    fn test_negative_revenue_treated_as_zero() {
        assert_eq!(bracket_share(&two_tier(), -500.0, BracketMode::Tiered), BracketShare::Earned(0.0));
        assert_eq!(bracket_share(&two_tier(), f64::NAN, BracketMode::SingleBracket), BracketShare::Earned(0.0));
    }

    #[test]
    fn test_validate_accepts_contiguous_schedule() {
        assert_eq!(validate_brackets(&two_tier()), Ok(()));
        assert_eq!(validate_brackets(&three_tier()), Ok(()));
        assert_eq!(validate_brackets(&[CommissionBracket::new(100.0, 0.0, None)]), Ok(()));
    }

    #[test]
    fn test_validate_rejects_malformed_schedules() {
        assert_eq!(validate_brackets(&[]), Err(BracketError::Empty));

        let late_start = vec![CommissionBracket::new(10.0, 100.0, None)];
        assert_eq!(validate_brackets(&late_start), Err(BracketError::DoesNotStartAtZero(100.0)));

        let gap = vec![
            CommissionBracket::new(10.0, 0.0, Some(1000.0)),
            CommissionBracket::new(20.0, 2000.0, None),
        ];
        assert_eq!(
            validate_brackets(&gap),
            Err(BracketError::NotContiguous {
                index: 1,
                previous_to: 1000.0,
                from: 2000.0
            })
        );

        let overlap = vec![
            CommissionBracket::new(10.0, 0.0, Some(1000.0)),
            CommissionBracket::new(20.0, 500.0, None),
        ];
        assert!(matches!(validate_brackets(&overlap), Err(BracketError::NotContiguous { .. })));

        let unbounded_first = vec![
            CommissionBracket::new(10.0, 0.0, None),
            CommissionBracket::new(20.0, 1000.0, None),
        ];
        assert_eq!(
            validate_brackets(&unbounded_first),
            Err(BracketError::UnboundedNotLast { index: 0 })
        );

        let bounded_last = vec![CommissionBracket::new(10.0, 0.0, Some(1000.0))];
        assert_eq!(validate_brackets(&bounded_last), Err(BracketError::LastBracketBounded(1000.0)));

        let inverted = vec![
            CommissionBracket::new(10.0, 0.0, Some(0.0)),
            CommissionBracket::new(20.0, 0.0, None),
        ];
        assert!(matches!(validate_brackets(&inverted), Err(BracketError::EmptyRange { index: 0, .. })));

        let zero_pct = vec![CommissionBracket::new(0.0, 0.0, None)];
        assert!(matches!(
            validate_brackets(&zero_pct),
            Err(BracketError::InvalidPercentage { index: 0, .. })
        ));
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(BracketMode::from_paid_from_each_bracket(true), BracketMode::Tiered);
        assert_eq!(BracketMode::from_paid_from_each_bracket(false), BracketMode::SingleBracket);
    }
}
