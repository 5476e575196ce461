//! Commission, revenue-share and profit calculations for one entry
//!
//! Everything here is a pure function of `(event, entry)`. Nothing panics or
//! returns an error: missing figures count as 0 and are reported through
//! `CalculationWarning` so callers can flag bad data instead of hiding it.

use serde::Serialize;
use std::fmt;

use crate::brackets::{BracketMode, BracketShare, bracket_share};
use crate::model::{DealType, Event, EventData};
use crate::money::percent_of;

// =============================================================================
// Aggregation
// =============================================================================

/// Promoter + staff + VIP commissions + flat table commissions
pub fn calculate_total_commissions(entry: &EventData) -> f64 {
    let promoter_commissions: f64 = entry.promoters.iter().map(|p| p.commission).sum();
    let staff_payments: f64 = entry.staff.iter().map(|s| s.payment).sum();
    let vip_commissions: f64 = entry.vip_girls_commissions.iter().map(|g| g.commission).sum();

    promoter_commissions + staff_payments + vip_commissions + entry.table_commissions
}

/// Total ad spend (reach/clicks/leads are not money)
pub fn calculate_total_ad_spend(entry: &EventData) -> f64 {
    entry.ad_spend.iter().map(|ad| ad.amount).sum()
}

/// Commissions plus ad spend
pub fn calculate_total_expenses(entry: &EventData) -> f64 {
    calculate_total_commissions(entry) + calculate_total_ad_spend(entry)
}

// =============================================================================
// Revenue share
// =============================================================================

/// Data-quality problem found while computing an entry's revenue
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CalculationWarning {
    /// The bracket schedule has no bracket covering this revenue figure
    NoMatchingBracket { revenue: f64 },
    /// Entrance-only deal entry without door revenue
    MissingDoorRevenue,
    /// Blended deal entry without entrance revenue
    MissingEntranceRevenue,
    /// Blended deal with no entrance percentage on the event or the entry
    MissingEntrancePercentage,
}

impl fmt::Display for CalculationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculationWarning::NoMatchingBracket { revenue } => {
                write!(f, "no commission bracket covers revenue {:.2}; counted as 0", revenue)
            }
            CalculationWarning::MissingDoorRevenue => write!(f, "door revenue missing; counted as 0"),
            CalculationWarning::MissingEntranceRevenue => {
                write!(f, "entrance revenue missing; entrance share counted as 0")
            }
            CalculationWarning::MissingEntrancePercentage => {
                write!(f, "entrance percentage missing; entrance share counted as 0")
            }
        }
    }
}

/// The operator's earnings for one entry, split by source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueBreakdown {
    /// Share of total revenue (or of door revenue for entrance-only deals)
    pub share: f64,
    /// Share of entrance revenue (blended deal only)
    pub entrance: f64,
    pub total: f64,
    pub warnings: Vec<CalculationWarning>,
}

/// Share of `revenue` under the event's bracket schedule, or the flat
/// `rumba_percentage` for events without one
fn revenue_share(event: &Event, revenue: f64, warnings: &mut Vec<CalculationWarning>) -> f64 {
    if !event.has_bracket_schedule() {
        return percent_of(revenue, event.rumba_percentage);
    }

    let mode = BracketMode::from_paid_from_each_bracket(event.is_paid_from_each_bracket);
    match bracket_share(&event.commission_brackets, revenue, mode) {
        BracketShare::Earned(amount) => amount,
        BracketShare::Unmatched => {
            warnings.push(CalculationWarning::NoMatchingBracket { revenue });
            0.0
        }
    }
}

/// Entrance percentage for a blended-deal entry. The entry override wins over
/// the event default.
pub fn effective_entrance_percentage(event: &Event, entry: &EventData) -> Option<f64> {
    entry.entrance_percentage.or(event.entrance_percentage)
}

/// Earned revenue for one entry with its breakdown and warnings
pub fn revenue_breakdown(event: &Event, entry: &EventData) -> RevenueBreakdown {
    let mut warnings = Vec::new();

    let (share, entrance) = match event.deal_type {
        DealType::RevenueShare => (revenue_share(event, entry.total_revenue, &mut warnings), 0.0),

        DealType::EntranceOnly => match entry.door_revenue {
            Some(door) => (percent_of(door, event.rumba_percentage), 0.0),
            None => {
                warnings.push(CalculationWarning::MissingDoorRevenue);
                (0.0, 0.0)
            }
        },

        DealType::RevenueShareAndEntrance => {
            let share = revenue_share(event, entry.total_revenue, &mut warnings);
            let entrance = match (entry.entrance_revenue, effective_entrance_percentage(event, entry)) {
                (Some(revenue), Some(pct)) => percent_of(revenue, pct),
                (None, _) => {
                    warnings.push(CalculationWarning::MissingEntranceRevenue);
                    0.0
                }
                (Some(_), None) => {
                    warnings.push(CalculationWarning::MissingEntrancePercentage);
                    0.0
                }
            };
            (share, entrance)
        }
    };

    RevenueBreakdown {
        share,
        entrance,
        total: share + entrance,
        warnings,
    }
}

/// The operator's earned revenue for one entry
pub fn calculate_rumba_revenue(event: &Event, entry: &EventData) -> f64 {
    revenue_breakdown(event, entry).total
}

// =============================================================================
// Profit
// =============================================================================

/// Earned revenue minus expenses; negative means a loss
pub fn calculate_profit(event: &Event, entry: &EventData) -> f64 {
    calculate_rumba_revenue(event, entry) - calculate_total_expenses(entry)
}

/// Every per-entry figure, computed once for reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryFigures {
    pub rumba_revenue: f64,
    pub commissions: f64,
    pub ad_spend: f64,
    pub expenses: f64,
    pub profit: f64,
    pub warnings: Vec<CalculationWarning>,
}

impl EntryFigures {
    pub fn compute(event: &Event, entry: &EventData) -> Self {
        let breakdown = revenue_breakdown(event, entry);
        let commissions = calculate_total_commissions(entry);
        let ad_spend = calculate_total_ad_spend(entry);
        let expenses = commissions + ad_spend;

        Self {
            rumba_revenue: breakdown.total,
            commissions,
            ad_spend,
            expenses,
            profit: breakdown.total - expenses,
            warnings: breakdown.warnings,
        }
    }
}
