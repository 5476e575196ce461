//! Rollups across the entries of one event and across many events

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::calculations::{
    EntryFigures, calculate_profit, calculate_rumba_revenue, calculate_total_ad_spend,
    calculate_total_commissions, calculate_total_expenses,
};
use crate::model::Event;
use crate::money::safe_div;

// =============================================================================
// Per-event
// =============================================================================

/// Totals over every entry of one event
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub entry_count: usize,
    pub total_revenue: f64,
    pub total_attendees: u64,
    pub total_tables: u64,
    pub total_rumba_revenue: f64,
    pub total_commissions: f64,
    pub total_ad_spend: f64,
    pub total_expenses: f64,
    pub total_profit: f64,
}

/// Sum the per-entry figures of an event
///
/// Returns `None` when nothing has been recorded yet, so "no data" is not
/// confused with a night that genuinely made nothing.
pub fn summarize_event(event: &Event) -> Option<EventSummary> {
    if event.event_data.is_empty() {
        return None;
    }

    let mut summary = EventSummary::default();
    for entry in &event.event_data {
        summary.entry_count += 1;
        summary.total_revenue += entry.total_revenue;
        summary.total_attendees += u64::from(entry.total_attendees);
        summary.total_tables += u64::from(entry.tables_from_rumba);
        summary.total_rumba_revenue += calculate_rumba_revenue(event, entry);
        summary.total_commissions += calculate_total_commissions(entry);
        summary.total_ad_spend += calculate_total_ad_spend(entry);
        summary.total_expenses += calculate_total_expenses(entry);
        summary.total_profit += calculate_profit(event, entry);
    }

    Some(summary)
}

/// Gross revenue recorded across an event's entries
pub fn event_total_revenue(event: &Event) -> f64 {
    event.event_data.iter().map(|d| d.total_revenue).sum()
}

/// Profit across an event's entries
pub fn event_total_profit(event: &Event) -> f64 {
    event.event_data.iter().map(|d| calculate_profit(event, d)).sum()
}

// =============================================================================
// Dashboard
// =============================================================================

/// Profit as a percentage of expenses; 0 when nothing was spent
pub fn roi(total_profit: f64, total_expenses: f64) -> f64 {
    safe_div(total_profit, total_expenses) * 100.0
}

/// Average of a total over `count` events; 0 when there are none
pub fn average_per_event(total: f64, count: usize) -> f64 {
    safe_div(total, count as f64)
}

/// Totals across many events for the dashboard and report pages
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub event_count: usize,
    /// Events with at least one entry
    pub events_with_data: usize,
    pub total_revenue: f64,
    pub total_attendees: u64,
    pub total_tables: u64,
    pub total_rumba_revenue: f64,
    pub total_commissions: f64,
    pub total_ad_spend: f64,
    pub total_expenses: f64,
    pub total_profit: f64,
    pub roi: f64,
    pub average_spend: f64,
    pub average_profit: f64,
}

/// Fold `summarize_event` over `events`. Averages divide by every event,
/// including ones with nothing recorded yet.
pub fn summarize_dashboard(events: &[Event]) -> DashboardSummary {
    let mut dashboard = DashboardSummary {
        event_count: events.len(),
        ..Default::default()
    };

    for summary in events.iter().filter_map(summarize_event) {
        dashboard.events_with_data += 1;
        dashboard.total_revenue += summary.total_revenue;
        dashboard.total_attendees += summary.total_attendees;
        dashboard.total_tables += summary.total_tables;
        dashboard.total_rumba_revenue += summary.total_rumba_revenue;
        dashboard.total_commissions += summary.total_commissions;
        dashboard.total_ad_spend += summary.total_ad_spend;
        dashboard.total_expenses += summary.total_expenses;
        dashboard.total_profit += summary.total_profit;
    }

    dashboard.roi = roi(dashboard.total_profit, dashboard.total_expenses);
    dashboard.average_spend = average_per_event(dashboard.total_expenses, dashboard.event_count);
    dashboard.average_profit = average_per_event(dashboard.total_profit, dashboard.event_count);
    dashboard
}

// =============================================================================
// Monthly rollup
// =============================================================================

/// Entry figures grouped by calendar month of the entry date
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    /// YYYY-MM
    pub month: String,
    pub entries: usize,
    pub total_revenue: f64,
    pub total_rumba_revenue: f64,
    pub total_expenses: f64,
    pub total_profit: f64,
}

/// Month-by-month totals, oldest first, optionally limited to one year
pub fn summarize_by_month(events: &[Event], year: Option<i32>) -> Vec<MonthlySummary> {
    let mut months: BTreeMap<String, MonthlySummary> = BTreeMap::new();

    for event in events {
        for entry in &event.event_data {
            let month = entry.date.format("%Y-%m").to_string();
            if let Some(year) = year {
                if !month.starts_with(&format!("{}-", year)) {
                    continue;
                }
            }

            let figures = EntryFigures::compute(event, entry);
            let row = months.entry(month.clone()).or_insert_with(|| MonthlySummary {
                month,
                ..Default::default()
            });
            row.entries += 1;
            row.total_revenue += entry.total_revenue;
            row.total_rumba_revenue += figures.rumba_revenue;
            row.total_expenses += figures.expenses;
            row.total_profit += figures.profit;
        }
    }

    months.into_values().collect()
}

// =============================================================================
// Report page helpers
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    Date,
    Revenue,
    Profit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Events whose name, venue or location contains `search` (case-insensitive)
pub fn filter_events<'a>(events: &'a [Event], search: &str) -> Vec<&'a Event> {
    let needle = search.trim().to_lowercase();
    events
        .iter()
        .filter(|e| {
            needle.is_empty()
                || e.name.to_lowercase().contains(&needle)
                || e.venue_name.to_lowercase().contains(&needle)
                || e.location.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Stable sort by start date, gross revenue or profit
pub fn sort_events(events: &mut [&Event], key: SortKey, order: SortOrder) {
    events.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Date => a.date.cmp(&b.date),
            SortKey::Revenue => event_total_revenue(a).total_cmp(&event_total_revenue(b)),
            SortKey::Profit => event_total_profit(a).total_cmp(&event_total_profit(b)),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Highest total profit; the earliest in list order wins ties
pub fn most_profitable_event(events: &[Event]) -> Option<&Event> {
    events.iter().reduce(|best, e| {
        if event_total_profit(e) > event_total_profit(best) { e } else { best }
    })
}

/// Latest start date; the earliest in list order wins ties
pub fn most_recent_event(events: &[Event]) -> Option<&Event> {
    events
        .iter()
        .reduce(|best, e| if e.date > best.date { e } else { best })
}

// =============================================================================
// Payments
// =============================================================================

/// An entry the venue has not paid for yet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutstandingPayment {
    pub event_id: String,
    pub event_name: String,
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    /// The operator's earned revenue for the entry
    pub amount_owed: f64,
    /// Days past due as of `today`; `None` when not due yet or no terms set
    pub days_overdue: Option<i64>,
}

/// Unpaid entries across `events`, earliest due date first (unknown last)
pub fn outstanding_payments(events: &[Event], today: NaiveDate) -> Vec<OutstandingPayment> {
    let mut outstanding: Vec<OutstandingPayment> = events
        .iter()
        .flat_map(|event| {
            event
                .event_data
                .iter()
                .enumerate()
                .filter(|(_, entry)| !entry.payment_received)
                .map(move |(entry_index, entry)| {
                    let due_date = entry.payment_due_date();
                    let days_overdue = due_date
                        .map(|due| (today - due).num_days())
                        .filter(|days| *days > 0);

                    OutstandingPayment {
                        event_id: event.id.clone(),
                        event_name: event.name.clone(),
                        entry_index,
                        entry_date: entry.date,
                        due_date,
                        amount_owed: calculate_rumba_revenue(event, entry),
                        days_overdue,
                    }
                })
        })
        .collect();

    outstanding.sort_by_key(|p| (p.due_date.is_none(), p.due_date, p.entry_date));
    outstanding
}

/// Total still owed by venues
pub fn total_outstanding(payments: &[OutstandingPayment]) -> f64 {
    payments.iter().map(|p| p.amount_owed).sum()
}
