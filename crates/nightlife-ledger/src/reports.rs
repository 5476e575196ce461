//! Report generation (CSV outputs and console summary)

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use csv::Writer;
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::calculations::{EntryFigures, revenue_breakdown};
use crate::constants;
use crate::model::Event;
use crate::money::{format_currency, format_percent, normalize_zero};
use crate::summary::{
    event_total_profit, most_profitable_event, most_recent_event, outstanding_payments, roi,
    summarize_by_month, summarize_dashboard, summarize_event, total_outstanding,
};

/// Copy of `events` keeping only entries dated in `year`
///
/// Events themselves are kept even when no entry survives, so averages still
/// count them.
pub fn restrict_to_year(events: &[Event], year: Option<i32>) -> Vec<Event> {
    let Some(year) = year else {
        return events.to_vec();
    };

    events
        .iter()
        .map(|event| Event {
            event_data: event
                .event_data
                .iter()
                .filter(|entry| entry.date.year() == year)
                .cloned()
                .collect(),
            ..event.clone()
        })
        .collect()
}

/// Generate all CSV reports
pub fn generate_all_reports(output_dir: &Path, events: &[Event], year_filter: Option<i32>) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;

    let events = restrict_to_year(events, year_filter);
    generate_entry_ledger(output_dir, &events)?;
    generate_event_summary(output_dir, &events)?;

    Ok(())
}

/// Generate entry_ledger.csv
fn generate_entry_ledger(output_dir: &Path, events: &[Event]) -> Result<()> {
    let path = output_dir.join(constants::ENTRY_LEDGER_FILENAME);
    let mut wtr = Writer::from_path(&path)?;

    // Header
    wtr.write_record([
        "Date",
        "Event",
        "Venue",
        "Deal_Type",
        "Total_Revenue",
        "Rumba_Revenue",
        "Commissions",
        "Ad_Spend",
        "Total_Expenses",
        "Profit",
        "Attendees",
        "Tables",
        "Paid",
        "Warnings",
    ])?;

    let mut rows: Vec<(&Event, usize)> = events
        .iter()
        .flat_map(|event| (0..event.event_data.len()).map(move |i| (event, i)))
        .collect();
    rows.sort_by_key(|(event, i)| event.event_data[*i].date);

    for (event, index) in rows {
        let entry = &event.event_data[index];
        let figures = EntryFigures::compute(event, entry);
        let warnings: Vec<String> = figures.warnings.iter().map(|w| w.to_string()).collect();
        let date = entry.date.format(constants::DATE_FORMAT).to_string();

        wtr.write_record([
            date.as_str(),
            &event.name,
            &event.venue_name,
            event.deal_type.as_str(),
            &format!("{:.2}", entry.total_revenue),
            &format!("{:.2}", normalize_zero(figures.rumba_revenue)),
            &format!("{:.2}", figures.commissions),
            &format!("{:.2}", figures.ad_spend),
            &format!("{:.2}", figures.expenses),
            &format!("{:.2}", normalize_zero(figures.profit)),
            &entry.total_attendees.to_string(),
            &entry.tables_from_rumba.to_string(),
            if entry.payment_received { "yes" } else { "no" },
            &warnings.join("; "),
        ])?;
    }

    wtr.flush()?;
    println!("  Generated: {}", path.display());

    Ok(())
}

/// Generate event_summary.csv
fn generate_event_summary(output_dir: &Path, events: &[Event]) -> Result<()> {
    let path = output_dir.join(constants::EVENT_SUMMARY_FILENAME);
    let mut wtr = Writer::from_path(&path)?;

    wtr.write_record([
        "Event",
        "Venue",
        "Deal_Type",
        "Entries",
        "Total_Revenue",
        "Rumba_Revenue",
        "Commissions",
        "Total_Expenses",
        "Profit",
        "ROI_Percent",
    ])?;

    for event in events {
        // Events without entries still get a row, with blank figures
        let Some(summary) = summarize_event(event) else {
            wtr.write_record([
                event.name.as_str(),
                &event.venue_name,
                event.deal_type.as_str(),
                "0",
                "",
                "",
                "",
                "",
                "",
                "",
            ])?;
            continue;
        };

        wtr.write_record([
            event.name.as_str(),
            &event.venue_name,
            event.deal_type.as_str(),
            &summary.entry_count.to_string(),
            &format!("{:.2}", summary.total_revenue),
            &format!("{:.2}", normalize_zero(summary.total_rumba_revenue)),
            &format!("{:.2}", summary.total_commissions),
            &format!("{:.2}", summary.total_expenses),
            &format!("{:.2}", normalize_zero(summary.total_profit)),
            &format!("{:.2}", normalize_zero(roi(summary.total_profit, summary.total_expenses))),
        ])?;
    }

    let dashboard = summarize_dashboard(events);
    let total_entries: usize = events.iter().map(|e| e.event_data.len()).sum();
    wtr.write_record([
        "TOTAL",
        "",
        "",
        &total_entries.to_string(),
        &format!("{:.2}", dashboard.total_revenue),
        &format!("{:.2}", normalize_zero(dashboard.total_rumba_revenue)),
        &format!("{:.2}", dashboard.total_commissions),
        &format!("{:.2}", dashboard.total_expenses),
        &format!("{:.2}", normalize_zero(dashboard.total_profit)),
        &format!("{:.2}", normalize_zero(dashboard.roi)),
    ])?;

    wtr.flush()?;
    println!("  Generated: {}", path.display());

    Ok(())
}

// =============================================================================
// Console output
// =============================================================================

/// Print the dashboard to console
pub fn print_dashboard(events: &[Event], year_filter: Option<i32>, today: NaiveDate) {
    let events = restrict_to_year(events, year_filter);
    let dashboard = summarize_dashboard(&events);

    println!("\n============================================================");
    if let Some(year) = year_filter {
        println!("                  EVENT DASHBOARD ({})", year);
    } else {
        println!("                      EVENT DASHBOARD");
    }
    println!("============================================================\n");

    println!("ACTIVITY:");
    println!("  Events:                 {:>14}", dashboard.event_count);
    println!("  Events with data:       {:>14}", dashboard.events_with_data);
    println!("  Attendees:              {:>14}", dashboard.total_attendees);
    println!("  Tables from Rumba:      {:>14}", dashboard.total_tables);

    println!("\nREVENUE:");
    println!("  Venue Revenue:          {:>14}", format_currency(dashboard.total_revenue));
    println!("  Rumba Revenue:          {:>14}", format_currency(dashboard.total_rumba_revenue));

    println!("\nEXPENSES:");
    println!("  Commissions:            {:>14}", format_currency(dashboard.total_commissions));
    println!("  Ad Spend:               {:>14}", format_currency(dashboard.total_ad_spend));
    println!("  ─────────────────────────────────────────");
    println!("  Total Expenses:         {:>14}", format_currency(dashboard.total_expenses));

    println!("\nPROFIT/LOSS:");
    println!("  Net Profit:             {:>14}", format_currency(dashboard.total_profit));
    println!("  ROI:                    {:>14}", format_percent(dashboard.roi));
    println!("  Average Spend / Event:  {:>14}", format_currency(dashboard.average_spend));
    println!("  Average Profit / Event: {:>14}", format_currency(dashboard.average_profit));

    if let Some(best) = most_profitable_event(&events) {
        println!("\nHIGHLIGHTS:");
        println!(
            "  Most profitable:        {} ({})",
            best.name,
            format_currency(event_total_profit(best))
        );
    }
    if let Some(latest) = most_recent_event(&events) {
        println!(
            "  Most recent:            {} ({})",
            latest.name,
            latest.date.format(constants::DISPLAY_DATE_FORMAT)
        );
    }

    let months = summarize_by_month(&events, None);
    if !months.is_empty() {
        println!("\nMONTHLY:");
        println!(
            "  {:<8} {:>7} {:>14} {:>14} {:>14}",
            "Month", "Entries", "Rumba Rev", "Expenses", "Profit"
        );
        for month in &months {
            println!(
                "  {:<8} {:>7} {:>14} {:>14} {:>14}",
                month.month,
                month.entries,
                format_currency(month.total_rumba_revenue),
                format_currency(month.total_expenses),
                format_currency(month.total_profit)
            );
        }
    }

    let outstanding = outstanding_payments(&events, today);
    if !outstanding.is_empty() {
        println!("\nOUTSTANDING PAYMENTS:");
        for payment in &outstanding {
            let status = match (payment.due_date, payment.days_overdue) {
                (_, Some(days)) => format!("{} days overdue", days),
                (Some(due), None) => format!("due {}", due.format(constants::DATE_FORMAT)),
                (None, None) => "no terms".to_string(),
            };
            println!(
                "  {} {:<24} {:>14}  {}",
                payment.entry_date.format(constants::DATE_FORMAT),
                truncate(&payment.event_name, 24),
                format_currency(payment.amount_owed),
                status
            );
        }
        println!("  ─────────────────────────────────────────");
        println!("  Total Owed:             {:>14}", format_currency(total_outstanding(&outstanding)));
    }

    println!("============================================================");
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Venue")]
    venue: String,
    #[tabled(rename = "Start")]
    date: String,
    #[tabled(rename = "Deal")]
    deal: String,
    #[tabled(rename = "Entries")]
    entries: usize,
    #[tabled(rename = "Profit")]
    profit: String,
}

/// Print a table of events
pub fn print_event_list(events: &[&Event]) {
    if events.is_empty() {
        println!("No events found.");
        return;
    }

    let rows: Vec<EventRow> = events
        .iter()
        .map(|event| EventRow {
            id: short_id(&event.id).to_string(),
            name: event.name.clone(),
            venue: event.venue_name.clone(),
            date: event.date.format(constants::DATE_FORMAT).to_string(),
            deal: event.deal_type.to_string(),
            entries: event.event_data.len(),
            profit: match summarize_event(event) {
                Some(summary) => format_currency(summary.total_profit),
                None => "-".to_string(),
            },
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
    println!("Total: {} events", events.len());
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Revenue")]
    revenue: String,
    #[tabled(rename = "Rumba")]
    rumba: String,
    #[tabled(rename = "Expenses")]
    expenses: String,
    #[tabled(rename = "Profit")]
    profit: String,
    #[tabled(rename = "Paid")]
    paid: &'static str,
}

/// Print an event's entries with their computed figures
pub fn print_entries(event: &Event) {
    if event.event_data.is_empty() {
        println!("No entries recorded for {}.", event.name);
        return;
    }

    let rows: Vec<EntryRow> = event
        .event_data
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let figures = EntryFigures::compute(event, entry);
            EntryRow {
                index,
                date: entry.date.format(constants::DATE_FORMAT).to_string(),
                revenue: format_currency(entry.total_revenue),
                rumba: format_currency(figures.rumba_revenue),
                expenses: format_currency(figures.expenses),
                profit: format_currency(figures.profit),
                paid: if entry.payment_received { "yes" } else { "no" },
            }
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}

/// Print one event's configuration, totals and entries
pub fn print_event_detail(event: &Event) {
    println!("\n{}", event.name);
    println!("{}", "-".repeat(60));
    println!("  ID:              {}", event.id);
    println!(
        "  When:            {}s, starting {} {}",
        event.day_of_week,
        event.date.format(constants::DISPLAY_DATE_FORMAT),
        event.time
    );
    println!("  Venue:           {} {}", event.venue_name, event.location);
    println!("  Deal:            {}", event.deal_type);
    println!("  Payment terms:   {}", event.payment_terms);

    if event.has_bracket_schedule() {
        let mode = if event.is_paid_from_each_bracket {
            "tiered"
        } else {
            "single bracket"
        };
        println!("  Brackets ({}):", mode);
        for bracket in &event.commission_brackets {
            println!("    {}", bracket);
        }
    } else {
        println!("  Rumba share:     {}", format_percent(event.rumba_percentage));
    }
    if let Some(pct) = event.entrance_percentage {
        println!("  Entrance share:  {}", format_percent(pct));
    }
    for partner in &event.partners {
        println!("  Partner:         {} ({})", partner.name, format_percent(partner.percentage));
    }

    match summarize_event(event) {
        Some(summary) => {
            println!("\n  Entries:         {}", summary.entry_count);
            println!("  Attendees:       {}", summary.total_attendees);
            println!("  Venue Revenue:   {:>14}", format_currency(summary.total_revenue));
            println!("  Rumba Revenue:   {:>14}", format_currency(summary.total_rumba_revenue));
            println!("  Expenses:        {:>14}", format_currency(summary.total_expenses));
            println!("  Profit:          {:>14}", format_currency(summary.total_profit));
            println!(
                "  ROI:             {:>14}",
                format_percent(roi(summary.total_profit, summary.total_expenses))
            );
            println!();
            print_entries(event);
        }
        None => println!("\n  No entries recorded yet."),
    }

    for (index, entry) in event.event_data.iter().enumerate() {
        for warning in revenue_breakdown(event, entry).warnings {
            println!("  ! entry {} ({}): {}", index, entry.date.format(constants::DATE_FORMAT), warning);
        }
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DealType, EventData, Promoter};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_events() -> Vec<Event> {
        let entry = |on: NaiveDate, revenue: f64| EventData {
            date: on,
            total_revenue: revenue,
            promoters: vec![Promoter {
                name: "Leo".to_string(),
                commission: 100.0,
            }],
            ..Default::default()
        };

        vec![
            Event {
                id: "e1".to_string(),
                name: "Salsa, Fridays".to_string(),
                venue_name: "Club Sol".to_string(),
                deal_type: DealType::RevenueShare,
                rumba_percentage: 10.0,
                event_data: vec![entry(date(2024, 12, 6), 5000.0), entry(date(2025, 1, 3), 2000.0)],
                ..Default::default()
            },
            Event {
                id: "e2".to_string(),
                name: "Bachata".to_string(),
                venue_name: "Sala Luna".to_string(),
                deal_type: DealType::RevenueShare,
                rumba_percentage: 20.0,
                ..Default::default()
            },
        ]
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_restrict_to_year_keeps_events() {
        let events = sample_events();
        let only_2025 = restrict_to_year(&events, Some(2025));
        assert_eq!(only_2025.len(), 2);
        assert_eq!(only_2025[0].event_data.len(), 1);
        assert_eq!(restrict_to_year(&events, None), events);
    }

    #[test]
    fn test_generate_reports() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");
        generate_all_reports(&out, &sample_events(), None).unwrap();

        let ledger = read_rows(&out.join(constants::ENTRY_LEDGER_FILENAME));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0][0], "2024-12-06");
        assert_eq!(ledger[0][1], "Salsa, Fridays");
        assert_eq!(ledger[0][5], "500.00");
        assert_eq!(ledger[0][9], "400.00");

        let summary = read_rows(&out.join(constants::EVENT_SUMMARY_FILENAME));
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0][3], "2");
        assert_eq!(summary[0][8], "500.00");
        assert_eq!(summary[1][3], "0");
        assert_eq!(summary[1][8], "");
        let total = summary.last().unwrap();
        assert_eq!(total[0], "TOTAL");
        assert_eq!(total[3], "2");
        assert_eq!(total[4], "7000.00");
        assert_eq!(total[7], "200.00");
        assert_eq!(total[8], "500.00");
        assert_eq!(total[9], "250.00");
    }

    #[test]
    fn test_generate_reports_with_year_filter() {
        let dir = tempfile::tempdir().unwrap();
        generate_all_reports(dir.path(), &sample_events(), Some(2025)).unwrap();

        let ledger = read_rows(&dir.path().join(constants::ENTRY_LEDGER_FILENAME));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0][0], "2025-01-03");
    }

    #[test]
    fn test_truncate_and_short_id() {
        assert_eq!(truncate("Salsa", 24), "Salsa");
        assert_eq!(truncate("Reggaeton Saturdays at the Beach", 10), "Reggaet...");
        assert_eq!(short_id("1234567890"), "12345678");
        assert_eq!(short_id("e1"), "e1");
    }
}
