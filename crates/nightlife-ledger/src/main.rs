//! Nightlife event ledger CLI
//!
//! Records events and their nightly results, computes the operator's share
//! under each venue deal, and writes CSV reports.

use anyhow::{Context, Result, bail};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use nightlife_ledger::calculations::revenue_breakdown;
use nightlife_ledger::config::{Config, FileConfig};
use nightlife_ledger::constants;
use nightlife_ledger::input;
use nightlife_ledger::model::{DayOfWeek, DealType, Event, EventData, NewEvent, PaymentTerms};
use nightlife_ledger::money::format_currency;
use nightlife_ledger::reports;
use nightlife_ledger::store::{self, EventRepository, SqliteStore};
use nightlife_ledger::summary::{SortKey, SortOrder, filter_events, sort_events};

#[derive(Parser, Debug)]
#[command(name = "nightlife-ledger")]
#[command(about = "Revenue, commission and profit tracking for nightlife events")]
struct Args {
    /// Data directory for the event database
    #[arg(short, long, default_value = "./data", global = true)]
    data_dir: PathBuf,

    /// Output directory for generated CSV reports
    #[arg(short, long, default_value = "./output", global = true)]
    output_dir: PathBuf,

    /// Config file (optional; built-in defaults are used when missing)
    #[arg(short, long, default_value = constants::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage events
    Event {
        #[command(subcommand)]
        action: EventCommand,
    },

    /// Manage per-night entries of an event
    Entry {
        #[command(subcommand)]
        action: EntryCommand,
    },

    /// Print the dashboard and write CSV reports
    Report {
        /// Filter reports to a specific year (e.g., 2025)
        #[arg(long)]
        year: Option<i32>,
    },

    /// Export all of your events to a JSON file
    Export {
        /// Path to output JSON file
        file: PathBuf,
    },

    /// Import events from a JSON export
    Import {
        /// Path to JSON file
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum EventCommand {
    /// Create a new event
    Add {
        /// Event name
        #[arg(long)]
        name: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Start time (e.g., 23:00)
        #[arg(long, default_value = "")]
        time: String,

        /// Night of the week (default: weekday of --date)
        #[arg(long)]
        day: Option<String>,

        /// Venue name
        #[arg(long)]
        venue: String,

        /// Venue location
        #[arg(long, default_value = "")]
        location: String,

        /// Deal type: revenue-share, revenue-share-entrance, entrance
        #[arg(long)]
        deal_type: Option<String>,

        /// Commission bracket PCT:FROM[:TO], repeatable, in order
        #[arg(long = "bracket")]
        brackets: Vec<String>,

        /// Pay each bracket on its own slice of revenue (default: one bracket
        /// applies to all revenue)
        #[arg(long)]
        tiered: bool,

        /// Flat operator share, used when no brackets are given and for door revenue
        #[arg(long)]
        rumba_percentage: Option<f64>,

        /// Share of entrance revenue for revenue-share-entrance deals
        #[arg(long)]
        entrance_percentage: Option<f64>,

        /// Payment terms: upfront, weekly, bi-weekly, monthly, end-of-month, other
        #[arg(long)]
        payment_terms: Option<String>,

        /// Partner NAME:PCT, repeatable
        #[arg(long = "partner")]
        partners: Vec<String>,
    },

    /// List events
    List {
        /// Only events whose name, venue or location contains this text
        #[arg(long)]
        search: Option<String>,

        #[arg(long, value_enum, default_value = "date")]
        sort: SortKey,

        #[arg(long, value_enum, default_value = "asc")]
        order: SortOrder,
    },

    /// Show an event with its totals and entries
    Show {
        /// Event ID (or a unique prefix)
        id: String,
    },

    /// Delete an event and all its entries
    Delete {
        /// Event ID (or a unique prefix)
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum EntryCommand {
    /// Record one night's results
    Add {
        /// Event ID (or a unique prefix)
        event: String,

        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Total venue revenue
        #[arg(long)]
        revenue: f64,

        #[arg(long, default_value_t = 0)]
        attendees: u32,

        /// Tables booked through the operator
        #[arg(long, default_value_t = 0)]
        tables: u32,

        /// Door revenue (required for entrance deals)
        #[arg(long)]
        door_revenue: Option<f64>,

        /// Entrance revenue (required for revenue-share-entrance deals)
        #[arg(long)]
        entrance_revenue: Option<f64>,

        /// Override the event's entrance percentage for this night
        #[arg(long)]
        entrance_percentage: Option<f64>,

        /// Promoter NAME:AMOUNT, repeatable
        #[arg(long = "promoter")]
        promoters: Vec<String>,

        /// Staff ROLE:NAME:PAYMENT, repeatable
        #[arg(long = "staff")]
        staff: Vec<String>,

        /// VIP commission NAME:AMOUNT, repeatable
        #[arg(long = "vip")]
        vips: Vec<String>,

        /// Flat table commissions
        #[arg(long, default_value_t = 0.0)]
        table_commissions: f64,

        /// Ad spend PLATFORM:AMOUNT[:REACH[:CLICKS[:LEADS]]], repeatable
        #[arg(long = "ad")]
        ads: Vec<String>,

        #[arg(long, default_value_t = 0)]
        leads: u32,

        /// Venue has already paid for this night
        #[arg(long)]
        paid: bool,

        /// Days after the night until the venue pays
        #[arg(long)]
        days_until_paid: Option<u32>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List an event's entries with computed figures
    List {
        /// Event ID (or a unique prefix)
        event: String,
    },

    /// Delete an entry by index (see `entry list`)
    Delete {
        /// Event ID (or a unique prefix)
        event: String,

        /// Entry index
        index: usize,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let file_config = FileConfig::load_or_default(&args.config)?;
    let config = Config::from_file(&file_config)?;
    tracing::debug!(user = %config.user_id, "loaded configuration");

    std::fs::create_dir_all(&args.data_dir)?;
    let store = SqliteStore::open_in_dir(&args.data_dir).await?;

    match args.command {
        Command::Event { action } => handle_event_command(action, &store, &config).await,
        Command::Entry { action } => handle_entry_command(action, &store, &config).await,
        Command::Report { year } => run_reports(&store, &config, &args.output_dir, year).await,
        Command::Export { file } => {
            let events = store.list_events(&config.user_id).await?;
            store::export_events_json(&events, &file)?;
            println!("Exported {} events to {}", events.len(), file.display());
            Ok(())
        }
        Command::Import { file } => import_events(&store, &config, &file).await,
    }
}

/// Find one of the user's events by full ID or unique ID prefix
async fn resolve_event(store: &impl EventRepository, config: &Config, id: &str) -> Result<Event> {
    if let Some(event) = store.load_event(id).await? {
        if event.owner == config.user_id {
            return Ok(event);
        }
    }

    let mut matches: Vec<Event> = store
        .list_events(&config.user_id)
        .await?
        .into_iter()
        .filter(|e| e.id.starts_with(id))
        .collect();

    match matches.len() {
        0 => bail!("Event '{}' not found", id),
        1 => Ok(matches.remove(0)),
        n => bail!("Event ID prefix '{}' is ambiguous ({} matches)", id, n),
    }
}

/// Log data-quality warnings for an event's entries
fn warn_on_calculation_issues(event: &Event) {
    for (index, entry) in event.event_data.iter().enumerate() {
        for warning in revenue_breakdown(event, entry).warnings {
            tracing::warn!(event = %event.name, entry = index, date = %entry.date, "{}", warning);
        }
    }
}

/// Handle event management subcommands
async fn handle_event_command(action: EventCommand, store: &SqliteStore, config: &Config) -> Result<()> {
    match action {
        EventCommand::Add {
            name,
            date,
            time,
            day,
            venue,
            location,
            deal_type,
            brackets,
            tiered,
            rumba_percentage,
            entrance_percentage,
            payment_terms,
            partners,
        } => {
            let deal_type = match deal_type {
                Some(s) => s.parse::<DealType>().map_err(anyhow::Error::msg)?,
                None => config.default_deal_type,
            };
            let payment_terms = match payment_terms {
                Some(s) => s.parse::<PaymentTerms>().map_err(anyhow::Error::msg)?,
                None => config.default_payment_terms,
            };
            let day_of_week = day
                .map(|d| d.parse::<DayOfWeek>().map_err(anyhow::Error::msg))
                .transpose()?;

            let new_event = NewEvent {
                name,
                day_of_week,
                date: input::parse_date(&date)?,
                time,
                venue_name: venue,
                location,
                deal_type,
                commission_brackets: brackets
                    .iter()
                    .map(|b| input::parse_bracket(b))
                    .collect::<Result<_>>()?,
                is_paid_from_each_bracket: tiered,
                rumba_percentage: rumba_percentage.unwrap_or(config.default_rumba_percentage),
                entrance_percentage,
                payment_terms,
                partners: partners
                    .iter()
                    .map(|p| input::parse_partner(p))
                    .collect::<Result<_>>()?,
            };

            let event = new_event.build(&config.user_id, Utc::now())?;
            if deal_type == DealType::RevenueShareAndEntrance && event.entrance_percentage.is_none() {
                tracing::warn!("no --entrance-percentage set; entries must provide their own");
            }
            for setting in event.ignored_settings() {
                tracing::warn!(deal = %event.deal_type, "{} set but not used by this deal type", setting);
            }

            store.save_event(&event).await?;
            println!("Created event {} ({})", event.name, event.id);
            Ok(())
        }

        EventCommand::List { search, sort, order } => {
            let events = store.list_events(&config.user_id).await?;
            let mut selected = filter_events(&events, search.as_deref().unwrap_or(""));
            sort_events(&mut selected, sort, order);
            reports::print_event_list(&selected);
            Ok(())
        }

        EventCommand::Show { id } => {
            let event = resolve_event(store, config, &id).await?;
            reports::print_event_detail(&event);
            Ok(())
        }

        EventCommand::Delete { id } => {
            let event = resolve_event(store, config, &id).await?;
            if store.delete_event(&event.id).await? {
                println!("Deleted event {} ({} entries)", event.name, event.event_data.len());
            } else {
                println!("Event {} not found", id);
            }
            Ok(())
        }
    }
}

/// Handle entry subcommands
async fn handle_entry_command(action: EntryCommand, store: &SqliteStore, config: &Config) -> Result<()> {
    match action {
        EntryCommand::Add {
            event,
            date,
            revenue,
            attendees,
            tables,
            door_revenue,
            entrance_revenue,
            entrance_percentage,
            promoters,
            staff,
            vips,
            table_commissions,
            ads,
            leads,
            paid,
            days_until_paid,
            notes,
        } => {
            let mut target = resolve_event(store, config, &event).await?;

            let entry = EventData {
                date: input::parse_date(&date)?,
                total_revenue: revenue,
                total_attendees: attendees,
                tables_from_rumba: tables,
                door_revenue,
                entrance_revenue,
                entrance_percentage,
                promoters: promoters
                    .iter()
                    .map(|p| input::parse_promoter(p))
                    .collect::<Result<_>>()?,
                staff: staff.iter().map(|s| input::parse_staff(s)).collect::<Result<_>>()?,
                vip_girls_commissions: vips.iter().map(|v| input::parse_vip(v)).collect::<Result<_>>()?,
                table_commissions,
                ad_spend: ads.iter().map(|a| input::parse_ad_spend(a)).collect::<Result<_>>()?,
                leads_collected: leads,
                payment_received: paid,
                days_until_paid,
                notes,
            };

            let index = target
                .add_entry(entry)
                .with_context(|| format!("Invalid entry for {}", target.name))?;
            target.updated_at = Utc::now();
            store.save_event(&target).await?;

            let breakdown = revenue_breakdown(&target, &target.event_data[index]);
            for warning in &breakdown.warnings {
                tracing::warn!(event = %target.name, "{}", warning);
            }
            println!(
                "Added entry #{} to {}: {} earned",
                index,
                target.name,
                format_currency(breakdown.total)
            );
            Ok(())
        }

        EntryCommand::List { event } => {
            let target = resolve_event(store, config, &event).await?;
            reports::print_entries(&target);
            warn_on_calculation_issues(&target);
            Ok(())
        }

        EntryCommand::Delete { event, index } => {
            let mut target = resolve_event(store, config, &event).await?;
            let removed = target.remove_entry(index)?;
            store.save_event(&target).await?;
            println!(
                "Deleted entry #{} ({}) from {}",
                index,
                removed.date.format(constants::DATE_FORMAT),
                target.name
            );
            Ok(())
        }
    }
}

/// Print the dashboard and write CSV reports
async fn run_reports(store: &SqliteStore, config: &Config, output_dir: &Path, year: Option<i32>) -> Result<()> {
    let events = store.list_events(&config.user_id).await?;
    if events.is_empty() {
        println!("No events recorded for {}.", config.display_name);
        println!("\nUse 'nightlife-ledger event add' to create one");
        return Ok(());
    }

    for event in &events {
        warn_on_calculation_issues(event);
    }

    reports::print_dashboard(&events, year, Local::now().date_naive());

    println!("\nGenerating reports...");
    reports::generate_all_reports(output_dir, &events, year)?;
    Ok(())
}

/// Import events from a JSON export into the current user's events
async fn import_events(store: &SqliteStore, config: &Config, file: &Path) -> Result<()> {
    let events = store::import_events_json(file)?;
    let summary = store::import_events(store, &config.user_id, events).await?;

    println!(
        "Imported {} events from {} ({} skipped)",
        summary.imported,
        file.display(),
        summary.skipped.len()
    );
    for (name, reason) in &summary.skipped {
        println!("  Skipped {}: {}", name, reason);
    }
    Ok(())
}
