//! Centralized constants for the nightlife event ledger
//!
//! Per-user settings are loaded from config.toml; these are the fallbacks.

// =============================================================================
// File Names
// =============================================================================

/// Default config file path
pub const CONFIG_FILENAME: &str = "config.toml";

/// Event database filename
pub const DATABASE_FILENAME: &str = "events.sqlite";

/// Per-entry ledger CSV filename
pub const ENTRY_LEDGER_FILENAME: &str = "entry_ledger.csv";

/// Per-event summary CSV filename
pub const EVENT_SUMMARY_FILENAME: &str = "event_summary.csv";

// =============================================================================
// Defaults
// =============================================================================

/// Owner used when no config.toml is present
pub const DEFAULT_USER: &str = "default";

/// Operator share for new events when nothing else is configured
pub const DEFAULT_RUMBA_PERCENTAGE: f64 = 50.0;

// =============================================================================
// Formats
// =============================================================================

/// Date format for entry and event dates (YYYY-MM-DD)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Long date format used in console output
pub const DISPLAY_DATE_FORMAT: &str = "%B %-d, %Y";
