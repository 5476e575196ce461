//! Event configuration and per-date performance entries
//!
//! Field names serialize in camelCase (`totalRevenue`, `isPaidFromEachBracket`)
//! in stored entry payloads and JSON exports.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::brackets::{self, BracketError};

// =============================================================================
// Enumerations
// =============================================================================

/// Commercial arrangement that decides which revenue figure(s) the operator's
/// share is computed from
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DealType {
    /// Share of total revenue, bracketed or flat
    #[default]
    #[serde(rename = "Revenue Share")]
    RevenueShare,
    /// Share of total revenue plus a share of entrance revenue
    #[serde(rename = "Revenue Share & Entrance Deal", alias = "Both")]
    RevenueShareAndEntrance,
    /// Legacy: flat share of door revenue only
    #[serde(rename = "Entrance Deal")]
    EntranceOnly,
}

impl DealType {
    /// Stable label used for storage and display
    pub fn as_str(&self) -> &'static str {
        match self {
            DealType::RevenueShare => "Revenue Share",
            DealType::RevenueShareAndEntrance => "Revenue Share & Entrance Deal",
            DealType::EntranceOnly => "Entrance Deal",
        }
    }

    /// Whether entries for this deal must record door revenue
    pub fn requires_door_revenue(&self) -> bool {
        matches!(self, DealType::EntranceOnly)
    }

    /// Whether entries for this deal must record entrance revenue
    pub fn requires_entrance_revenue(&self) -> bool {
        matches!(self, DealType::RevenueShareAndEntrance)
    }
}

impl fmt::Display for DealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "revenue share" | "revenue-share" | "revenueshare" => Ok(DealType::RevenueShare),
            "revenue share & entrance deal" | "revenue-share-entrance" | "both" | "blended" => {
                Ok(DealType::RevenueShareAndEntrance)
            }
            "entrance deal" | "entrance" | "entrance-only" => Ok(DealType::EntranceOnly),
            other => Err(format!(
                "Invalid deal type '{}'. Valid options: revenue-share, revenue-share-entrance, entrance",
                other
            )),
        }
    }
}

/// Night the event runs on
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    #[default]
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for DayOfWeek {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Ok(DayOfWeek::Monday),
            "tuesday" | "tue" => Ok(DayOfWeek::Tuesday),
            "wednesday" | "wed" => Ok(DayOfWeek::Wednesday),
            "thursday" | "thu" => Ok(DayOfWeek::Thursday),
            "friday" | "fri" => Ok(DayOfWeek::Friday),
            "saturday" | "sat" => Ok(DayOfWeek::Saturday),
            "sunday" | "sun" => Ok(DayOfWeek::Sunday),
            other => Err(format!("Invalid day of week '{}'", other)),
        }
    }
}

/// When the venue pays the operator
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PaymentTerms {
    #[default]
    #[serde(rename = "50% upfront")]
    HalfUpfront,
    Weekly,
    #[serde(rename = "Bi-weekly")]
    BiWeekly,
    Monthly,
    #[serde(rename = "End of month")]
    EndOfMonth,
    Other,
}

impl PaymentTerms {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentTerms::HalfUpfront => "50% upfront",
            PaymentTerms::Weekly => "Weekly",
            PaymentTerms::BiWeekly => "Bi-weekly",
            PaymentTerms::Monthly => "Monthly",
            PaymentTerms::EndOfMonth => "End of month",
            PaymentTerms::Other => "Other",
        }
    }
}

impl fmt::Display for PaymentTerms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentTerms {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "50% upfront" | "upfront" | "half-upfront" => Ok(PaymentTerms::HalfUpfront),
            "weekly" => Ok(PaymentTerms::Weekly),
            "bi-weekly" | "biweekly" => Ok(PaymentTerms::BiWeekly),
            "monthly" => Ok(PaymentTerms::Monthly),
            "end of month" | "end-of-month" => Ok(PaymentTerms::EndOfMonth),
            "other" => Ok(PaymentTerms::Other),
            other => Err(format!(
                "Invalid payment terms '{}'. Valid options: upfront, weekly, bi-weekly, monthly, end-of-month, other",
                other
            )),
        }
    }
}

// =============================================================================
// Line items
// =============================================================================

/// Revenue-share partner (informational, not subtracted from profit)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Partner {
    pub name: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Promoter {
    pub name: String,
    pub commission: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Staff {
    pub role: String,
    pub name: String,
    pub payment: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VipGirl {
    pub name: String,
    pub commission: f64,
}

/// Paid advertising for one night. Only `amount` is money; the rest is
/// campaign reporting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdSpend {
    pub platform: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reach: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clicks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leads: Option<u64>,
}

/// One tier of the revenue-share schedule, covering `[from_amount, to_amount)`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommissionBracket {
    /// Share of revenue in this tier (0-100]
    pub percentage: f64,
    pub from_amount: f64,
    /// `None` is an unbounded upper edge
    pub to_amount: Option<f64>,
}

impl CommissionBracket {
    pub fn new(percentage: f64, from_amount: f64, to_amount: Option<f64>) -> Self {
        Self {
            percentage,
            from_amount,
            to_amount,
        }
    }

    /// Whether `amount` falls inside `[from_amount, to_amount)`
    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.from_amount && self.to_amount.is_none_or(|to| amount < to)
    }
}

impl fmt::Display for CommissionBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_amount {
            Some(to) => write!(f, "{}% of {:.2}-{:.2}", self.percentage, self.from_amount, to),
            None => write!(f, "{}% of {:.2}+", self.percentage, self.from_amount),
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Field-level problems caught before an event or entry is persisted
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("event name is required")]
    MissingName,

    #[error("{field} must be between 0 and 100 (got {value})")]
    PercentageOutOfRange { field: &'static str, value: f64 },

    #[error("{field} must not be negative (got {value})")]
    NegativeAmount { field: &'static str, value: f64 },

    #[error("door revenue is required for '{0}' deals")]
    MissingDoorRevenue(DealType),

    #[error("entrance revenue is required for '{0}' deals")]
    MissingEntranceRevenue(DealType),

    #[error("invalid commission brackets: {0}")]
    Brackets(#[from] BracketError),

    #[error("no entry at index {index} (event has {len})")]
    EntryIndexOutOfRange { index: usize, len: usize },
}

fn check_percentage(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::PercentageOutOfRange { field, value })
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NegativeAmount { field, value })
    }
}

// =============================================================================
// Entries
// =============================================================================

/// One dated performance snapshot for an event
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    pub date: NaiveDate,
    pub total_revenue: f64,
    #[serde(default)]
    pub total_attendees: u32,
    #[serde(default)]
    pub tables_from_rumba: u32,
    /// Required for entrance-only deals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub door_revenue: Option<f64>,
    /// Required for the blended revenue-share & entrance deal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrance_revenue: Option<f64>,
    /// Overrides the event-level entrance percentage for this night
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrance_percentage: Option<f64>,
    #[serde(default)]
    pub promoters: Vec<Promoter>,
    #[serde(default)]
    pub staff: Vec<Staff>,
    #[serde(default)]
    pub vip_girls_commissions: Vec<VipGirl>,
    #[serde(default)]
    pub table_commissions: f64,
    #[serde(default)]
    pub ad_spend: Vec<AdSpend>,
    #[serde(default)]
    pub leads_collected: u32,
    #[serde(default)]
    pub payment_received: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_until_paid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl EventData {
    /// Check required fields and non-negative money for the owning event's deal
    pub fn validate(&self, deal_type: DealType) -> Result<(), ValidationError> {
        check_amount("totalRevenue", self.total_revenue)?;
        check_amount("tableCommissions", self.table_commissions)?;

        match self.door_revenue {
            Some(door) => check_amount("doorRevenue", door)?,
            None if deal_type.requires_door_revenue() => {
                return Err(ValidationError::MissingDoorRevenue(deal_type));
            }
            None => {}
        }

        match self.entrance_revenue {
            Some(entrance) => check_amount("entranceRevenue", entrance)?,
            None if deal_type.requires_entrance_revenue() => {
                return Err(ValidationError::MissingEntranceRevenue(deal_type));
            }
            None => {}
        }

        if let Some(pct) = self.entrance_percentage {
            check_percentage("entrancePercentage", pct)?;
        }

        for promoter in &self.promoters {
            check_amount("promoter commission", promoter.commission)?;
        }
        for member in &self.staff {
            check_amount("staff payment", member.payment)?;
        }
        for girl in &self.vip_girls_commissions {
            check_amount("VIP commission", girl.commission)?;
        }
        for ad in &self.ad_spend {
            check_amount("ad spend", ad.amount)?;
        }

        Ok(())
    }

    /// Date the venue is expected to pay, when payment terms are known
    pub fn payment_due_date(&self) -> Option<NaiveDate> {
        self.days_until_paid
            .and_then(|days| self.date.checked_add_days(chrono::Days::new(days as u64)))
    }
}

// =============================================================================
// Events
// =============================================================================

/// Event configuration plus its recorded entries
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    /// User the event belongs to
    #[serde(default)]
    pub owner: String,
    pub name: String,
    pub day_of_week: DayOfWeek,
    /// Start date of the event series
    pub date: NaiveDate,
    #[serde(default)]
    pub time: String,
    pub venue_name: String,
    #[serde(default)]
    pub location: String,
    pub deal_type: DealType,
    #[serde(default)]
    pub commission_brackets: Vec<CommissionBracket>,
    /// Tiered (`true`) vs. single bracket applies to all revenue (`false`)
    #[serde(default)]
    pub is_paid_from_each_bracket: bool,
    /// Flat share used when there is no bracket schedule, and for door revenue
    pub rumba_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrance_percentage: Option<f64>,
    #[serde(default)]
    pub payment_terms: PaymentTerms,
    #[serde(default)]
    pub partners: Vec<Partner>,
    #[serde(default)]
    pub event_data: Vec<EventData>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether the event was configured with a bracket schedule (legacy events
    /// only have `rumba_percentage`)
    pub fn has_bracket_schedule(&self) -> bool {
        !self.commission_brackets.is_empty()
    }

    /// Construction-time checks: name, percentages, bracket schedule
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        check_percentage("rumbaPercentage", self.rumba_percentage)?;
        if let Some(pct) = self.entrance_percentage {
            check_percentage("entrancePercentage", pct)?;
        }
        for partner in &self.partners {
            check_percentage("partner percentage", partner.percentage)?;
        }
        if self.has_bracket_schedule() {
            brackets::validate_brackets(&self.commission_brackets)?;
        }
        Ok(())
    }

    /// Configured settings the deal type never reads
    ///
    /// An entrance deal pays from door revenue only, so brackets and the
    /// entrance percentage sit unused; a plain revenue share has no entrance
    /// part at all.
    pub fn ignored_settings(&self) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        match self.deal_type {
            DealType::EntranceOnly => {
                if self.has_bracket_schedule() {
                    ignored.push("commission brackets");
                }
                if self.entrance_percentage.is_some() {
                    ignored.push("entrance percentage");
                }
            }
            DealType::RevenueShare => {
                if self.entrance_percentage.is_some() {
                    ignored.push("entrance percentage");
                }
            }
            DealType::RevenueShareAndEntrance => {}
        }
        if self.is_paid_from_each_bracket && !self.has_bracket_schedule() {
            ignored.push("tiered bracket mode");
        }
        ignored
    }

    /// Append an entry after validating it against this event's deal type
    pub fn add_entry(&mut self, entry: EventData) -> Result<usize, ValidationError> {
        entry.validate(self.deal_type)?;
        self.event_data.push(entry);
        Ok(self.event_data.len() - 1)
    }

    /// Remove the entry at `index`, returning it
    pub fn remove_entry(&mut self, index: usize) -> Result<EventData, ValidationError> {
        if index >= self.event_data.len() {
            return Err(ValidationError::EntryIndexOutOfRange {
                index,
                len: self.event_data.len(),
            });
        }
        Ok(self.event_data.remove(index))
    }

    /// Replace the entry at `index` wholesale, returning the previous one
    pub fn replace_entry(&mut self, index: usize, entry: EventData) -> Result<EventData, ValidationError> {
        let len = self.event_data.len();
        let slot = self
            .event_data
            .get_mut(index)
            .ok_or(ValidationError::EntryIndexOutOfRange { index, len })?;
        entry.validate(self.deal_type)?;
        Ok(std::mem::replace(slot, entry))
    }
}

/// User-supplied fields for creating an event
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub name: String,
    /// Derived from `date` when not given
    pub day_of_week: Option<DayOfWeek>,
    pub date: NaiveDate,
    pub time: String,
    pub venue_name: String,
    pub location: String,
    pub deal_type: DealType,
    pub commission_brackets: Vec<CommissionBracket>,
    pub is_paid_from_each_bracket: bool,
    pub rumba_percentage: f64,
    pub entrance_percentage: Option<f64>,
    pub payment_terms: PaymentTerms,
    pub partners: Vec<Partner>,
}

impl NewEvent {
    /// Assign an id and timestamps, dropping unnamed partners, and validate
    pub fn build(self, owner: &str, now: DateTime<Utc>) -> Result<Event, ValidationError> {
        let event = Event {
            id: uuid::Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            name: self.name.trim().to_string(),
            day_of_week: self.day_of_week.unwrap_or_else(|| self.date.weekday().into()),
            date: self.date,
            time: self.time,
            venue_name: self.venue_name,
            location: self.location,
            deal_type: self.deal_type,
            commission_brackets: self.commission_brackets,
            is_paid_from_each_bracket: self.is_paid_from_each_bracket,
            rumba_percentage: self.rumba_percentage,
            entrance_percentage: self.entrance_percentage,
            payment_terms: self.payment_terms,
            partners: self
                .partners
                .into_iter()
                .filter(|p| !p.name.trim().is_empty())
                .collect(),
            event_data: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        event.validate()?;
        Ok(event)
    }
}
