//! SQLite storage for events and their entries
//!
//! Event configuration lives in flat tables (`events`, `commission_brackets`,
//! `partners`). Entries are replaced wholesale and never edited in place, so
//! each one is kept as a JSON payload in `event_entries`, ordered by position.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use std::path::Path;

use crate::constants;
use crate::model::{CommissionBracket, DayOfWeek, DealType, Event, EventData, Partner, PaymentTerms};

/// Read/write contract for event records
///
/// The calculation modules never touch this; callers load events first and
/// pass plain values in.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Load one event with its brackets, partners and entries
    async fn load_event(&self, id: &str) -> Result<Option<Event>>;

    /// Insert or fully replace an event. Rejects invalid configurations and
    /// ids already stored under a different owner.
    async fn save_event(&self, event: &Event) -> Result<()>;

    /// All events owned by `owner`, oldest start date first
    async fn list_events(&self, owner: &str) -> Result<Vec<Event>>;

    /// Delete an event and everything under it; `false` if it did not exist
    async fn delete_event(&self, id: &str) -> Result<bool>;
}

/// Event database wrapper
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Row type for events query
#[derive(FromRow)]
struct EventRow {
    id: String,
    owner: String,
    name: String,
    day_of_week: String,
    date: String,
    time: String,
    venue_name: String,
    location: String,
    deal_type: String,
    is_paid_from_each_bracket: bool,
    rumba_percentage: f64,
    entrance_percentage: Option<f64>,
    payment_terms: String,
    created_at: String,
    updated_at: String,
}

/// Row type for commission brackets query
#[derive(FromRow)]
struct BracketRow {
    percentage: f64,
    from_amount: f64,
    to_amount: Option<f64>,
}

/// Row type for partners query
#[derive(FromRow)]
struct PartnerRow {
    name: String,
    percentage: f64,
}

/// Row type for entries query
#[derive(FromRow)]
struct EntryRow {
    payload: String,
}

impl SqliteStore {
    /// Open or create the event database
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // SQLx requires the file to exist for SQLite
        if !path.exists() {
            std::fs::File::create(path)?;
        }

        let url = format!("sqlite:{}", path.display());
        let pool = SqlitePool::connect(&url)
            .await
            .with_context(|| format!("Failed to open event database: {}", path.display()))?;

        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
        sqlx::query("PRAGMA busy_timeout=5000").execute(&pool).await?;
        sqlx::query("PRAGMA foreign_keys=ON").execute(&pool).await?;

        let store = Self { pool };
        store.init_schema().await?;

        tracing::debug!(path = %path.display(), "opened event database");
        Ok(store)
    }

    /// Open `events.sqlite` inside a data directory
    pub async fn open_in_dir(data_dir: &Path) -> Result<Self> {
        Self::open(&data_dir.join(constants::DATABASE_FILENAME)).await
    }

    /// Initialize database schema
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "
            -- Event configuration
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                day_of_week TEXT NOT NULL,
                date TEXT NOT NULL,
                time TEXT NOT NULL,
                venue_name TEXT NOT NULL,
                location TEXT NOT NULL,
                deal_type TEXT NOT NULL,
                is_paid_from_each_bracket INTEGER NOT NULL DEFAULT 0,
                rumba_percentage REAL NOT NULL,
                entrance_percentage REAL,
                payment_terms TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_owner ON events(owner)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "
            -- Revenue-share schedule, in list order
            CREATE TABLE IF NOT EXISTS commission_brackets (
                event_id TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                percentage REAL NOT NULL,
                from_amount REAL NOT NULL,
                to_amount REAL,
                PRIMARY KEY (event_id, position)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "
            -- Revenue-share partners
            CREATE TABLE IF NOT EXISTS partners (
                event_id TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                percentage REAL NOT NULL,
                PRIMARY KEY (event_id, position)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "
            -- Per-date performance entries (JSON payload)
            CREATE TABLE IF NOT EXISTS event_entries (
                event_id TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                date TEXT NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (event_id, position)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Rebuild an event from its row and child tables
    async fn hydrate(&self, row: EventRow) -> Result<Event> {
        let brackets: Vec<BracketRow> = sqlx::query_as(
            "SELECT percentage, from_amount, to_amount
             FROM commission_brackets
             WHERE event_id = ?
             ORDER BY position",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let partners: Vec<PartnerRow> = sqlx::query_as(
            "SELECT name, percentage FROM partners WHERE event_id = ? ORDER BY position",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let entries: Vec<EntryRow> =
            sqlx::query_as("SELECT payload FROM event_entries WHERE event_id = ? ORDER BY position")
                .bind(&row.id)
                .fetch_all(&self.pool)
                .await?;

        let event_data = entries
            .into_iter()
            .map(|r| serde_json::from_str::<EventData>(&r.payload))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Corrupt entry payload for event {}", row.id))?;

        Ok(Event {
            day_of_week: row
                .day_of_week
                .parse::<DayOfWeek>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Event {}", row.id))?,
            date: NaiveDate::parse_from_str(&row.date, constants::DATE_FORMAT)
                .with_context(|| format!("Invalid date for event {}", row.id))?,
            deal_type: row
                .deal_type
                .parse::<DealType>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Event {}", row.id))?,
            payment_terms: row
                .payment_terms
                .parse::<PaymentTerms>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Event {}", row.id))?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            commission_brackets: brackets
                .into_iter()
                .map(|b| CommissionBracket {
                    percentage: b.percentage,
                    from_amount: b.from_amount,
                    to_amount: b.to_amount,
                })
                .collect(),
            partners: partners
                .into_iter()
                .map(|p| Partner {
                    name: p.name,
                    percentage: p.percentage,
                })
                .collect(),
            event_data,
            id: row.id,
            owner: row.owner,
            name: row.name,
            time: row.time,
            venue_name: row.venue_name,
            location: row.location,
            is_paid_from_each_bracket: row.is_paid_from_each_bracket,
            rumba_percentage: row.rumba_percentage,
            entrance_percentage: row.entrance_percentage,
        })
    }

    /// Number of stored events and entries
    pub async fn stats(&self) -> Result<StoreStats> {
        let events: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;
        let entries: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM event_entries")
            .fetch_one(&self.pool)
            .await?;

        Ok(StoreStats {
            events: events.0 as u64,
            entries: entries.0 as u64,
        })
    }
}

#[async_trait]
impl EventRepository for SqliteStore {
    async fn load_event(&self, id: &str) -> Result<Option<Event>> {
        let row: Option<EventRow> = sqlx::query_as(
            "SELECT id, owner, name, day_of_week, date, time, venue_name, location, deal_type,
                    is_paid_from_each_bracket, rumba_percentage, entrance_percentage,
                    payment_terms, created_at, updated_at
             FROM events
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn save_event(&self, event: &Event) -> Result<()> {
        event
            .validate()
            .with_context(|| format!("Refusing to save event '{}'", event.name))?;
        for (index, entry) in event.event_data.iter().enumerate() {
            entry
                .validate(event.deal_type)
                .with_context(|| format!("Refusing to save entry {} of event '{}'", index, event.name))?;
        }

        let mut tx = self.pool.begin().await?;

        let stored_owner: Option<String> = sqlx::query_scalar("SELECT owner FROM events WHERE id = ?")
            .bind(&event.id)
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(stored_owner) = stored_owner {
            if stored_owner != event.owner {
                bail!("Event {} belongs to another user", event.id);
            }
        }

        sqlx::query(
            "INSERT INTO events
             (id, owner, name, day_of_week, date, time, venue_name, location, deal_type,
              is_paid_from_each_bracket, rumba_percentage, entrance_percentage, payment_terms,
              created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                owner = excluded.owner,
                name = excluded.name,
                day_of_week = excluded.day_of_week,
                date = excluded.date,
                time = excluded.time,
                venue_name = excluded.venue_name,
                location = excluded.location,
                deal_type = excluded.deal_type,
                is_paid_from_each_bracket = excluded.is_paid_from_each_bracket,
                rumba_percentage = excluded.rumba_percentage,
                entrance_percentage = excluded.entrance_percentage,
                payment_terms = excluded.payment_terms,
                updated_at = ?",
        )
        .bind(&event.id)
        .bind(&event.owner)
        .bind(&event.name)
        .bind(event.day_of_week.to_string())
        .bind(event.date.format(constants::DATE_FORMAT).to_string())
        .bind(&event.time)
        .bind(&event.venue_name)
        .bind(&event.location)
        .bind(event.deal_type.as_str())
        .bind(event.is_paid_from_each_bracket)
        .bind(event.rumba_percentage)
        .bind(event.entrance_percentage)
        .bind(event.payment_terms.as_str())
        .bind(event.created_at.to_rfc3339())
        .bind(event.updated_at.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        // Child rows are replaced, never patched
        for table in ["commission_brackets", "partners", "event_entries"] {
            sqlx::query(&format!("DELETE FROM {} WHERE event_id = ?", table))
                .bind(&event.id)
                .execute(&mut *tx)
                .await?;
        }

        for (position, bracket) in event.commission_brackets.iter().enumerate() {
            sqlx::query(
                "INSERT INTO commission_brackets (event_id, position, percentage, from_amount, to_amount)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&event.id)
            .bind(position as i64)
            .bind(bracket.percentage)
            .bind(bracket.from_amount)
            .bind(bracket.to_amount)
            .execute(&mut *tx)
            .await?;
        }

        for (position, partner) in event.partners.iter().enumerate() {
            sqlx::query("INSERT INTO partners (event_id, position, name, percentage) VALUES (?, ?, ?, ?)")
                .bind(&event.id)
                .bind(position as i64)
                .bind(&partner.name)
                .bind(partner.percentage)
                .execute(&mut *tx)
                .await?;
        }

        for (position, entry) in event.event_data.iter().enumerate() {
            let payload = serde_json::to_string(entry)?;
            sqlx::query("INSERT INTO event_entries (event_id, position, date, payload) VALUES (?, ?, ?, ?)")
                .bind(&event.id)
                .bind(position as i64)
                .bind(entry.date.format(constants::DATE_FORMAT).to_string())
                .bind(payload)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            event_id = %event.id,
            brackets = event.commission_brackets.len(),
            entries = event.event_data.len(),
            "saved event"
        );
        Ok(())
    }

    async fn list_events(&self, owner: &str) -> Result<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT id, owner, name, day_of_week, date, time, venue_name, location, deal_type,
                    is_paid_from_each_bracket, rumba_percentage, entrance_percentage,
                    payment_terms, created_at, updated_at
             FROM events
             WHERE owner = ?
             ORDER BY date, created_at",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            events.push(self.hydrate(row).await?);
        }
        Ok(events)
    }

    async fn delete_event(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Helper functions
// =============================================================================

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid timestamp '{}'", value))?
        .with_timezone(&Utc))
}

/// Export events to a JSON file (for backup)
pub fn export_events_json(events: &[Event], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(events)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Load events from a JSON export
pub fn import_events_json(path: &Path) -> Result<Vec<Event>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse events from {}", path.display()))
}

/// Result of importing an export file
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub imported: usize,
    /// (event name, reason) for every event left out
    pub skipped: Vec<(String, String)>,
}

/// Save exported events under `owner`
///
/// Every event is claimed for `owner`, whatever the file says. An event whose
/// id is already stored for another user is skipped rather than taken over.
pub async fn import_events<R: EventRepository + ?Sized>(
    repo: &R,
    owner: &str,
    events: Vec<Event>,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for mut event in events {
        if let Some(existing) = repo.load_event(&event.id).await? {
            if existing.owner != owner {
                tracing::warn!(event_id = %event.id, "skipping event owned by another user");
                summary.skipped.push((event.name, "id belongs to another user".to_string()));
                continue;
            }
        }

        event.owner = owner.to_string();
        match repo.save_event(&event).await {
            Ok(()) => summary.imported += 1,
            Err(e) => {
                tracing::warn!(event = %event.name, "skipping: {:#}", e);
                summary.skipped.push((event.name, format!("{:#}", e)));
            }
        }
    }

    Ok(summary)
}

/// Store statistics
#[derive(Debug)]
pub struct StoreStats {
    pub events: u64,
    pub entries: u64,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} events, {} entries", self.events, self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Promoter;

    fn sample_event(owner: &str, name: &str) -> Event {
        let now = Utc::now();
        Event {
            id: uuid::Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
            day_of_week: DayOfWeek::Saturday,
            date: NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
            time: "23:00".to_string(),
            venue_name: "Club Sol".to_string(),
            location: "Miami".to_string(),
            deal_type: DealType::RevenueShareAndEntrance,
            commission_brackets: vec![
                CommissionBracket::new(15.0, 0.0, Some(40_000.0)),
                CommissionBracket::new(20.0, 40_000.0, None),
            ],
            is_paid_from_each_bracket: true,
            rumba_percentage: 10.0,
            entrance_percentage: Some(50.0),
            payment_terms: PaymentTerms::Weekly,
            partners: vec![Partner {
                name: "Ana".to_string(),
                percentage: 10.0,
            }],
            event_data: vec![EventData {
                date: NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
                total_revenue: 50_000.0,
                entrance_revenue: Some(2000.0),
                promoters: vec![Promoter {
                    name: "Leo".to_string(),
                    commission: 200.0,
                }],
                ..Default::default()
            }],
            created_at: now,
            updated_at: now,
        }
    }

    async fn open_temp() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open_in_dir(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let (_dir, store) = open_temp().await;
        let event = sample_event("alice", "Salsa Saturdays");
        store.save_event(&event).await.unwrap();

        let loaded = store.load_event(&event.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, event.name);
        assert_eq!(loaded.commission_brackets, event.commission_brackets);
        assert_eq!(loaded.partners, event.partners);
        assert_eq!(loaded.event_data, event.event_data);
        assert_eq!(loaded.deal_type, DealType::RevenueShareAndEntrance);
        assert_eq!(loaded.payment_terms, PaymentTerms::Weekly);
        assert_eq!(loaded.entrance_percentage, Some(50.0));
        assert!(loaded.is_paid_from_each_bracket);
        assert_eq!(loaded.created_at.timestamp(), event.created_at.timestamp());
    }

    #[tokio::test]
    async fn test_load_missing_event() {
        let (_dir, store) = open_temp().await;
        assert!(store.load_event("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_children() {
        let (_dir, store) = open_temp().await;
        let mut event = sample_event("alice", "Salsa Saturdays");
        store.save_event(&event).await.unwrap();

        event.commission_brackets = vec![CommissionBracket::new(12.0, 0.0, None)];
        event.partners.clear();
        event.event_data.push(EventData {
            date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            total_revenue: 1000.0,
            entrance_revenue: Some(100.0),
            ..Default::default()
        });
        store.save_event(&event).await.unwrap();

        let loaded = store.load_event(&event.id).await.unwrap().unwrap();
        assert_eq!(loaded.commission_brackets.len(), 1);
        assert!(loaded.partners.is_empty());
        assert_eq!(loaded.event_data.len(), 2);
        assert_eq!(loaded.event_data[1].total_revenue, 1000.0);
        assert!(loaded.updated_at >= event.updated_at);
        assert_eq!(loaded.created_at.timestamp(), event.created_at.timestamp());

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.events, 1);
        assert_eq!(stats.entries, 2);
    }

    #[tokio::test]
    async fn test_save_rejects_malformed_brackets() {
        let (_dir, store) = open_temp().await;
        let mut event = sample_event("alice", "Gapped");
        event.commission_brackets[1].from_amount = 45_000.0;

        assert!(store.save_event(&event).await.is_err());
        assert!(store.load_event(&event.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let (_dir, store) = open_temp().await;
        store.save_event(&sample_event("alice", "A1")).await.unwrap();
        store.save_event(&sample_event("alice", "A2")).await.unwrap();
        store.save_event(&sample_event("bob", "B1")).await.unwrap();

        assert_eq!(store.list_events("alice").await.unwrap().len(), 2);
        assert_eq!(store.list_events("bob").await.unwrap().len(), 1);
        assert!(store.list_events("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_refuses_event_owned_by_another_user() {
        let (_dir, store) = open_temp().await;
        let event = sample_event("bob", "Bob's Night");
        store.save_event(&event).await.unwrap();

        let mut taken = event.clone();
        taken.owner = "alice".to_string();
        taken.name = "Alice's Night".to_string();
        assert!(store.save_event(&taken).await.is_err());

        let bobs = store.list_events("bob").await.unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].name, "Bob's Night");
        assert_eq!(bobs[0].event_data.len(), 1);
        assert!(store.list_events("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_claims_events_for_current_user() {
        let (_dir, store) = open_temp().await;
        let bobs_live = sample_event("bob", "Bob's Live Night");
        store.save_event(&bobs_live).await.unwrap();

        // An export written by bob, holding one new event and one id already in use
        let exported = vec![sample_event("bob", "Shared Export"), bobs_live.clone()];
        let summary = import_events(&store, "alice", exported).await.unwrap();

        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].0, "Bob's Live Night");

        let alices = store.list_events("alice").await.unwrap();
        assert_eq!(alices.len(), 1);
        assert_eq!(alices[0].name, "Shared Export");
        assert_eq!(alices[0].owner, "alice");

        let bobs = store.list_events("bob").await.unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].id, bobs_live.id);
    }

    #[tokio::test]
    async fn test_import_updates_own_events() {
        let (_dir, store) = open_temp().await;
        let mut event = sample_event("alice", "Before");
        store.save_event(&event).await.unwrap();

        event.name = "After".to_string();
        let summary = import_events(&store, "alice", vec![event.clone()]).await.unwrap();
        assert_eq!(summary.imported, 1);
        assert!(summary.skipped.is_empty());
        assert_eq!(store.load_event(&event.id).await.unwrap().unwrap().name, "After");
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let (_dir, store) = open_temp().await;
        let event = sample_event("alice", "Short Lived");
        store.save_event(&event).await.unwrap();

        assert!(store.delete_event(&event.id).await.unwrap());
        assert!(!store.delete_event(&event.id).await.unwrap());

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.events, 0);
        assert_eq!(stats.entries, 0);
    }

    #[test]
    fn test_json_export_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        let events = vec![sample_event("alice", "Exported")];

        export_events_json(&events, &path).unwrap();
        let imported = import_events_json(&path).unwrap();
        assert_eq!(imported, events);
    }
}
