//! Persistence layer.
//!
//! One SQLite table keyed by (auction_date, tenor_days). The store only
//! grows: a re-fetch for the same date replaces that date's quotes,
//! nothing is ever deleted. Consumers read "all quotes at the newest
//! date"; an empty store yields the built-in fallback snapshot so the
//! calculators always have something to work with.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::types::{FetchError, YieldCurveSnapshot, YieldQuote};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS yield_quotes (
        auction_date  TEXT    NOT NULL,
        tenor_days    INTEGER NOT NULL,
        yield_percent REAL    NOT NULL,
        updated_at    TEXT    NOT NULL,
        PRIMARY KEY (auction_date, tenor_days)
    )";

/// Durable store of yield-curve snapshots, one per calendar date.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Open (or create) the database file and ensure the schema exists.
    pub async fn connect(path: &str) -> Result<Self, FetchError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| FetchError::Unexpected(format!("Invalid database path {path}: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| FetchError::Unexpected(format!("Failed to open database {path}: {e}")))?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| FetchError::Unexpected(format!("Failed to create schema: {e}")))?;

        info!(path, "Repository ready");
        Ok(Self { pool })
    }

    /// An in-memory store for tests and dry runs.
    pub async fn in_memory() -> Result<Self, FetchError> {
        Self::connect("sqlite::memory:").await
    }

    /// Write every quote of the snapshot, replacing any existing quote
    /// with the same (auction_date, tenor_days). One transaction: a
    /// reader never observes a partially-written curve.
    pub async fn upsert(&self, snapshot: &YieldCurveSnapshot) -> Result<(), FetchError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| FetchError::Unexpected(format!("begin transaction failed: {e}")))?;

        let now = Utc::now().to_rfc3339();
        for quote in &snapshot.quotes {
            sqlx::query(
                "INSERT INTO yield_quotes (auction_date, tenor_days, yield_percent, updated_at) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (auction_date, tenor_days) DO UPDATE \
                 SET yield_percent = excluded.yield_percent, updated_at = excluded.updated_at",
            )
            .bind(quote.auction_date.to_string())
            .bind(quote.tenor_days as i64)
            .bind(quote.yield_percent)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| FetchError::Unexpected(format!("insert yield quote failed: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| FetchError::Unexpected(format!("commit transaction failed: {e}")))?;

        debug!(
            auction_date = %snapshot.auction_date,
            quotes = snapshot.quotes.len(),
            "Snapshot upserted"
        );
        Ok(())
    }

    /// All quotes sharing the newest stored auction date, ascending by
    /// tenor. A never-written store returns the fallback snapshot, and
    /// so does a store whose rows cannot be read back: the consumers
    /// always get something to display, and the corrupt rows stay in
    /// place for inspection.
    pub async fn read_latest(&self) -> Result<YieldCurveSnapshot, FetchError> {
        let rows = match sqlx::query(
            "SELECT auction_date, tenor_days, yield_percent FROM yield_quotes \
             WHERE auction_date = (SELECT MAX(auction_date) FROM yield_quotes) \
             ORDER BY tenor_days ASC",
        )
        .fetch_all(&self.pool)
        .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Store unreadable, serving the built-in fallback snapshot");
                return Ok(YieldCurveSnapshot::fallback());
            }
        };

        if rows.is_empty() {
            info!("Store is empty, serving the built-in fallback snapshot");
            return Ok(YieldCurveSnapshot::fallback());
        }

        let mut quotes = Vec::with_capacity(rows.len());
        let mut auction_date = None;
        for row in rows {
            let date_str: String = row.get("auction_date");
            let date = match NaiveDate::parse_from_str(&date_str, "%Y-%m-%d") {
                Ok(date) => date,
                Err(e) => {
                    warn!(
                        date = %date_str,
                        error = %e,
                        "Stored date unparsable, serving the built-in fallback snapshot"
                    );
                    return Ok(YieldCurveSnapshot::fallback());
                }
            };
            auction_date = Some(date);
            quotes.push(YieldQuote {
                tenor_days: row.get::<i64, _>("tenor_days") as u32,
                yield_percent: row.get("yield_percent"),
                auction_date: date,
            });
        }

        Ok(YieldCurveSnapshot {
            // rows is non-empty here, so the date is always set
            auction_date: auction_date.unwrap_or_else(|| Utc::now().date_naive()),
            quotes,
        })
    }

    /// When the store was last written, for display. None if never.
    pub async fn last_modified(&self) -> Result<Option<DateTime<Utc>>, FetchError> {
        let row = sqlx::query("SELECT MAX(updated_at) AS ts FROM yield_quotes")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| FetchError::Unexpected(format!("read last-modified failed: {e}")))?;

        let ts: Option<String> = row.get("ts");
        match ts {
            Some(s) => {
                let parsed = DateTime::parse_from_rfc3339(&s).map_err(|e| {
                    FetchError::Unexpected(format!("stored timestamp '{s}' unparsable: {e}"))
                })?;
                Ok(Some(parsed.with_timezone(&Utc)))
            }
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
