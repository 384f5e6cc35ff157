//! SQLite-backed store for flights, hotels, watch subscriptions, and
//! sessions. One connection behind a mutex; every insert is a single
//! statement, so row-level atomicity holds without explicit transactions.

use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::schema::SCHEMA_SQL;
use crate::types::*;
use wayfare_core::{new_record_id, Error, Result};

/// SQLite store. `db_dir` is the data directory; the file is
/// `db_dir/wayfare.db`.
pub struct TravelStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl TravelStore {
    /// Open or create the store.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("wayfare.db");

        let conn = Connection::open(&db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let counts = store.counts()?;
        info!(
            "TravelStore initialized: {} flights, {} hotels, {} watches, path={}",
            counts.flights,
            counts.hotels,
            counts.watches,
            store.db_path.display()
        );

        Ok(store)
    }

    // ---------------------------------------------------------------
    // Flight records
    // ---------------------------------------------------------------

    /// Insert a flight record. Returns the stored row.
    pub fn insert_flight(&self, new: NewFlight) -> Result<FlightRecord> {
        let id = new_record_id();
        let created_at = Utc::now().to_rfc3339();

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO flights \
             (id, waid, origin, dest, depart_date, depart_time, arrival_date, arrival_time, \
              airline, flight_number, pnr, passengers, source_doc_id, raw_excerpt, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![
            id,
            new.waid,
            new.origin,
            new.dest,
            new.depart_date,
            new.depart_time,
            new.arrival_date,
            new.arrival_time,
            new.airline,
            new.flight_number,
            new.pnr,
            new.passengers,
            new.source_doc_id,
            new.raw_excerpt,
            created_at,
        ])
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(FlightRecord {
            id,
            waid: new.waid,
            origin: new.origin,
            dest: new.dest,
            depart_date: new.depart_date,
            depart_time: new.depart_time,
            arrival_date: new.arrival_date,
            arrival_time: new.arrival_time,
            airline: new.airline,
            flight_number: new.flight_number,
            pnr: new.pnr,
            passengers: new.passengers,
            source_doc_id: new.source_doc_id,
            raw_excerpt: new.raw_excerpt,
            created_at,
        })
    }

    /// Flights for an owner departing between today and today+`days_ahead`
    /// (no upper bound when `days_ahead` is `None`), soonest first. A flight
    /// with no departure time sorts after timed flights on the same date.
    pub fn upcoming_flights(
        &self,
        waid: &str,
        days_ahead: Option<i64>,
        limit: usize,
    ) -> Result<Vec<FlightRecord>> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let until = days_ahead
            .map(|d| (Utc::now() + Duration::days(d)).format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "9999-12-31".to_string());

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT * FROM flights \
                 WHERE waid = ?1 AND depart_date BETWEEN ?2 AND ?3 \
                 ORDER BY depart_date ASC, IFNULL(depart_time, '23:59') ASC \
                 LIMIT ?4",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![waid, today, until, limit as i64], |row| {
                Ok(Self::row_to_flight(row))
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // ---------------------------------------------------------------
    // Hotel records
    // ---------------------------------------------------------------

    /// Insert a hotel record. Returns the stored row.
    pub fn insert_hotel(&self, new: NewHotel) -> Result<HotelRecord> {
        let id = new_record_id();
        let created_at = Utc::now().to_rfc3339();

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO hotels \
             (id, waid, hotel_name, city, checkin_date, checkout_date, address, \
              source_doc_id, raw_excerpt, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![
            id,
            new.waid,
            new.hotel_name,
            new.city,
            new.checkin_date,
            new.checkout_date,
            new.address,
            new.source_doc_id,
            new.raw_excerpt,
            created_at,
        ])
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(HotelRecord {
            id,
            waid: new.waid,
            hotel_name: new.hotel_name,
            city: new.city,
            checkin_date: new.checkin_date,
            checkout_date: new.checkout_date,
            address: new.address,
            source_doc_id: new.source_doc_id,
            raw_excerpt: new.raw_excerpt,
            created_at,
        })
    }

    // ---------------------------------------------------------------
    // Watch registry
    // ---------------------------------------------------------------

    /// Append a watch subscription with a null snapshot/hash. Duplicate
    /// (owner, code) rows are allowed; cancellation removes them all.
    pub fn add_watch(
        &self,
        waid: &str,
        flight_code: &str,
        flight_date: Option<&str>,
    ) -> Result<WatchSubscription> {
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO flight_watch (waid, flight_code, flight_date) VALUES (?1, ?2, ?3)",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![waid, flight_code, flight_date])
        .map_err(|e| Error::Database(e.to_string()))?;
        let id = conn.last_insert_rowid();

        let sub = conn
            .prepare_cached("SELECT * FROM flight_watch WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], |row| Ok(Self::row_to_watch(row)))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(sub)
    }

    /// Remove subscriptions for an owner: those matching `flight_code`, or
    /// all of them when no code is given. Returns the removed row count.
    pub fn remove_watches(&self, waid: &str, flight_code: Option<&str>) -> Result<usize> {
        let conn = self.conn.lock();
        let count = match flight_code {
            Some(code) => conn
                .execute(
                    "DELETE FROM flight_watch WHERE waid = ?1 AND flight_code = ?2",
                    params![waid, code],
                )
                .map_err(|e| Error::Database(e.to_string()))?,
            None => conn
                .execute("DELETE FROM flight_watch WHERE waid = ?1", params![waid])
                .map_err(|e| Error::Database(e.to_string()))?,
        };
        Ok(count)
    }

    /// Subscriptions for one owner, most recently created first.
    pub fn list_watches(&self, waid: &str) -> Result<Vec<WatchSubscription>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM flight_watch WHERE waid = ?1 ORDER BY id DESC")
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![waid], |row| Ok(Self::row_to_watch(row)))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Every subscription, in registry order (newest first).
    pub fn all_watches(&self) -> Result<Vec<WatchSubscription>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM flight_watch ORDER BY id DESC")
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok(Self::row_to_watch(row)))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Re-read the stored hash for one subscription (None when the row is
    /// gone or has never been polled).
    pub fn watch_hash(&self, id: i64) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let hash: Option<Option<String>> = conn
            .prepare_cached("SELECT last_hash FROM flight_watch WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], |row| row.get(0))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(hash.flatten())
    }

    /// Persist a new snapshot and hash for a subscription, bumping its
    /// updated timestamp. Returns false when the row no longer exists.
    pub fn update_watch_snapshot(&self, id: i64, snapshot: &str, hash: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .prepare_cached(
                "UPDATE flight_watch \
                 SET last_snapshot = ?1, last_hash = ?2, updated_at = CURRENT_TIMESTAMP \
                 WHERE id = ?3",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .execute(params![snapshot, hash, id])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    // ---------------------------------------------------------------
    // Sessions
    // ---------------------------------------------------------------

    /// Load a user's conversation history (empty when none saved).
    pub fn load_session(&self, waid: &str) -> Result<Vec<SessionTurn>> {
        let conn = self.conn.lock();
        let json: Option<String> = conn
            .prepare_cached("SELECT history_json FROM sessions WHERE waid = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![waid], |row| row.get(0))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(json
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default())
    }

    /// Persist a user's conversation history, replacing any prior state.
    pub fn save_session(&self, waid: &str, turns: &[SessionTurn]) -> Result<()> {
        let json = serde_json::to_string(turns)?;
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO sessions (waid, history_json, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(waid) DO UPDATE SET \
             history_json = excluded.history_json, updated_at = excluded.updated_at",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![waid, json, now])
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    /// Discard a user's saved session.
    pub fn clear_session(&self, waid: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute("DELETE FROM sessions WHERE waid = ?1", params![waid])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    // ---------------------------------------------------------------
    // Counters
    // ---------------------------------------------------------------

    /// Row counts for the status endpoint.
    pub fn counts(&self) -> Result<StoreCounts> {
        let conn = self.conn.lock();
        let count = |table: &str| -> Result<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .map_err(|e| Error::Database(e.to_string()))
        };
        Ok(StoreCounts {
            flights: count("flights")?,
            hotels: count("hotels")?,
            watches: count("flight_watch")?,
        })
    }

    // ---------------------------------------------------------------
    // Row mapping
    // ---------------------------------------------------------------

    fn row_to_flight(row: &rusqlite::Row<'_>) -> FlightRecord {
        FlightRecord {
            id: row.get("id").unwrap_or_default(),
            waid: row.get("waid").unwrap_or_default(),
            origin: row.get("origin").ok().flatten(),
            dest: row.get("dest").unwrap_or_default(),
            depart_date: row.get("depart_date").unwrap_or_default(),
            depart_time: row.get("depart_time").ok().flatten(),
            arrival_date: row.get("arrival_date").ok().flatten(),
            arrival_time: row.get("arrival_time").ok().flatten(),
            airline: row.get("airline").ok().flatten(),
            flight_number: row.get("flight_number").ok().flatten(),
            pnr: row.get("pnr").ok().flatten(),
            passengers: row.get("passengers").ok().flatten(),
            source_doc_id: row.get("source_doc_id").ok().flatten(),
            raw_excerpt: row.get("raw_excerpt").ok().flatten(),
            created_at: row.get("created_at").unwrap_or_default(),
        }
    }

    fn row_to_watch(row: &rusqlite::Row<'_>) -> WatchSubscription {
        WatchSubscription {
            id: row.get("id").unwrap_or(0),
            waid: row.get("waid").unwrap_or_default(),
            flight_code: row.get("flight_code").unwrap_or_default(),
            flight_date: row.get("flight_date").ok().flatten(),
            provider: row.get("provider").unwrap_or_default(),
            last_snapshot: row.get("last_snapshot").ok().flatten(),
            last_hash: row.get("last_hash").ok().flatten(),
            created_at: row.get("created_at").unwrap_or_default(),
            updated_at: row.get("updated_at").unwrap_or_default(),
        }
    }
}
