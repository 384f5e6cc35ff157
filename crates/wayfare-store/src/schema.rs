//! Database schema SQL.

/// Core tables: flight and hotel records, watch subscriptions, sessions.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS flights (
    id TEXT PRIMARY KEY,
    waid TEXT NOT NULL,
    origin TEXT,
    dest TEXT NOT NULL,
    depart_date TEXT NOT NULL,
    depart_time TEXT,
    arrival_date TEXT,
    arrival_time TEXT,
    airline TEXT,
    flight_number TEXT,
    pnr TEXT,
    passengers TEXT,
    source_doc_id TEXT,
    raw_excerpt TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_flights_waid_date ON flights(waid, depart_date);

CREATE TABLE IF NOT EXISTS hotels (
    id TEXT PRIMARY KEY,
    waid TEXT NOT NULL,
    hotel_name TEXT,
    city TEXT,
    checkin_date TEXT NOT NULL,
    checkout_date TEXT,
    address TEXT,
    source_doc_id TEXT,
    raw_excerpt TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_hotels_waid_date ON hotels(waid, checkin_date);

CREATE TABLE IF NOT EXISTS flight_watch (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    waid TEXT NOT NULL,
    flight_code TEXT NOT NULL,
    flight_date TEXT,
    provider TEXT NOT NULL DEFAULT 'aviationstack',
    last_snapshot TEXT,
    last_hash TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_watch_waid ON flight_watch(waid);

CREATE TABLE IF NOT EXISTS sessions (
    waid TEXT PRIMARY KEY,
    history_json TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
