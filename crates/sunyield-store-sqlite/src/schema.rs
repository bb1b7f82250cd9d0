//! SQL schema for the sunyield SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for later migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS sites (
    site_id               INTEGER PRIMARY KEY,
    name                  TEXT    NOT NULL UNIQUE,
    kind                  TEXT    NOT NULL,   -- 'physical' | 'aggregate'
    installed_capacity_kw REAL    NOT NULL,
    panel_count           INTEGER NOT NULL
);

-- Site-independent daily observations, written by the weather import.
CREATE TABLE IF NOT EXISTS weather_daily (
    date                          TEXT PRIMARY KEY,   -- YYYY-MM-DD
    sunrise                       TEXT,               -- HH:MM:SS
    sunset                        TEXT,
    sunshine_duration_seconds     REAL,
    daylight_duration_seconds     REAL,
    min_temperature_c             REAL,
    avg_temperature_c             REAL,
    max_temperature_c             REAL,
    avg_solar_irradiance_wm2      REAL,
    avg_relative_humidity_percent REAL,
    avg_cloud_cover_percent       REAL,
    avg_wind_speed_kmh            REAL,
    rainfall_mm                   REAL
);

CREATE TABLE IF NOT EXISTS weather_monthly (
    year                          INTEGER NOT NULL,
    month                         INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    day_count                     INTEGER NOT NULL,
    avg_sunshine_duration_seconds REAL,
    avg_daylight_duration_seconds REAL,
    min_temperature_c             REAL,
    avg_temperature_c             REAL,
    max_temperature_c             REAL,
    avg_solar_irradiance_wm2      REAL,
    avg_relative_humidity_percent REAL,
    avg_cloud_cover_percent       REAL,
    avg_wind_speed_kmh            REAL,
    total_rainfall_mm             REAL,
    UNIQUE (year, month)
);

-- Base facts. Each value column has its own writer and is upserted alone.
CREATE TABLE IF NOT EXISTS monthly_generation (
    year            INTEGER NOT NULL,
    month           INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    site_id         INTEGER NOT NULL REFERENCES sites(site_id),
    actual_kwh      REAL,
    theoretical_kwh REAL,
    predicted_kwh   REAL,
    UNIQUE (year, month, site_id)
);

-- Derived tables. Cleared and rebuilt wholesale by the pipeline.
CREATE TABLE IF NOT EXISTS monthly_performance (
    year              INTEGER NOT NULL,
    month             INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    site_id           INTEGER NOT NULL REFERENCES sites(site_id),
    performance_ratio REAL    NOT NULL,
    capacity_factor   REAL    NOT NULL,
    output_per_panel  REAL    NOT NULL,
    UNIQUE (year, month, site_id)
);

CREATE TABLE IF NOT EXISTS yearly_performance (
    year              INTEGER NOT NULL,
    site_id           INTEGER NOT NULL REFERENCES sites(site_id),
    performance_ratio REAL    NOT NULL,
    capacity_factor   REAL    NOT NULL,
    output_per_panel  REAL    NOT NULL,
    UNIQUE (year, site_id)
);

CREATE TABLE IF NOT EXISTS lifetime_performance (
    site_id           INTEGER NOT NULL REFERENCES sites(site_id),
    start_year        INTEGER NOT NULL,
    end_year          INTEGER NOT NULL,
    performance_ratio REAL    NOT NULL,
    capacity_factor   REAL    NOT NULL,
    output_per_panel  REAL    NOT NULL,
    UNIQUE (site_id),
    CHECK  (start_year <= end_year)
);

CREATE INDEX IF NOT EXISTS monthly_generation_site_idx ON monthly_generation(site_id);

PRAGMA user_version = 1;
";
