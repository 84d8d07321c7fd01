//! SQLite dataset layer — observations and stations.
//!
//! The dataset is an externally provided SQLite file with two tables,
//! `measurement` and `station`, treated as immutable for the lifetime of
//! the process. The store holds only the database path and opens a fresh
//! read-only connection per query, so no session handle is ever shared
//! across concurrent requests.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OpenFlags};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::window;

/// Columns the service requires on each table, checked once at startup.
const MEASUREMENT_COLUMNS: &[&str] = &["station", "date", "prcp", "tobs"];
const STATION_COLUMNS: &[&str] = &["station", "name"];

/// Errors from dataset operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("schema validation failed: {0}")]
    Schema(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A precipitation reading. Duplicate dates across stations are
/// preserved; collapsing them into a date-keyed map would silently drop
/// readings.
#[derive(Debug, Clone, Serialize)]
pub struct PrecipitationReading {
    pub date: String,
    pub prcp: Option<f64>,
}

/// A temperature observation row.
#[derive(Debug, Clone, Serialize)]
pub struct TobsRecord {
    pub station: String,
    pub date: String,
    pub tobs: f64,
}

/// Min/avg/max of `tobs` over a date-filtered set. All fields are `None`
/// when no rows match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempStats {
    pub tmin: Option<f64>,
    pub tavg: Option<f64>,
    pub tmax: Option<f64>,
}

/// The trailing-year window: its cutoff date and the qualifying rows.
#[derive(Debug, Clone)]
pub struct RecentYearTobs {
    pub cutoff: NaiveDate,
    pub rows: Vec<TobsRecord>,
}

/// Read-only access to the climate dataset.
#[derive(Debug)]
pub struct ClimateStore {
    db_path: PathBuf,
}

impl ClimateStore {
    /// Open the dataset at the given path and validate its schema.
    ///
    /// Fails fast when the file cannot be opened or either table is
    /// missing a required column.
    pub fn open(path: &Path) -> Result<Self> {
        let store = Self {
            db_path: path.to_path_buf(),
        };
        store.validate_schema()?;
        Ok(store)
    }

    /// One read-only connection per query.
    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    /// Verify both tables exist with the columns the queries rely on.
    fn validate_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        for (table, required) in [
            ("measurement", MEASUREMENT_COLUMNS),
            ("station", STATION_COLUMNS),
        ] {
            let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
            let columns = stmt
                .query_map(params![table], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            if columns.is_empty() {
                return Err(StoreError::Schema(format!("missing table '{table}'")));
            }
            for col in required {
                if !columns.iter().any(|c| c == col) {
                    return Err(StoreError::Schema(format!(
                        "table '{table}' is missing column '{col}'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Cheap reachability probe for the health endpoint.
    pub fn ping(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    /// Row counts for startup logging: (stations, observations).
    pub fn counts(&self) -> Result<(u64, u64)> {
        let conn = self.connect()?;
        let stations: u64 = conn.query_row("SELECT COUNT(*) FROM station", [], |r| r.get(0))?;
        let observations: u64 =
            conn.query_row("SELECT COUNT(*) FROM measurement", [], |r| r.get(0))?;
        Ok((stations, observations))
    }

    /// Every precipitation reading, duplicates preserved, in data-source
    /// order.
    pub fn precipitation(&self) -> Result<Vec<PrecipitationReading>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT date, prcp FROM measurement")?;
        let rows = stmt.query_map([], |row| {
            Ok(PrecipitationReading {
                date: row.get(0)?,
                prcp: row.get(1)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    /// Station id → display name, one entry per distinct station.
    pub fn stations(&self) -> Result<BTreeMap<String, String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT station, name FROM station")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut stations = BTreeMap::new();
        for row in rows {
            let (id, name) = row?;
            stations.insert(id, name);
        }
        Ok(stations)
    }

    /// Temperature observations in the trailing-year window: rows with a
    /// date strictly greater than (max date − 365 days).
    ///
    /// Returns `Ok(None)` for an empty dataset, where no window exists.
    pub fn recent_year_tobs(&self) -> Result<Option<RecentYearTobs>> {
        let conn = self.connect()?;

        let mut stmt = conn.prepare("SELECT date FROM measurement")?;
        let dates = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Dates that don't parse as ISO days can't anchor the window.
        let parsed = dates
            .iter()
            .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        let cutoff = match window::recent_year_cutoff(parsed) {
            Some(cutoff) => cutoff,
            None => return Ok(None),
        };

        let mut stmt = conn.prepare(
            "SELECT station, date, tobs FROM measurement WHERE date > ?1",
        )?;
        let rows = stmt
            .query_map(params![cutoff.format("%Y-%m-%d").to_string()], |row| {
                Ok(TobsRecord {
                    station: row.get(0)?,
                    date: row.get(1)?,
                    tobs: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(RecentYearTobs { cutoff, rows }))
    }

    /// Min/avg/max of `tobs` for dates in `[start, end]`, or `[start, ∞)`
    /// when `end` is `None`. Bounds are inclusive; dates are compared as
    /// ISO text, so a malformed bound simply matches no rows and yields
    /// all-null stats.
    pub fn temp_stats(&self, start: &str, end: Option<&str>) -> Result<TempStats> {
        let conn = self.connect()?;
        let stats = match end {
            Some(end) => conn.query_row(
                "SELECT MIN(tobs), AVG(tobs), MAX(tobs) FROM measurement \
                 WHERE date >= ?1 AND date <= ?2",
                params![start, end],
                |row| {
                    Ok(TempStats {
                        tmin: row.get(0)?,
                        tavg: row.get(1)?,
                        tmax: row.get(2)?,
                    })
                },
            )?,
            None => conn.query_row(
                "SELECT MIN(tobs), AVG(tobs), MAX(tobs) FROM measurement \
                 WHERE date >= ?1",
                params![start],
                |row| {
                    Ok(TempStats {
                        tmin: row.get(0)?,
                        tavg: row.get(1)?,
                        tmax: row.get(2)?,
                    })
                },
            )?,
        };
        Ok(stats)
    }
}
