//! Relational store on SQLite.
//!
//! ## Tables
//!
//! ```text
//! employer ──< job            (job.employer_code)
//! employer ──< review         (review.employer_code, cascades)
//! job >──< tag                (job_tag)
//! job >──< address            (job_address)
//! employer >──< tag           (employer_tag)
//! employer >──< address       (employer_address)
//! ```
//!
//! Link rows cascade when either side is deleted.

mod queries;
mod rows;
mod write;

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::Result;

pub use queries::{EmployerJobCount, JobView, TableCounts, TagCount};
pub use rows::{EmployerRow, JobRow};
pub use write::{UpdateReport, review_key};

#[cfg(test)]
pub(crate) use write::fixtures;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS employer (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        url TEXT NOT NULL,
        logo TEXT NOT NULL DEFAULT '',
        location TEXT NOT NULL DEFAULT '',
        industry TEXT NOT NULL DEFAULT '',
        employees TEXT NOT NULL DEFAULT '',
        country TEXT NOT NULL DEFAULT '',
        working_days TEXT,
        overtime TEXT,
        website TEXT,
        description TEXT NOT NULL DEFAULT '',
        why TEXT NOT NULL DEFAULT '[]',
        reviews_count INTEGER NOT NULL DEFAULT 0,
        rating REAL,
        recommended INTEGER,
        rating_categories TEXT NOT NULL DEFAULT '{}',
        last_post TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS job (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE,
        site_id INTEGER,
        title TEXT NOT NULL,
        url TEXT NOT NULL,
        salary TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        reasons TEXT NOT NULL DEFAULT '',
        details TEXT NOT NULL DEFAULT '',
        skills TEXT NOT NULL DEFAULT '',
        why TEXT NOT NULL DEFAULT '',
        last_post TEXT NOT NULL,
        employer_code TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS job_employer_code ON job (employer_code)",
    "CREATE TABLE IF NOT EXISTS tag (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS address (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        full_address TEXT NOT NULL UNIQUE,
        city TEXT NOT NULL,
        district TEXT
    )",
    "CREATE TABLE IF NOT EXISTS review (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        key TEXT NOT NULL UNIQUE,
        employer_code TEXT NOT NULL REFERENCES employer (code) ON DELETE CASCADE,
        title TEXT NOT NULL,
        date TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS job_tag (
        job_id INTEGER NOT NULL REFERENCES job (id) ON DELETE CASCADE,
        tag_id INTEGER NOT NULL REFERENCES tag (id) ON DELETE CASCADE,
        PRIMARY KEY (job_id, tag_id)
    )",
    "CREATE TABLE IF NOT EXISTS job_address (
        job_id INTEGER NOT NULL REFERENCES job (id) ON DELETE CASCADE,
        address_id INTEGER NOT NULL REFERENCES address (id) ON DELETE CASCADE,
        PRIMARY KEY (job_id, address_id)
    )",
    "CREATE TABLE IF NOT EXISTS employer_tag (
        employer_id INTEGER NOT NULL REFERENCES employer (id) ON DELETE CASCADE,
        tag_id INTEGER NOT NULL REFERENCES tag (id) ON DELETE CASCADE,
        PRIMARY KEY (employer_id, tag_id)
    )",
    "CREATE TABLE IF NOT EXISTS employer_address (
        employer_id INTEGER NOT NULL REFERENCES employer (id) ON DELETE CASCADE,
        address_id INTEGER NOT NULL REFERENCES address (id) ON DELETE CASCADE,
        PRIMARY KEY (employer_id, address_id)
    )",
];

/// Handle to the relational store.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if url.contains(":memory:") {
            // Every connection of an in-memory pool would see its own database.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(4)
                .connect_with(options)
                .await?
        };

        log::debug!("Connected to {}", url);
        Ok(Self { pool })
    }

    /// Fresh in-memory database with the schema installed.
    pub async fn in_memory() -> Result<Self> {
        let db = Self::connect("sqlite::memory:").await?;
        db.init().await?;
        Ok(db)
    }

    /// Create missing tables.
    pub async fn init(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
