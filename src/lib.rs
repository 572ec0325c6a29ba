// src/lib.rs

//! ITviec Scraper Library
//!
//! Walks the job and employer feeds, caches every record as JSON and keeps a
//! SQLite store in line with the feed.

pub mod db;
pub mod error;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

pub use db::Database;
pub use error::{AppError, Result};
pub use models::Config;
