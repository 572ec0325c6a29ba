//! Local filesystem cache implementation.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{EmployerFeedEntry, EmployerRecord, JobRecord, JobSummary};
use crate::storage::RecordCache;

const JOBS_DIR: &str = "jobs";
const EMPLOYERS_DIR: &str = "employers";
const JOB_FEED: &str = "jobs.json";
const EMPLOYER_FEED: &str = "employers.json";

/// Local filesystem cache backend.
#[derive(Debug, Clone)]
pub struct LocalCache {
    root_dir: PathBuf,
}

impl LocalCache {
    /// Create a new LocalCache rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Key of a record file; codes are slugs but never trusted as paths.
    fn record_key(dir: &str, code: &str) -> Result<String> {
        if code.is_empty() || code.contains(['/', '\\']) || code.starts_with('.') {
            return Err(AppError::validation(format!("invalid record code '{code}'")));
        }
        Ok(format!("{dir}/{code}.json"))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RecordCache for LocalCache {
    async fn get_job(&self, code: &str) -> Result<Option<JobRecord>> {
        self.read_json(&Self::record_key(JOBS_DIR, code)?).await
    }

    async fn save_job(&self, job: &JobRecord) -> Result<()> {
        let key = Self::record_key(JOBS_DIR, job.code())?;
        self.write_json(&key, job).await?;
        log::debug!("Cached job {}", job.code());
        Ok(())
    }

    async fn job_codes(&self) -> Result<Vec<String>> {
        let dir = self.path(JOBS_DIR);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut codes = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                codes.push(stem.to_string());
            }
        }
        codes.sort();
        Ok(codes)
    }

    async fn get_employer(&self, code: &str) -> Result<Option<EmployerRecord>> {
        self.read_json(&Self::record_key(EMPLOYERS_DIR, code)?).await
    }

    async fn save_employer(&self, employer: &EmployerRecord) -> Result<()> {
        let key = Self::record_key(EMPLOYERS_DIR, &employer.code)?;
        self.write_json(&key, employer).await?;
        log::debug!("Cached employer {}", employer.code);
        Ok(())
    }

    async fn load_job_feed(&self) -> Result<Option<Vec<JobSummary>>> {
        self.read_json(JOB_FEED).await
    }

    async fn save_job_feed(&self, jobs: &[JobSummary]) -> Result<()> {
        self.write_json(JOB_FEED, jobs).await
    }

    async fn load_employer_feed(&self) -> Result<Option<Vec<EmployerFeedEntry>>> {
        self.read_json(EMPLOYER_FEED).await
    }

    async fn save_employer_feed(&self, employers: &[EmployerFeedEntry]) -> Result<()> {
        self.write_json(EMPLOYER_FEED, employers).await
    }
}
