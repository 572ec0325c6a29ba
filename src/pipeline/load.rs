// src/pipeline/load.rs

use crate::db::Database;
use crate::error::Result;
use crate::storage::RecordCache;

/// Jobs written by a load run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub created: usize,
    pub updated: usize,
    pub missing: usize,
}

/// Insert or update every cached job record in the database.
pub async fn load_cached_jobs(store: &dyn RecordCache, db: &Database) -> Result<LoadReport> {
    let codes = store.job_codes().await?;
    log::info!("Loading {} cached jobs...", codes.len());

    let mut report = LoadReport::default();
    for code in &codes {
        // Removed since the listing
        let Some(job) = store.get_job(code).await? else {
            report.missing += 1;
            continue;
        };
        if db.upsert_job(&job).await? {
            report.created += 1;
        } else {
            report.updated += 1;
        }
    }

    log::info!(
        "Loaded jobs: {} created, {} updated.",
        report.created,
        report.updated
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::{JobDetail, JobRecord, fixtures::summary};
    use crate::storage::LocalCache;

    const POST: &str = "2019-08-21 10:03:31 +0700";

    #[tokio::test]
    async fn loads_every_cached_job() {
        let tmp = TempDir::new().unwrap();
        let store = LocalCache::new(tmp.path());
        let db = Database::in_memory().await.unwrap();

        for code in ["java-1", "qa-2"] {
            store
                .save_job(&JobRecord::new(summary(code, "acme", POST), JobDetail::default()))
                .await
                .unwrap();
        }

        let first = load_cached_jobs(&store, &db).await.unwrap();
        assert_eq!(first, LoadReport { created: 2, updated: 0, missing: 0 });

        let second = load_cached_jobs(&store, &db).await.unwrap();
        assert_eq!(second, LoadReport { created: 0, updated: 2, missing: 0 });
        assert_eq!(db.counts().await.unwrap().jobs, 2);
    }

    #[tokio::test]
    async fn empty_cache_loads_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = LocalCache::new(tmp.path());
        let db = Database::in_memory().await.unwrap();

        let report = load_cached_jobs(&store, &db).await.unwrap();
        assert_eq!(report, LoadReport::default());
    }
}
