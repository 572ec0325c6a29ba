//! Writing records: installs, updates and link syncing.

use std::collections::BTreeSet;

use sha2::{Digest, Sha256};
use sqlx::SqliteConnection;

use super::Database;
use crate::error::{AppError, Result};
use crate::models::{Address, EmployerRecord, JobRecord, Review};

/// Many-to-many link tables.
#[derive(Debug, Clone, Copy)]
enum Link {
    JobTag,
    JobAddress,
    EmployerTag,
    EmployerAddress,
}

impl Link {
    fn table(self) -> &'static str {
        match self {
            Link::JobTag => "job_tag",
            Link::JobAddress => "job_address",
            Link::EmployerTag => "employer_tag",
            Link::EmployerAddress => "employer_address",
        }
    }

    fn owner(self) -> &'static str {
        match self {
            Link::JobTag | Link::JobAddress => "job_id",
            Link::EmployerTag | Link::EmployerAddress => "employer_id",
        }
    }

    fn target(self) -> &'static str {
        match self {
            Link::JobTag | Link::EmployerTag => "tag_id",
            Link::JobAddress | Link::EmployerAddress => "address_id",
        }
    }
}

/// What an employer update changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub created_jobs: usize,
    pub updated_jobs: usize,
    pub purged_jobs: usize,
    pub reviews: usize,
}

/// Stable identity of a review: sha256 of employer, title and date.
pub fn review_key(employer_code: &str, review: &Review) -> String {
    let mut hasher = Sha256::new();
    hasher.update(employer_code.as_bytes());
    hasher.update(b"\n");
    hasher.update(review.title.as_bytes());
    hasher.update(b"\n");
    hasher.update(review.date.as_bytes());
    hex::encode(hasher.finalize())
}

impl Database {
    /// Insert an employer with its reviews, tags, addresses and jobs.
    ///
    /// Jobs already in the database are kept as they are.
    pub async fn install_employer(&self, employer: &EmployerRecord, jobs: &[JobRecord]) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        if employer_id(&mut tx, &employer.code).await?.is_some() {
            return Err(AppError::validation(format!(
                "employer '{}' is already installed",
                employer.code
            )));
        }

        let id = insert_employer_row(&mut tx, employer).await?;
        sync_employer_links(&mut tx, id, employer).await?;
        replace_reviews(&mut tx, employer).await?;

        for job in jobs {
            match job_id(&mut tx, job.code()).await? {
                Some(_) => log::debug!("Job {} already installed", job.code()),
                None => {
                    insert_job(&mut tx, job).await?;
                }
            }
        }

        tx.commit().await?;
        log::info!("Installed employer {} with {} jobs", employer.code, jobs.len());
        Ok(())
    }

    /// Bring an installed employer in line with its cached record.
    ///
    /// `jobs` are the records of every job the employer lists; jobs of this
    /// employer that are no longer listed are deleted.
    pub async fn update_employer(
        &self,
        employer: &EmployerRecord,
        jobs: &[JobRecord],
    ) -> Result<UpdateReport> {
        let mut tx = self.pool().begin().await?;

        let id = employer_id(&mut tx, &employer.code)
            .await?
            .ok_or_else(|| AppError::not_found(format!("employer '{}' in database", employer.code)))?;

        let mut report = UpdateReport::default();
        for job in jobs {
            if upsert_job(&mut tx, job).await? {
                report.created_jobs += 1;
            } else {
                report.updated_jobs += 1;
            }
        }

        let listed: BTreeSet<&str> = employer.jobs.iter().map(|j| j.code.as_str()).collect();
        let installed: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, code FROM job WHERE employer_code = ?")
                .bind(&employer.code)
                .fetch_all(&mut *tx)
                .await?;
        for (job_id, code) in installed {
            if !listed.contains(code.as_str()) {
                log::info!("Purging deprecated job {}", code);
                sqlx::query("DELETE FROM job WHERE id = ?")
                    .bind(job_id)
                    .execute(&mut *tx)
                    .await?;
                report.purged_jobs += 1;
            }
        }

        sync_employer_links(&mut tx, id, employer).await?;
        report.reviews = replace_reviews(&mut tx, employer).await?;
        update_employer_row(&mut tx, id, employer).await?;

        tx.commit().await?;
        log::info!("Updated employer {}: {:?}", employer.code, report);
        Ok(report)
    }

    /// Insert or update a single job. Returns `true` when it was created.
    pub async fn upsert_job(&self, job: &JobRecord) -> Result<bool> {
        let mut tx = self.pool().begin().await?;
        let created = upsert_job(&mut tx, job).await?;
        tx.commit().await?;
        Ok(created)
    }
}

async fn employer_id(conn: &mut SqliteConnection, code: &str) -> Result<Option<i64>> {
    Ok(sqlx::query_scalar::<_, i64>("SELECT id FROM employer WHERE code = ?")
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?)
}

async fn job_id(conn: &mut SqliteConnection, code: &str) -> Result<Option<i64>> {
    Ok(sqlx::query_scalar::<_, i64>("SELECT id FROM job WHERE code = ?")
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?)
}

/// Get-or-create a tag by name.
async fn tag_id(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
    sqlx::query("INSERT OR IGNORE INTO tag (name) VALUES (?)")
        .bind(name)
        .execute(&mut *conn)
        .await?;
    Ok(sqlx::query_scalar::<_, i64>("SELECT id FROM tag WHERE name = ?")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?)
}

/// Get-or-create an address; empty addresses have no row.
async fn address_id(conn: &mut SqliteConnection, full_address: &str) -> Result<Option<i64>> {
    let Some(address) = Address::parse(full_address) else {
        return Ok(None);
    };
    sqlx::query("INSERT OR IGNORE INTO address (full_address, city, district) VALUES (?, ?, ?)")
        .bind(&address.full_address)
        .bind(&address.city)
        .bind(&address.district)
        .execute(&mut *conn)
        .await?;
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM address WHERE full_address = ?")
        .bind(&address.full_address)
        .fetch_one(&mut *conn)
        .await?;
    Ok(Some(id))
}

async fn tag_ids(conn: &mut SqliteConnection, names: &[String]) -> Result<BTreeSet<i64>> {
    let mut ids = BTreeSet::new();
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        ids.insert(tag_id(conn, name).await?);
    }
    Ok(ids)
}

async fn address_ids(conn: &mut SqliteConnection, addresses: &[String]) -> Result<BTreeSet<i64>> {
    let mut ids = BTreeSet::new();
    for full in addresses {
        if let Some(id) = address_id(conn, full).await? {
            ids.insert(id);
        }
    }
    Ok(ids)
}

/// Make the owner's links exactly `wanted`: add missing, drop stale.
async fn sync_links(
    conn: &mut SqliteConnection,
    link: Link,
    owner_id: i64,
    wanted: &BTreeSet<i64>,
) -> Result<()> {
    let (table, owner, target) = (link.table(), link.owner(), link.target());

    let select = format!("SELECT {target} FROM {table} WHERE {owner} = ?");
    let current: BTreeSet<i64> = sqlx::query_scalar::<_, i64>(&select)
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .collect();

    let insert = format!("INSERT INTO {table} ({owner}, {target}) VALUES (?, ?)");
    for id in wanted.difference(&current) {
        sqlx::query(&insert)
            .bind(owner_id)
            .bind(*id)
            .execute(&mut *conn)
            .await?;
    }

    let delete = format!("DELETE FROM {table} WHERE {owner} = ? AND {target} = ?");
    for id in current.difference(wanted) {
        sqlx::query(&delete)
            .bind(owner_id)
            .bind(*id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn sync_job_links(conn: &mut SqliteConnection, id: i64, job: &JobRecord) -> Result<()> {
    let tags = tag_ids(conn, &job.summary.tags).await?;
    sync_links(conn, Link::JobTag, id, &tags).await?;
    let addresses = address_ids(conn, &job.summary.addresses).await?;
    sync_links(conn, Link::JobAddress, id, &addresses).await
}

async fn sync_employer_links(conn: &mut SqliteConnection, id: i64, employer: &EmployerRecord) -> Result<()> {
    let tags = tag_ids(conn, &employer.tags).await?;
    sync_links(conn, Link::EmployerTag, id, &tags).await?;
    let addresses = address_ids(conn, &employer.addresses).await?;
    sync_links(conn, Link::EmployerAddress, id, &addresses).await
}

async fn insert_job(conn: &mut SqliteConnection, job: &JobRecord) -> Result<i64> {
    let (summary, detail) = (&job.summary, &job.detail);
    let id = sqlx::query(
        "INSERT INTO job (code, site_id, title, url, salary, description, reasons, details, \
         skills, why, last_post, employer_code) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&summary.code)
    .bind(summary.id.and_then(|n| i64::try_from(n).ok()))
    .bind(&summary.title)
    .bind(&summary.url)
    .bind(&summary.salary)
    .bind(&summary.description)
    .bind(&detail.reasons)
    .bind(&detail.details)
    .bind(&detail.skills)
    .bind(&detail.why)
    .bind(&summary.last_post)
    .bind(&summary.employer_code)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    sync_job_links(conn, id, job).await?;
    log::debug!("Inserted job {}", summary.code);
    Ok(id)
}

async fn update_job(conn: &mut SqliteConnection, id: i64, job: &JobRecord) -> Result<()> {
    let (summary, detail) = (&job.summary, &job.detail);
    sqlx::query(
        "UPDATE job SET site_id = ?, title = ?, url = ?, salary = ?, description = ?, \
         reasons = ?, details = ?, skills = ?, why = ?, last_post = ?, employer_code = ? \
         WHERE id = ?",
    )
    .bind(summary.id.and_then(|n| i64::try_from(n).ok()))
    .bind(&summary.title)
    .bind(&summary.url)
    .bind(&summary.salary)
    .bind(&summary.description)
    .bind(&detail.reasons)
    .bind(&detail.details)
    .bind(&detail.skills)
    .bind(&detail.why)
    .bind(&summary.last_post)
    .bind(&summary.employer_code)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    sync_job_links(conn, id, job).await
}

async fn upsert_job(conn: &mut SqliteConnection, job: &JobRecord) -> Result<bool> {
    match job_id(conn, job.code()).await? {
        Some(id) => {
            update_job(conn, id, job).await?;
            Ok(false)
        }
        None => {
            insert_job(conn, job).await?;
            Ok(true)
        }
    }
}

/// Columns shared by employer insert and update, in bind order.
struct EmployerValues {
    why: String,
    categories: String,
    reviews_count: i64,
    rating: Option<f64>,
    recommended: Option<i64>,
}

impl EmployerValues {
    fn of(employer: &EmployerRecord) -> Result<Self> {
        Ok(Self {
            why: serde_json::to_string(&employer.why)?,
            categories: serde_json::to_string(&employer.ratings.categories)?,
            reviews_count: i64::from(employer.reviews_count),
            rating: employer.ratings.overall.map(f64::from),
            recommended: employer.ratings.recommended.map(i64::from),
        })
    }
}

async fn insert_employer_row(conn: &mut SqliteConnection, employer: &EmployerRecord) -> Result<i64> {
    let values = EmployerValues::of(employer)?;
    let result = sqlx::query(
        "INSERT INTO employer (code, name, url, logo, location, industry, employees, country, \
         working_days, overtime, website, description, why, reviews_count, rating, recommended, \
         rating_categories, last_post) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&employer.code)
    .bind(&employer.name)
    .bind(&employer.url)
    .bind(&employer.logo)
    .bind(&employer.location)
    .bind(&employer.industry)
    .bind(&employer.employees)
    .bind(&employer.country)
    .bind(&employer.working_days)
    .bind(&employer.overtime)
    .bind(&employer.website)
    .bind(&employer.description)
    .bind(&values.why)
    .bind(values.reviews_count)
    .bind(values.rating)
    .bind(values.recommended)
    .bind(&values.categories)
    .bind(&employer.last_post)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

async fn update_employer_row(conn: &mut SqliteConnection, id: i64, employer: &EmployerRecord) -> Result<()> {
    let values = EmployerValues::of(employer)?;
    sqlx::query(
        "UPDATE employer SET name = ?, url = ?, logo = ?, location = ?, industry = ?, \
         employees = ?, country = ?, working_days = ?, overtime = ?, website = ?, \
         description = ?, why = ?, reviews_count = ?, rating = ?, recommended = ?, \
         rating_categories = ?, last_post = ? WHERE id = ?",
    )
    .bind(&employer.name)
    .bind(&employer.url)
    .bind(&employer.logo)
    .bind(&employer.location)
    .bind(&employer.industry)
    .bind(&employer.employees)
    .bind(&employer.country)
    .bind(&employer.working_days)
    .bind(&employer.overtime)
    .bind(&employer.website)
    .bind(&employer.description)
    .bind(&values.why)
    .bind(values.reviews_count)
    .bind(values.rating)
    .bind(values.recommended)
    .bind(&values.categories)
    .bind(&employer.last_post)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Replace the employer's reviews; duplicates collapse on their key.
async fn replace_reviews(conn: &mut SqliteConnection, employer: &EmployerRecord) -> Result<usize> {
    sqlx::query("DELETE FROM review WHERE employer_code = ?")
        .bind(&employer.code)
        .execute(&mut *conn)
        .await?;

    let mut inserted = 0;
    for review in &employer.reviews {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO review (key, employer_code, title, date) VALUES (?, ?, ?, ?)",
        )
        .bind(review_key(&employer.code, review))
        .bind(&employer.code)
        .bind(&review.title)
        .bind(&review.date)
        .execute(&mut *conn)
        .await?;
        inserted += result.rows_affected() as usize;
    }
    Ok(inserted)
}
