//! ITviec Scraper CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use itviec::{
    Database,
    error::{AppError, Result},
    models::{Config, MAIN_CITIES},
    pipeline,
    services::{CacheService, HttpFetcher, JobFeed, Scraper},
    storage::LocalCache,
};
use serde::Serialize;

/// itviec - IT job listings scraper
#[derive(Parser, Debug)]
#[command(
    name = "itviec",
    version,
    about = "Scrapes ITviec jobs and employers into a JSON cache and SQLite"
)]
struct Cli {
    /// Path to the data directory containing config.toml
    #[arg(short, long, default_value = "instance")]
    data_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration file
    Validate,

    /// Create the database tables
    InitDb,

    /// Fetch feed snapshots into the cache
    Fetch {
        #[arg(value_enum)]
        what: FeedKind,
    },

    /// Refresh cached jobs and employers from the job feed
    Download {
        /// Download instead of only printing the plan
        #[arg(long)]
        yes: bool,
    },

    /// Bring the database in line with the job feed
    Upgrade {
        /// Apply instead of only printing the plan
        #[arg(long)]
        yes: bool,
    },

    /// Statistics over the stored job feed
    FeedStats,

    /// Jobs whose database copy lags behind the feed
    ToBeUpdated,

    /// Single job commands
    Job {
        #[command(subcommand)]
        command: JobCommand,
    },

    /// Single employer commands
    Employer {
        #[command(subcommand)]
        command: EmployerCommand,
    },

    /// Insert or update every cached job in the database
    Load,

    /// Row counts of the database
    Stats,

    /// Latest jobs, optionally by city
    Jobs {
        /// Only jobs in this city
        #[arg(long, conflicts_with = "other")]
        city: Option<String>,

        /// Only jobs outside the main cities
        #[arg(long)]
        other: bool,

        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Tags by number of jobs
    Tags,

    /// Employers by number of jobs
    EmployersJobs,

    /// Cities with jobs
    Locations,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FeedKind {
    Jobs,
    Employers,
    All,
}

#[derive(Subcommand, Debug)]
enum JobCommand {
    /// Download a job of the stored feed into the cache
    Fetch { code: String },

    /// Print a job from the database
    Show { code: String },

    /// Walk the job feed and print every job tag
    Feed {
        /// Stop after this many pages
        #[arg(long)]
        max: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
enum EmployerCommand {
    /// Download an employer with its reviews into the cache
    Fetch { code: String },

    /// Print an employer from the database
    Show { code: String },

    /// Insert a cached employer and its jobs into the database
    Install { code: String },

    /// Sync a cached employer and its jobs into the database
    Update { code: String },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn open_database(config: &Config) -> Result<Database> {
    let db = Database::connect(&config.database.url).await?;
    db.init().await?;
    Ok(db)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.data_dir.join("config.toml");
    let config = Config::load_or_default(&config_path)
        .with_env_overrides()
        .rooted_at(&cli.data_dir);

    if let Command::Validate = cli.command {
        log::info!("Validating configuration...");
        if let Err(e) = config.validate() {
            log::error!("Config validation failed: {}", e);
            return Err(e);
        }
        log::info!("Config OK");
        return Ok(());
    }
    config.validate()?;
    std::fs::create_dir_all(&cli.data_dir)?;

    let fetcher = HttpFetcher::new(&config.crawler)?;
    let store = LocalCache::new(&config.cache.dir);
    let cache = CacheService::new(
        Scraper::new(&fetcher, &config.site),
        &store,
        config.cache.freshness_hours,
    );
    let delay = Duration::from_millis(config.crawler.request_delay_ms);
    let format = config.site.datetime_format.as_str();

    match cli.command {
        Command::Validate => {}

        Command::InitDb => {
            let db = open_database(&config).await?;
            log::info!("Database ready at {}", config.database.url);
            db.close().await;
        }

        Command::Fetch { what } => match what {
            FeedKind::Jobs => {
                pipeline::fetch_jobs(&cache).await?;
            }
            FeedKind::Employers => {
                pipeline::fetch_employers(&cache).await?;
            }
            FeedKind::All => {
                let (employers, jobs) = pipeline::fetch_all(&cache).await?;
                log::info!("Stored {} employers and {} jobs.", employers, jobs);
            }
        },

        Command::Download { yes } => {
            let feed = pipeline::feed_jobs(&cache).await?;
            pipeline::run_download(&cache, &feed, delay, yes).await?;
        }

        Command::Upgrade { yes } => {
            let feed = pipeline::feed_jobs(&cache).await?;
            let db = open_database(&config).await?;
            pipeline::run_upgrade(&cache, &db, &feed, yes).await?;
            db.close().await;
        }

        Command::FeedStats => {
            let feed = pipeline::feed_jobs(&cache).await?;
            pipeline::FeedStats::compute(&feed).log();
        }

        Command::ToBeUpdated => {
            let feed = pipeline::feed_jobs(&cache).await?;
            let db = open_database(&config).await?;
            pipeline::to_be_updated(&db, &feed, format).await?.log();
            db.close().await;
        }

        Command::Job { command } => match command {
            JobCommand::Fetch { code } => {
                let feed = pipeline::feed_jobs(&cache).await?;
                let summary = feed
                    .iter()
                    .find(|job| job.code == code)
                    .ok_or_else(|| AppError::not_found(format!("job '{code}' in the feed")))?;
                print_json(&cache.fetch_job(summary).await?)?;
            }
            JobCommand::Show { code } => {
                let db = open_database(&config).await?;
                let job = db
                    .job_by_code(&code)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("job '{code}'")))?;
                print_json(&job)?;
                db.close().await;
            }
            JobCommand::Feed { max } => {
                let jobs = JobFeed::default()
                    .job_tags_limited(&fetcher, &config.site, max)
                    .await?;
                print_json(&jobs)?;
            }
        },

        Command::Employer { command } => match command {
            EmployerCommand::Fetch { code } => {
                print_json(&cache.fetch_employer(&code, None).await?)?;
            }
            EmployerCommand::Show { code } => {
                let db = open_database(&config).await?;
                let employer = db
                    .employer_by_code(&code)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("employer '{code}'")))?;
                print_json(&employer)?;
                db.close().await;
            }
            EmployerCommand::Install { code } => {
                let db = open_database(&config).await?;
                pipeline::install_employer(&cache, &db, &code).await?;
                log::info!("Installed employer {}", code);
                db.close().await;
            }
            EmployerCommand::Update { code } => {
                let db = open_database(&config).await?;
                let report = pipeline::update_employer(&cache, &db, &code).await?;
                log::info!(
                    "Updated employer {}: {} jobs created, {} updated, {} purged, {} reviews",
                    code,
                    report.created_jobs,
                    report.updated_jobs,
                    report.purged_jobs,
                    report.reviews
                );
                db.close().await;
            }
        },

        Command::Load => {
            let db = open_database(&config).await?;
            pipeline::load_cached_jobs(&store, &db).await?;
            db.close().await;
        }

        Command::Stats => {
            let db = open_database(&config).await?;
            print_json(&db.counts().await?)?;
            db.close().await;
        }

        Command::Jobs { city, other, limit } => {
            let db = open_database(&config).await?;
            let jobs = match (city, other) {
                (_, true) => db.other_jobs(limit).await?,
                (Some(city), false) => {
                    if !MAIN_CITIES.contains(&city.as_str()) {
                        log::warn!("{} is not one of {:?}", city, MAIN_CITIES);
                    }
                    db.jobs_in_city(&city, limit).await?
                }
                (None, false) => db.latest_jobs(limit).await?,
            };
            print_json(&jobs)?;
            db.close().await;
        }

        Command::Tags => {
            let db = open_database(&config).await?;
            print_json(&db.tag_counts().await?)?;
            db.close().await;
        }

        Command::EmployersJobs => {
            let db = open_database(&config).await?;
            print_json(&db.employers_by_job_count().await?)?;
            db.close().await;
        }

        Command::Locations => {
            let db = open_database(&config).await?;
            print_json(&db.locations().await?)?;
            db.close().await;
        }
    }

    log::info!("Done!");

    Ok(())
}
