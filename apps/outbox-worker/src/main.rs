//! Outbox Worker
//!
//! Scheduled service that drains FOOD_DELETED outbox events from PostgreSQL
//! and removes the corresponding product image folders from blob storage.
//! A Redis lease keeps replicas from processing the same batch.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use core_config::tracing::init_tracing;
use domain_outbox::lease::{LeaseConfig, RedisLease};
use domain_outbox::postgres::{init_schema, PgOutboxRepository};
use domain_outbox::OutboxDispatcher;
use eyre::Result;
use storage::S3BlobStore;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "outbox-worker")]
#[command(about = "Drain FOOD_DELETED outbox events and clean up product image blobs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single dispatch cycle and exit
    Once,

    /// Run as a scheduled service
    Schedule {
        /// Cron expression (seconds-first). Defaults to the OUTBOX_CRON setting.
        #[arg(short, long)]
        cron: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let cli = Cli::parse();

    info!("Connecting to PostgreSQL...");
    let db = database::postgres::connect_with_retry(&config.postgres.url, None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;
    init_schema(&db).await?;

    info!("Connecting to Redis...");
    let redis = database::redis::connect_with_retry(&config.redis.url, None)
        .await
        .map_err(|e| eyre::eyre!("Redis connection failed: {}", e))?;

    let blobs = S3BlobStore::from_config(&config.s3)
        .await
        .map_err(|e| eyre::eyre!("S3 client setup failed: {}", e))?;

    let lease_config = LeaseConfig {
        min_hold: Duration::from_millis(config.worker.lease_min_hold_ms),
        max_hold: Duration::from_millis(config.worker.lease_max_hold_ms),
    };

    let dispatcher = Arc::new(OutboxDispatcher::new(
        Arc::new(PgOutboxRepository::new(db)),
        Arc::new(blobs),
        Arc::new(RedisLease::new(redis, lease_config)),
        config.worker.batch_size,
    ));

    match cli.command {
        Commands::Once => {
            info!("Running one dispatch cycle");
            dispatcher.run_cycle().await;
        }

        Commands::Schedule { cron } => {
            let cron = cron.unwrap_or_else(|| config.worker.cron.clone());
            run_scheduled(dispatcher, &cron).await?;
        }
    }

    Ok(())
}

async fn run_scheduled(dispatcher: Arc<OutboxDispatcher>, cron_expr: &str) -> Result<()> {
    info!(cron = cron_expr, "Starting scheduled outbox dispatch");

    let sched = JobScheduler::new().await?;

    let job = Job::new_async(cron_expr, move |_uuid, _l| {
        let dispatcher = dispatcher.clone();

        Box::pin(async move {
            dispatcher.run_cycle().await;
        })
    })
    .map_err(|e| {
        error!(error = %e, "Invalid cron expression");
        e
    })?;

    sched.add(job).await?;
    sched.start().await?;

    // Keep running until interrupted
    info!("Scheduler started, waiting for jobs...");
    loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
    }
}
