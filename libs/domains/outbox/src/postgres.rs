//! PostgreSQL implementation of the outbox repository

use async_trait::async_trait;
use domain_foods::error::{FoodError, FoodResult};
use domain_foods::repository::OutboxRecorder;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use tracing::instrument;

use crate::entity;
use crate::error::OutboxResult;
use crate::repository::{OutboxRepository, AGGREGATE_FOOD, EVENT_FOOD_DELETED};

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS outbox_event (
    id BIGSERIAL PRIMARY KEY,
    aggregate_type VARCHAR(64) NOT NULL,
    aggregate_id VARCHAR(64) NOT NULL,
    event_type VARCHAR(64) NOT NULL,
    payload TEXT,
    processed BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    processed_at TIMESTAMPTZ
);
CREATE INDEX IF NOT EXISTS idx_outbox_unprocessed
    ON outbox_event (event_type, created_at)
    WHERE processed = FALSE;
"#;

/// Create the outbox table and its partial index if they don't exist.
/// Idempotent; runs at worker startup.
pub async fn init_schema(db: &DatabaseConnection) -> OutboxResult<()> {
    db.execute_unprepared(CREATE_TABLE_SQL).await?;
    tracing::info!("Outbox schema ready");
    Ok(())
}

pub struct PgOutboxRepository {
    db: DatabaseConnection,
}

impl PgOutboxRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OutboxRepository for PgOutboxRepository {
    #[instrument(skip(self, payload))]
    async fn record(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        event_type: &str,
        payload: Option<String>,
    ) -> OutboxResult<entity::Model> {
        let active = entity::ActiveModel {
            aggregate_type: Set(aggregate_type.to_string()),
            aggregate_id: Set(aggregate_id.to_string()),
            event_type: Set(event_type.to_string()),
            payload: Set(payload),
            processed: Set(false),
            created_at: Set(chrono::Utc::now().into()),
            processed_at: Set(None),
            ..Default::default()
        };

        let model = entity::Entity::insert(active)
            .exec_with_returning(&self.db)
            .await?;

        tracing::info!(event_id = model.id, aggregate_id = %model.aggregate_id, "Recorded outbox event");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn fetch_unprocessed(
        &self,
        event_type: &str,
        limit: u64,
    ) -> OutboxResult<Vec<entity::Model>> {
        let events = entity::Entity::find()
            .filter(entity::Column::Processed.eq(false))
            .filter(entity::Column::EventType.eq(event_type))
            .order_by_asc(entity::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(events)
    }

    #[instrument(skip(self), fields(count = ids.len()))]
    async fn mark_processed(&self, ids: &[i64]) -> OutboxResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = entity::Entity::update_many()
            .col_expr(entity::Column::Processed, Expr::value(true))
            .col_expr(
                entity::Column::ProcessedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(entity::Column::Id.is_in(ids.iter().copied()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl OutboxRecorder for PgOutboxRepository {
    async fn record_food_deleted(&self, food_id: &str) -> FoodResult<()> {
        self.record(AGGREGATE_FOOD, food_id, EVENT_FOOD_DELETED, None)
            .await
            .map_err(|e| FoodError::Database(e.to_string()))?;
        Ok(())
    }
}
