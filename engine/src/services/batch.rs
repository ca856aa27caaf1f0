//! Batch coordinator: atomic creation, settlement, and cancellation
//!
//! A batch is created in `processing` state before its movement transaction
//! opens, so the batch record survives a failed creation as an audit trail.
//! Settlement and cancellation both take a `FOR UPDATE` lock on the batch
//! row, which makes them mutually exclusive per batch and serializes the
//! running-balance chaining of the batch's movements.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::{BatchType, StockBatch};

use crate::error::{AppError, AppResult};
use crate::services::stock::{CreateMovementInput, StockService};

const BATCH_COLUMNS: &str = r#"
    id, batch_type, status, item_count, success_count, failure_count,
    error_message, created_by, settled_by, canceled_by, created_at, updated_at
"#;

/// Batch coordinator service
#[derive(Clone)]
pub struct BatchService {
    db: PgPool,
    stock: StockService,
}

/// Row for stock batch queries
#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    batch_type: String,
    status: String,
    item_count: i32,
    success_count: i32,
    failure_count: i32,
    error_message: Option<String>,
    created_by: Uuid,
    settled_by: Option<Uuid>,
    canceled_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BatchRow {
    fn into_domain(self) -> AppResult<StockBatch> {
        let batch_type = self
            .batch_type
            .parse()
            .map_err(|msg: String| AppError::Internal(msg))?;
        let status = self
            .status
            .parse()
            .map_err(|msg: String| AppError::Internal(msg))?;
        Ok(StockBatch {
            id: self.id,
            batch_type,
            status,
            item_count: self.item_count,
            success_count: self.success_count,
            failure_count: self.failure_count,
            error_message: self.error_message,
            created_by: self.created_by,
            settled_by: self.settled_by,
            canceled_by: self.canceled_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl BatchService {
    pub fn new(db: PgPool, stock: StockService) -> Self {
        Self { db, stock }
    }

    /// Create a batch of movements atomically: either every requested
    /// movement persists or none does.
    pub async fn create_batch(
        &self,
        user_id: Uuid,
        requests: Vec<CreateMovementInput>,
    ) -> AppResult<StockBatch> {
        if requests.is_empty() {
            return Err(AppError::validation(
                "movements",
                "A batch needs at least one movement request",
            ));
        }

        let batch_type = BatchType::from_events(requests.iter().map(|r| r.event))
            .unwrap_or(BatchType::Mixed);
        let item_count = requests.len() as i32;

        // The batch row is committed on its own, before the movement
        // transaction, so it survives a rolled-back creation.
        let batch_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO stock_batches (batch_type, status, item_count, created_by)
            VALUES ($1, 'processing', $2, $3)
            RETURNING id
            "#,
        )
        .bind(batch_type.as_str())
        .bind(item_count)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        match self.create_all(batch_id, user_id, &requests).await {
            Ok(()) => {
                tracing::info!("batch {} completed with {} movements", batch_id, item_count);
                self.get_batch(batch_id).await
            }
            Err(err) => {
                tracing::error!("batch {} creation failed: {}", batch_id, err);
                self.mark_failed(batch_id, &err).await?;
                Err(err)
            }
        }
    }

    /// Settle every `created` movement in a `completed` batch, sequentially
    /// and all-or-nothing. Re-invocation against an already settled batch is
    /// a no-op that touches nothing, not an error.
    pub async fn settle_batch(&self, user_id: Uuid, batch_id: Uuid) -> AppResult<StockBatch> {
        match self.settle_all(user_id, batch_id).await {
            Ok(affected) => {
                tracing::info!("batch {} settled, {} movements affected", batch_id, affected);
                self.get_batch(batch_id).await
            }
            // A missing batch or a wrong-state batch is rejected without any
            // mutation; only a failure inside the settlement itself flips the
            // batch to failed.
            Err(err @ AppError::NotFound(_)) | Err(err @ AppError::InvalidStateTransition(_)) => {
                Err(err)
            }
            Err(err) => {
                tracing::error!("batch {} settlement failed: {}", batch_id, err);
                self.mark_failed(batch_id, &err).await?;
                Err(err)
            }
        }
    }

    /// Withdraw a batch before settlement: every `created` movement in it is
    /// flipped to `canceled` together with the batch.
    pub async fn cancel_batch(&self, user_id: Uuid, batch_id: Uuid) -> AppResult<StockBatch> {
        let mut tx = self.db.begin().await?;

        let batch = self.lock_batch(&mut *tx, batch_id).await?;
        if !batch.status.can_cancel() {
            return Err(AppError::InvalidStateTransition(format!(
                "batch {} is {}, only processing or completed batches can be canceled",
                batch.id, batch.status
            )));
        }

        sqlx::query(
            r#"
            UPDATE stock_movements
            SET status = 'canceled', canceled_by = $1, updated_at = NOW()
            WHERE batch_id = $2 AND status = 'created'
            "#,
        )
        .bind(user_id)
        .bind(batch_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE stock_batches
            SET status = 'canceled', canceled_by = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(user_id)
        .bind(batch_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("batch {} canceled", batch_id);
        self.get_batch(batch_id).await
    }

    /// Get a batch by id.
    pub async fn get_batch(&self, batch_id: Uuid) -> AppResult<StockBatch> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {} FROM stock_batches WHERE id = $1",
            BATCH_COLUMNS
        ))
        .bind(batch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        row.into_domain()
    }

    async fn create_all(
        &self,
        batch_id: Uuid,
        user_id: Uuid,
        requests: &[CreateMovementInput],
    ) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        for request in requests {
            self.stock
                .create_movement_on(&mut *tx, user_id, request, Some(batch_id))
                .await?;
        }

        sqlx::query(
            r#"
            UPDATE stock_batches
            SET status = 'completed', success_count = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(requests.len() as i32)
        .bind(batch_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn settle_all(&self, user_id: Uuid, batch_id: Uuid) -> AppResult<usize> {
        let mut tx = self.db.begin().await?;

        let batch = self.lock_batch(&mut *tx, batch_id).await?;
        if batch.status.settle_is_noop() {
            return Ok(0);
        }
        if !batch.status.can_settle() {
            return Err(AppError::InvalidStateTransition(format!(
                "batch {} is {}, only completed batches can settle",
                batch.id, batch.status
            )));
        }

        // Fixed settlement order: running-balance chaining requires the
        // batch's movements to settle one after another.
        let movement_ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM stock_movements
            WHERE batch_id = $1 AND status = 'created'
            ORDER BY created_at, id
            "#,
        )
        .bind(batch_id)
        .fetch_all(&mut *tx)
        .await?;

        for movement_id in &movement_ids {
            self.stock
                .settle_movement_on(&mut *tx, user_id, *movement_id)
                .await?;
        }

        sqlx::query(
            r#"
            UPDATE stock_batches
            SET status = 'settled', settled_by = $1, success_count = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(user_id)
        .bind(movement_ids.len() as i32)
        .bind(batch_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(movement_ids.len())
    }

    /// Lock the batch row for the duration of the caller's transaction.
    async fn lock_batch(&self, conn: &mut PgConnection, batch_id: Uuid) -> AppResult<StockBatch> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {} FROM stock_batches WHERE id = $1 FOR UPDATE",
            BATCH_COLUMNS
        ))
        .bind(batch_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        row.into_domain()
    }

    /// Runs as its own statement on the pool, after the failed transaction
    /// has rolled back, so the failure marking itself survives. Nothing in
    /// the batch persisted or settled, hence the counts.
    async fn mark_failed(&self, batch_id: Uuid, err: &AppError) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE stock_batches
            SET status = 'failed', success_count = 0, failure_count = item_count,
                error_message = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(err.to_string())
        .bind(batch_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}
