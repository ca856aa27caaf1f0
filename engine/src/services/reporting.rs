//! Reporting queries over batches, movements, and commission shares
//!
//! Read-only boundary for external callers. Formatting and pagination live
//! outside the engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::{BatchStatus, CommissionTier, MovementStatus, SellerKind};

use crate::error::AppResult;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Filter for movement queries
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub status: Option<MovementStatus>,
    pub batch_id: Option<Uuid>,
    pub metric_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub seller_kind: Option<SellerKind>,
    pub seller_id: Option<Uuid>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Filter for batch queries
#[derive(Debug, Default, Deserialize)]
pub struct BatchFilter {
    pub status: Option<BatchStatus>,
    pub created_by: Option<Uuid>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Movement report entry
#[derive(Debug, Serialize, FromRow)]
pub struct MovementReportRow {
    pub id: Uuid,
    pub batch_id: Option<Uuid>,
    pub metric_id: Uuid,
    pub event: String,
    pub amount: Decimal,
    pub seller_kind: Option<String>,
    pub seller_id: Option<Uuid>,
    pub total_net_price: Decimal,
    pub update_amount: Option<Decimal>,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Batch report entry
#[derive(Debug, Serialize, FromRow)]
pub struct BatchReportRow {
    pub id: Uuid,
    pub batch_type: String,
    pub status: String,
    pub item_count: i32,
    pub success_count: i32,
    pub failure_count: i32,
    pub error_message: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Aggregate movement amounts over a period
#[derive(Debug, Serialize, FromRow)]
pub struct MovementTotals {
    pub total_in: Decimal,
    pub total_out: Decimal,
    pub movement_count: i64,
}

/// Aggregate commission amounts per tier over a period
#[derive(Debug, Serialize, FromRow)]
pub struct TierShareTotal {
    pub tier: String,
    pub total_amount: Decimal,
    pub record_count: i64,
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Movements matching the filter, newest first.
    pub async fn movements(&self, filter: &MovementFilter) -> AppResult<Vec<MovementReportRow>> {
        let rows = sqlx::query_as::<_, MovementReportRow>(
            r#"
            SELECT id, batch_id, metric_id, event, amount, seller_kind, seller_id,
                   total_net_price, update_amount, status, created_by, created_at
            FROM stock_movements
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR batch_id = $2)
              AND ($3::uuid IS NULL OR metric_id = $3)
              AND ($4::uuid IS NULL OR created_by = $4)
              AND ($5::text IS NULL OR seller_kind = $5)
              AND ($6::uuid IS NULL OR seller_id = $6)
              AND ($7::timestamptz IS NULL OR created_at >= $7)
              AND ($8::timestamptz IS NULL OR created_at < $8)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.batch_id)
        .bind(filter.metric_id)
        .bind(filter.created_by)
        .bind(filter.seller_kind.map(|k| k.as_str()))
        .bind(filter.seller_id)
        .bind(filter.start)
        .bind(filter.end)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Batches matching the filter, newest first.
    pub async fn batches(&self, filter: &BatchFilter) -> AppResult<Vec<BatchReportRow>> {
        let rows = sqlx::query_as::<_, BatchReportRow>(
            r#"
            SELECT id, batch_type, status, item_count, success_count, failure_count,
                   error_message, created_by, created_at
            FROM stock_batches
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR created_by = $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
              AND ($4::timestamptz IS NULL OR created_at < $4)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.created_by)
        .bind(filter.start)
        .bind(filter.end)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Settled stock-in/stock-out totals over a period, optionally for one
    /// seller.
    pub async fn movement_totals(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        seller_id: Option<Uuid>,
    ) -> AppResult<MovementTotals> {
        let totals = sqlx::query_as::<_, MovementTotals>(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE event = 'stock_in'), 0) AS total_in,
                COALESCE(SUM(amount) FILTER (WHERE event = 'stock_out'), 0) AS total_out,
                COUNT(*) AS movement_count
            FROM stock_movements
            WHERE status = 'settled'
              AND ($1::timestamptz IS NULL OR updated_at >= $1)
              AND ($2::timestamptz IS NULL OR updated_at < $2)
              AND ($3::uuid IS NULL OR seller_id = $3)
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(seller_id)
        .fetch_one(&self.db)
        .await?;

        Ok(totals)
    }

    /// Commission amounts grouped by tier over a period, optionally filtered
    /// to one tier.
    pub async fn share_totals(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        tier: Option<CommissionTier>,
    ) -> AppResult<Vec<TierShareTotal>> {
        let rows = sqlx::query_as::<_, TierShareTotal>(
            r#"
            SELECT tier, COALESCE(SUM(amount), 0) AS total_amount, COUNT(*) AS record_count
            FROM commission_records
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at < $2)
              AND ($3::text IS NULL OR tier = $3)
            GROUP BY tier
            ORDER BY tier
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(tier.map(|t| t.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}
