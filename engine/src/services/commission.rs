//! Commission ledger: append-only share records
//!
//! One row per applicable tier per settled movement. Rows are written inside
//! the settlement transaction and are never updated or deleted afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::{CommissionRecord, CommissionShare};

use crate::error::{AppError, AppResult};

/// Commission ledger service
#[derive(Clone)]
pub struct CommissionService {
    db: PgPool,
}

/// Row for commission record queries
#[derive(Debug, FromRow)]
struct CommissionRow {
    id: Uuid,
    stock_id: Uuid,
    tier: String,
    percentage: Decimal,
    net_basis: Decimal,
    amount: Decimal,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl CommissionRow {
    fn into_domain(self) -> AppResult<CommissionRecord> {
        let tier = self
            .tier
            .parse()
            .map_err(|msg: String| AppError::Internal(msg))?;
        Ok(CommissionRecord {
            id: self.id,
            stock_id: self.stock_id,
            tier,
            percentage: self.percentage,
            net_basis: self.net_basis,
            amount: self.amount,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

impl CommissionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append the computed shares for a settled movement inside the caller's
    /// settlement transaction.
    pub(crate) async fn insert_shares_on(
        &self,
        conn: &mut PgConnection,
        stock_id: Uuid,
        user_id: Uuid,
        net_basis: Decimal,
        shares: &[CommissionShare],
    ) -> AppResult<()> {
        for share in shares {
            sqlx::query(
                r#"
                INSERT INTO commission_records (stock_id, tier, percentage, net_basis,
                                                amount, created_by)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(stock_id)
            .bind(share.tier.as_str())
            .bind(share.percentage)
            .bind(net_basis)
            .bind(share.amount)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// All commission rows written for a movement, in insertion order.
    pub async fn list_for_movement(&self, stock_id: Uuid) -> AppResult<Vec<CommissionRecord>> {
        let rows = sqlx::query_as::<_, CommissionRow>(
            r#"
            SELECT id, stock_id, tier, percentage, net_basis, amount, created_by, created_at
            FROM commission_records
            WHERE stock_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(stock_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(CommissionRow::into_domain).collect()
    }
}
