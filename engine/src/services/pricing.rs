//! Price and commission-percentage lookups
//!
//! Read-only collaborators consumed by the settlement path. Both lookups go
//! to the database on every call: settlement must see the table as it is at
//! that moment, and already-settled records keep the values they were
//! computed with.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::{CommissionPercentages, PriceRecord};

use crate::error::{AppError, AppResult};

/// Pricing service for latest-price and percentage-table lookups
#[derive(Clone)]
pub struct PricingService {
    db: PgPool,
}

/// Row for metric price queries
#[derive(Debug, FromRow)]
struct PriceRow {
    id: Uuid,
    metric_id: Uuid,
    price: Decimal,
    net_price: Decimal,
    salesman_price: Decimal,
    sub_agent_price: Decimal,
    agent_price: Decimal,
    created_at: DateTime<Utc>,
}

impl From<PriceRow> for PriceRecord {
    fn from(row: PriceRow) -> Self {
        PriceRecord {
            id: row.id,
            metric_id: row.metric_id,
            price: row.price,
            net_price: row.net_price,
            salesman_price: row.salesman_price,
            sub_agent_price: row.sub_agent_price,
            agent_price: row.agent_price,
            created_at: row.created_at,
        }
    }
}

impl PricingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Latest price record for a metric, or `None` when the metric has never
    /// been priced.
    pub async fn latest_price(&self, metric_id: Uuid) -> AppResult<Option<PriceRecord>> {
        let row = sqlx::query_as::<_, PriceRow>(
            r#"
            SELECT id, metric_id, price, net_price, salesman_price, sub_agent_price,
                   agent_price, created_at
            FROM metric_prices
            WHERE metric_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(metric_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    /// The current commission percentage table.
    ///
    /// Every key must be present and the table must validate; a partial or
    /// inconsistent table is a configuration error, never a silent zero.
    pub async fn commission_percentages(&self) -> AppResult<CommissionPercentages> {
        let entries = sqlx::query_as::<_, (String, Decimal)>(
            "SELECT key, percent FROM commission_percentages",
        )
        .fetch_all(&self.db)
        .await?;

        let table =
            CommissionPercentages::from_entries(&entries).map_err(AppError::Configuration)?;
        table
            .validate()
            .map_err(|msg| AppError::Configuration(msg.to_string()))?;

        Ok(table)
    }
}
