//! Stock ledger service: movement creation and settlement
//!
//! Creation is a pure, order-independent append that captures a price
//! snapshot. Settlement chains a metric's movements into a running balance,
//! computes the commission shares, and flips the row to `settled`, all
//! inside the caller's transaction. Both the batch coordinator and the
//! single-movement fast path drive the same `_on` internals, so there is one
//! calculation path.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::{
    apply_movement, calculate_commission, validate_amount, CommissionRecord, CommissionTier,
    MovementEvent, SellerRef, StockMovement,
};

use crate::error::{AppError, AppResult};
use crate::services::{CommissionService, PricingService};

const MOVEMENT_COLUMNS: &str = r#"
    id, batch_id, metric_id, event, amount, seller_kind, seller_id,
    total_price, total_net_price, salesman_price, sub_agent_price, agent_price,
    initial_amount, update_amount, total_distributor_share, total_salesman_share,
    total_sub_agent_share, total_agent_share, total_shop_share, settlement_seq,
    status, created_by, settled_by, canceled_by, description, created_at, updated_at
"#;

/// Stock ledger service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
    pricing: PricingService,
}

/// Input for recording a stock movement
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMovementInput {
    pub metric_id: Uuid,
    pub event: MovementEvent,
    pub amount: Decimal,
    pub seller: Option<SellerRef>,
    pub description: Option<String>,
}

/// Row for stock movement queries
#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    batch_id: Option<Uuid>,
    metric_id: Uuid,
    event: String,
    amount: Decimal,
    seller_kind: Option<String>,
    seller_id: Option<Uuid>,
    total_price: Decimal,
    total_net_price: Decimal,
    salesman_price: Decimal,
    sub_agent_price: Decimal,
    agent_price: Decimal,
    initial_amount: Option<Decimal>,
    update_amount: Option<Decimal>,
    total_distributor_share: Option<Decimal>,
    total_salesman_share: Option<Decimal>,
    total_sub_agent_share: Option<Decimal>,
    total_agent_share: Option<Decimal>,
    total_shop_share: Option<Decimal>,
    settlement_seq: Option<i64>,
    status: String,
    created_by: Uuid,
    settled_by: Option<Uuid>,
    canceled_by: Option<Uuid>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MovementRow {
    fn into_domain(self) -> AppResult<StockMovement> {
        let event = self
            .event
            .parse()
            .map_err(|msg: String| AppError::Internal(msg))?;
        let status = self
            .status
            .parse()
            .map_err(|msg: String| AppError::Internal(msg))?;
        let seller = match (self.seller_kind, self.seller_id) {
            (Some(kind), Some(id)) => {
                let kind = kind.parse().map_err(|msg: String| AppError::Internal(msg))?;
                Some(SellerRef::new(kind, id))
            }
            (None, None) => None,
            _ => {
                return Err(AppError::Internal(format!(
                    "movement {} has an inconsistent seller reference",
                    self.id
                )))
            }
        };

        Ok(StockMovement {
            id: self.id,
            batch_id: self.batch_id,
            metric_id: self.metric_id,
            event,
            amount: self.amount,
            seller,
            total_price: self.total_price,
            total_net_price: self.total_net_price,
            salesman_price: self.salesman_price,
            sub_agent_price: self.sub_agent_price,
            agent_price: self.agent_price,
            initial_amount: self.initial_amount,
            update_amount: self.update_amount,
            total_distributor_share: self.total_distributor_share,
            total_salesman_share: self.total_salesman_share,
            total_sub_agent_share: self.total_sub_agent_share,
            total_agent_share: self.total_agent_share,
            total_shop_share: self.total_shop_share,
            settlement_seq: self.settlement_seq,
            status,
            created_by: self.created_by,
            settled_by: self.settled_by,
            canceled_by: self.canceled_by,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl StockService {
    pub fn new(db: PgPool, pricing: PricingService) -> Self {
        Self { db, pricing }
    }

    /// Record a single movement outside any batch.
    pub async fn create_movement(
        &self,
        user_id: Uuid,
        input: CreateMovementInput,
    ) -> AppResult<StockMovement> {
        let mut tx = self.db.begin().await?;
        let movement_id = self
            .create_movement_on(&mut *tx, user_id, &input, None)
            .await?;
        tx.commit().await?;

        self.get_movement(movement_id).await
    }

    /// Settle a single `created` movement.
    pub async fn settle_movement(
        &self,
        user_id: Uuid,
        movement_id: Uuid,
    ) -> AppResult<StockMovement> {
        let mut tx = self.db.begin().await?;
        self.settle_movement_on(&mut *tx, user_id, movement_id)
            .await?;
        tx.commit().await?;

        self.get_movement(movement_id).await
    }

    /// Single-movement fast path: create and settle in one transaction.
    pub async fn create_and_settle(
        &self,
        user_id: Uuid,
        input: CreateMovementInput,
    ) -> AppResult<StockMovement> {
        let mut tx = self.db.begin().await?;
        let movement_id = self
            .create_movement_on(&mut *tx, user_id, &input, None)
            .await?;
        self.settle_movement_on(&mut *tx, user_id, movement_id)
            .await?;
        tx.commit().await?;

        self.get_movement(movement_id).await
    }

    /// Withdraw a not-yet-settled non-batch movement. The row stays in the
    /// ledger as an audit record with status `removed`.
    pub async fn remove_movement(
        &self,
        user_id: Uuid,
        movement_id: Uuid,
    ) -> AppResult<StockMovement> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {} FROM stock_movements WHERE id = $1 FOR UPDATE",
            MOVEMENT_COLUMNS
        ))
        .bind(movement_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement".to_string()))?;
        let movement = row.into_domain()?;

        if movement.batch_id.is_some() {
            return Err(AppError::InvalidStateTransition(format!(
                "movement {} belongs to a batch; cancel the batch instead",
                movement.id
            )));
        }
        if !movement.status.can_remove() {
            return Err(AppError::InvalidStateTransition(format!(
                "movement {} is {}, only created movements can be removed",
                movement.id, movement.status
            )));
        }

        sqlx::query(
            r#"
            UPDATE stock_movements
            SET status = 'removed', canceled_by = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(user_id)
        .bind(movement_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_movement(movement_id).await
    }

    /// Get a movement by id.
    pub async fn get_movement(&self, movement_id: Uuid) -> AppResult<StockMovement> {
        let row = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {} FROM stock_movements WHERE id = $1",
            MOVEMENT_COLUMNS
        ))
        .bind(movement_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement".to_string()))?;

        row.into_domain()
    }

    /// Commission rows written when the movement settled.
    pub async fn commissions_for_movement(
        &self,
        movement_id: Uuid,
    ) -> AppResult<Vec<CommissionRecord>> {
        CommissionService::new(self.db.clone())
            .list_for_movement(movement_id)
            .await
    }

    /// Append one movement row inside the caller's transaction.
    ///
    /// Captures the price snapshot at creation time and leaves every
    /// settlement column null. Never reads or writes other movements.
    pub(crate) async fn create_movement_on(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        input: &CreateMovementInput,
        batch_id: Option<Uuid>,
    ) -> AppResult<Uuid> {
        validate_amount(input.amount)
            .map_err(|msg| AppError::validation("amount", msg))?;

        let price = self
            .pricing
            .latest_price(input.metric_id)
            .await?
            .ok_or(AppError::NoPriceAvailable(input.metric_id))?;

        let total_price = input.amount * price.price;
        let total_net_price = input.amount * price.net_price;

        // Tier unit price is captured only for the tier the movement is
        // attributed to; the other tier columns stay at zero.
        let mut salesman_price = Decimal::ZERO;
        let mut sub_agent_price = Decimal::ZERO;
        let mut agent_price = Decimal::ZERO;
        if let Some(seller) = input.seller {
            let unit = price.unit_price_for(seller.kind);
            match seller.kind {
                shared::SellerKind::Salesman => salesman_price = unit,
                shared::SellerKind::SubAgent => sub_agent_price = unit,
                shared::SellerKind::Agent => agent_price = unit,
            }
        }

        let movement_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO stock_movements (batch_id, metric_id, event, amount, seller_kind,
                                         seller_id, total_price, total_net_price,
                                         salesman_price, sub_agent_price, agent_price,
                                         status, created_by, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'created', $12, $13)
            RETURNING id
            "#,
        )
        .bind(batch_id)
        .bind(input.metric_id)
        .bind(input.event.as_str())
        .bind(input.amount)
        .bind(input.seller.map(|s| s.kind.as_str()))
        .bind(input.seller.map(|s| s.id))
        .bind(total_price)
        .bind(total_net_price)
        .bind(salesman_price)
        .bind(sub_agent_price)
        .bind(agent_price)
        .bind(user_id)
        .bind(&input.description)
        .fetch_one(&mut *conn)
        .await?;

        Ok(movement_id)
    }

    /// Settle one `created` movement inside the caller's transaction.
    ///
    /// Settlement is single-shot: a movement in any other status is a state
    /// conflict, never a silent skip. The running balance continues from the
    /// metric's most recently settled movement (zero when none exists).
    pub(crate) async fn settle_movement_on(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        movement_id: Uuid,
    ) -> AppResult<()> {
        let row = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {} FROM stock_movements WHERE id = $1 FOR UPDATE",
            MOVEMENT_COLUMNS
        ))
        .bind(movement_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement".to_string()))?;
        let movement = row.into_domain()?;

        if !movement.status.can_settle() {
            return Err(AppError::InvalidStateTransition(format!(
                "movement {} is {}, only created movements can settle",
                movement.id, movement.status
            )));
        }

        // Single settlement writer per metric. The lock is held until the
        // enclosing transaction ends, so two fast-path settlements on the
        // same metric (or a fast path racing a batch) cannot both read the
        // same chain head.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(movement.metric_id)
            .execute(&mut *conn)
            .await?;

        // The chain follows settlement order. `updated_at` cannot: NOW() is
        // transaction-constant, so movements settled in one batch all carry
        // the same timestamp.
        let initial_amount = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT update_amount FROM stock_movements
            WHERE metric_id = $1 AND status = 'settled'
            ORDER BY settlement_seq DESC
            LIMIT 1
            "#,
        )
        .bind(movement.metric_id)
        .fetch_optional(&mut *conn)
        .await?
        .unwrap_or(Decimal::ZERO);

        let update_amount = apply_movement(initial_amount, movement.event, movement.amount)?;

        // Percentages are read fresh for every settlement; table changes
        // only affect movements that have not settled yet.
        let percentages = self.pricing.commission_percentages().await?;
        let shares = calculate_commission(
            movement.total_net_price,
            movement.seller.map(|s| s.kind),
            &percentages,
            movement.event,
        );

        CommissionService::new(self.db.clone())
            .insert_shares_on(
                &mut *conn,
                movement.id,
                user_id,
                movement.total_net_price,
                &shares,
            )
            .await?;

        let share_for =
            |tier: CommissionTier| shares.iter().find(|s| s.tier == tier).map(|s| s.amount);

        sqlx::query(
            r#"
            UPDATE stock_movements
            SET initial_amount = $1, update_amount = $2,
                total_distributor_share = $3, total_salesman_share = $4,
                total_sub_agent_share = $5, total_agent_share = $6, total_shop_share = $7,
                settlement_seq = nextval('stock_settlement_seq'),
                status = 'settled', settled_by = $8, updated_at = NOW()
            WHERE id = $9
            "#,
        )
        .bind(initial_amount)
        .bind(update_amount)
        .bind(share_for(CommissionTier::Distributor))
        .bind(share_for(CommissionTier::Salesman))
        .bind(share_for(CommissionTier::SubAgent))
        .bind(share_for(CommissionTier::Agent))
        .bind(share_for(CommissionTier::Shop))
        .bind(user_id)
        .bind(movement.id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
