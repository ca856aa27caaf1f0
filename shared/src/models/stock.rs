//! Stock movement models and running-balance arithmetic

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::SellerRef;

/// Kind of a stock movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MovementEvent {
    StockIn,
    StockOut,
}

impl MovementEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementEvent::StockIn => "stock_in",
            MovementEvent::StockOut => "stock_out",
        }
    }
}

impl std::str::FromStr for MovementEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stock_in" => Ok(MovementEvent::StockIn),
            "stock_out" => Ok(MovementEvent::StockOut),
            other => Err(format!("unknown movement event: {}", other)),
        }
    }
}

impl std::fmt::Display for MovementEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a stock movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MovementStatus {
    Created,
    Settled,
    Canceled,
    Removed,
}

impl MovementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementStatus::Created => "created",
            MovementStatus::Settled => "settled",
            MovementStatus::Canceled => "canceled",
            MovementStatus::Removed => "removed",
        }
    }

    /// Settlement is a single-shot transition out of `created`.
    pub fn can_settle(&self) -> bool {
        matches!(self, MovementStatus::Created)
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self, MovementStatus::Created)
    }

    pub fn can_remove(&self) -> bool {
        matches!(self, MovementStatus::Created)
    }
}

impl std::str::FromStr for MovementStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(MovementStatus::Created),
            "settled" => Ok(MovementStatus::Settled),
            "canceled" => Ok(MovementStatus::Canceled),
            "removed" => Ok(MovementStatus::Removed),
            other => Err(format!("unknown movement status: {}", other)),
        }
    }
}

impl std::fmt::Display for MovementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stock ledger row.
///
/// Price snapshot fields are captured at creation time; the running-balance
/// fields (`initial_amount`, `update_amount`) and the per-tier share totals
/// are populated if and only if `status` is `Settled`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    /// Owning batch; `None` for single-movement fast-path rows.
    pub batch_id: Option<Uuid>,
    pub metric_id: Uuid,
    pub event: MovementEvent,
    pub amount: Decimal,
    pub seller: Option<SellerRef>,
    // Price snapshot (creation time)
    pub total_price: Decimal,
    pub total_net_price: Decimal,
    pub salesman_price: Decimal,
    pub sub_agent_price: Decimal,
    pub agent_price: Decimal,
    // Settlement results (null until settled)
    pub initial_amount: Option<Decimal>,
    pub update_amount: Option<Decimal>,
    pub total_distributor_share: Option<Decimal>,
    pub total_salesman_share: Option<Decimal>,
    pub total_sub_agent_share: Option<Decimal>,
    pub total_agent_share: Option<Decimal>,
    pub total_shop_share: Option<Decimal>,
    /// Monotonic settlement order marker; the running-balance chain follows
    /// it, not `updated_at`, which is identical across one transaction.
    pub settlement_seq: Option<i64>,
    pub status: MovementStatus,
    pub created_by: Uuid,
    pub settled_by: Option<Uuid>,
    pub canceled_by: Option<Uuid>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rule violations raised by the pure ledger arithmetic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerRuleError {
    #[error("movement amount must be greater than zero")]
    NonPositiveAmount,

    #[error("insufficient stock: {available} on hand, {requested} requested")]
    InsufficientStock {
        available: Decimal,
        requested: Decimal,
    },
}

/// Apply a movement to a running balance.
///
/// `initial` is the `update_amount` of the metric's most recently settled
/// movement (zero when none exists). A stock-out must never drive the
/// balance negative.
pub fn apply_movement(
    initial: Decimal,
    event: MovementEvent,
    amount: Decimal,
) -> Result<Decimal, LedgerRuleError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerRuleError::NonPositiveAmount);
    }

    match event {
        MovementEvent::StockIn => Ok(initial + amount),
        MovementEvent::StockOut => {
            if initial < amount {
                return Err(LedgerRuleError::InsufficientStock {
                    available: initial,
                    requested: amount,
                });
            }
            Ok(initial - amount)
        }
    }
}
