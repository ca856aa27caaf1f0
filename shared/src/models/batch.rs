//! Stock batch models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MovementEvent;

/// Composition of a batch, derived from its movement requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchType {
    StockIn,
    StockOut,
    Mixed,
}

impl BatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchType::StockIn => "stock_in",
            BatchType::StockOut => "stock_out",
            BatchType::Mixed => "mixed",
        }
    }

    /// Derive the batch type from the events of its movement requests.
    pub fn from_events<I>(events: I) -> Option<BatchType>
    where
        I: IntoIterator<Item = MovementEvent>,
    {
        let mut derived = None;
        for event in events {
            let kind = match event {
                MovementEvent::StockIn => BatchType::StockIn,
                MovementEvent::StockOut => BatchType::StockOut,
            };
            derived = match derived {
                None => Some(kind),
                Some(current) if current == kind => Some(current),
                Some(_) => Some(BatchType::Mixed),
            };
        }
        derived
    }
}

impl std::str::FromStr for BatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stock_in" => Ok(BatchType::StockIn),
            "stock_out" => Ok(BatchType::StockOut),
            "mixed" => Ok(BatchType::Mixed),
            other => Err(format!("unknown batch type: {}", other)),
        }
    }
}

/// Lifecycle status of a stock batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Processing,
    Completed,
    Settled,
    Canceled,
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
            BatchStatus::Settled => "settled",
            BatchStatus::Canceled => "canceled",
            BatchStatus::Failed => "failed",
        }
    }

    /// Only a fully created batch may be settled.
    pub fn can_settle(&self) -> bool {
        matches!(self, BatchStatus::Completed)
    }

    /// A repeated settlement request against an already settled batch is a
    /// no-op, not a state conflict.
    pub fn settle_is_noop(&self) -> bool {
        matches!(self, BatchStatus::Settled)
    }

    /// Cancellation is a pre-settlement withdrawal. A settled batch can never
    /// be canceled: its movements already anchor later running balances.
    pub fn can_cancel(&self) -> bool {
        matches!(self, BatchStatus::Processing | BatchStatus::Completed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchStatus::Settled | BatchStatus::Canceled | BatchStatus::Failed
        )
    }
}

impl std::str::FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(BatchStatus::Processing),
            "completed" => Ok(BatchStatus::Completed),
            "settled" => Ok(BatchStatus::Settled),
            "canceled" => Ok(BatchStatus::Canceled),
            "failed" => Ok(BatchStatus::Failed),
            other => Err(format!("unknown batch status: {}", other)),
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A batch of stock movements created together and settled together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockBatch {
    pub id: Uuid,
    pub batch_type: BatchType,
    pub status: BatchStatus,
    pub item_count: i32,
    pub success_count: i32,
    pub failure_count: i32,
    pub error_message: Option<String>,
    pub created_by: Uuid,
    pub settled_by: Option<Uuid>,
    pub canceled_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
