//! Commission models and the share calculator

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CommissionPercentages, MovementEvent};
use crate::types::SellerKind;

/// Tier a commission share is attributed to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CommissionTier {
    Distributor,
    Salesman,
    SubAgent,
    Agent,
    Shop,
}

impl CommissionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionTier::Distributor => "distributor",
            CommissionTier::Salesman => "salesman",
            CommissionTier::SubAgent => "sub_agent",
            CommissionTier::Agent => "agent",
            CommissionTier::Shop => "shop",
        }
    }
}

impl From<SellerKind> for CommissionTier {
    fn from(kind: SellerKind) -> Self {
        match kind {
            SellerKind::Salesman => CommissionTier::Salesman,
            SellerKind::SubAgent => CommissionTier::SubAgent,
            SellerKind::Agent => CommissionTier::Agent,
        }
    }
}

impl std::str::FromStr for CommissionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "distributor" => Ok(CommissionTier::Distributor),
            "salesman" => Ok(CommissionTier::Salesman),
            "sub_agent" => Ok(CommissionTier::SubAgent),
            "agent" => Ok(CommissionTier::Agent),
            "shop" => Ok(CommissionTier::Shop),
            other => Err(format!("unknown commission tier: {}", other)),
        }
    }
}

impl std::fmt::Display for CommissionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One computed share of a settled movement's net price
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommissionShare {
    pub tier: CommissionTier,
    pub percentage: Decimal,
    pub amount: Decimal,
}

/// A persisted commission ledger row (append-only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionRecord {
    pub id: Uuid,
    pub stock_id: Uuid,
    pub tier: CommissionTier,
    pub percentage: Decimal,
    pub net_basis: Decimal,
    pub amount: Decimal,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Compute the per-tier shares of a settled movement's net price.
///
/// Rules:
/// - the distributor keeps 100% minus the supplier, shop, and seller-tier
///   percentages. Agent sales do not subtract the shop percentage from the
///   distributor share, even though a shop share is still written for every
///   stock-out below; for an agent stock-out the written percentages sum to
///   more than 100. This matches the historical settlement behavior.
/// - the seller-tier share goes to exactly the matching tier; no rows are
///   produced for absent tiers.
/// - the shop share exists only for stock-out movements: stock entering
///   inventory is not a sale and earns the shop nothing.
///
/// Percentages are taken from the table as passed in; callers look the table
/// up fresh per settlement so already-settled records keep their original
/// values.
pub fn calculate_commission(
    total_net_price: Decimal,
    seller: Option<SellerKind>,
    percentages: &CommissionPercentages,
    event: MovementEvent,
) -> Vec<CommissionShare> {
    let hundred = Decimal::ONE_HUNDRED;
    let seller_percent = seller
        .map(|kind| percentages.for_seller(kind))
        .unwrap_or(Decimal::ZERO);

    let mut distributor_percent = hundred - percentages.supplier - seller_percent;
    if seller != Some(SellerKind::Agent) {
        distributor_percent -= percentages.shop;
    }

    let share = |tier: CommissionTier, percentage: Decimal| CommissionShare {
        tier,
        percentage,
        amount: total_net_price * percentage / hundred,
    };

    let mut shares = vec![share(CommissionTier::Distributor, distributor_percent)];

    if let Some(kind) = seller {
        shares.push(share(kind.into(), seller_percent));
    }

    if event == MovementEvent::StockOut {
        shares.push(share(CommissionTier::Shop, percentages.shop));
    }

    shares
}
