//! Price snapshots and the commission percentage table

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::SellerKind;
use crate::validation::validate_percentage_table;

/// Latest price record for a metric, as returned by the price lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRecord {
    pub id: Uuid,
    pub metric_id: Uuid,
    pub price: Decimal,
    pub net_price: Decimal,
    pub salesman_price: Decimal,
    pub sub_agent_price: Decimal,
    pub agent_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl PriceRecord {
    /// Unit price for the given seller tier.
    pub fn unit_price_for(&self, kind: SellerKind) -> Decimal {
        match kind {
            SellerKind::Salesman => self.salesman_price,
            SellerKind::SubAgent => self.sub_agent_price,
            SellerKind::Agent => self.agent_price,
        }
    }
}

/// Named commission percentage table.
///
/// Fixed fields instead of a key-to-percent map, so a missing key is a
/// loading error rather than a silent zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommissionPercentages {
    pub supplier: Decimal,
    pub shop: Decimal,
    pub salesman: Decimal,
    pub sub_agent: Decimal,
    pub agent: Decimal,
}

impl CommissionPercentages {
    /// Keys the percentage store must provide, matching the field names.
    pub const KEYS: [&'static str; 5] = ["supplier", "shop", "salesman", "sub_agent", "agent"];

    /// Build the table from key/percent entries. Every key in [`Self::KEYS`]
    /// must be present exactly as named.
    pub fn from_entries(entries: &[(String, Decimal)]) -> Result<Self, String> {
        let lookup = |key: &str| -> Result<Decimal, String> {
            entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, percent)| *percent)
                .ok_or_else(|| format!("missing commission percentage key: {}", key))
        };

        Ok(Self {
            supplier: lookup("supplier")?,
            shop: lookup("shop")?,
            salesman: lookup("salesman")?,
            sub_agent: lookup("sub_agent")?,
            agent: lookup("agent")?,
        })
    }

    pub fn for_seller(&self, kind: SellerKind) -> Decimal {
        match kind {
            SellerKind::Salesman => self.salesman,
            SellerKind::SubAgent => self.sub_agent,
            SellerKind::Agent => self.agent,
        }
    }

    /// Each percentage must lie in [0, 100] and the table must sum to at
    /// most 100, so the distributor share can never go negative.
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_percentage_table(self)
    }
}
