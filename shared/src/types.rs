//! Common types used across the platform

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seller tier that originated a stock movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SellerKind {
    Salesman,
    SubAgent,
    Agent,
}

impl SellerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SellerKind::Salesman => "salesman",
            SellerKind::SubAgent => "sub_agent",
            SellerKind::Agent => "agent",
        }
    }
}

impl std::str::FromStr for SellerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "salesman" => Ok(SellerKind::Salesman),
            "sub_agent" => Ok(SellerKind::SubAgent),
            "agent" => Ok(SellerKind::Agent),
            other => Err(format!("unknown seller kind: {}", other)),
        }
    }
}

impl std::fmt::Display for SellerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the seller a movement is attributed to.
///
/// A movement carries at most one seller reference; distributor-direct
/// movements carry none.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SellerRef {
    pub kind: SellerKind,
    pub id: Uuid,
}

impl SellerRef {
    pub fn new(kind: SellerKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}
