//! Domain models for the Distribution Ledger Platform

mod batch;
mod commission;
mod pricing;
mod stock;

pub use batch::*;
pub use commission::*;
pub use pricing::*;
pub use stock::*;
