//! Business logic services for the Distribution Ledger Platform

pub mod batch;
pub mod commission;
pub mod pricing;
pub mod reporting;
pub mod stock;

pub use batch::BatchService;
pub use commission::CommissionService;
pub use pricing::PricingService;
pub use reporting::ReportingService;
pub use stock::StockService;
