//! `shipcost-recon` - Shipment-cost ledger vs sales-order reconciliation engine.
//!
//! Pure engine crate: receives raw tables, returns joined rows, issues and a
//! summary. No CLI or IO dependencies.

pub mod classify;
pub mod config;
pub mod country;
pub mod derived;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod matcher;
pub mod model;
pub mod normalize;

pub use config::ReconConfig;
pub use country::CountryTable;
pub use engine::{run, Reconciliation};
pub use error::ReconError;
pub use model::{
    IssueCategory, IssueReport, JoinedRecord, MatchStatus, OrderRecord, RawTable, ReconResult,
    RowScope, ShipmentRecord,
};
pub use normalize::Normalizer;
