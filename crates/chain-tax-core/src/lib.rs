pub mod advisory;
pub mod catalog;
pub mod chain;
pub mod config;
pub mod error;
pub mod tax;
pub mod types;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use catalog::Catalog;
pub use chain::{run_simulation, simulate, EntityResult, SimulationResult};
pub use config::{CalculationConfig, ChainRole, RunDocument};
pub use error::ChainTaxError;
pub use types::*;

/// Standard result type for all chain-tax operations
pub type ChainTaxResult<T> = Result<T, ChainTaxError>;
