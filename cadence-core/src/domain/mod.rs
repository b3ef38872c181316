//! Domain types for the rebalance engine.

pub mod bar;
pub mod ledger;
pub mod policy;
pub mod signal;

pub use bar::Bar;
pub use ledger::{PortfolioLedger, PortfolioStep, SymbolLedger, SymbolStep};
pub use policy::RebalancePolicy;
pub use signal::Signal;

/// Symbol type alias
pub type Symbol = String;
