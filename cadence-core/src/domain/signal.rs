//! Signal — categorical exposure intent for one symbol at one step.

use serde::{Deserialize, Serialize};

/// Exposure intent emitted by a strategy and consumed by the rebalancer.
///
/// The vocabulary is deliberately small: the engine is long/flat only.
/// `Flat` is the default everywhere a signal has not been computed yet
/// (first calendar step, pre-warmup bars, symbols with no price history).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    /// Want exposure.
    Long,
    /// Want no exposure.
    #[default]
    Flat,
}

impl Signal {
    pub fn is_long(self) -> bool {
        matches!(self, Signal::Long)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Long => "LONG",
            Signal::Flat => "FLAT",
        }
    }
}
