//! Cash-allocation policy applied at rebalance events.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// How available cash is split among symbols opening at a rebalance event.
///
/// Existing open positions are never resized under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RebalancePolicy {
    /// Weight per newly opened symbol = 1 / (total symbols - positions still
    /// held after this step's closes). Spreads cash across all unfilled
    /// slots, not just the symbols opening this step.
    ProRataActive,
    /// Weight per newly opened symbol = 1 / (symbols opening this step).
    /// No opens at all when available cash is non-positive.
    FullActive,
}

impl RebalancePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            RebalancePolicy::ProRataActive => "pro-rata-active",
            RebalancePolicy::FullActive => "full-active",
        }
    }
}

impl fmt::Display for RebalancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RebalancePolicy {
    type Err = ConfigError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "pro-rata-active" => Ok(RebalancePolicy::ProRataActive),
            "full-active" => Ok(RebalancePolicy::FullActive),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}
