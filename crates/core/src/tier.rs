//! Deployment tiers.
//!
//! A tier selects which pair of databases a run connects to. Connection
//! strings themselves are resolved from the environment by the caller.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Prod,
    Stage,
    Qa,
    Dev,
}

/// All known tiers, in promotion order.
pub const VALID_TIERS: &[Tier] = &[Tier::Prod, Tier::Stage, Tier::Qa, Tier::Dev];

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Prod => "PROD",
            Tier::Stage => "STAGE",
            Tier::Qa => "QA",
            Tier::Dev => "DEV",
        }
    }

    /// Prefix for tier-specific environment variables, e.g. `CDR_PROD`.
    pub fn env_prefix(&self) -> String {
        format!("CDR_{}", self.as_str())
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        VALID_TIERS
            .iter()
            .copied()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let names: Vec<&str> = VALID_TIERS.iter().map(Tier::as_str).collect();
                CoreError::Validation(format!(
                    "Unknown tier: '{s}'. Valid tiers: {}",
                    names.join(", ")
                ))
            })
    }
}
