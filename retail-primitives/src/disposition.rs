//! Routing decisions for returned items.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Where a returned item should go next.
///
/// The set is closed: decoding never coerces an unknown value into one of
/// these variants.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Restock and sell again.
    Resale,
    /// Give to a charitable partner.
    Donation,
    /// Sell off in bulk to recover residual value.
    Liquidation,
}

impl Disposition {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 3] = [Self::Resale, Self::Donation, Self::Liquidation];

    /// Wire name of the variant.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resale => "resale",
            Self::Donation => "donation",
            Self::Liquidation => "liquidation",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Disposition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == s)
            .ok_or_else(|| Error::UnknownDisposition {
                value: s.to_owned(),
            })
    }
}
