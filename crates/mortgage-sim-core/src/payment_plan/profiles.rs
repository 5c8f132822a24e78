use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Percent;

/// Commercial tier of the buyer; higher tiers tolerate heavier commitments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientProfile {
    Diamond,
    Gold,
    #[default]
    Silver,
    Bronze,
    Steel,
}

/// Ceilings in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileLimits {
    /// Financing installment plus deferred installment over income.
    pub income_commitment: Percent,
    /// Corrected deferred balance over the base value of the unit.
    pub deferred_share: Percent,
    /// Deferred installment over income.
    pub deferred_commitment: Percent,
}

impl ClientProfile {
    pub fn limits(&self) -> ProfileLimits {
        let (income_commitment, deferred_share, deferred_commitment) = match self {
            ClientProfile::Diamond => (dec!(50), dec!(25), dec!(20)),
            ClientProfile::Gold => (dec!(50), dec!(20), dec!(20)),
            ClientProfile::Silver => (dec!(48), dec!(18), dec!(18)),
            ClientProfile::Bronze => (dec!(45), dec!(15), dec!(15)),
            ClientProfile::Steel => (dec!(40), dec!(12), dec!(10)),
        };
        ProfileLimits {
            income_commitment,
            deferred_share,
            deferred_commitment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitCheck {
    pub name: String,
    pub value: Percent,
    pub limit: Percent,
    pub exceeded: bool,
}

impl LimitCheck {
    pub fn new(name: &str, value: Percent, limit: Percent) -> Self {
        Self {
            name: name.to_string(),
            value,
            limit,
            exceeded: value > limit,
        }
    }
}

/// `part / whole` in percent, zero when `whole` is not positive and
/// saturating at `Decimal::MAX` when out of range.
pub fn percent_of(part: Decimal, whole: Decimal) -> Percent {
    if whole <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        part.checked_div(whole)
            .and_then(|ratio| ratio.checked_mul(dec!(100)))
            .unwrap_or(Decimal::MAX)
    }
}
