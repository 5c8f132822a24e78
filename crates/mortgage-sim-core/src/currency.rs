//! Locale-tolerant amount parsing.
//!
//! Request amounts arrive either as JSON numbers or as strings typed by a
//! person, in Brazilian (`1.234,56`) or international (`1,234.56`) notation,
//! sometimes with a currency prefix. The separator heuristic is approximate:
//! a lone comma followed by three digits reads as a thousands separator, so
//! `1,234` is one thousand two hundred thirty-four, never one point two.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MortgageSimError;
use crate::types::Money;
use crate::MortgageSimResult;

/// An amount as supplied by the caller: a number or a formatted string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Text(String),
    Number(Decimal),
}

impl AmountInput {
    pub fn parsed(&self) -> Option<Money> {
        match self {
            AmountInput::Text(s) => parse_amount(s),
            AmountInput::Number(n) => Some(*n),
        }
    }

    /// Parse and require a strictly positive amount.
    pub fn resolve(&self, field: &str) -> MortgageSimResult<Money> {
        match self.parsed() {
            Some(v) if v > Decimal::ZERO => Ok(v),
            Some(_) => Err(MortgageSimError::validation(field, "must be greater than zero")),
            None => Err(MortgageSimError::validation(
                field,
                format!("could not read an amount from {self}"),
            )),
        }
    }
}

impl std::fmt::Display for AmountInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmountInput::Text(s) => write!(f, "'{s}'"),
            AmountInput::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<Decimal> for AmountInput {
    fn from(value: Decimal) -> Self {
        AmountInput::Number(value)
    }
}

impl From<&str> for AmountInput {
    fn from(value: &str) -> Self {
        AmountInput::Text(value.to_string())
    }
}

/// Parse a formatted amount, auto-detecting the decimal separator.
///
/// Returns `None` for empty or unreadable input.
pub fn parse_amount(raw: &str) -> Option<Money> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let has_comma = cleaned.contains(',');
    let dots = cleaned.matches('.').count();

    let normalised = if has_comma && dots > 0 {
        // 1.234.567,89
        cleaned.replace('.', "").replacen(',', ".", 1)
    } else if has_comma {
        let mut parts = cleaned.split(',');
        let _whole = parts.next();
        let fraction = parts.next().unwrap_or_default();
        let single_comma = parts.next().is_none();
        if single_comma && fraction.len() <= 2 {
            cleaned.replacen(',', ".", 1)
        } else {
            cleaned.replace(',', "")
        }
    } else if dots > 1 {
        // 1.234.567
        cleaned.replace('.', "")
    } else {
        cleaned
    };

    Decimal::from_str(&normalised).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_amount_table() {
        let cases: &[(&str, Option<Decimal>)] = &[
            ("10000", Some(dec!(10000))),
            ("10000.50", Some(dec!(10000.50))),
            ("10000,50", Some(dec!(10000.50))),
            ("10.000,50", Some(dec!(10000.50))),
            ("R$ 1.234.567,89", Some(dec!(1234567.89))),
            ("1,000", Some(dec!(1000))),
            ("1,000,000", Some(dec!(1000000))),
            ("1,5", Some(dec!(1.5))),
            ("1.000.000", Some(dec!(1000000))),
            ("  3500 ", Some(dec!(3500))),
            ("R$\u{a0}400.000,00", Some(dec!(400000))),
            ("-150,25", Some(dec!(-150.25))),
            // a single dot is always decimal, even before three digits
            ("1.000", Some(dec!(1))),
            ("", None),
            ("R$", None),
            ("abc", None),
            ("1-2", None),
        ];

        for (raw, expected) in cases {
            assert_eq!(parse_amount(raw), *expected, "parsing {raw:?}");
        }
    }

    #[test]
    fn test_amount_input_from_json() {
        let text: AmountInput = serde_json::from_str("\"10.000,00\"").unwrap();
        let number: AmountInput = serde_json::from_str("2500.5").unwrap();
        assert_eq!(text.parsed(), Some(dec!(10000)));
        assert_eq!(number.parsed(), Some(dec!(2500.5)));
    }

    #[test]
    fn test_resolve_rejects_non_positive() {
        let zero = AmountInput::from("0,00");
        let junk = AmountInput::from("n/a");
        assert!(matches!(
            zero.resolve("income"),
            Err(MortgageSimError::Validation { .. })
        ));
        assert!(matches!(
            junk.resolve("income"),
            Err(MortgageSimError::Validation { .. })
        ));
        assert_eq!(AmountInput::from(dec!(12.5)).resolve("income").unwrap(), dec!(12.5));
    }
}
