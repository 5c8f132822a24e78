//! Applicant age figures.
//!
//! Whole months deliberately under-count: the month in progress is never
//! treated as complete, so eligibility is never overstated.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

const DAYS_PER_YEAR: Decimal = dec!(365.25);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeFigures {
    /// Fractional age in years (elapsed days / 365.25).
    pub years: Decimal,
    /// Whole elapsed months, current month excluded.
    pub months: u32,
}

impl AgeFigures {
    pub const ZERO: AgeFigures = AgeFigures {
        years: Decimal::ZERO,
        months: 0,
    };

    pub fn new(birth_date: NaiveDate, reference: NaiveDate) -> Self {
        Self {
            years: age_years(birth_date, reference),
            months: age_months(birth_date, reference),
        }
    }

    /// Unparseable input yields zero figures, which fail any minimum-age check.
    pub fn from_raw(raw: &str, reference: NaiveDate) -> Self {
        parse_birth_date(raw)
            .map(|birth| Self::new(birth, reference))
            .unwrap_or(Self::ZERO)
    }

    pub fn whole_years(&self) -> u32 {
        self.years.floor().to_u32().unwrap_or(0)
    }
}

pub fn age_years(birth_date: NaiveDate, reference: NaiveDate) -> Decimal {
    let days = (reference - birth_date).num_days();
    if days <= 0 {
        return Decimal::ZERO;
    }
    Decimal::from(days) / DAYS_PER_YEAR
}

pub fn age_months(birth_date: NaiveDate, reference: NaiveDate) -> u32 {
    let months = (reference.year() - birth_date.year()) * 12
        + (reference.month() as i32 - birth_date.month() as i32)
        - 1;
    u32::try_from(months).unwrap_or(0)
}

/// Accepts `YYYY-MM-DD` (optionally followed by a time part), `DD/MM/YYYY`
/// and `DD-MM-YYYY`.
pub fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(['T', ' '])
        .next()
        .unwrap_or(trimmed);

    ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}
