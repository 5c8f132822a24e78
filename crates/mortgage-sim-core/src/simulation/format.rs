//! pt-BR display strings for the simulation response.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::types::{Money, Months, Rate};

fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// `R$ 1.234,56`
pub fn format_brl(value: Money) -> String {
    let rounded = round_half_up(value, 2);
    let negative = rounded < Decimal::ZERO;
    let plain = format!("{:.2}", rounded.abs());
    let (whole, cents) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}R$ {grouped},{cents}")
}

/// A rate as a percentage with `dp` decimals: `0.25` → `25.00%`.
pub fn format_rate(rate: Rate, dp: usize) -> String {
    format_percent(rate * dec!(100), dp)
}

/// A value already in percent: `25` → `25.00%`.
pub fn format_percent(percent: Decimal, dp: usize) -> String {
    let rounded = round_half_up(percent, dp as u32);
    format!("{rounded:.dp$}%")
}

/// `30 anos`, `1 ano e 1 mês`, `11 meses`
pub fn format_term(months: Months) -> String {
    let years = months / 12;
    let rest = months % 12;
    let months_part = |m: Months| format!("{m} {}", if m == 1 { "mês" } else { "meses" });

    if years == 0 {
        return months_part(rest);
    }
    let years_part = format!("{years} {}", if years == 1 { "ano" } else { "anos" });
    if rest == 0 {
        years_part
    } else {
        format!("{years_part} e {}", months_part(rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(dec!(0)), "R$ 0,00");
        assert_eq!(format_brl(dec!(5.5)), "R$ 5,50");
        assert_eq!(format_brl(dec!(999.995)), "R$ 1.000,00");
        assert_eq!(format_brl(dec!(1234.56)), "R$ 1.234,56");
        assert_eq!(format_brl(dec!(320000)), "R$ 320.000,00");
        assert_eq!(format_brl(dec!(1234567.891)), "R$ 1.234.567,89");
        assert_eq!(format_brl(dec!(-42.1)), "-R$ 42,10");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_rate(dec!(0.25), 2), "25.00%");
        assert_eq!(format_rate(dec!(0.109259), 4), "10.9259%");
        assert_eq!(format_rate(dec!(0.9), 0), "90%");
        assert_eq!(format_percent(dec!(19.995), 2), "20.00%");
    }

    #[test]
    fn test_format_term() {
        assert_eq!(format_term(360), "30 anos");
        assert_eq!(format_term(13), "1 ano e 1 mês");
        assert_eq!(format_term(246), "20 anos e 6 meses");
        assert_eq!(format_term(1), "1 mês");
        assert_eq!(format_term(11), "11 meses");
    }
}
