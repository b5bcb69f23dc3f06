//! Display formatting for settlement amounts.
//!
//! Amounts are whole currency units in practice; fractional values (a
//! fractional maintenance fee, for instance) keep up to two decimals.

use serde::{Deserialize, Serialize};

use crate::config::Config;

const MAX_FRACTION_DIGITS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountFormat {
    pub grouping_separator: char,
    /// Appended after the number, e.g. `25,000 원`.
    pub label: String,
}

impl Default for AmountFormat {
    fn default() -> Self {
        Self {
            grouping_separator: Config::default_grouping_separator(),
            label: Config::default_currency_label(),
        }
    }
}

impl AmountFormat {
    pub fn from_config(config: &Config) -> Self {
        Self {
            grouping_separator: config.grouping_separator,
            label: config.currency_label.clone(),
        }
    }

    pub fn amount(&self, value: f64) -> String {
        let body = format_number(value, self.grouping_separator);
        if self.label.is_empty() {
            body
        } else {
            format!("{} {}", body, self.label)
        }
    }
}

/// Groups the integer digits of `value` in threes and trims trailing zeros
/// from the fraction.
pub fn format_number(value: f64, separator: char) -> String {
    let mut body = format!("{:.*}", MAX_FRACTION_DIGITS, value.abs());
    if body.contains('.') {
        let trimmed_len = body.trim_end_matches('0').trim_end_matches('.').len();
        body.truncate(trimmed_len);
    }
    let (int_part, frac_part) = match body.find('.') {
        Some(pos) => body.split_at(pos),
        None => (body.as_str(), ""),
    };
    let grouped = group_digits(int_part, separator);
    let negative = value < 0.0 && (grouped != "0" || !frac_part.is_empty());
    if negative {
        format!("-{}{}", grouped, frac_part)
    } else {
        format!("{}{}", grouped, frac_part)
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    let mut count = 0;
    for ch in digits.chars().rev() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
        count += 1;
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands_and_appends_label() {
        let format = AmountFormat::default();
        assert_eq!(format.amount(25000.0), "25,000 원");
        assert_eq!(format.amount(1234567.0), "1,234,567 원");
        assert_eq!(format.amount(0.0), "0 원");
    }

    #[test]
    fn keeps_short_fractions_and_signs() {
        assert_eq!(format_number(1234.5, ','), "1,234.5");
        assert_eq!(format_number(-10000.0, ','), "-10,000");
        assert_eq!(format_number(-0.001, ','), "0");
        assert_eq!(format_number(999.999, ' '), "1 000");
    }

    #[test]
    fn empty_label_prints_bare_number() {
        let format = AmountFormat {
            grouping_separator: '.',
            label: String::new(),
        };
        assert_eq!(format.amount(45000.0), "45.000");
    }
}
