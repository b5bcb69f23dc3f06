//! Billing form state as typed by the user, and its conversion into a
//! [`BillingRun`].
//!
//! Every field is kept as raw text. Numbers are read leniently: whatever
//! numeric prefix the text starts with is used, anything else counts as zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::allocation::{BillingRun, MeterReading};
use crate::errors::{Result, SettlementError};
use crate::roster::Roster;

/// Reads the leading decimal number of `text`, falling back to zero.
///
/// Accepts an optional sign, digits with an optional fraction and an optional
/// exponent. Trailing garbage is ignored (`"12kg"` reads as 12).
pub fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return 0.0;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    trimmed[..end]
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Raw meter readings for one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInput {
    pub previous_inner: String,
    pub previous_outer: String,
    pub current_inner: String,
    pub current_outer: String,
}

impl UnitInput {
    pub fn new(
        previous_inner: impl Into<String>,
        previous_outer: impl Into<String>,
        current_inner: impl Into<String>,
        current_outer: impl Into<String>,
    ) -> Self {
        Self {
            previous_inner: previous_inner.into(),
            previous_outer: previous_outer.into(),
            current_inner: current_inner.into(),
            current_outer: current_outer.into(),
        }
    }

    pub fn to_reading(&self, unit_id: &str) -> MeterReading {
        MeterReading::new(
            unit_id,
            parse_number(&self.previous_inner),
            parse_number(&self.previous_outer),
            parse_number(&self.current_inner),
            parse_number(&self.current_outer),
        )
    }

    pub fn from_reading(reading: &MeterReading) -> Self {
        Self::new(
            format_input(reading.previous_inner),
            format_input(reading.previous_outer),
            format_input(reading.current_inner),
            format_input(reading.current_outer),
        )
    }
}

/// Raw bill totals shared by every unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralInput {
    pub total_water: String,
    pub total_electricity: String,
    pub fixed_maintenance_fee: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingForm {
    pub general: GeneralInput,
    units: BTreeMap<String, UnitInput>,
}

impl BillingForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_totals(
        &mut self,
        total_water: impl Into<String>,
        total_electricity: impl Into<String>,
        fixed_maintenance_fee: impl Into<String>,
    ) {
        self.general = GeneralInput {
            total_water: total_water.into(),
            total_electricity: total_electricity.into(),
            fixed_maintenance_fee: fixed_maintenance_fee.into(),
        };
    }

    pub fn set_unit(&mut self, unit_id: impl Into<String>, input: UnitInput) {
        self.units.insert(unit_id.into(), input);
    }

    pub fn unit(&self, unit_id: &str) -> Option<&UnitInput> {
        self.units.get(unit_id)
    }

    /// Drops inputs of units no longer on the roster.
    pub fn retain_units(&mut self, roster: &Roster) {
        self.units.retain(|unit_id, _| roster.contains(unit_id));
    }

    pub fn clear_units(&mut self) {
        self.units.clear();
    }

    /// Validates the totals and assembles a run for the roster's units, in
    /// roster order. Units without typed readings read as all zeros.
    pub fn build_run(&self, roster: &Roster) -> Result<BillingRun> {
        let total_water_bill = parse_number(&self.general.total_water);
        let total_electricity_bill = parse_number(&self.general.total_electricity);
        let fixed_maintenance_fee = parse_number(&self.general.fixed_maintenance_fee);

        if total_water_bill == 0.0
            || total_electricity_bill == 0.0
            || fixed_maintenance_fee == 0.0
            || roster.is_empty()
        {
            return Err(SettlementError::InvalidInput(
                "water bill, electricity bill, maintenance fee and unit list are all required"
                    .into(),
            ));
        }

        let units = roster
            .names()
            .iter()
            .map(|name| {
                self.units
                    .get(name)
                    .map(|input| input.to_reading(name))
                    .unwrap_or_else(|| MeterReading::new(name.as_str(), 0.0, 0.0, 0.0, 0.0))
            })
            .collect();

        Ok(BillingRun {
            total_water_bill,
            total_electricity_bill,
            fixed_maintenance_fee,
            units,
        })
    }
}

/// Renders a stored number back into form text.
pub fn format_input(value: f64) -> String {
    if value == 0.0 {
        String::new()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_reads_numeric_prefix() {
        assert_eq!(parse_number("42"), 42.0);
        assert_eq!(parse_number("  -3.5"), -3.5);
        assert_eq!(parse_number("12kg"), 12.0);
        assert_eq!(parse_number(".5"), 0.5);
        assert_eq!(parse_number("5."), 5.0);
        assert_eq!(parse_number("1e3"), 1000.0);
        assert_eq!(parse_number("2e"), 2.0);
        assert_eq!(parse_number("+7"), 7.0);
    }

    #[test]
    fn parse_number_coerces_garbage_to_zero() {
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("abc"), 0.0);
        assert_eq!(parse_number("-"), 0.0);
        assert_eq!(parse_number("."), 0.0);
        assert_eq!(parse_number("1e999"), 0.0);
    }

    #[test]
    fn build_run_requires_every_total() {
        let roster = Roster::new(vec!["301".into()]);
        let mut form = BillingForm::new();
        form.set_totals("40000", "", "5000");
        assert!(matches!(
            form.build_run(&roster),
            Err(SettlementError::InvalidInput(_))
        ));

        form.set_totals("40000", "20000", "5000");
        assert!(form.build_run(&roster).is_ok());
        assert!(form.build_run(&Roster::new(Vec::new())).is_err());
    }

    #[test]
    fn build_run_follows_roster_order_and_zero_fills() {
        let roster = Roster::new(vec!["302".into(), "301".into()]);
        let mut form = BillingForm::new();
        form.set_totals("40000", "20000", "5000");
        form.set_unit("301", UnitInput::new("100", "200", "110", "x"));

        let run = form.build_run(&roster).expect("run");
        assert_eq!(run.units[0].unit_id, "302");
        assert_eq!(run.units[0].usage(), 0.0);
        assert_eq!(run.units[1].unit_id, "301");
        assert_eq!(run.units[1].current_outer, 0.0);
        assert_eq!(run.units[1].usage(), -190.0);
    }

    #[test]
    fn retain_units_drops_removed_names() {
        let mut form = BillingForm::new();
        form.set_unit("301", UnitInput::new("1", "2", "3", "4"));
        form.set_unit("302", UnitInput::new("5", "6", "7", "8"));
        form.retain_units(&Roster::new(vec!["302".into()]));
        assert!(form.unit("301").is_none());
        assert_eq!(form.unit("302").map(|u| u.current_outer.as_str()), Some("8"));
    }
}
