//! Splits a shared water and electricity bill across housing units.
//!
//! Water is shared in proportion to each unit's meter delta, electricity is
//! shared equally, and the per-unit sums are snapped to the billing
//! granularity before the rounding remainder is handed back out in whole
//! granularity steps so the unit costs add up to the billed total.

mod reconcile;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{Result, SettlementError};

/// Currency denomination every combined cost is snapped to.
pub const DEFAULT_GRANULARITY: f64 = 10.0;
/// Decimal places of the rounding error used when grouping tied units.
pub const DEFAULT_ERROR_PRECISION: u32 = 4;

/// Water-meter readings for one unit over one billing period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    pub unit_id: String,
    pub previous_inner: f64,
    pub previous_outer: f64,
    pub current_inner: f64,
    pub current_outer: f64,
}

impl MeterReading {
    pub fn new(
        unit_id: impl Into<String>,
        previous_inner: f64,
        previous_outer: f64,
        current_inner: f64,
        current_outer: f64,
    ) -> Self {
        Self {
            unit_id: unit_id.into(),
            previous_inner,
            previous_outer,
            current_inner,
            current_outer,
        }
    }

    /// Combined delta of both meters. Negative after a meter reset.
    pub fn usage(&self) -> f64 {
        (self.current_inner - self.previous_inner) + (self.current_outer - self.previous_outer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitUsage {
    pub unit_id: String,
    pub usage: f64,
    pub fixed_maintenance_fee: f64,
}

/// How `allocate` treats a unit whose meters report negative usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeUsagePolicy {
    /// Keep the value; the unit receives a negative water share.
    #[default]
    PassThrough,
    /// Treat the unit as having used nothing.
    Clamp,
    /// Fail with `InvalidInput`.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorSettings {
    pub granularity: f64,
    pub error_precision: u32,
    pub negative_usage: NegativeUsagePolicy,
}

impl Default for AllocatorSettings {
    fn default() -> Self {
        Self {
            granularity: DEFAULT_GRANULARITY,
            error_precision: DEFAULT_ERROR_PRECISION,
            negative_usage: NegativeUsagePolicy::default(),
        }
    }
}

/// Per-unit outcome of an allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub unit_id: String,
    pub usage: f64,
    pub fixed_maintenance_fee: f64,
    pub initial_combined_cost: f64,
    pub rounded_combined_cost: f64,
    pub rounding_error: f64,
    /// Reconciliation step applied on top of the rounded cost, zero when the
    /// unit was left alone.
    pub adjustment: f64,
    pub final_combined_cost: f64,
    pub final_house_bill: f64,
}

impl AllocationResult {
    pub fn was_adjusted(&self) -> bool {
        self.adjustment != 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Results in the order the units were supplied.
    pub results: Vec<AllocationResult>,
    pub expected_total: f64,
    /// Part of the rounding difference no whole group could absorb.
    pub residual: f64,
}

impl Allocation {
    pub fn combined_total(&self) -> f64 {
        self.results
            .iter()
            .map(|result| result.final_combined_cost)
            .sum()
    }

    pub fn house_bill_total(&self) -> f64 {
        self.results
            .iter()
            .map(|result| result.final_house_bill)
            .sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.residual == 0.0
    }

    pub fn result(&self, unit_id: &str) -> Option<&AllocationResult> {
        self.results.iter().find(|result| result.unit_id == unit_id)
    }
}

/// Everything needed to settle one billing period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingRun {
    pub total_water_bill: f64,
    pub total_electricity_bill: f64,
    pub fixed_maintenance_fee: f64,
    pub units: Vec<MeterReading>,
}

impl BillingRun {
    pub fn expected_total(&self) -> f64 {
        self.total_water_bill + self.total_electricity_bill
    }
}

/// Derives each unit's usage from its meter readings.
pub fn compute_usage(readings: &[MeterReading], fixed_maintenance_fee: f64) -> Vec<UnitUsage> {
    readings
        .iter()
        .map(|reading| UnitUsage {
            unit_id: reading.unit_id.clone(),
            usage: reading.usage(),
            fixed_maintenance_fee,
        })
        .collect()
}

/// Allocates with the default settings.
pub fn allocate(
    units: &[UnitUsage],
    total_water_bill: f64,
    total_electricity_bill: f64,
) -> Result<Allocation> {
    BillAllocator::default().allocate(units, total_water_bill, total_electricity_bill)
}

/// Snaps `value` to the nearest multiple of `granularity`, halves away from zero.
pub fn round_to_granularity(value: f64, granularity: f64) -> f64 {
    (value / granularity).round() * granularity
}

#[derive(Debug, Clone, Default)]
pub struct BillAllocator {
    settings: AllocatorSettings,
}

impl BillAllocator {
    pub fn new(settings: AllocatorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AllocatorSettings {
        &self.settings
    }

    /// Computes usage for every unit of the run and allocates its totals.
    pub fn run(&self, run: &BillingRun) -> Result<Allocation> {
        let units = compute_usage(&run.units, run.fixed_maintenance_fee);
        self.allocate(&units, run.total_water_bill, run.total_electricity_bill)
    }

    pub fn allocate(
        &self,
        units: &[UnitUsage],
        total_water_bill: f64,
        total_electricity_bill: f64,
    ) -> Result<Allocation> {
        if units.is_empty() {
            return Err(SettlementError::InvalidInput(
                "at least one unit is required".into(),
            ));
        }
        if !total_water_bill.is_finite() || !total_electricity_bill.is_finite() {
            return Err(SettlementError::InvalidInput(
                "bill totals must be finite numbers".into(),
            ));
        }
        let granularity = self.settings.granularity;
        if !granularity.is_finite() || granularity <= 0.0 {
            return Err(SettlementError::InvalidInput(format!(
                "rounding granularity must be positive, got {granularity}"
            )));
        }

        let usages = self.effective_usages(units)?;
        let total_usage: f64 = usages.iter().sum();
        if total_usage == 0.0 {
            return Err(SettlementError::InvalidInput(
                "total water usage is zero; check the meter readings".into(),
            ));
        }

        let electricity_share = total_electricity_bill / units.len() as f64;
        let mut results: Vec<AllocationResult> = units
            .iter()
            .zip(&usages)
            .map(|(unit, &usage)| {
                let water_cost = total_water_bill * (usage / total_usage);
                let initial = water_cost + electricity_share;
                let rounded = round_to_granularity(initial, granularity);
                AllocationResult {
                    unit_id: unit.unit_id.clone(),
                    usage,
                    fixed_maintenance_fee: unit.fixed_maintenance_fee,
                    initial_combined_cost: initial,
                    rounded_combined_cost: rounded,
                    rounding_error: initial - rounded,
                    adjustment: 0.0,
                    final_combined_cost: rounded,
                    final_house_bill: rounded + unit.fixed_maintenance_fee,
                }
            })
            .collect();

        let expected_total = total_water_bill + total_electricity_bill;
        let rounded_total: f64 = results
            .iter()
            .map(|result| result.rounded_combined_cost)
            .sum();
        let difference = expected_total - rounded_total;
        debug!(
            units = results.len(),
            total_usage, expected_total, rounded_total, difference, "rounded unit costs"
        );

        let residual = reconcile::redistribute(
            &mut results,
            difference,
            granularity,
            self.settings.error_precision,
        );

        for result in &mut results {
            result.final_combined_cost = result.rounded_combined_cost + result.adjustment;
            result.final_house_bill = result.final_combined_cost + result.fixed_maintenance_fee;
        }

        if residual != 0.0 {
            warn!(
                residual,
                expected_total, "rounding remainder could not be fully redistributed"
            );
        }

        Ok(Allocation {
            results,
            expected_total,
            residual,
        })
    }

    fn effective_usages(&self, units: &[UnitUsage]) -> Result<Vec<f64>> {
        units
            .iter()
            .map(|unit| {
                if unit.usage >= 0.0 {
                    return Ok(unit.usage);
                }
                match self.settings.negative_usage {
                    NegativeUsagePolicy::PassThrough => {
                        warn!(unit = %unit.unit_id, usage = unit.usage, "negative water usage");
                        Ok(unit.usage)
                    }
                    NegativeUsagePolicy::Clamp => {
                        warn!(unit = %unit.unit_id, usage = unit.usage, "negative water usage clamped to zero");
                        Ok(0.0)
                    }
                    NegativeUsagePolicy::Reject => Err(SettlementError::InvalidInput(format!(
                        "unit {} reports negative water usage ({})",
                        unit.unit_id, unit.usage
                    ))),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: &str, usage: f64, fee: f64) -> UnitUsage {
        UnitUsage {
            unit_id: id.to_string(),
            usage,
            fixed_maintenance_fee: fee,
        }
    }

    fn finals(allocation: &Allocation) -> Vec<f64> {
        allocation
            .results
            .iter()
            .map(|result| result.final_combined_cost)
            .collect()
    }

    #[test]
    fn usage_sums_both_meter_deltas() {
        let reading = MeterReading::new("301", 100.0, 50.0, 112.0, 53.5);
        assert!((reading.usage() - 15.5).abs() < 1e-9);

        let usages = compute_usage(&[reading], 5000.0);
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].unit_id, "301");
        assert_eq!(usages[0].fixed_maintenance_fee, 5000.0);
    }

    #[test]
    fn exact_split_needs_no_adjustment() {
        let units = vec![unit("A", 10.0, 5000.0), unit("B", 30.0, 5000.0)];
        let allocation = allocate(&units, 40000.0, 20000.0).expect("allocate");

        assert_eq!(finals(&allocation), vec![20000.0, 40000.0]);
        assert_eq!(allocation.results[0].final_house_bill, 25000.0);
        assert_eq!(allocation.results[1].final_house_bill, 45000.0);
        assert!(allocation.results.iter().all(|r| !r.was_adjusted()));
        assert!(allocation.is_balanced());
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_to_granularity(1005.0, 10.0), 1010.0);
        assert_eq!(round_to_granularity(1004.9, 10.0), 1000.0);
        assert_eq!(round_to_granularity(-15.0, 10.0), -20.0);
    }

    #[test]
    fn rejects_zero_usage_sum() {
        let units = vec![unit("A", 5.0, 0.0), unit("B", -5.0, 0.0)];
        let err = allocate(&units, 1000.0, 1000.0).expect_err("zero usage must fail");
        assert!(matches!(err, SettlementError::InvalidInput(_)));
    }

    #[test]
    fn rejects_empty_units_and_non_finite_totals() {
        assert!(matches!(
            allocate(&[], 1000.0, 1000.0),
            Err(SettlementError::InvalidInput(_))
        ));
        let units = vec![unit("A", 1.0, 0.0)];
        assert!(matches!(
            allocate(&units, f64::NAN, 1000.0),
            Err(SettlementError::InvalidInput(_))
        ));
    }

    #[test]
    fn legitimately_zero_final_cost_is_kept() {
        // Costs 5.5 / 16.8 / 27.7 round to 10 / 20 / 30, overshooting by 10;
        // the first unit gained the most and drops to exactly zero.
        let units = vec![
            unit("A", 45.0, 100.0),
            unit("B", 158.0, 100.0),
            unit("C", 267.0, 100.0),
        ];
        let allocation = allocate(&units, 47.0, 3.0).expect("allocate");

        assert_eq!(finals(&allocation), vec![0.0, 20.0, 30.0]);
        assert!(allocation.results[0].was_adjusted());
        assert_eq!(allocation.results[0].final_house_bill, 100.0);
        assert_eq!(allocation.combined_total(), 50.0);
    }

    #[test]
    fn tied_group_that_cannot_fit_leaves_a_residual() {
        let units = vec![unit("A", 1.0, 0.0), unit("B", 1.0, 0.0)];
        let allocation = allocate(&units, 2000.0, 10.0).expect("allocate");

        assert_eq!(finals(&allocation), vec![1010.0, 1010.0]);
        assert_eq!(allocation.residual, -10.0);
        assert!(!allocation.is_balanced());
    }

    #[test]
    fn negative_usage_policies() {
        let units = vec![unit("A", -10.0, 0.0), unit("B", 50.0, 0.0)];

        let passthrough = allocate(&units, 40000.0, 20000.0).expect("pass through");
        assert_eq!(finals(&passthrough), vec![0.0, 60000.0]);
        assert_eq!(passthrough.results[0].usage, -10.0);

        let clamp = BillAllocator::new(AllocatorSettings {
            negative_usage: NegativeUsagePolicy::Clamp,
            ..AllocatorSettings::default()
        })
        .allocate(&units, 40000.0, 20000.0)
        .expect("clamp");
        assert_eq!(finals(&clamp), vec![10000.0, 50000.0]);
        assert_eq!(clamp.results[0].usage, 0.0);

        let reject = BillAllocator::new(AllocatorSettings {
            negative_usage: NegativeUsagePolicy::Reject,
            ..AllocatorSettings::default()
        })
        .allocate(&units, 40000.0, 20000.0);
        assert!(matches!(reject, Err(SettlementError::InvalidInput(_))));
    }

    #[test]
    fn run_computes_usage_from_readings() {
        let run = BillingRun {
            total_water_bill: 40000.0,
            total_electricity_bill: 20000.0,
            fixed_maintenance_fee: 5000.0,
            units: vec![
                MeterReading::new("301", 100.0, 200.0, 104.0, 206.0),
                MeterReading::new("302", 10.0, 20.0, 25.0, 35.0),
            ],
        };
        let allocation = BillAllocator::default().run(&run).expect("run");
        assert_eq!(finals(&allocation), vec![20000.0, 40000.0]);
        assert_eq!(allocation.expected_total, run.expected_total());
    }

    #[test]
    fn invalid_granularity_is_rejected() {
        let allocator = BillAllocator::new(AllocatorSettings {
            granularity: 0.0,
            ..AllocatorSettings::default()
        });
        let units = vec![unit("A", 1.0, 0.0)];
        assert!(allocator.allocate(&units, 100.0, 100.0).is_err());
    }
}
