//! Bounded log of past settlements, newest first.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::allocation::{Allocation, AllocationResult, BillingRun, MeterReading};
use crate::errors::{Result, SettlementError};
use crate::roster::Roster;

pub const DEFAULT_HISTORY_CAPACITY: usize = 10;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Bill totals as they were entered for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralSnapshot {
    pub total_water: f64,
    pub total_electricity: f64,
    pub fixed_maintenance_fee: f64,
}

/// Immutable copy of one settlement: inputs, roster and results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub timestamp: String,
    pub general: GeneralSnapshot,
    pub unit_inputs: Vec<MeterReading>,
    pub unit_names: Vec<String>,
    pub results: Vec<AllocationResult>,
}

impl HistoryRecord {
    pub fn capture(
        run: &BillingRun,
        roster: &Roster,
        allocation: &Allocation,
        at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            general: GeneralSnapshot {
                total_water: run.total_water_bill,
                total_electricity: run.total_electricity_bill,
                fixed_maintenance_fee: run.fixed_maintenance_fee,
            },
            unit_inputs: run.units.clone(),
            unit_names: roster.names().to_vec(),
            results: allocation.results.clone(),
        }
    }

    /// Water plus electricity, the amount the units settle between them.
    pub fn total_bill(&self) -> f64 {
        self.general.total_water + self.general.total_electricity
    }

    pub fn unit_count(&self) -> usize {
        self.unit_names.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryLog {
    capacity: usize,
    records: Vec<HistoryRecord>,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: Vec::new(),
        }
    }

    /// Rebuilds a log from stored records, dropping any beyond capacity.
    pub fn from_records(mut records: Vec<HistoryRecord>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        records.truncate(capacity);
        Self { capacity, records }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.records.iter()
    }

    /// Inserts at the front and returns the record evicted from the back, if any.
    pub fn push(&mut self, record: HistoryRecord) -> Option<HistoryRecord> {
        self.records.insert(0, record);
        let evicted = if self.records.len() > self.capacity {
            self.records.pop()
        } else {
            None
        };
        if let Some(old) = &evicted {
            info!(timestamp = %old.timestamp, "oldest history record evicted");
        }
        evicted
    }

    pub fn get(&self, index: usize) -> Result<&HistoryRecord> {
        self.records
            .get(index)
            .ok_or(SettlementError::HistoryIndexOutOfRange {
                index,
                len: self.records.len(),
            })
    }

    pub fn remove(&mut self, index: usize) -> Result<HistoryRecord> {
        if index >= self.records.len() {
            return Err(SettlementError::HistoryIndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }
        Ok(self.records.remove(index))
    }
}
