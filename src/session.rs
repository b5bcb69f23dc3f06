//! Caller-side workflow around the allocator: roster and form state, history
//! replay and persistence.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;

use crate::allocation::{Allocation, BillAllocator};
use crate::config::Config;
use crate::currency::AmountFormat;
use crate::errors::{Result, SettlementError};
use crate::form::{format_input, BillingForm, UnitInput};
use crate::history::{HistoryLog, HistoryRecord};
use crate::report;
use crate::roster::Roster;
use crate::storage::{load_json, save_json, KeyValueStore, HISTORY_KEY, UNIT_NAMES_KEY};

pub struct SettlementSession {
    store: Box<dyn KeyValueStore>,
    config: Config,
    roster: Roster,
    form: BillingForm,
    history: HistoryLog,
    last_allocation: Option<Allocation>,
}

impl SettlementSession {
    /// Loads the stored roster and history. A store without a roster starts
    /// from the configured default units.
    pub fn open(store: Box<dyn KeyValueStore>, config: Config) -> Result<Self> {
        let roster = load_json::<Vec<String>, _>(store.as_ref(), UNIT_NAMES_KEY)?
            .map(Roster::new)
            .unwrap_or_else(|| Roster::new(config.default_units.clone()));
        let records: Vec<HistoryRecord> =
            load_json(store.as_ref(), HISTORY_KEY)?.unwrap_or_default();
        let history = HistoryLog::from_records(records, config.history_capacity);
        info!(
            units = roster.len(),
            history = history.len(),
            "settlement session opened"
        );
        Ok(Self {
            store,
            config,
            roster,
            form: BillingForm::new(),
            history,
            last_allocation: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn form(&self) -> &BillingForm {
        &self.form
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn last_allocation(&self) -> Option<&Allocation> {
        self.last_allocation.as_ref()
    }

    pub fn allocator(&self) -> BillAllocator {
        BillAllocator::new(self.config.allocator.clone())
    }

    pub fn amount_format(&self) -> AmountFormat {
        AmountFormat::from_config(&self.config)
    }

    pub fn set_totals(&mut self, water: &str, electricity: &str, maintenance_fee: &str) {
        self.form.set_totals(water, electricity, maintenance_fee);
    }

    pub fn set_reading(&mut self, unit_id: &str, input: UnitInput) -> Result<()> {
        if !self.roster.contains(unit_id) {
            return Err(SettlementError::UnitNotFound(unit_id.to_string()));
        }
        self.form.set_unit(unit_id, input);
        Ok(())
    }

    pub fn add_unit(&mut self, name: &str) -> Result<String> {
        let mut roster = self.roster.clone();
        let added = roster.add(name)?;
        self.save_roster(&roster)?;
        self.roster = roster;
        Ok(added)
    }

    /// Removes a unit; readings typed for the other units are kept.
    pub fn remove_unit(&mut self, name: &str) -> Result<()> {
        let mut roster = self.roster.clone();
        roster.remove(name)?;
        self.save_roster(&roster)?;
        self.roster = roster;
        self.form.retain_units(&self.roster);
        Ok(())
    }

    /// Settles the current form, records the run in history and persists it.
    /// Nothing changes in memory when the history cannot be stored.
    pub fn calculate(&mut self, at: NaiveDateTime) -> Result<&Allocation> {
        let run = self.form.build_run(&self.roster)?;
        let allocation = self.allocator().run(&run)?;
        let mut history = self.history.clone();
        history.push(HistoryRecord::capture(&run, &self.roster, &allocation, at));
        self.save_history(&history)?;
        self.history = history;
        info!(
            units = allocation.results.len(),
            expected_total = allocation.expected_total,
            "settlement calculated"
        );
        Ok(&*self.last_allocation.insert(allocation))
    }

    /// Restores roster and form inputs from a stored run. The previous result
    /// is cleared so the restored inputs have to be recalculated.
    pub fn apply_history(&mut self, index: usize) -> Result<()> {
        let record = self.history.get(index)?.clone();
        let roster = Roster::new(record.unit_names.clone());
        self.save_roster(&roster)?;
        self.roster = roster;

        self.form.clear_units();
        self.form.set_totals(
            format_input(record.general.total_water),
            format_input(record.general.total_electricity),
            format_input(record.general.fixed_maintenance_fee),
        );
        for reading in &record.unit_inputs {
            self.form
                .set_unit(reading.unit_id.clone(), UnitInput::from_reading(reading));
        }
        self.last_allocation = None;
        info!(timestamp = %record.timestamp, "history record applied");
        Ok(())
    }

    pub fn delete_history(&mut self, index: usize) -> Result<HistoryRecord> {
        let mut history = self.history.clone();
        let removed = history.remove(index)?;
        self.save_history(&history)?;
        self.history = history;
        info!(timestamp = %removed.timestamp, "history record deleted");
        Ok(removed)
    }

    /// Exports the last calculated settlement; `dir` overrides the configured
    /// export directory.
    pub fn export(&self, dir: Option<PathBuf>, date: NaiveDate) -> Result<PathBuf> {
        let allocation = self.last_allocation.as_ref().ok_or_else(|| {
            SettlementError::InvalidInput("run a calculation before exporting".into())
        })?;
        let dir = dir.unwrap_or_else(|| self.config.resolve_export_dir());
        report::export_allocation(allocation, &self.amount_format(), dir, date)
    }

    fn save_roster(&self, roster: &Roster) -> Result<()> {
        save_json(self.store.as_ref(), UNIT_NAMES_KEY, roster)
    }

    fn save_history(&self, history: &HistoryLog) -> Result<()> {
        save_json(self.store.as_ref(), HISTORY_KEY, &history.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Memory store whose writes can be switched off from the test.
    struct FlakyStore {
        inner: MemoryStore,
        fail_puts: Arc<AtomicBool>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: &str) -> Result<()> {
            if self.fail_puts.load(Ordering::SeqCst) {
                return Err(SettlementError::Storage("disk full".into()));
            }
            self.inner.put(key, value)
        }

        fn delete(&self, key: &str) -> Result<()> {
            self.inner.delete(key)
        }
    }

    fn flaky_session() -> (SettlementSession, Arc<AtomicBool>) {
        let fail_puts = Arc::new(AtomicBool::new(false));
        let store = FlakyStore {
            inner: MemoryStore::new(),
            fail_puts: Arc::clone(&fail_puts),
        };
        let session =
            SettlementSession::open(Box::new(store), Config::default()).expect("open");
        (session, fail_puts)
    }

    fn fill(session: &mut SettlementSession) {
        session.set_totals("40000", "20000", "5000");
        session
            .set_reading("301호", UnitInput::new("0", "0", "10", "0"))
            .expect("reading");
        session
            .set_reading("302호", UnitInput::new("0", "0", "20", "10"))
            .expect("reading");
    }

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 1)
            .and_then(|d| d.and_hms_opt(10, minute, 0))
            .expect("valid time")
    }

    fn session() -> SettlementSession {
        SettlementSession::open(Box::new(MemoryStore::new()), Config::default()).expect("open")
    }

    #[test]
    fn opens_with_default_units() {
        let session = session();
        assert_eq!(session.roster().names(), ["301호", "302호"]);
        assert!(session.history().is_empty());
    }

    #[test]
    fn calculate_records_history() {
        let mut session = session();
        session.set_totals("40000", "20000", "5000");
        session
            .set_reading("301호", UnitInput::new("0", "0", "10", "0"))
            .expect("reading");
        session
            .set_reading("302호", UnitInput::new("0", "0", "20", "10"))
            .expect("reading");

        let bills: Vec<f64> = session
            .calculate(at(0))
            .expect("calculate")
            .results
            .iter()
            .map(|r| r.final_house_bill)
            .collect();
        assert_eq!(bills, vec![25000.0, 45000.0]);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history().records()[0].timestamp, "2025-05-01 10:00");
    }

    #[test]
    fn failed_history_save_leaves_no_record_behind() {
        let (mut session, fail_puts) = flaky_session();
        fill(&mut session);

        fail_puts.store(true, Ordering::SeqCst);
        assert!(matches!(
            session.calculate(at(0)),
            Err(SettlementError::Storage(_))
        ));
        assert!(session.history().is_empty());
        assert!(session.last_allocation().is_none());

        fail_puts.store(false, Ordering::SeqCst);
        session.calculate(at(1)).expect("retry");
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn failed_roster_save_keeps_previous_roster() {
        let (mut session, fail_puts) = flaky_session();
        fill(&mut session);
        fail_puts.store(true, Ordering::SeqCst);

        assert!(session.add_unit("303호").is_err());
        assert!(session.remove_unit("301호").is_err());
        assert_eq!(session.roster().names(), ["301호", "302호"]);
        assert!(session.form().unit("301호").is_some());

        fail_puts.store(false, Ordering::SeqCst);
        session.calculate(at(0)).expect("calculate");
        fail_puts.store(true, Ordering::SeqCst);
        assert!(session.delete_history(0).is_err());
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn reading_for_unknown_unit_is_rejected() {
        let mut session = session();
        let err = session
            .set_reading("999", UnitInput::default())
            .expect_err("unknown unit");
        assert!(matches!(err, SettlementError::UnitNotFound(_)));
    }

    #[test]
    fn export_requires_a_calculation() {
        let session = session();
        let date = NaiveDate::from_ymd_opt(2025, 5, 1).expect("date");
        assert!(matches!(
            session.export(None, date),
            Err(SettlementError::InvalidInput(_))
        ));
    }
}
