#![doc(test(attr(deny(warnings))))]

//! Villa Split settles a shared villa's water and electricity bill across its
//! housing units: water by metered usage, electricity in equal shares, each
//! unit's cost rounded to the currency granularity and reconciled so the
//! units pay exactly the billed total.

pub mod allocation;
pub mod cli;
pub mod config;
pub mod currency;
pub mod errors;
pub mod form;
pub mod history;
pub mod report;
pub mod roster;
pub mod session;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup debug log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!("Villa Split tracing initialized.");
    });
}
