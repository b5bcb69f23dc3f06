//! Text rendering of settlements and history, plus file export.

pub mod table;

use std::{fs, path::PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::allocation::Allocation;
use crate::currency::AmountFormat;
use crate::errors::Result;
use crate::history::HistoryLog;
use crate::utils::ensure_dir;

use table::{Alignment, Table, TableColumn};

const EXPORT_PREFIX: &str = "villa_settlement";

/// Unit / usage / combined cost / house bill table with a totals footer.
pub fn render_allocation(allocation: &Allocation, format: &AmountFormat, plain: bool) -> String {
    let mut table = Table::new(vec![
        TableColumn::new("Unit", Alignment::Left),
        TableColumn::new("Usage", Alignment::Right),
        TableColumn::new("Water + electricity", Alignment::Right),
        TableColumn::new("House bill", Alignment::Right),
    ]);
    table.plain = plain;
    for result in &allocation.results {
        table.push_row(vec![
            result.unit_id.clone(),
            format!("{:.0}", result.usage),
            format.amount(result.final_combined_cost),
            format.amount(result.final_house_bill),
        ]);
    }
    table.footer = Some(vec![
        "Total".into(),
        String::new(),
        format.amount(allocation.combined_total()),
        format.amount(allocation.house_bill_total()),
    ]);

    let mut out = table.render();
    if !allocation.is_balanced() {
        out.push_str(&format!(
            "\nUnallocated remainder: {}",
            format.amount(allocation.residual)
        ));
    }
    out
}

/// One line per stored run, numbered from 1 as the shell expects.
pub fn render_history(history: &HistoryLog, format: &AmountFormat) -> String {
    if history.is_empty() {
        return "No saved settlements.".to_string();
    }
    history
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            format!(
                "{:>2}. {} settlement ({} units) | total bill: {} / maintenance fee per unit: {}",
                idx + 1,
                record.timestamp,
                record.unit_count(),
                format.amount(record.total_bill()),
                format.amount(record.general.fixed_maintenance_fee),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("{}_{}.txt", EXPORT_PREFIX, date.format("%Y-%m-%d"))
}

/// Writes the rendered settlement into `dir` and returns the file path.
pub fn export_allocation(
    allocation: &Allocation,
    format: &AmountFormat,
    dir: PathBuf,
    date: NaiveDate,
) -> Result<PathBuf> {
    ensure_dir(&dir)?;
    let path = dir.join(export_file_name(date));
    let body = format!(
        "Villa settlement {}\n\n{}\n",
        date.format("%Y-%m-%d"),
        render_allocation(allocation, format, true)
    );
    fs::write(&path, body)?;
    info!(path = %path.display(), "settlement exported");
    Ok(path)
}
