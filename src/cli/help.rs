use crate::cli::output;
use crate::cli::registry::{CommandEntry, CommandRegistry};
use crate::report::table::display_width;

pub fn print_overview(registry: &CommandRegistry) {
    output::section("Available commands");
    let width = registry
        .list()
        .iter()
        .map(|entry| entry.usage.len())
        .max()
        .unwrap_or(0);
    for entry in registry.list() {
        output::block(format!(
            "  {:<width$}  {}",
            entry.usage,
            entry.description,
            width = width
        ));
    }
    output::info("Use `help <command>` for details.");
}

pub fn print_command(entry: &CommandEntry) {
    output::section(format!("Help: {}", entry.name));
    print_rows(&[
        ("Description", entry.description.to_string()),
        ("Usage", entry.usage.to_string()),
    ]);
}

/// Two-column label/value listing with labels padded to a common width.
pub fn print_rows(rows: &[(&str, String)]) {
    output::block(format_rows(rows));
}

pub(crate) fn format_rows(rows: &[(&str, String)]) -> String {
    let width = rows
        .iter()
        .map(|(label, _)| display_width(label))
        .max()
        .unwrap_or(0);
    rows.iter()
        .map(|(label, value)| {
            let pad = width.saturating_sub(display_width(label));
            format!("  {}{} : {}", label, " ".repeat(pad), value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_align_on_the_colon() {
        let rows = [("Target", "x86_64".to_string()), ("Rustc", "1.80".to_string())];
        assert_eq!(
            format_rows(&rows),
            "  Target : x86_64\n  Rustc  : 1.80"
        );
    }
}
