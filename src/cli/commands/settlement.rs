use std::path::PathBuf;

use chrono::Local;

use crate::cli::commands::expect_args;
use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::form::{parse_number, UnitInput};
use crate::report::{
    self,
    table::{Alignment, Table, TableColumn},
};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "totals",
            "Set the water bill, electricity bill and per-unit maintenance fee",
            "totals <water> <electricity> <fee>",
            cmd_totals,
        ),
        CommandEntry::new(
            "reading",
            "Record a unit's previous and current meter readings",
            "reading <unit> <prev-inner> <prev-outer> <cur-inner> <cur-outer>",
            cmd_reading,
        ),
        CommandEntry::new("form", "Show the current inputs", "form", cmd_form),
        CommandEntry::new(
            "calculate",
            "Settle the bill and save it to history",
            "calculate",
            cmd_calculate,
        ),
        CommandEntry::new(
            "export",
            "Write the last settlement to a text file",
            "export [dir]",
            cmd_export,
        ),
    ]
}

fn cmd_totals(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 3, "totals <water> <electricity> <fee>")?;
    context.session.set_totals(args[0], args[1], args[2]);
    let format = context.session.amount_format();
    output::success(format!(
        "Totals set: water {}, electricity {}, maintenance fee {} per unit.",
        format.amount(parse_number(args[0])),
        format.amount(parse_number(args[1])),
        format.amount(parse_number(args[2])),
    ));
    Ok(())
}

fn cmd_reading(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(
        args,
        5,
        "reading <unit> <prev-inner> <prev-outer> <cur-inner> <cur-outer>",
    )?;
    let input = UnitInput::new(args[1], args[2], args[3], args[4]);
    let usage = input.to_reading(args[0]).usage();
    context.session.set_reading(args[0], input)?;
    output::success(format!("Readings for `{}` saved (usage {}).", args[0], usage));
    Ok(())
}

fn cmd_form(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 0, "form")?;
    let session = &context.session;
    let general = &session.form().general;

    output::section("Bill totals");
    output::block(format!(
        "Water: {}\nElectricity: {}\nMaintenance fee per unit: {}",
        display_raw(&general.total_water),
        display_raw(&general.total_electricity),
        display_raw(&general.fixed_maintenance_fee),
    ));

    output::section("Meter readings");
    if session.roster().is_empty() {
        output::info("No units configured.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        TableColumn::new("Unit", Alignment::Left),
        TableColumn::new("Prev inner", Alignment::Right),
        TableColumn::new("Prev outer", Alignment::Right),
        TableColumn::new("Cur inner", Alignment::Right),
        TableColumn::new("Cur outer", Alignment::Right),
        TableColumn::new("Usage", Alignment::Right),
    ]);
    table.plain = output::current_preferences().plain_mode;
    for name in session.roster().names() {
        let input = session.form().unit(name).cloned().unwrap_or_default();
        let usage = input.to_reading(name).usage();
        table.push_row(vec![
            name.clone(),
            display_raw(&input.previous_inner),
            display_raw(&input.previous_outer),
            display_raw(&input.current_inner),
            display_raw(&input.current_outer),
            usage.to_string(),
        ]);
    }
    output::block(table.render());
    Ok(())
}

fn display_raw(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn cmd_calculate(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 0, "calculate")?;
    let format = context.session.amount_format();
    let plain = output::current_preferences().plain_mode;
    let allocation = context.session.calculate(Local::now().naive_local())?;

    output::section("Settlement");
    output::block(report::render_allocation(allocation, &format, plain));
    if !allocation.is_balanced() {
        output::warning(format!(
            "{} could not be spread without splitting tied units; settle it by hand.",
            format.amount(allocation.residual)
        ));
    }
    output::success("Settlement saved to history.");
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.len() > 1 {
        return expect_args(args, 1, "export [dir]");
    }
    let dir = args.first().map(PathBuf::from);
    let path = context.session.export(dir, Local::now().date_naive())?;
    output::success(format!("Settlement exported to {}", path.display()));
    Ok(())
}
