use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use etl_core::ManualRunResponse;
use etl_model::{ColumnSpec, RunResult, RunStatus};

pub fn print_summary(results: &[RunResult]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Customer"),
        header_cell("Status"),
        header_cell("Rows"),
        header_cell("Accepted"),
        header_cell("Rejected"),
        header_cell("Artifacts"),
        header_cell("Error"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let mut totals = (0u64, 0u64, 0u64);
    for result in results {
        totals.0 += result.total;
        totals.1 += result.accepted;
        totals.2 += result.rejected;
        table.add_row(vec![
            Cell::new(&result.customer)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            status_cell(result.status),
            Cell::new(result.total),
            Cell::new(result.accepted),
            count_cell(result.rejected, Color::Yellow),
            count_cell(result.artifacts.len() as u64, Color::Green),
            error_cell(result),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(totals.0).add_attribute(Attribute::Bold),
        Cell::new(totals.1).add_attribute(Attribute::Bold),
        count_cell(totals.2, Color::Yellow).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    println!("{table}");
    print_failure_table(results);
}

/// Manual-run entries, including names that matched no customer.
pub fn print_manual(response: &ManualRunResponse) {
    let results: Vec<RunResult> = response.results().cloned().collect();
    print_summary(&results);
    if !response.unknown.is_empty() {
        eprintln!("Unknown customers (invalid_name):");
        for name in &response.unknown {
            eprintln!("- {name}");
        }
    }
}

fn print_failure_table(results: &[RunResult]) {
    let rows: Vec<(&str, &str, u64)> = results
        .iter()
        .flat_map(|result| {
            result
                .failures
                .iter()
                .map(|(column, count)| (result.customer.as_str(), column.as_str(), *count))
        })
        .collect();
    if rows.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Customer"),
        header_cell("Column"),
        header_cell("Failures"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for (customer, column, count) in rows {
        table.add_row(vec![
            Cell::new(customer),
            Cell::new(column),
            count_cell(count, Color::Yellow),
        ]);
    }
    println!();
    println!("Rejected fields:");
    println!("{table}");
}

/// One row per resolved column of a customer.
pub fn print_columns(spec: &ColumnSpec) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Key"),
        header_cell("Name"),
        header_cell("Type"),
        header_cell("Required"),
        header_cell("Rules"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Center);
    for column in spec.columns() {
        let rules: Vec<&str> = column.rules.iter().map(|rule| rule.name()).collect();
        table.add_row(vec![
            Cell::new(&column.key),
            Cell::new(&column.name),
            Cell::new(column.dtype),
            if column.required {
                Cell::new("✓").fg(Color::Green)
            } else {
                dim_cell("-")
            },
            if rules.is_empty() {
                dim_cell("-")
            } else {
                Cell::new(rules.join(", "))
            },
        ]);
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(status: RunStatus) -> Cell {
    match status {
        RunStatus::Success => Cell::new("success").fg(Color::Green),
        RunStatus::PartialSuccess => Cell::new("partial").fg(Color::Yellow),
        RunStatus::Failed => Cell::new("FAILED")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        RunStatus::Skipped => dim_cell("skipped"),
    }
}

fn error_cell(result: &RunResult) -> Cell {
    match &result.error {
        Some(failure) => Cell::new(format!(
            "{} at {}: {}",
            failure.kind, failure.stage, failure.message
        ))
        .fg(Color::Red),
        None => dim_cell("-"),
    }
}

fn count_cell(count: u64, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
