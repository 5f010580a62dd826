use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use cbh_core::{Quarantine, UploadReport};
use cbh_report::TablePage;

use crate::types::{ImportResult, ResubmitResult};

/// Longest reason shown in the quarantine table.
const MAX_REASON_WIDTH: usize = 80;

pub fn print_import_summary(result: &ImportResult) {
    println!("File: {}", result.file.display());
    println!("Mapping: {}", result.mapping);
    if result.upload.is_none() {
        println!("Dry run: nothing was written to the store");
    }

    let mut table = Table::new();
    table.set_header(vec![header_cell("Stage"), header_cell("Records")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("Rows read"), Cell::new(result.rows)]);
    table.add_row(vec![Cell::new("Accepted"), Cell::new(result.accepted)]);
    table.add_row(vec![
        Cell::new("Accepted without collection date"),
        count_cell(result.dates_cleared, Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Failed validation"),
        count_cell(result.invalid, Color::Red),
    ]);
    if result.upload.is_some() {
        table.add_row(vec![
            Cell::new("Cross-references persisted"),
            Cell::new(result.flush.persisted),
        ]);
        table.add_row(vec![
            Cell::new("Cross-references not persisted"),
            count_cell(result.flush.failed.len(), Color::Yellow),
        ]);
    }
    if let Some(upload) = &result.upload {
        add_upload_rows(&mut table, upload);
    }
    table.add_row(vec![
        Cell::new("Quarantined").add_attribute(Attribute::Bold),
        count_cell(result.quarantine.len(), Color::Red).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    print_quarantine(&result.quarantine);
    if let Some(path) = &result.quarantine_path {
        println!(
            "Quarantine written to {} ({} entries in file)",
            path.display(),
            result.quarantine_file_entries
        );
    }
}

pub fn print_resubmit_summary(result: &ResubmitResult) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Stage"), header_cell("Records")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("Quarantine entries"), Cell::new(result.entries)]);
    add_upload_rows(&mut table, &result.upload);
    table.add_row(vec![
        Cell::new("Still quarantined").add_attribute(Attribute::Bold),
        count_cell(result.remaining.len(), Color::Red).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    print_quarantine(&result.remaining);
    println!("Quarantine written to {}", result.quarantine_path.display());
}

/// Renders one page of the grouped sample table.
pub fn print_page(page: &TablePage<'_>) {
    if page.total == 0 {
        println!("No stored samples match");
        return;
    }
    let mut table = Table::new();
    table.set_header(page.headers().into_iter().map(|h| header_cell(&h)));
    apply_table_style(&mut table);
    for row in page.cells() {
        table.add_row(row);
    }
    println!("{table}");
    println!(
        "Page {} of {} ({} sample(s))",
        page.page, page.page_count, page.total
    );
}

fn add_upload_rows(table: &mut Table, upload: &UploadReport) {
    table.add_row(vec![
        Cell::new("Upload chunks"),
        dim_cell(upload.chunks.len()),
    ]);
    table.add_row(vec![
        Cell::new("Stored").fg(Color::Green),
        Cell::new(upload.stored()).fg(Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Rejected by store"),
        count_cell(upload.failed(), Color::Red),
    ]);
}

fn print_quarantine(quarantine: &Quarantine) {
    if quarantine.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Record"),
        header_cell("Sample ID"),
        header_cell("Reason"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for (index, entry) in quarantine.entries().iter().enumerate() {
        table.add_row(vec![
            dim_cell(index),
            Cell::new(&entry.record.id),
            Cell::new(&entry.record.identifiers.sample),
            Cell::new(truncate(&entry.reason.summary(), MAX_REASON_WIDTH)).fg(Color::Red),
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

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("Matrix", 10), "Matrix");
        insta::assert_snapshot!(truncate("CBH_Donor_ID, Matrix, Age", 12), @"CBH_Donor...");
    }
}
