use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};
use fitpanel_cli::PipelineOutcome;
use fitpanel_model::{ResultSummary, RunReport, TableReport};

use crate::commands::AnalyzeResult;

pub fn print_pipeline_summary(outcome: &PipelineOutcome) {
    match &outcome.cleaned_dir {
        Some(dir) => println!("Cleaned: {}", dir.display()),
        None => println!("Dry run: nothing written"),
    }
    if let Some(dir) = &outcome.analysis_dir {
        println!("Analysis: {}", dir.display());
    }
    if let Some(path) = &outcome.report_path {
        println!("Run report: {}", path.display());
    }
    print_cleaning_table(&outcome.report);
    print_quality_notes(&outcome.report);
    if !outcome.report.results.is_empty() {
        print_results_table(&outcome.report.results);
    }
    print_absent(&outcome.report);
}

pub fn print_analysis_summary(result: &AnalyzeResult) {
    println!("Cleaned input: {}", result.cleaned_dir.display());
    match &result.analysis_dir {
        Some(dir) => println!("Analysis: {}", dir.display()),
        None => println!("Dry run: nothing written"),
    }
    print_results_table(&result.results);
}

fn print_cleaning_table(report: &RunReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Input"),
        header_cell("Dropped"),
        header_cell("Output"),
        header_cell("Reasons"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    let mut total_input = 0usize;
    let mut total_dropped = 0usize;
    let mut total_output = 0usize;
    for summary in &report.tables {
        total_input += summary.input_rows;
        total_dropped += summary.total_dropped();
        total_output += summary.output_rows;
        table.add_row(vec![
            dataset_cell(&summary.dataset.to_string(), summary.dataset.is_mandatory()),
            Cell::new(summary.input_rows),
            count_cell(summary.total_dropped(), Color::Yellow),
            Cell::new(summary.output_rows),
            reasons_cell(summary),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_input).add_attribute(Attribute::Bold),
        count_cell(total_dropped, Color::Yellow).add_attribute(Attribute::Bold),
        Cell::new(total_output).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");
}

fn print_quality_notes(report: &RunReport) {
    if report.quality_notes.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Count"),
        header_cell("Note"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for note in &report.quality_notes {
        table.add_row(vec![
            dataset_cell(&note.dataset.to_string(), false),
            Cell::new(note.count).fg(Color::Yellow),
            Cell::new(&note.message),
        ]);
    }
    println!();
    println!("Quality notes:");
    println!("{table}");
}

fn print_results_table(results: &[ResultSummary]) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Result"), header_cell("Rows"), header_cell("Status")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Center);
    for result in results {
        let status = if result.skipped {
            Cell::new("skipped").fg(Color::Yellow)
        } else {
            Cell::new("✓").fg(Color::Green).add_attribute(Attribute::Bold)
        };
        table.add_row(vec![
            Cell::new(&result.name).fg(Color::Blue),
            Cell::new(result.rows),
            status,
        ]);
    }
    println!();
    println!("Results:");
    println!("{table}");
}

fn print_absent(report: &RunReport) {
    if !report.missing_datasets.is_empty() {
        let names: Vec<String> = report
            .missing_datasets
            .iter()
            .map(ToString::to_string)
            .collect();
        eprintln!("Not found: {}", names.join(", "));
    }
    if !report.failed_datasets.is_empty() {
        eprintln!("Failed:");
        for failed in &report.failed_datasets {
            eprintln!("- {}: {}", failed.dataset, failed.message);
        }
    }
}

fn reasons_cell(report: &TableReport) -> Cell {
    if report.dropped.is_empty() {
        return dim_cell("-");
    }
    let reasons: Vec<String> = report
        .dropped
        .iter()
        .map(|(reason, count)| format!("{reason}: {count}"))
        .collect();
    Cell::new(reasons.join(", "))
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
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
    if table.column_count() >= 5 {
        table.set_constraints(vec![
            ColumnConstraint::LowerBoundary(Width::Fixed(14)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::UpperBoundary(Width::Percentage(55)),
        ]);
    }
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

fn dataset_cell(name: &str, mandatory: bool) -> Cell {
    if mandatory {
        Cell::new(name)
            .fg(Color::Blue)
            .add_attribute(Attribute::Bold)
    } else {
        Cell::new(name).fg(Color::Blue)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
