use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use harmonia_cli::types::RunResult;
use harmonia_transform::{Issue, IssueSeverity};

pub fn print_summary(result: &RunResult) {
    println!("Campaign: {}", result.campaign);
    if let Some(dir) = &result.state_dir {
        println!("State: {}", dir.display());
    }
    print_step_table(result);
    print_binding_table(result);
    if let Some(output) = &result.output {
        if !output.tables.is_empty() {
            let mut table = Table::new();
            table.set_header(vec![
                header_cell("Level"),
                header_cell("File"),
                header_cell("Rows"),
                header_cell("Columns"),
            ]);
            apply_table_style(&mut table);
            align_column(&mut table, 2, CellAlignment::Right);
            align_column(&mut table, 3, CellAlignment::Right);
            for level in &output.tables {
                table.add_row(vec![
                    level_cell(&level.level),
                    Cell::new(level.path.display()),
                    Cell::new(level.rows),
                    Cell::new(level.columns),
                ]);
            }
            println!();
            println!("Outputs:");
            println!("{table}");
        }
        if let Some(path) = &output.error_file {
            println!("Issues written to {}", path.display());
        }
    }
    print_issue_table(&result.issues);
}

fn print_step_table(result: &RunResult) {
    let steps: Vec<_> = result
        .stages
        .iter()
        .flat_map(|stage| stage.steps.iter().map(move |step| (stage.stage, step)))
        .collect();
    if steps.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Step"),
        header_cell("Binding"),
        header_cell("Generated"),
        header_cell("User"),
        header_cell("Issues"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 3..6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for (stage, step) in steps {
        table.add_row(vec![
            dim_cell(format!("{stage:?}").to_lowercase()),
            Cell::new(&step.step),
            level_cell(&step.binding),
            Cell::new(step.automated),
            count_cell(step.user, Color::Cyan),
            count_cell(step.issues, Color::Red),
        ]);
    }
    println!("{table}");
}

fn print_binding_table(result: &RunResult) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Binding"),
        header_cell("Rows"),
        header_cell("Columns"),
        header_cell("Identifiers"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    let mut total_rows = 0usize;
    for binding in &result.bindings {
        total_rows += binding.rows;
        table.add_row(vec![
            level_cell(&binding.name),
            Cell::new(binding.rows),
            Cell::new(binding.columns),
            Cell::new(binding.identifiers.join(", ")),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_rows).add_attribute(Attribute::Bold),
        dim_cell("-"),
        count_cell(result.issues.len(), Color::Red)
            .add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}

fn print_issue_table(issues: &[Issue]) {
    if issues.is_empty() {
        return;
    }
    let mut ordered: Vec<&Issue> = issues.iter().collect();
    ordered.sort_by_key(|issue| std::cmp::Reverse(issue.severity()));
    let mut table = Table::new();
    table.set_header(vec![header_cell("Severity"), header_cell("Issue")]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    for issue in ordered {
        table.add_row(vec![severity_cell(issue.severity()), Cell::new(issue)]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn apply_table_style(table: &mut Table) {
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

fn severity_cell(severity: IssueSeverity) -> Cell {
    match severity {
        IssueSeverity::Error => Cell::new("ERROR").fg(Color::Red),
        IssueSeverity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn level_cell(name: &str) -> Cell {
    Cell::new(name)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
