//! Check command - per-cell verdicts and the document safety flag.

use std::path::PathBuf;

use colored::Colorize;
use csvnest::{SafetyReport, Value};

pub fn run(
    file: PathBuf,
    config: Option<PathBuf>,
    json_output: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let (mut engine, text) = super::load(&file, config.as_deref())?;
    let result = engine.parse(&text)?;
    let report = &result.report;

    if json_output {
        let status = serde_json::json!({
            "file": file.display().to_string(),
            "source": result.source,
            "safe": report.is_safe(),
            "summary": report.summary(),
            "columns": report.columns,
            "verdicts": report.matrix(),
            "issues": report.issues(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{} {}", "Checking".cyan().bold(), file.display().to_string().white());
        println!();
        print_table(report);
        println!();
        print_summary(report);
    }

    Ok(if report.is_safe() { 0 } else { 2 })
}

fn print_table(report: &SafetyReport) {
    let header: Vec<String> = report
        .columns
        .iter()
        .map(|c| if report.missing_columns.contains(c) { format!("{}?", c) } else { c.clone() })
        .collect();
    println!("  {:<12} {}", "key".bold(), header.join(" | ").bold());

    for row in &report.rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| {
                let text = display_value(&cell.value);
                if cell.is_safe() {
                    text.green().to_string()
                } else {
                    text.red().to_string()
                }
            })
            .collect();
        let key = row.key.join("/");
        let key = if row.is_safe() { key.normal() } else { key.red().bold() };
        println!("  {:<12} {}", key, cells.join(" | "));
    }
}

fn print_summary(report: &SafetyReport) {
    let summary = report.summary();

    println!("{}", "Summary:".yellow().bold());
    println!("  Rows:         {}", summary.rows.to_string().white());
    println!(
        "  Failed cells: {}/{}",
        if summary.failed_cells > 0 {
            summary.failed_cells.to_string().red()
        } else {
            summary.failed_cells.to_string().green()
        },
        summary.cells
    );
    if summary.duplicate_rows > 0 {
        println!("  Duplicate-key rows: {}", summary.duplicate_rows.to_string().red());
    }
    if summary.missing_columns > 0 {
        println!("  Missing columns:    {}", report.missing_columns.join(", ").red());
    }

    let issues = report.issues();
    if !issues.is_empty() {
        println!();
        println!("{}", "Issues:".yellow().bold());
        for issue in issues {
            println!("  [{}] {}: {}", issue.kind.label().magenta(), issue.column.bold(), issue.description);
        }
    }

    println!();
    if report.is_safe() {
        println!("{}", "Document is safe to save".green().bold());
    } else {
        println!("{}", "Document is NOT safe to save".red().bold());
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Undefined => "-".to_string(),
        Value::String(s) if s.is_empty() => "\"\"".to_string(),
        other => other.to_string(),
    }
}
