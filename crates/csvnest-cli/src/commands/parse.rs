//! Parse command - emit the nested result as JSON.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;
use csvnest::{CsvNestError, NestedResult};

pub fn run(
    file: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    pretty: bool,
    force: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let (mut engine, text) = super::load(&file, config.as_deref())?;
    engine.parse(&text)?;

    let render = |nested: &NestedResult| {
        if pretty {
            serde_json::to_string_pretty(nested)
        } else {
            serde_json::to_string(nested)
        }
    };

    let saved = engine.save(force, |nested| -> Result<(), Box<dyn std::error::Error>> {
        let json = render(nested)?;
        match &output {
            Some(path) => fs::write(path, json + "\n")?,
            None => println!("{}", json),
        }
        Ok(())
    });

    match saved {
        Ok(()) => {
            if let Some(path) = &output {
                eprintln!("{} {}", "Wrote".green().bold(), path.display());
            }
            if !engine.is_safe() {
                eprintln!("{}", "Warning: document failed validation".yellow());
            }
            Ok(0)
        }
        Err(CsvNestError::UnsafeDocument { failed_cells }) => {
            eprintln!(
                "{} {} cell(s) failed validation; run 'csvnest check {}' or pass --force",
                "Refusing to write:".red().bold(),
                failed_cells,
                file.display()
            );
            Ok(2)
        }
        Err(e) => Err(e.into()),
    }
}
