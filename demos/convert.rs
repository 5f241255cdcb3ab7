//! Convert between workbook, JSON, type-preserving JSON and YAML files
//!
//! ```text
//! cargo run --example convert -- report.xlsx report.pyexcel.json
//! cargo run --example convert -- report.pyexcel.json report.xlsx --no-styles
//! ```

use excelport::{SaveOptions, Workbook};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let (input, output) = match (args.next(), args.next()) {
        (Some(input), Some(output)) => (input, output),
        _ => {
            eprintln!("usage: convert <input> <output> [--no-meta] [--no-styles]");
            std::process::exit(2);
        }
    };

    let mut options = SaveOptions::default();
    for flag in args {
        match flag.as_str() {
            "--no-meta" => options = options.with_retain_meta(false),
            "--no-styles" => options = options.with_retain_styles(false),
            other => {
                eprintln!("unknown flag {}", other);
                std::process::exit(2);
            }
        }
    }

    let mut book = Workbook::open(&input)?;
    println!("Loaded {} ({} sheet(s))", input, book.sheets().len());
    for (name, rows) in book.sheets() {
        println!("  {}: {} row(s)", name, rows.len());
    }
    if let Some(styles) = book.meta().styles() {
        println!("  {} styled cell(s)", styles.len());
    }

    book.save(&output, &options)?;
    println!("Saved {}", output);

    Ok(())
}
