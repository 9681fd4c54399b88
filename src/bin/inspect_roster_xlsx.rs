//! Inspect a roster workbook: sheet names, header mapping, first rows, and headcount per rank.
//! Usage: cargo run --bin inspect_roster_xlsx -- path/to/militares.xlsx [sheet]

use std::collections::BTreeMap;
use std::path::Path;

use calamine::Reader;
use ranksim::data::loader::{load_roster, Cell, Field, DEFAULT_ROSTER_PATH};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| DEFAULT_ROSTER_PATH.to_string());
    let wanted_sheet = args.next();
    let path = Path::new(&path);
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    let mut wb = calamine::open_workbook_auto(path)?;
    let names = wb.sheet_names();
    println!("Sheets ({}): {}", names.len(), names.join(", "));

    let sheet_name = match &wanted_sheet {
        Some(wanted) => names.iter().find(|s| s.eq_ignore_ascii_case(wanted)),
        None => names.first(),
    }
    .ok_or("No such sheet")?
    .clone();
    println!("\nUsing sheet: {sheet_name}");

    let range = wb.worksheet_range(&sheet_name)?;
    let (height, width) = range.get_size();
    println!("Size: {height} rows x {width} cols");

    let header: Vec<String> = range
        .rows()
        .next()
        .map(|row| row.iter().map(|c| Cell::from(c).display()).collect())
        .unwrap_or_default();
    println!("\nColumns:");
    for field in Field::ALL {
        let found = header.iter().find(|h| field.matches(h));
        match found {
            Some(h) => println!("  {:<16} <- {h}", field.header()),
            None if field.required() => println!("  {:<16} MISSING", field.header()),
            None => println!("  {:<16} (optional, absent)", field.header()),
        }
    }

    println!("\nFirst 10 rows:");
    for (i, row) in range.rows().take(10).enumerate() {
        let cells: Vec<String> = row.iter().map(|c| Cell::from(c).display()).collect();
        println!("  {}: {}", i, cells.join(" | "));
    }

    let roster = load_roster(path, Some(&sheet_name))?;
    let mut per_rank: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for member in roster.active() {
        let entry = per_rank.entry(member.rank.as_str()).or_default();
        if member.supernumerary {
            entry.1 += 1;
        } else {
            entry.0 += 1;
        }
    }
    println!("\nLoaded {} members:", roster.len());
    for (rank, (regular, excess)) in per_rank {
        println!("  {rank:<10} regular={regular} supernumerary={excess}");
    }
    Ok(())
}
