use std::io::{Read, Write};

use chrono::Datelike;
use tracing::info;

use crate::aggregate::{parse_date, YearRange, DATE_COLUMN};
use crate::loader::raw_rows;
use crate::models::RawRow;

pub const KEPT_COLUMNS: [&str; 8] = [
    "CRASH DATE",
    "LATITUDE",
    "LONGITUDE",
    "LOCATION",
    "CONTRIBUTING FACTOR VEHICLE 1",
    "CONTRIBUTING FACTOR VEHICLE 2",
    "VEHICLE TYPE CODE 1",
    "VEHICLE TYPE CODE 2",
];

/// Column paired with the placeholder that marks it as missing.
const FACTOR_CHECKS: [(&str, &str); 2] = [
    ("CONTRIBUTING FACTOR VEHICLE 1", "Unspecified"),
    ("CONTRIBUTING FACTOR VEHICLE 2", "Unspecified"),
];
const VEHICLE_CHECKS: [(&str, &str); 2] = [
    ("VEHICLE TYPE CODE 1", "NaN"),
    ("VEHICLE TYPE CODE 2", "Nan"),
];
const COORDINATE_COLUMNS: [&str; 2] = ["LATITUDE", "LONGITUDE"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub read: usize,
    pub kept: usize,
}

fn present<'a>(row: &'a RawRow, column: &str) -> Option<&'a str> {
    row.get(column)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn any_valid(row: &RawRow, checks: &[(&str, &str)]) -> bool {
    checks.iter().any(|(column, placeholder)| {
        present(row, column).is_some_and(|value| value != *placeholder)
    })
}

pub fn keep_row(row: &RawRow, years: &YearRange) -> bool {
    let in_range = present(row, DATE_COLUMN)
        .and_then(parse_date)
        .is_some_and(|date| years.contains(date.year()));

    in_range
        && any_valid(row, &FACTOR_CHECKS)
        && COORDINATE_COLUMNS
            .iter()
            .all(|column| present(row, column).is_some())
        && any_valid(row, &VEHICLE_CHECKS)
}

/// Filters a raw export down to chartable rows and the columns the charts use.
pub fn clean<R: Read, W: Write>(
    source: R,
    sink: W,
    years: &YearRange,
) -> anyhow::Result<CleanStats> {
    let rows = raw_rows(source)?;
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(KEPT_COLUMNS)?;

    let mut stats = CleanStats::default();
    for result in rows {
        let row = result?;
        stats.read += 1;
        if !keep_row(&row, years) {
            continue;
        }
        writer.write_record(
            KEPT_COLUMNS
                .iter()
                .map(|column| row.get(*column).map(String::as_str).unwrap_or("")),
        )?;
        stats.kept += 1;
    }

    writer.flush()?;
    info!(read = stats.read, kept = stats.kept, "cleaned collision export");
    Ok(stats)
}
