use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::models::{
    AggregateSummary, CategoryCount, CollisionRecord, Dimension, MonthlyPoint, PointDetail,
    RawRow, Series, SeriesKey, SeriesStats, UNKNOWN,
};

const YEAR_COLUMNS: [&str; 2] = ["CRASH YEAR", "YEAR"];
const MONTH_COLUMNS: [&str; 2] = ["CRASH MONTH", "MONTH"];
pub const DATE_COLUMN: &str = "CRASH DATE";
pub const VEHICLE_COLUMN: &str = "VEHICLE TYPE CODE 1";
pub const FACTOR_COLUMN: &str = "CONTRIBUTING FACTOR VEHICLE 1";

const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];
const DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

pub const STATS_TOP_N: usize = 3;
const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub first: i32,
    pub last: i32,
}

impl YearRange {
    pub fn new(first: i32, last: i32) -> Self {
        Self {
            first: first.min(last),
            last: first.max(last),
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.first..=self.last).contains(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.first..=self.last
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::new(2020, 2024)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    pub dimension: Dimension,
    pub years: YearRange,
    pub top_n: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            dimension: Dimension::Year,
            years: YearRange::default(),
            top_n: 8,
        }
    }
}

/// Aggregated view of one load. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub dimension: Dimension,
    pub series: Vec<Series>,
    records: Vec<CollisionRecord>,
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|stamp| stamp.date())
        })
}

fn first_value<'a>(row: &'a RawRow, columns: &[&str]) -> Option<&'a str> {
    columns
        .iter()
        .filter_map(|column| row.get(*column))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

fn category(row: &RawRow, column: &str) -> String {
    match row.get(column).map(|value| value.trim()) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Reduces a row to the charted fields; `None` when no year or month can be derived.
///
/// A valid month column pairs with the year column (or the date's year when
/// that column is missing). Otherwise year and month both come from the date.
pub fn parse_record(row: &RawRow) -> Option<CollisionRecord> {
    let date = row.get(DATE_COLUMN).and_then(|text| parse_date(text));

    let explicit_month = first_value(row, &MONTH_COLUMNS)
        .and_then(|text| text.parse::<u32>().ok())
        .filter(|month| (1..=12).contains(month));

    let (year, month) = match explicit_month {
        Some(month) => {
            let year = first_value(row, &YEAR_COLUMNS)
                .and_then(|text| text.parse::<i32>().ok())
                .or_else(|| date.map(|date| date.year()))?;
            (year, month)
        }
        None => date.map(|date| (date.year(), date.month()))?,
    };

    Some(CollisionRecord {
        year,
        month,
        vehicle_type: category(row, VEHICLE_COLUMN),
        factor: category(row, FACTOR_COLUMN),
    })
}

/// Most frequent categories first; equal counts keep first-encountered order.
pub fn top_n<I, S>(items: I, n: usize) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<CategoryCount> = Vec::new();

    for item in items {
        let name = item.as_ref();
        match positions.get(name) {
            Some(&position) => counts[position].count += 1,
            None => {
                positions.insert(name.to_string(), counts.len());
                counts.push(CategoryCount {
                    name: name.to_string(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(n);
    counts
}

/// One 12-point series per declared key, zero-filled where no record lands.
pub fn dense_series(records: &[CollisionRecord], keys: &[SeriesKey]) -> Vec<Series> {
    let mut counts = vec![[0u64; 12]; keys.len()];

    for record in records {
        let Some(index) = keys.iter().position(|key| key.matches(record)) else {
            continue;
        };
        if let Some(slot) = record
            .month
            .checked_sub(1)
            .and_then(|month| counts[index].get_mut(month as usize))
        {
            *slot += 1;
        }
    }

    keys.iter()
        .zip(counts)
        .map(|(key, months)| Series {
            key: key.clone(),
            values: months
                .iter()
                .enumerate()
                .map(|(index, count)| MonthlyPoint::new(index as u32 + 1, *count))
                .collect(),
        })
        .collect()
}

pub fn aggregate(rows: &[RawRow], options: &AggregateOptions) -> Chart {
    let records: Vec<CollisionRecord> = rows
        .iter()
        .filter_map(parse_record)
        .filter(|record| options.years.contains(record.year))
        .collect();

    let dropped = rows.len() - records.len();
    if dropped > 0 {
        debug!(dropped, "excluded rows without a usable date or outside the year range");
    }

    let keys: Vec<SeriesKey> = match options.dimension {
        Dimension::Year => options.years.years().map(SeriesKey::Year).collect(),
        Dimension::VehicleType => {
            top_n(records.iter().map(|record| &record.vehicle_type), options.top_n)
                .into_iter()
                .map(|category| SeriesKey::VehicleType(category.name))
                .collect()
        }
    };

    let series = dense_series(&records, &keys);
    info!(
        records = records.len(),
        series = series.len(),
        dimension = options.dimension.label(),
        "aggregated collisions"
    );

    Chart {
        dimension: options.dimension,
        series,
        records,
    }
}

impl Chart {
    pub fn series_for(&self, key: &SeriesKey) -> Option<&Series> {
        self.series.iter().find(|series| &series.key == key)
    }

    pub fn contains(&self, key: &SeriesKey) -> bool {
        self.series_for(key).is_some()
    }

    pub fn max_count(&self) -> u64 {
        self.series.iter().map(Series::max_count).max().unwrap_or(0)
    }

    pub fn stats(&self, key: &SeriesKey) -> Option<SeriesStats> {
        let series = self.series_for(key)?;
        let matching: Vec<&CollisionRecord> = self
            .records
            .iter()
            .filter(|record| key.matches(record))
            .collect();

        Some(SeriesStats {
            key: key.clone(),
            total: series.total(),
            average_per_month: series.average_per_month(),
            peak: series
                .peak()
                .cloned()
                .unwrap_or_else(|| MonthlyPoint::new(1, 0)),
            top_factors: top_n(matching.iter().map(|record| &record.factor), STATS_TOP_N),
            top_vehicles: top_n(
                matching.iter().map(|record| &record.vehicle_type),
                STATS_TOP_N,
            ),
        })
    }

    pub fn all_stats(&self) -> Vec<SeriesStats> {
        self.series
            .iter()
            .filter_map(|series| self.stats(&series.key))
            .collect()
    }

    pub fn summary(&self) -> AggregateSummary {
        let per_series: Vec<(SeriesKey, u64)> = self
            .series
            .iter()
            .map(|series| (series.key.clone(), series.total()))
            .collect();

        AggregateSummary {
            grand_total: per_series.iter().map(|(_, total)| total).sum(),
            per_series,
        }
    }

    /// Tooltip data for a single (key, month) cell.
    pub fn point_detail(&self, key: &SeriesKey, month: u32) -> Option<PointDetail> {
        let point = self.series_for(key)?.point(month)?;
        let cell: Vec<&CollisionRecord> = self
            .records
            .iter()
            .filter(|record| record.month == month && key.matches(record))
            .collect();

        let dominant = |names: Vec<&String>| {
            top_n(names, 1)
                .into_iter()
                .next()
                .map(|category| category.name)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };

        Some(PointDetail {
            key: key.clone(),
            month_name: point.month_name,
            count: point.count,
            dominant_vehicle: dominant(cell.iter().map(|record| &record.vehicle_type).collect()),
            dominant_factor: dominant(cell.iter().map(|record| &record.factor).collect()),
        })
    }
}
