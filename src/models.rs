use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub const UNKNOWN: &str = "Unknown";

/// One CSV row keyed by column header.
pub type RawRow = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionRecord {
    pub year: i32,
    pub month: u32,
    pub vehicle_type: String,
    pub factor: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Dimension {
    Year,
    #[value(name = "vehicle")]
    VehicleType,
}

impl Dimension {
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Year => "Year",
            Dimension::VehicleType => "Vehicle Type",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum SeriesKey {
    Year(i32),
    VehicleType(String),
}

impl SeriesKey {
    /// Reads user text as a key of the given dimension.
    pub fn parse(text: &str, dimension: Dimension) -> Option<SeriesKey> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        match dimension {
            Dimension::Year => text.parse().ok().map(SeriesKey::Year),
            Dimension::VehicleType => Some(SeriesKey::VehicleType(text.to_string())),
        }
    }

    pub fn matches(&self, record: &CollisionRecord) -> bool {
        match self {
            SeriesKey::Year(year) => record.year == *year,
            SeriesKey::VehicleType(vehicle_type) => record.vehicle_type == *vehicle_type,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKey::Year(year) => write!(f, "{year}"),
            SeriesKey::VehicleType(vehicle_type) => f.write_str(vehicle_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    pub month: u32,
    pub month_name: &'static str,
    pub count: u64,
}

impl MonthlyPoint {
    pub fn new(month: u32, count: u64) -> Self {
        let month_name = month
            .checked_sub(1)
            .and_then(|index| MONTH_LABELS.get(index as usize))
            .copied()
            .unwrap_or("?");
        Self {
            month,
            month_name,
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
    pub key: SeriesKey,
    pub values: Vec<MonthlyPoint>,
}

impl Series {
    pub fn total(&self) -> u64 {
        self.values.iter().map(|point| point.count).sum()
    }

    pub fn max_count(&self) -> u64 {
        self.values.iter().map(|point| point.count).max().unwrap_or(0)
    }

    /// Rounded to the nearest whole collision.
    pub fn average_per_month(&self) -> u64 {
        if self.values.is_empty() {
            return 0;
        }
        let len = self.values.len() as u64;
        (self.total() * 2 + len) / (len * 2)
    }

    /// Earliest month holding the maximum count.
    pub fn peak(&self) -> Option<&MonthlyPoint> {
        self.values
            .iter()
            .fold(None, |best: Option<&MonthlyPoint>, point| match best {
                Some(current) if point.count <= current.count => Some(current),
                _ => Some(point),
            })
    }

    pub fn point(&self, month: u32) -> Option<&MonthlyPoint> {
        self.values.iter().find(|point| point.month == month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesStats {
    pub key: SeriesKey,
    pub total: u64,
    pub average_per_month: u64,
    pub peak: MonthlyPoint,
    pub top_factors: Vec<CategoryCount>,
    pub top_vehicles: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointDetail {
    pub key: SeriesKey,
    pub month_name: &'static str,
    pub count: u64,
    pub dominant_vehicle: String,
    pub dominant_factor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateSummary {
    pub grand_total: u64,
    pub per_series: Vec<(SeriesKey, u64)>,
}
