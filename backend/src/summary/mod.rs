//! Daily sales series for the chart front-end.
//!
//! Reads a normalized table back, optionally keeps one region, sums
//! `Sales` per calendar day and compares the period before and after a
//! marker date (the Pink Morsel price increase by default).

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{IngestError, ParseError, SummaryError, SummaryResult};
use crate::models::{SalesRecord, SalesTable, OUTPUT_COLUMNS};
use crate::parser::{physical_line, read_text};
use crate::transform::clean::parse_decimal;

/// Date of the Pink Morsel price increase.
pub const PRICE_INCREASE: (i32, u32, u32) = (2021, 1, 15);

/// Sentinel accepted by [`RegionFilter::parse`] for "every region".
pub const ALL_REGIONS: &str = "all";

/// Date layouts accepted in the `Date` column.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Which rows of the table contribute to the series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionFilter {
    All,
    Region(String),
}

impl RegionFilter {
    /// `"all"` (any case) means no filter; anything else is a region name.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case(ALL_REGIONS) {
            RegionFilter::All
        } else {
            RegionFilter::Region(value.to_string())
        }
    }

    pub fn matches(&self, region: &str) -> bool {
        match self {
            RegionFilter::All => true,
            RegionFilter::Region(r) => r.to_lowercase() == region.to_lowercase(),
        }
    }
}

/// Total sales for one day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub sales: f64,
}

/// Aggregate over one side of the marker date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodStats {
    pub days: usize,
    pub total: f64,
    /// Mean of the daily totals; 0 when `days` is 0
    pub daily_average: f64,
}

impl PeriodStats {
    fn from_days(days: &[DailyTotal]) -> Self {
        let total: f64 = days.iter().map(|d| d.sales).sum();
        let daily_average = if days.is_empty() {
            0.0
        } else {
            total / days.len() as f64
        };
        Self {
            days: days.len(),
            total,
            daily_average,
        }
    }
}

/// Sales before the marker versus on and after it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerComparison {
    pub marker: NaiveDate,
    pub before: PeriodStats,
    pub after: PeriodStats,
}

impl MarkerComparison {
    /// Relative change of the daily average, or `None` without a baseline.
    pub fn average_change(&self) -> Option<f64> {
        if self.before.days == 0 || self.before.daily_average == 0.0 {
            return None;
        }
        Some((self.after.daily_average - self.before.daily_average) / self.before.daily_average)
    }
}

/// The marker date used when none is given.
pub fn default_marker() -> NaiveDate {
    let (y, m, d) = PRICE_INCREASE;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Parse a `Date` cell in any of the accepted layouts.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Read a persisted `Sales,Date,Region` table.
pub fn load_sales_table(path: &Path) -> SummaryResult<SalesTable> {
    let (_, content) = read_text(path)?;
    parse_sales_table(path, &content)
}

/// Parse normalized table text. Extra columns are ignored.
pub fn parse_sales_table(path: &Path, content: &str) -> SummaryResult<SalesTable> {
    let malformed = |line: u64, err: &csv::Error| IngestError::Malformed {
        path: path.to_path_buf(),
        line,
        message: err.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());
    let headers = reader.headers().map_err(|e| malformed(1, &e))?.clone();

    let index = |name: &str| headers.iter().position(|h| h == name);
    let columns: Vec<Option<usize>> = OUTPUT_COLUMNS.iter().map(|c| index(c)).collect();
    let missing: Vec<String> = OUTPUT_COLUMNS
        .iter()
        .zip(&columns)
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| name.to_string())
        .collect();
    let (sales_idx, date_idx, region_idx) = match columns.as_slice() {
        [Some(s), Some(d), Some(r)] => (*s, *d, *r),
        _ => {
            return Err(IngestError::MissingColumns {
                path: path.to_path_buf(),
                columns: missing,
            }
            .into())
        }
    };

    let line_of = |pos: Option<&csv::Position>| {
        pos.map(|p| physical_line(content, p.byte())).unwrap_or(0)
    };

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| malformed(line_of(e.position()), &e))?;
        let line = line_of(record.position());
        let field = |i: usize| record.get(i).unwrap_or("");

        let raw_sales = field(sales_idx);
        let sales = parse_decimal(raw_sales.trim()).ok_or_else(|| {
            ParseError::new("Sales", raw_sales, "expected a decimal number").at(path, line)
        })?;

        records.push(SalesRecord {
            sales,
            date: field(date_idx).to_string(),
            region: field(region_idx).to_string(),
        });
    }

    Ok(SalesTable::new(records))
}

/// Sum `Sales` per distinct date, ascending by date.
pub fn daily_totals(table: &SalesTable, filter: &RegionFilter) -> SummaryResult<Vec<DailyTotal>> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for (row, record) in table.iter().enumerate() {
        if !filter.matches(&record.region) {
            continue;
        }
        let date = parse_date(&record.date).ok_or_else(|| SummaryError::InvalidDate {
            row: row + 1,
            value: record.date.clone(),
        })?;
        *totals.entry(date).or_insert(0.0) += record.sales;
    }

    Ok(totals
        .into_iter()
        .map(|(date, sales)| DailyTotal { date, sales })
        .collect())
}

/// Split a sorted series at `marker`; the marker day counts as "after".
pub fn compare_around(series: &[DailyTotal], marker: NaiveDate) -> MarkerComparison {
    let split = series.partition_point(|d| d.date < marker);
    let (before, after) = series.split_at(split);
    MarkerComparison {
        marker,
        before: PeriodStats::from_days(before),
        after: PeriodStats::from_days(after),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(sales: f64, date: &str, region: &str) -> SalesRecord {
        SalesRecord {
            sales,
            date: date.into(),
            region: region.into(),
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_region_filter_parse() {
        assert_eq!(RegionFilter::parse("all"), RegionFilter::All);
        assert_eq!(RegionFilter::parse("ALL"), RegionFilter::All);
        assert_eq!(RegionFilter::parse("north"), RegionFilter::Region("north".into()));
        assert!(RegionFilter::parse("North").matches("north"));
        assert!(!RegionFilter::parse("north").matches("south"));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2021-01-15"), Some(ymd(2021, 1, 15)));
        assert_eq!(parse_date("2021/01/15"), Some(ymd(2021, 1, 15)));
        assert_eq!(parse_date("01/15/2021"), Some(ymd(2021, 1, 15)));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_daily_totals_sorted_and_summed() {
        let table = SalesTable::new(vec![
            record(3.0, "2021-01-11", "north"),
            record(1.0, "2021-01-10", "south"),
            record(2.0, "2021-01-11", "south"),
            record(4.0, "2021-01-10", "north"),
        ]);

        let all = daily_totals(&table, &RegionFilter::All).unwrap();
        assert_eq!(
            all,
            vec![
                DailyTotal { date: ymd(2021, 1, 10), sales: 5.0 },
                DailyTotal { date: ymd(2021, 1, 11), sales: 5.0 },
            ]
        );

        let south = daily_totals(&table, &RegionFilter::parse("south")).unwrap();
        assert_eq!(south[0].sales, 1.0);
        assert_eq!(south[1].sales, 2.0);
    }

    #[test]
    fn test_invalid_date_only_when_selected() {
        let table = SalesTable::new(vec![
            record(1.0, "2021-01-10", "north"),
            record(1.0, "soon", "west"),
        ]);
        assert!(daily_totals(&table, &RegionFilter::parse("north")).is_ok());
        assert!(matches!(
            daily_totals(&table, &RegionFilter::All),
            Err(SummaryError::InvalidDate { row: 2, .. })
        ));
    }

    #[test]
    fn test_compare_around_marker() {
        let series = vec![
            DailyTotal { date: ymd(2021, 1, 13), sales: 10.0 },
            DailyTotal { date: ymd(2021, 1, 14), sales: 20.0 },
            DailyTotal { date: ymd(2021, 1, 15), sales: 30.0 },
            DailyTotal { date: ymd(2021, 1, 16), sales: 30.0 },
        ];
        let cmp = compare_around(&series, default_marker());

        assert_eq!(cmp.before.days, 2);
        assert_eq!(cmp.before.daily_average, 15.0);
        assert_eq!(cmp.after.days, 2);
        assert_eq!(cmp.after.total, 60.0);
        assert_eq!(cmp.average_change(), Some(1.0));
    }

    #[test]
    fn test_compare_without_baseline() {
        let series = vec![DailyTotal { date: ymd(2021, 2, 1), sales: 1.0 }];
        let cmp = compare_around(&series, default_marker());
        assert_eq!(cmp.before.days, 0);
        assert_eq!(cmp.before.daily_average, 0.0);
        assert_eq!(cmp.average_change(), None);
    }

    #[test]
    fn test_load_sales_table_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("formatted_output.csv");
        std::fs::write(&path, "Sales,Date,Region\n6.0,2021-01-10,north\n1.5,2021-01-11,south\n").unwrap();

        let table = load_sales_table(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0], record(6.0, "2021-01-10", "north"));
    }

    #[test]
    fn test_load_sales_table_errors() {
        let missing = parse_sales_table(Path::new("x.csv"), "Sales,Date\n1,2021-01-01\n");
        assert!(matches!(
            missing,
            Err(SummaryError::Ingest(IngestError::MissingColumns { .. }))
        ));

        let bad = parse_sales_table(Path::new("x.csv"), "Sales,Date,Region\nlots,2021-01-01,north\n");
        match bad {
            Err(SummaryError::Parse(err)) => {
                assert_eq!(err.line, 2);
                assert_eq!(err.column, "Sales");
            }
            other => panic!("expected parse error, got {:?}", other),
        }

        let spaced = parse_sales_table(
            Path::new("x.csv"),
            "Sales,Date,Region\n1,2021-01-01,north\n\nlots,2021-01-02,north\n",
        );
        match spaced {
            Err(SummaryError::Parse(err)) => assert_eq!(err.line, 4),
            other => panic!("expected parse error, got {:?}", other),
        }

        assert!(matches!(
            load_sales_table(Path::new("/definitely/not/here.csv")),
            Err(SummaryError::Ingest(IngestError::Missing { .. }))
        ));
    }
}
