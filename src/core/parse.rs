//! CSV normalizer for the NESO datastore dumps.
//!
//! Two row schemas share the pipeline: the market/bids feed and the utilisation feed.
//! Each is located by header name, extracted into a tagged [`RawRow`], and normalized
//! into the common [`Record`]. A malformed row is skipped with a warning; only a payload
//! with no recognizable tabular structure at all is an error.

use chrono::{NaiveDate, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{
    core::record::{AcceptanceStatus, Record, TimeWindow},
    prelude::*,
    quantity::{power::Megawatts, price::PoundsPerMegawattHour},
};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("the payload is empty")]
    Empty,

    #[error("failed to read the header row: {0}")]
    Header(#[source] csv::Error),

    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),
}

/// Which of the two feed schemas the payload follows.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FeedShape {
    /// DFS market requirements with eligible participant bids.
    Market,

    /// DFS utilisation report: per-session bids with acceptance status.
    Utilization,
}

impl FeedShape {
    const fn participant_column(self) -> &'static str {
        match self {
            Self::Market => "Participant Bids Eligible",
            Self::Utilization => "Registered DFS Participant",
        }
    }

    const fn price_column(self) -> &'static str {
        match self {
            Self::Market => "Guaranteed Acceptance Price GBP per MWh",
            Self::Utilization => "Utilisation Price GBP per MWh",
        }
    }

    const fn volume_column(self) -> &'static str {
        match self {
            Self::Market => "Service Requirement MW",
            Self::Utilization => "DFS Volume MW",
        }
    }
}

/// Column indices resolved against the actual header row.
struct Columns {
    shape: FeedShape,
    participant: usize,
    delivery_date: usize,
    from: usize,
    to: usize,
    price: usize,
    volume: usize,
    status: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord, shape: FeedShape) -> Result<Self, ParseError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or(ParseError::MissingColumn(name))
        };
        Ok(Self {
            shape,
            participant: find(shape.participant_column())?,
            delivery_date: find("Delivery Date")?,
            from: find("From")?,
            to: find("To")?,
            price: find(shape.price_column())?,
            volume: find(shape.volume_column())?,
            status: match shape {
                FeedShape::Market => None,
                FeedShape::Utilization => Some(find("Status")?),
            },
        })
    }

    fn extract<'r>(&self, row: &'r StringRecord) -> Result<RawRow<'r>> {
        let field = |index: usize| row.get(index).context("row is too short");
        let common = RawFields {
            participant: field(self.participant)?,
            delivery_date: field(self.delivery_date)?,
            from: field(self.from)?,
            to: field(self.to)?,
            price: field(self.price)?,
            volume: field(self.volume)?,
        };
        Ok(match self.shape {
            FeedShape::Market => RawRow::Market(common),
            FeedShape::Utilization => {
                let status = self.status.map(field).transpose()?.unwrap_or_default();
                RawRow::Utilization(common, status)
            }
        })
    }
}

struct RawFields<'r> {
    participant: &'r str,
    delivery_date: &'r str,
    from: &'r str,
    to: &'r str,
    price: &'r str,
    volume: &'r str,
}

/// A row as found in the feed, before normalization. Tagged per schema so the adapters
/// stay in one place instead of branching inside the aggregation.
enum RawRow<'r> {
    Market(RawFields<'r>),
    Utilization(RawFields<'r>, &'r str),
}

impl RawRow<'_> {
    fn normalize(self) -> Result<Record> {
        let (fields, status) = match self {
            // Market requirements are published before any bid is decided.
            Self::Market(fields) => (fields, AcceptanceStatus::Unknown),
            Self::Utilization(fields, status) => (fields, AcceptanceStatus::parse(status)),
        };
        Ok(Record {
            participant: fields.participant.to_owned(),
            delivery_date: parse_date(fields.delivery_date)?,
            window: parse_window(fields.from, fields.to)?,
            price: PoundsPerMegawattHour(parse_decimal(fields.price)?),
            volume: Megawatts(parse_decimal(fields.volume)?),
            status,
        })
    }
}

/// Parse a payload of the given shape into normalized records.
///
/// A well-formed header with zero data rows yields an empty vector.
pub fn parse(payload: &str, shape: FeedShape) -> Result<Vec<Record>, ParseError> {
    if payload.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(payload.as_bytes());
    let headers = reader.headers().map_err(ParseError::Header)?.clone();
    let columns = Columns::locate(&headers, shape)?;

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(error) => {
                warn!(index, "skipping an unreadable row: {error}");
                continue;
            }
        };
        match columns.extract(&row).and_then(RawRow::normalize) {
            Ok(record) => records.push(record),
            Err(error) => warn!(index, "skipping a malformed row: {error:#}"),
        }
    }
    Ok(records)
}

/// The feed mixes ISO dates, ISO timestamps, and human-readable dates.
fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    let date_part = text.split('T').next().unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d %B %Y"))
        .or_else(|_| NaiveDate::parse_from_str(text, "%d/%m/%Y"))
        .with_context(|| format!("unrecognized date `{text}`"))
}

fn parse_time(text: &str) -> Result<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .with_context(|| format!("unrecognized time `{text}`"))
}

/// Accepts separate `From`/`To` cells as well as a combined `"HH:MM-HH:MM"` range
/// left in the `From` cell.
fn parse_window(from: &str, to: &str) -> Result<TimeWindow> {
    if to.trim().is_empty() {
        if let Some((start, end)) = from.split_once('-') {
            return Ok(TimeWindow::new(parse_time(start)?, parse_time(end)?));
        }
    }
    Ok(TimeWindow::new(parse_time(from)?, parse_time(to)?))
}

/// Numeric cells come through as text, sometimes with a currency sign or
/// thousands separators, sometimes empty.
fn parse_decimal(text: &str) -> Result<f64> {
    let cleaned: String =
        text.chars().filter(|char| char.is_ascii_digit() || *char == '.' || *char == '-').collect();
    ensure!(!cleaned.is_empty(), "missing numeric value `{text}`");
    cleaned.parse().with_context(|| format!("unrecognized numeric value `{text}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UTILIZATION_HEADER: &str =
        "_id,Registered DFS Participant,Delivery Date,From,To,Status,Utilisation Price GBP per MWh,DFS Volume MW";

    #[test]
    fn test_header_only_is_empty_not_an_error() -> Result {
        let records = parse(UTILIZATION_HEADER, FeedShape::Utilization)?;
        assert!(records.is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_payload_fails() {
        assert!(matches!(parse("  \n", FeedShape::Utilization), Err(ParseError::Empty)));
    }

    #[test]
    fn test_missing_column_fails() {
        let result = parse("Delivery Date,From,To\n2025-02-11,16:00,19:00", FeedShape::Utilization);
        assert!(matches!(result, Err(ParseError::MissingColumn(_))));
    }

    #[test]
    fn test_utilization_row() -> Result {
        let payload = format!(
            "{UTILIZATION_HEADER}\n1,OCTOPUS ENERGY LIMITED,2025-02-11,16:00,19:00,ACCEPTED,123.45,50.5"
        );
        let records = parse(&payload, FeedShape::Utilization)?;
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.participant, "OCTOPUS ENERGY LIMITED");
        assert_eq!(record.delivery_date, NaiveDate::from_ymd_opt(2025, 2, 11).unwrap());
        assert_eq!(record.window.to_string(), "16:00 - 19:00");
        assert_eq!(record.price, PoundsPerMegawattHour(123.45));
        assert_eq!(record.status, AcceptanceStatus::Accepted);
        Ok(())
    }

    #[test]
    fn test_market_row_has_unknown_status() -> Result {
        let payload = "\
            Delivery Date,From,To,Participant Bids Eligible,Service Requirement MW,Guaranteed Acceptance Price GBP per MWh\n\
            2025-02-11,17:00:00,17:30:00,OCTOPUS ENERGY LIMITED|E.ON NEXT,240,£95.00";
        let records = parse(payload, FeedShape::Market)?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AcceptanceStatus::Unknown);
        assert_eq!(records[0].price, PoundsPerMegawattHour(95.0));
        assert_eq!(records[0].volume.0, 240.0);
        Ok(())
    }

    #[test]
    fn test_missing_numeric_skips_the_row() -> Result {
        let payload = format!(
            "{UTILIZATION_HEADER}\n\
            1,OCTOPUS ENERGY LIMITED,2025-02-11,16:00,19:00,ACCEPTED,,50.5\n\
            2,OCTOPUS ENERGY LIMITED,2025-02-11,19:00,20:00,ACCEPTED,101.00,25.0"
        );
        let records = parse(&payload, FeedShape::Utilization)?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].price, PoundsPerMegawattHour(101.0));
        Ok(())
    }

    #[test]
    fn test_date_formats() -> Result {
        assert_eq!(parse_date("2025-02-11")?, NaiveDate::from_ymd_opt(2025, 2, 11).unwrap());
        assert_eq!(
            parse_date("2025-02-11T00:00:00")?,
            NaiveDate::from_ymd_opt(2025, 2, 11).unwrap()
        );
        assert_eq!(parse_date("11 February 2025")?, NaiveDate::from_ymd_opt(2025, 2, 11).unwrap());
        Ok(())
    }

    #[test]
    fn test_combined_window_range() -> Result {
        let window = parse_window("16:00-19:00", "")?;
        assert_eq!(window.to_string(), "16:00 - 19:00");
        Ok(())
    }

    #[test]
    fn test_wrapping_window_is_kept() -> Result {
        let window = parse_window("23:00", "01:00")?;
        assert!(window.end < window.start);
        Ok(())
    }

    #[test]
    fn test_decimal_with_currency_sign() -> Result {
        assert_eq!(parse_decimal("£1,234.50")?, 1234.5);
        assert!(parse_decimal("N/A").is_err());
        Ok(())
    }
}
