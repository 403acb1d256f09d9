use std::fmt::{Debug, Display, Formatter};

use chrono::{NaiveDate, NaiveTime};

use crate::quantity::{power::Megawatts, price::PoundsPerMegawattHour};

/// Bid-acceptance status of a feed row.
///
/// Anything the feed renders that is not recognizably accepted or rejected maps to
/// [`AcceptanceStatus::Unknown`]; the feed occasionally carries provisional wording.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AcceptanceStatus {
    Accepted,
    Rejected,
    Unknown,
}

impl AcceptanceStatus {
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "accepted" => Self::Accepted,
            "rejected" => Self::Rejected,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl Display for AcceptanceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery window within a single day.
///
/// The end may precede the start when the window wraps midnight, for example `23:00-01:00`.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub const fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }
}

impl Display for TimeWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

impl Debug for TimeWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// One normalized feed row. Both feed shapes funnel into this.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub participant: String,
    pub delivery_date: NaiveDate,
    pub window: TimeWindow,
    pub price: PoundsPerMegawattHour,
    pub volume: Megawatts,
    pub status: AcceptanceStatus,
}
