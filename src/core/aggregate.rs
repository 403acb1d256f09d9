//! Groups normalized records by delivery date and derives the per-day summaries.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use itertools::Itertools;

use crate::{
    core::record::{AcceptanceStatus, Record},
    quantity::price::PoundsPerMegawattHour,
};

/// Everything derived for one delivery date. Records are kept in window order,
/// ties preserving the original feed order.
#[derive(Clone, Debug, PartialEq)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub records: Vec<Record>,
    pub mean_price: Option<PoundsPerMegawattHour>,
    pub highest_accepted: Option<Record>,
}

impl DaySummary {
    fn build(date: NaiveDate, mut records: Vec<Record>) -> Self {
        // Stable: equal start times keep their feed order.
        records.sort_by_key(|record| record.window.start);
        let mean_price = (!records.is_empty()).then(|| {
            PoundsPerMegawattHour(
                records.iter().map(|record| record.price.0).sum::<f64>() / records.len() as f64,
            )
        });
        let highest_accepted = highest_accepted(&records).cloned();
        Self { date, records, mean_price, highest_accepted }
    }

    /// Window list, one `"HH:MM - HH:MM"` entry per record.
    pub fn windows(&self) -> Vec<String> {
        self.records.iter().map(|record| record.window.to_string()).collect()
    }

    /// Primary textual form of the window list.
    #[must_use]
    pub fn window_summary(&self) -> String {
        self.records.iter().map(|record| record.window.to_string()).join("; ")
    }

    pub fn prices(&self) -> Vec<f64> {
        self.records.iter().map(|record| record.price.rounded()).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.records.iter().map(|record| record.volume.rounded()).collect()
    }
}

/// Maximum-price accepted record. On equal prices the first one in window order
/// wins; arbitrary, the tie source is not semantically distinguished.
pub fn highest_accepted(records: &[Record]) -> Option<&Record> {
    records
        .iter()
        .filter(|record| record.status == AcceptanceStatus::Accepted)
        .fold(None, |best: Option<&Record>, record| match best {
            Some(best) if best.price >= record.price => Some(best),
            _ => Some(record),
        })
}

/// Group the in-scope records by delivery date.
///
/// The participant filter is a case-insensitive containment test: the market feed lists
/// every eligible participant in one cell. Dates absent from the feed are absent from
/// the result.
pub fn aggregate(records: &[Record], participant: &str) -> BTreeMap<NaiveDate, DaySummary> {
    let needle = participant.to_ascii_lowercase();
    let mut by_date: BTreeMap<NaiveDate, Vec<Record>> = BTreeMap::new();
    for record in records {
        if record.participant.to_ascii_lowercase().contains(&needle) {
            by_date.entry(record.delivery_date).or_default().push(record.clone());
        }
    }
    by_date.into_iter().map(|(date, records)| (date, DaySummary::build(date, records))).collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::NaiveTime;

    use super::*;
    use crate::{core::record::TimeWindow, quantity::power::Megawatts};

    fn record(
        date: (i32, u32, u32),
        start: (u32, u32),
        end: (u32, u32),
        price: f64,
        status: AcceptanceStatus,
    ) -> Record {
        Record {
            participant: "OCTOPUS ENERGY LIMITED".to_owned(),
            delivery_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            window: TimeWindow::new(
                NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
                NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            ),
            price: PoundsPerMegawattHour(price),
            volume: Megawatts(50.5),
            status,
        }
    }

    #[test]
    fn test_mean_price() {
        let records = [
            record((2025, 2, 11), (16, 0), (17, 0), 100.0, AcceptanceStatus::Accepted),
            record((2025, 2, 11), (17, 0), (18, 0), 150.0, AcceptanceStatus::Accepted),
            record((2025, 2, 11), (18, 0), (19, 0), 200.0, AcceptanceStatus::Accepted),
        ];
        let summaries = aggregate(&records, "OCTOPUS ENERGY LIMITED");
        let summary = &summaries[&NaiveDate::from_ymd_opt(2025, 2, 11).unwrap()];
        assert_abs_diff_eq!(summary.mean_price.unwrap().rounded(), 150.00);
    }

    #[test]
    fn test_highest_accepted_excludes_rejected() {
        let records = [
            record((2025, 2, 11), (16, 0), (17, 0), 145.5, AcceptanceStatus::Accepted),
            record((2025, 2, 11), (17, 0), (18, 0), 200.0, AcceptanceStatus::Rejected),
        ];
        let summaries = aggregate(&records, "OCTOPUS ENERGY LIMITED");
        let summary = &summaries[&NaiveDate::from_ymd_opt(2025, 2, 11).unwrap()];
        assert_eq!(summary.highest_accepted.as_ref().unwrap().price, PoundsPerMegawattHour(145.5));
    }

    #[test]
    fn test_highest_accepted_tie_keeps_the_first() {
        let mut first = record((2025, 2, 11), (16, 0), (17, 0), 145.5, AcceptanceStatus::Accepted);
        first.volume = Megawatts(10.0);
        let second = record((2025, 2, 11), (17, 0), (18, 0), 145.5, AcceptanceStatus::Accepted);
        let records = [first.clone(), second];
        assert_eq!(highest_accepted(&records).unwrap().volume, Megawatts(10.0));
    }

    #[test]
    fn test_stable_order_under_equal_starts() {
        let mut first = record((2025, 2, 11), (16, 0), (17, 0), 100.0, AcceptanceStatus::Accepted);
        first.volume = Megawatts(1.0);
        let mut second = record((2025, 2, 11), (16, 0), (18, 0), 200.0, AcceptanceStatus::Accepted);
        second.volume = Megawatts(2.0);
        let summaries = aggregate(&[first, second], "OCTOPUS ENERGY LIMITED");
        let summary = &summaries[&NaiveDate::from_ymd_opt(2025, 2, 11).unwrap()];
        assert_eq!(summary.volumes(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let records = [
            record((2025, 2, 11), (18, 0), (19, 0), 200.0, AcceptanceStatus::Rejected),
            record((2025, 2, 11), (16, 0), (17, 0), 100.0, AcceptanceStatus::Accepted),
            record((2025, 2, 12), (17, 0), (18, 0), 150.0, AcceptanceStatus::Accepted),
        ];
        assert_eq!(
            aggregate(&records, "OCTOPUS ENERGY LIMITED"),
            aggregate(&records, "OCTOPUS ENERGY LIMITED"),
        );
    }

    #[test]
    fn test_participant_filter_is_containment() {
        let mut eligible = record((2025, 2, 11), (16, 0), (17, 0), 95.0, AcceptanceStatus::Unknown);
        eligible.participant = "E.ON NEXT|OCTOPUS ENERGY LIMITED".to_owned();
        let mut other = record((2025, 2, 11), (16, 0), (17, 0), 95.0, AcceptanceStatus::Unknown);
        other.participant = "E.ON NEXT".to_owned();
        let summaries = aggregate(&[eligible, other], "Octopus Energy Limited");
        assert_eq!(summaries[&NaiveDate::from_ymd_opt(2025, 2, 11).unwrap()].records.len(), 1);
    }

    #[test]
    fn test_window_summary_joins_with_semicolons() {
        let records = [
            record((2025, 2, 11), (16, 0), (17, 0), 100.0, AcceptanceStatus::Accepted),
            record((2025, 2, 11), (17, 0), (18, 0), 150.0, AcceptanceStatus::Accepted),
        ];
        let summaries = aggregate(&records, "OCTOPUS");
        let summary = &summaries[&NaiveDate::from_ymd_opt(2025, 2, 11).unwrap()];
        assert_eq!(summary.window_summary(), "16:00 - 17:00; 17:00 - 18:00");
    }
}
