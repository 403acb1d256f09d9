use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter},
};

use ordered_float::OrderedFloat;

/// Utilisation or guaranteed acceptance price in pounds sterling per megawatt-hour.
#[derive(Copy, Clone, derive_more::FromStr, serde::Serialize, serde::Deserialize)]
pub struct PoundsPerMegawattHour(pub f64);

impl PoundsPerMegawattHour {
    /// Round to the published precision of two decimal places.
    #[must_use]
    pub fn rounded(self) -> f64 {
        (self.0 * 100.0).round() / 100.0
    }
}

impl Display for PoundsPerMegawattHour {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "£{:.2}/MWh", self.0)
    }
}

impl Debug for PoundsPerMegawattHour {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "£{:.2}", self.0)
    }
}

impl PartialEq for PoundsPerMegawattHour {
    fn eq(&self, other: &Self) -> bool {
        OrderedFloat(self.0).eq(&OrderedFloat(other.0))
    }
}

impl Eq for PoundsPerMegawattHour {}

impl PartialOrd for PoundsPerMegawattHour {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PoundsPerMegawattHour {
    fn cmp(&self, other: &Self) -> Ordering {
        OrderedFloat(self.0).cmp(&OrderedFloat(other.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded() {
        assert_eq!(PoundsPerMegawattHour(123.456).rounded(), 123.46);
    }

    #[test]
    fn test_ordering_is_total() {
        let mut prices =
            vec![PoundsPerMegawattHour(92.0), PoundsPerMegawattHour(145.5), PoundsPerMegawattHour(12.01)];
        prices.sort();
        assert_eq!(prices[2], PoundsPerMegawattHour(145.5));
    }
}
