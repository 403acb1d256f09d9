use std::fmt::{Debug, Display, Formatter};

/// DFS volume or service requirement in megawatts.
#[derive(Copy, Clone, PartialEq, derive_more::FromStr, serde::Serialize, serde::Deserialize)]
pub struct Megawatts(pub f64);

impl Megawatts {
    /// Round to the published precision of one decimal place.
    #[must_use]
    pub fn rounded(self) -> f64 {
        (self.0 * 10.0).round() / 10.0
    }
}

impl Display for Megawatts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} MW", self.0)
    }
}

impl Debug for Megawatts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}MW", self.0)
    }
}
