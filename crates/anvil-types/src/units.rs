use serde::{Deserialize, Serialize};

/// Document length units. The core normalizes to millimetres
/// internally; documents store lengths in their declared unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Mm,
    Cm,
    M,
    In,
    Ft,
}

impl Units {
    pub fn to_mm(self) -> f64 {
        match self {
            Units::Mm => 1.0,
            Units::Cm => 10.0,
            Units::M => 1000.0,
            Units::In => 25.4,
            Units::Ft => 304.8,
        }
    }

    pub fn from_mm(self) -> f64 {
        1.0 / self.to_mm()
    }
}
