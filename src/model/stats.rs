use crate::model::ids::HlaId;

/// 2x2 counts of allele presence (A) against response presence (R).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quadrants {
    pub ap_rp: u32,
    pub an_rp: u32,
    pub ap_rn: u32,
    pub an_rn: u32,
}

impl Quadrants {
    pub fn total(&self) -> u32 {
        self.ap_rp + self.an_rp + self.ap_rn + self.an_rn
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyRow {
    pub hla: HlaId,
    pub peptide: String,
    pub counts: Quadrants,
}

impl ContingencyRow {
    pub fn key(&self, separator: char) -> String {
        format!("{}{}{}", self.hla, separator, self.peptide)
    }
}

/// A ratio that may be undefined because of a zero denominator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    Undefined,
}

impl Metric {
    pub fn ratio(num: f64, denom: f64) -> Self {
        if denom == 0.0 {
            Metric::Undefined
        } else {
            Metric::Value(num / denom)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(v),
            Metric::Undefined => None,
        }
    }

    pub fn is_positive(self) -> bool {
        matches!(self, Metric::Value(v) if v > 0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatResult {
    pub row: ContingencyRow,
    pub n_donors: u32,
    pub relative_freq: Metric,
    pub odds_ratio: Metric,
    pub fisher_p: f64,
}

impl StatResult {
    pub fn hla(&self) -> &HlaId {
        &self.row.hla
    }

    pub fn peptide(&self) -> &str {
        &self.row.peptide
    }
}
