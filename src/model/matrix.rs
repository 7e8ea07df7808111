use crate::model::ids::HlaId;

/// Binary cell: `Some(0)`, `Some(1)` or `None` for missing.
pub type Cell = Option<u8>;

#[derive(Debug, Clone, PartialEq)]
pub struct AlleleRow {
    pub id: HlaId,
    pub cells: Vec<Cell>,
}

/// Allele x donor presence matrix.
#[derive(Debug, Clone)]
pub struct AlleleMatrix {
    pub donors: Vec<String>,
    pub rows: Vec<AlleleRow>,
}

impl AlleleMatrix {
    pub fn n_donors(&self) -> usize {
        self.donors.len()
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, id: &str) -> Option<&AlleleRow> {
        self.rows.iter().find(|r| r.id.as_str() == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peptide {
    pub number: u64,
    pub id: String,
    pub sequence: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRow {
    pub peptide: Peptide,
    pub cells: Vec<Cell>,
}

/// Peptide x donor response matrix, thresholded at one response cutoff.
#[derive(Debug, Clone)]
pub struct ResponseMatrix {
    pub donors: Vec<String>,
    pub cutoff: f64,
    pub rows: Vec<ResponseRow>,
}

impl ResponseMatrix {
    pub fn n_donors(&self) -> usize {
        self.donors.len()
    }
}
