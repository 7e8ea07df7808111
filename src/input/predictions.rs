use std::path::{Path, PathBuf};

use crate::input::InputError;
use crate::input::reader::read_delimited;
use crate::model::binders::BinderList;

pub const COL_ALLELE: &str = "allele";
pub const COL_PEPTIDE: &str = "peptide";
pub const COL_RANK: &str = "rank";

#[derive(Debug, Clone)]
pub struct PredictionRecord {
    pub allele: String,
    pub peptide: String,
    pub rank: f64,
    pub raw: String,
}

/// Binding-prediction table (netMHCpan style CSV export).
#[derive(Debug, Clone)]
pub struct PredictionTable {
    pub path: PathBuf,
    pub header_line: String,
    pub rows: Vec<PredictionRecord>,
}

impl PredictionTable {
    pub fn rows_for<'a>(&'a self, peptide: &'a str) -> impl Iterator<Item = &'a PredictionRecord> {
        self.rows.iter().filter(move |r| r.peptide == peptide)
    }

    /// Distinct alleles predicted to bind `peptide` at `rank <= rank_cutoff`, with the vendor
    /// prefix removed.
    pub fn binders_for(&self, peptide: &str, rank_cutoff: f64, vendor_prefix: &str) -> BinderList {
        self.rows_for(peptide)
            .filter(|r| r.rank <= rank_cutoff)
            .map(|r| r.allele.replace(vendor_prefix, ""))
            .collect()
    }
}

pub fn read_prediction_table(path: &Path) -> Result<PredictionTable, InputError> {
    let table = read_delimited(path, ',')?;
    let allele_col = table.column(COL_ALLELE)?;
    let peptide_col = table.column(COL_PEPTIDE)?;
    let rank_col = table.column(COL_RANK)?;

    let mut rows = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let rank_raw = row.field(rank_col);
        let rank = rank_raw.parse::<f64>().map_err(|_| {
            InputError::parse(
                path,
                row.line_no,
                format!("non-numeric {} '{}'", COL_RANK, rank_raw),
            )
        })?;
        rows.push(PredictionRecord {
            allele: row.field(allele_col).to_string(),
            peptide: row.field(peptide_col).to_string(),
            rank,
            raw: row.raw.clone(),
        });
    }

    tracing::debug!(
        "read prediction table {}: {} rows",
        path.display(),
        rows.len()
    );

    Ok(PredictionTable {
        path: path.to_path_buf(),
        header_line: table.header_line,
        rows,
    })
}
