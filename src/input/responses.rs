use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::input::InputError;
use crate::input::reader::read_delimited;

pub const COL_PEPTIDE_NUMBER: &str = "Peptide #";
pub const COL_PEPTIDE_ID: &str = "Peptide_ID";
pub const COL_PEPTIDE_SEQ: &str = "Peptide_Seq";

#[derive(Debug, Clone)]
pub struct ResponseRecord {
    pub number: u64,
    pub id: String,
    pub sequence: String,
    /// Raw donor cells, aligned with `ResponseTable::donors`.
    pub values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ResponseTable {
    pub path: PathBuf,
    pub donors: Vec<String>,
    pub rows: Vec<ResponseRecord>,
}

impl ResponseTable {
    pub fn max_peptide_number(&self) -> u64 {
        self.rows.iter().map(|r| r.number).max().unwrap_or(0)
    }
}

pub fn read_response_table(path: &Path, donor_marker: &str) -> Result<ResponseTable, InputError> {
    let table = read_delimited(path, '\t')?;
    let number_col = table.column(COL_PEPTIDE_NUMBER)?;
    let id_col = table.column(COL_PEPTIDE_ID)?;
    let seq_col = table.column(COL_PEPTIDE_SEQ)?;

    let donor_cols: Vec<usize> = table
        .header
        .iter()
        .enumerate()
        .filter(|(_, name)| name.contains(donor_marker))
        .map(|(idx, _)| idx)
        .collect();
    if donor_cols.is_empty() {
        return Err(InputError::InvalidInput(format!(
            "{}: no donor columns (header containing '{}')",
            path.display(),
            donor_marker
        )));
    }
    let donors: Vec<String> = donor_cols
        .iter()
        .map(|&idx| table.header[idx].clone())
        .collect();

    let mut rows = Vec::with_capacity(table.rows.len());
    let mut seen: HashMap<String, usize> = HashMap::new();
    for row in &table.rows {
        let sequence = row.field(seq_col).to_string();
        if sequence.is_empty() {
            return Err(InputError::parse(
                path,
                row.line_no,
                format!("empty {}", COL_PEPTIDE_SEQ),
            ));
        }
        if let Some(first) = seen.insert(sequence.clone(), row.line_no) {
            return Err(InputError::parse(
                path,
                row.line_no,
                format!("duplicate peptide {} (first seen on line {})", sequence, first),
            ));
        }
        let number = parse_peptide_number(row.field(number_col)).ok_or_else(|| {
            InputError::parse(
                path,
                row.line_no,
                format!(
                    "invalid {} '{}' for peptide {}",
                    COL_PEPTIDE_NUMBER,
                    row.field(number_col),
                    sequence
                ),
            )
        })?;
        rows.push(ResponseRecord {
            number,
            id: row.field(id_col).to_string(),
            sequence,
            values: donor_cols
                .iter()
                .map(|&idx| row.field(idx).to_string())
                .collect(),
        });
    }

    tracing::debug!(
        "read response table {}: {} peptides, {} donors",
        path.display(),
        rows.len(),
        donors.len()
    );

    Ok(ResponseTable {
        path: path.to_path_buf(),
        donors,
        rows,
    })
}

/// Accepts integral numbers, including the "12.0" form spreadsheets emit.
fn parse_peptide_number(value: &str) -> Option<u64> {
    if let Ok(n) = value.parse::<u64>() {
        return Some(n);
    }
    let f = value.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 {
        Some(f as u64)
    } else {
        None
    }
}
