use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::input::InputError;
use crate::input::reader::read_delimited;

/// Donor-keyed allele listing: one column of raw allele cells per donor.
#[derive(Debug, Clone)]
pub struct AlleleTable {
    pub path: PathBuf,
    pub donors: Vec<String>,
    pub columns: Vec<Vec<String>>,
}

pub fn read_allele_table(path: &Path) -> Result<AlleleTable, InputError> {
    let table = read_delimited(path, '\t')?;

    let mut seen = BTreeSet::new();
    for (idx, donor) in table.header.iter().enumerate() {
        if donor.is_empty() {
            return Err(InputError::parse(
                path,
                1,
                format!("donor column {} has an empty name", idx + 1),
            ));
        }
        if !seen.insert(donor.as_str()) {
            return Err(InputError::InvalidInput(format!(
                "{}: duplicate donor column '{}'",
                path.display(),
                donor
            )));
        }
    }

    let mut columns = vec![Vec::with_capacity(table.rows.len()); table.header.len()];
    for row in &table.rows {
        for (idx, column) in columns.iter_mut().enumerate() {
            column.push(row.field(idx).to_string());
        }
    }

    tracing::debug!(
        "read allele table {}: {} donors, {} rows",
        path.display(),
        table.header.len(),
        table.rows.len()
    );

    Ok(AlleleTable {
        path: path.to_path_buf(),
        donors: table.header,
        columns,
    })
}

pub fn write_allele_table(
    path: &Path,
    donors: &[String],
    columns: &[Vec<String>],
) -> std::io::Result<()> {
    use std::io::{BufWriter, Write};

    let mut w = BufWriter::new(std::fs::File::create(path)?);
    writeln!(w, "{}", donors.join("\t"))?;
    let depth = columns.iter().map(Vec::len).max().unwrap_or(0);
    for i in 0..depth {
        let line = columns
            .iter()
            .map(|c| c.get(i).map(String::as_str).unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\t");
        writeln!(w, "{}", line)?;
    }
    w.flush()
}
