use std::collections::BTreeSet;

use crate::input::{AlleleTable, ResponseTable};
use crate::model::ids::{HlaId, locus_of};
use crate::model::matrix::{AlleleMatrix, AlleleRow, Cell, Peptide, ResponseMatrix, ResponseRow};
use crate::model::params::EngineParams;
use crate::pipeline::EngineError;

/// Strips the vendor prefix and maps null tokens to `None`.
pub fn normalize_allele_cell(raw: &str, params: &EngineParams) -> Option<String> {
    let trimmed = raw.trim();
    if params.is_null_token(trimmed) {
        return None;
    }
    let code = trimmed.replace(params.vendor_prefix, "");
    if params.is_null_token(&code) {
        return None;
    }
    Some(code)
}

pub fn build_allele_matrix(
    table: &AlleleTable,
    params: &EngineParams,
) -> Result<AlleleMatrix, EngineError> {
    let mut donors = Vec::with_capacity(table.donors.len());
    let mut typed: Vec<BTreeSet<String>> = Vec::with_capacity(table.donors.len());
    let mut all_codes = BTreeSet::new();

    for (donor, column) in table.donors.iter().zip(&table.columns) {
        let mut alleles = BTreeSet::new();
        for raw in column {
            let Some(code) = normalize_allele_cell(raw, params) else {
                continue;
            };
            check_separators(
                "allele",
                &code,
                &[params.group_separator, params.key_separator],
            )?;
            alleles.insert(code);
        }
        if alleles.is_empty() {
            tracing::warn!("donor {} has no typed alleles; dropping", donor);
            continue;
        }
        all_codes.extend(alleles.iter().cloned());
        donors.push(donor.clone());
        typed.push(alleles);
    }

    let mut rows: Vec<AlleleRow> = all_codes
        .into_iter()
        .map(|code| {
            let cells = typed
                .iter()
                .map(|set| Some(u8::from(set.contains(&code))))
                .collect();
            AlleleRow {
                id: HlaId::allele(code),
                cells,
            }
        })
        .collect();

    for (d, alleles) in typed.iter().enumerate() {
        let loci: BTreeSet<&str> = alleles.iter().map(|a| locus_of(a)).collect();
        for &locus in params.required_loci {
            if loci.contains(locus) {
                continue;
            }
            tracing::debug!("donor {} not typed at locus {}", donors[d], locus);
            for row in rows.iter_mut() {
                if locus_of(row.id.as_str()) == locus {
                    row.cells[d] = None;
                }
            }
        }
    }

    Ok(AlleleMatrix { donors, rows })
}

/// Present raw magnitudes below `cutoff` count as no response; otherwise any non-zero value is a
/// response.
pub fn binarize_response(value: f64, cutoff: f64) -> u8 {
    if value < cutoff {
        0
    } else {
        u8::from(value != 0.0)
    }
}

pub fn build_response_matrix(
    table: &ResponseTable,
    cutoff: f64,
    params: &EngineParams,
) -> Result<ResponseMatrix, EngineError> {
    let mut rows = Vec::with_capacity(table.rows.len());
    for record in &table.rows {
        check_separators("peptide", &record.sequence, &[params.key_separator])?;
        let mut cells = Vec::with_capacity(table.donors.len());
        for (donor, raw) in table.donors.iter().zip(&record.values) {
            cells.push(parse_response_cell(raw, cutoff, params).ok_or_else(|| {
                EngineError::NonNumericResponse {
                    peptide: record.sequence.clone(),
                    donor: donor.clone(),
                    value: raw.clone(),
                }
            })?);
        }
        rows.push(ResponseRow {
            peptide: Peptide {
                number: record.number,
                id: record.id.clone(),
                sequence: record.sequence.clone(),
            },
            cells,
        });
    }

    Ok(ResponseMatrix {
        donors: table.donors.clone(),
        cutoff,
        rows,
    })
}

/// `None` for a malformed cell, `Some(None)` for a missing one.
fn parse_response_cell(raw: &str, cutoff: f64, params: &EngineParams) -> Option<Cell> {
    let trimmed = raw.trim();
    if params.is_null_token(trimmed) {
        return Some(None);
    }
    let value = trimmed.parse::<f64>().ok()?;
    if value.is_nan() {
        return Some(None);
    }
    if value.is_infinite() {
        return None;
    }
    Some(Some(binarize_response(value, cutoff)))
}

/// Combined donor call for a group: missing if any member is missing, else logical OR.
pub fn synthesize_group_row(
    matrix: &AlleleMatrix,
    members: &[String],
    group_name: &str,
) -> Result<AlleleRow, EngineError> {
    let member_rows = members
        .iter()
        .map(|m| match matrix.row(m) {
            Some(row) if !row.id.is_group() => Ok(row),
            _ => Err(EngineError::UnknownMember(m.clone())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let cells = (0..matrix.n_donors())
        .map(|d| {
            let mut any = 0u8;
            for row in &member_rows {
                match row.cells[d] {
                    None => return None,
                    Some(v) if v >= 1 => any = 1,
                    Some(_) => {}
                }
            }
            Some(any)
        })
        .collect();

    Ok(AlleleRow {
        id: HlaId::Group {
            name: group_name.to_string(),
            members: members.to_vec(),
        },
        cells,
    })
}

fn check_separators(
    what: &'static str,
    value: &str,
    separators: &[char],
) -> Result<(), EngineError> {
    for &separator in separators {
        if value.contains(separator) {
            return Err(EngineError::ReservedSeparator {
                what,
                value: value.to_string(),
                separator,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_binarize.rs"]
mod tests;
