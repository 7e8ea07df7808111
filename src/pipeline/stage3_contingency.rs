use std::collections::HashMap;

use crate::model::matrix::{AlleleRow, Cell, ResponseRow};
use crate::model::stats::{ContingencyRow, Quadrants};

/// Column pairs (allele-matrix index, response-matrix index) for donors present in both tables.
#[derive(Debug, Clone)]
pub struct DonorAlignment {
    pub pairs: Vec<(usize, usize)>,
    pub allele_only: Vec<String>,
    pub response_only: Vec<String>,
}

impl DonorAlignment {
    pub fn new(allele_donors: &[String], response_donors: &[String]) -> Self {
        let response_index: HashMap<&str, usize> = response_donors
            .iter()
            .enumerate()
            .map(|(i, d)| (d.as_str(), i))
            .collect();

        let mut pairs = Vec::new();
        let mut allele_only = Vec::new();
        for (a, donor) in allele_donors.iter().enumerate() {
            match response_index.get(donor.as_str()) {
                Some(&r) => pairs.push((a, r)),
                None => allele_only.push(donor.clone()),
            }
        }
        let response_only = response_donors
            .iter()
            .filter(|d| !allele_donors.contains(d))
            .cloned()
            .collect();

        Self {
            pairs,
            allele_only,
            response_only,
        }
    }

    pub fn n_shared(&self) -> usize {
        self.pairs.len()
    }
}

/// Counts the four quadrants over donors with data for both the allele and the response.
pub fn tally(allele: &[Cell], response: &[Cell], alignment: &DonorAlignment) -> Quadrants {
    let mut q = Quadrants::default();
    for &(a, r) in &alignment.pairs {
        let (Some(x), Some(y)) = (allele[a], response[r]) else {
            continue;
        };
        match (x >= 1, y >= 1) {
            (true, true) => q.ap_rp += 1,
            (false, true) => q.an_rp += 1,
            (true, false) => q.ap_rn += 1,
            (false, false) => q.an_rn += 1,
        }
    }
    q
}

/// One row per (allele-or-group, peptide) pair, allele-major.
pub fn compute_contingency<'a, I>(
    responses: &[ResponseRow],
    alleles: I,
    alignment: &DonorAlignment,
) -> Vec<ContingencyRow>
where
    I: IntoIterator<Item = &'a AlleleRow>,
{
    let mut out = Vec::new();
    for allele in alleles {
        for response in responses {
            out.push(ContingencyRow {
                hla: allele.id.clone(),
                peptide: response.peptide.sequence.clone(),
                counts: tally(&allele.cells, &response.cells, alignment),
            });
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_contingency.rs"]
mod tests;
