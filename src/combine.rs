use crate::input::AlleleTable;
use crate::model::ids::locus_of;
use crate::model::params::EngineParams;
use crate::pipeline::stage2_binarize::normalize_allele_cell;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedListing {
    pub donors: Vec<String>,
    pub columns: Vec<Vec<String>>,
}

fn chain_of(code: &str) -> Option<char> {
    code.chars().nth(2)
}

/// Pairs alpha and beta chains of one donor's class II alleles.
///
/// Within a locus, every alpha (third character `A`) is paired with every beta (`B`) as
/// `alpha/beta`; loci lacking either chain keep their alleles unchanged. Duplicates keep their
/// first position.
pub fn combine_donor(alleles: &[String]) -> Vec<String> {
    let mut loci: Vec<(&str, Vec<&String>)> = Vec::new();
    for allele in alleles {
        let locus = locus_of(allele);
        match loci.iter_mut().find(|(l, _)| *l == locus) {
            Some((_, items)) => items.push(allele),
            None => loci.push((locus, vec![allele])),
        }
    }

    let mut combined: Vec<String> = Vec::new();
    for (_, items) in loci {
        let alpha: Vec<&String> = items
            .iter()
            .copied()
            .filter(|a| chain_of(a) == Some('A'))
            .collect();
        let beta: Vec<&String> = items
            .iter()
            .copied()
            .filter(|a| chain_of(a) == Some('B'))
            .collect();
        if !alpha.is_empty() && !beta.is_empty() {
            for a in &alpha {
                for b in &beta {
                    combined.push(format!("{}/{}", a, b));
                }
            }
        } else {
            combined.extend(items.into_iter().cloned());
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(combined.len());
    for item in combined {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Chain-paired listing for every donor; donors without any typed allele are dropped.
pub fn combine_table(table: &AlleleTable, params: &EngineParams) -> CombinedListing {
    let mut donors = Vec::new();
    let mut columns = Vec::new();
    for (donor, column) in table.donors.iter().zip(&table.columns) {
        let alleles: Vec<String> = column
            .iter()
            .filter_map(|raw| normalize_allele_cell(raw, params))
            .collect();
        if alleles.is_empty() {
            tracing::debug!("donor {} has no typed alleles; dropping", donor);
            continue;
        }
        donors.push(donor.clone());
        columns.push(combine_donor(&alleles));
    }
    CombinedListing { donors, columns }
}

#[cfg(test)]
#[path = "../tests/src_inline/combine.rs"]
mod tests;
