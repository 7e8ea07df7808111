use serde::Serialize;

use crate::pipeline::stage5_grouping::SearchOutcome;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub version: String,
    pub inputs: InputSummary,
    pub donors: DonorSummary,
    pub n_alleles: usize,
    pub n_peptides: usize,
    pub rank_cutoff: Option<f64>,
    pub cutoffs: Vec<CutoffSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputSummary {
    pub allele_file: String,
    pub response_file: String,
    pub prediction_file: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DonorSummary {
    pub typed: usize,
    pub with_responses: usize,
    pub shared: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CutoffSummary {
    pub response_cutoff: f64,
    pub label: String,
    pub peptides: usize,
    pub peptides_with_results: usize,
    pub accepted_groups: usize,
    pub rows: usize,
    pub best_hits: Vec<BestHit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BestHit {
    pub peptide: String,
    pub peptide_id: String,
    pub hla: String,
    /// Empty unless the best hit is an allele group.
    pub members: Vec<String>,
    pub fisher_pval: f64,
    /// Best p-value after the baseline and after each accepted group.
    pub trajectory: Vec<f64>,
    pub termination: &'static str,
}

pub fn summarize_cutoff(cutoff: f64, label: &str, outcomes: &[SearchOutcome]) -> CutoffSummary {
    let best_hits = outcomes
        .iter()
        .filter_map(|o| {
            o.best().map(|best| BestHit {
                peptide: o.peptide.sequence.clone(),
                peptide_id: o.peptide.id.clone(),
                hla: best.hla().to_string(),
                members: best.hla().members().to_vec(),
                fisher_pval: best.fisher_p,
                trajectory: o.trajectory.clone(),
                termination: o.termination.label(),
            })
        })
        .collect::<Vec<_>>();

    CutoffSummary {
        response_cutoff: cutoff,
        label: label.to_string(),
        peptides: outcomes.len(),
        peptides_with_results: best_hits.len(),
        accepted_groups: outcomes.iter().map(|o| o.groups.len()).sum(),
        rows: outcomes.iter().map(|o| o.results.len()).sum(),
        best_hits,
    }
}

pub fn render_run_summary(summary: &RunSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}
