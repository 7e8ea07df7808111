use std::collections::BTreeMap;
use std::fmt;
use std::slice;

use rayon::prelude::*;

use crate::model::binders::BinderList;
use crate::model::ids::group_name;
use crate::model::matrix::{AlleleMatrix, Peptide, ResponseMatrix, ResponseRow};
use crate::model::params::EngineParams;
use crate::model::stats::StatResult;
use crate::pipeline::EngineError;
use crate::pipeline::stage2_binarize::synthesize_group_row;
use crate::pipeline::stage3_contingency::{DonorAlignment, compute_contingency};
use crate::pipeline::stage4_stats::{apply_filters, compute_stats, min_pvalue, sort_by_pvalue};

/// Accepted result set after `iteration` grouping rounds. Never modified once built.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub iteration: usize,
    pub results: Vec<StatResult>,
    pub best_p: f64,
    pub last_members: Vec<String>,
    pub groups: Vec<String>,
    pub trajectory: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Termination {
    EmptyBaseline,
    NoImprovement { iteration: usize, candidate_p: f64 },
    GroupFiltered { iteration: usize },
    TooFewCandidates { iteration: usize },
    CandidatesExhausted { iteration: usize },
    IterationCap { cap: usize },
}

impl Termination {
    pub fn label(&self) -> &'static str {
        match self {
            Termination::EmptyBaseline => "empty_baseline",
            Termination::NoImprovement { .. } => "no_improvement",
            Termination::GroupFiltered { .. } => "group_filtered",
            Termination::TooFewCandidates { .. } => "too_few_candidates",
            Termination::CandidatesExhausted { .. } => "candidates_exhausted",
            Termination::IterationCap { .. } => "iteration_cap",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::EmptyBaseline => f.write_str("no informative allele"),
            Termination::NoImprovement {
                iteration,
                candidate_p,
            } => write!(f, "iteration {iteration} did not improve (p {candidate_p})"),
            Termination::GroupFiltered { iteration } => {
                write!(f, "iteration {iteration} group was filtered out")
            }
            Termination::TooFewCandidates { iteration } => {
                write!(f, "fewer than two candidates at iteration {iteration}")
            }
            Termination::CandidatesExhausted { iteration } => {
                write!(f, "no new candidate at iteration {iteration}")
            }
            Termination::IterationCap { cap } => write!(f, "iteration cap {cap} reached"),
        }
    }
}

#[derive(Debug)]
enum SearchState {
    Init,
    Iterate(Snapshot),
    Terminated(Snapshot, Termination),
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub peptide: Peptide,
    pub results: Vec<StatResult>,
    pub groups: Vec<String>,
    pub trajectory: Vec<f64>,
    pub termination: Termination,
}

impl SearchOutcome {
    pub fn best(&self) -> Option<&StatResult> {
        self.results.first()
    }
}

/// Greedy allele grouping for one peptide.
pub struct GroupSearch<'a> {
    alleles: &'a AlleleMatrix,
    response: &'a ResponseRow,
    alignment: &'a DonorAlignment,
    binders: BinderList,
    params: &'a EngineParams,
    cap: usize,
}

impl<'a> GroupSearch<'a> {
    pub fn new(
        alleles: &'a AlleleMatrix,
        response: &'a ResponseRow,
        alignment: &'a DonorAlignment,
        binders: BinderList,
        params: &'a EngineParams,
    ) -> Self {
        Self {
            alleles,
            response,
            alignment,
            binders,
            params,
            cap: params.iteration_cap(alleles.n_rows()),
        }
    }

    pub fn run(mut self) -> Result<SearchOutcome, EngineError> {
        let mut state = SearchState::Init;
        let (snapshot, termination) = loop {
            state = match state {
                SearchState::Init => self.init(),
                SearchState::Iterate(snapshot) => self.step(snapshot)?,
                SearchState::Terminated(snapshot, termination) => break (snapshot, termination),
            };
        };

        tracing::debug!(
            "peptide {}: {} after {} accepted groups",
            self.response.peptide.sequence,
            termination,
            snapshot.groups.len()
        );

        Ok(SearchOutcome {
            peptide: self.response.peptide.clone(),
            results: snapshot.results,
            groups: snapshot.groups,
            trajectory: snapshot.trajectory,
            termination,
        })
    }

    fn init(&self) -> SearchState {
        let rows = compute_contingency(
            slice::from_ref(self.response),
            &self.alleles.rows,
            self.alignment,
        );
        let results = apply_filters(
            compute_stats(rows, self.params.fisher_rel_tolerance),
            &self.binders,
        );
        match min_pvalue(&results) {
            Some(best_p) => SearchState::Iterate(Snapshot {
                iteration: 0,
                results,
                best_p,
                last_members: Vec::new(),
                groups: Vec::new(),
                trajectory: vec![best_p],
            }),
            None => SearchState::Terminated(
                Snapshot {
                    iteration: 0,
                    results,
                    best_p: 1.0,
                    last_members: Vec::new(),
                    groups: Vec::new(),
                    trajectory: Vec::new(),
                },
                Termination::EmptyBaseline,
            ),
        }
    }

    fn step(&mut self, snapshot: Snapshot) -> Result<SearchState, EngineError> {
        let iteration = snapshot.iteration + 1;
        if iteration > self.cap {
            tracing::warn!(
                "peptide {}: grouping stopped at iteration cap {}",
                self.response.peptide.sequence,
                self.cap
            );
            let termination = Termination::IterationCap { cap: self.cap };
            return Ok(SearchState::Terminated(snapshot, termination));
        }

        let members = select_members(&snapshot.results, 1 + iteration);
        if members.len() < 2 {
            let termination = Termination::TooFewCandidates { iteration };
            return Ok(SearchState::Terminated(snapshot, termination));
        }
        if members == snapshot.last_members {
            let termination = Termination::CandidatesExhausted { iteration };
            return Ok(SearchState::Terminated(snapshot, termination));
        }

        let name = group_name(iteration, &members, self.params.group_separator);
        let group_row = synthesize_group_row(self.alleles, &members, &name)?;
        if self.binders.is_active() {
            self.binders.insert(name.clone());
        }

        let rows = compute_contingency(
            slice::from_ref(self.response),
            slice::from_ref(&group_row),
            self.alignment,
        );
        for row in &rows {
            tracing::trace!("{} -> {:?}", row.key(self.params.key_separator), row.counts);
        }
        let results = apply_filters(
            compute_stats(rows, self.params.fisher_rel_tolerance),
            &self.binders,
        );

        let Some(candidate_p) = min_pvalue(&results) else {
            let termination = Termination::GroupFiltered { iteration };
            return Ok(SearchState::Terminated(snapshot, termination));
        };
        if candidate_p >= snapshot.best_p {
            let termination = Termination::NoImprovement {
                iteration,
                candidate_p,
            };
            return Ok(SearchState::Terminated(snapshot, termination));
        }

        tracing::debug!(
            "peptide {}: accepted {} (p {} < {})",
            self.response.peptide.sequence,
            name,
            candidate_p,
            snapshot.best_p
        );

        let mut accepted = snapshot.results.clone();
        accepted.extend(results);
        sort_by_pvalue(&mut accepted);
        let mut groups = snapshot.groups.clone();
        groups.push(name);
        let mut trajectory = snapshot.trajectory.clone();
        trajectory.push(candidate_p);

        Ok(SearchState::Iterate(Snapshot {
            iteration,
            results: accepted,
            best_p: candidate_p,
            last_members: members,
            groups,
            trajectory,
        }))
    }
}

/// The `amount` best raw alleles of a p-value sorted result set; groups never nest.
pub fn select_members(results: &[StatResult], amount: usize) -> Vec<String> {
    results
        .iter()
        .filter(|r| !r.hla().is_group())
        .take(amount)
        .map(|r| r.hla().as_str().to_string())
        .collect()
}

/// Runs the grouping search for every peptide of one response cutoff.
///
/// Peptides are independent and processed in parallel; outcomes keep the response-table order.
pub fn search_all_peptides(
    alleles: &AlleleMatrix,
    responses: &ResponseMatrix,
    alignment: &DonorAlignment,
    binders: &BTreeMap<String, BinderList>,
    params: &EngineParams,
    cutoff_label: &str,
) -> Result<Vec<SearchOutcome>, EngineError> {
    responses
        .rows
        .par_iter()
        .map(|response| {
            let peptide_binders = binders
                .get(&response.peptide.sequence)
                .cloned()
                .unwrap_or_default();
            GroupSearch::new(alleles, response, alignment, peptide_binders, params)
                .run()
                .map_err(|e| EngineError::InPeptide {
                    peptide: response.peptide.sequence.clone(),
                    cutoff: cutoff_label.to_string(),
                    source: Box::new(e),
                })
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_grouping.rs"]
mod tests;
