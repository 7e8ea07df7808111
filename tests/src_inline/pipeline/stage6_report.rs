use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::input::predictions::PredictionRecord;
use crate::model::ids::HlaId;
use crate::model::matrix::Peptide;
use crate::model::stats::{ContingencyRow, Metric, Quadrants};
use crate::pipeline::stage5_grouping::Termination;
use crate::report::json::summarize_cutoff;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("hla_comborate_report_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn result(hla: &str, peptide: &str, p: f64) -> StatResult {
    StatResult {
        row: ContingencyRow {
            hla: HlaId::allele(hla),
            peptide: peptide.to_string(),
            counts: Quadrants {
                ap_rp: 3,
                an_rp: 1,
                ap_rn: 1,
                an_rn: 3,
            },
        },
        n_donors: 8,
        relative_freq: Metric::Value(1.5),
        odds_ratio: Metric::Undefined,
        fisher_p: p,
    }
}

fn outcome(number: u64, sequence: &str, results: Vec<StatResult>) -> SearchOutcome {
    SearchOutcome {
        peptide: Peptide {
            number,
            id: format!("p{}", number),
            sequence: sequence.to_string(),
        },
        results,
        groups: Vec::new(),
        trajectory: Vec::new(),
        termination: Termination::TooFewCandidates { iteration: 1 },
    }
}

fn predictions() -> PredictionTable {
    PredictionTable {
        path: PathBuf::new(),
        header_line: "allele,peptide,rank".to_string(),
        rows: vec![PredictionRecord {
            allele: "HLA-DRB1*01:01".to_string(),
            peptide: "PEPB".to_string(),
            rank: 2.0,
            raw: "HLA-DRB1*01:01,PEPB,2.0".to_string(),
        }],
    }
}

#[test]
fn test_write_cutoff_reports_layout() {
    let out = make_temp_dir();
    let outcomes = vec![
        outcome(
            7,
            "PEPB",
            vec![result("A", "PEPB", 0.01), result("B", "PEPB", 0.2)],
        ),
        outcome(12, "PEPA", vec![result("C", "PEPA", 0.5)]),
        outcome(3, "PEPC", Vec::new()),
    ];
    let preds = predictions();
    let report = CutoffReport {
        label: "1.0",
        outcomes: &outcomes,
        predictions: Some(&preds),
        peptide_width: 2,
    };

    let dir = write_cutoff_reports(&out, &report).unwrap();
    assert_eq!(dir, out.join("reads_cutoff_1.0"));

    let rate = fs::read_to_string(dir.join("07_rate.csv")).unwrap();
    let lines: Vec<&str> = rate.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "HLA,Peptide,A+R+,A-R+,A+R-,A-R-,N_donors,Relative_freq,Odds_ratio,Fisher_pval,Response_cutoff"
    );
    assert_eq!(lines[1], "A,PEPB,3,1,1,3,8,1.5,NA,0.01,1.0");

    let empty = fs::read_to_string(dir.join("03_rate.csv")).unwrap();
    assert_eq!(empty.lines().count(), 1);

    let pred = fs::read_to_string(dir.join("07_pred.csv")).unwrap();
    assert_eq!(pred, "allele,peptide,rank\nHLA-DRB1*01:01,PEPB,2.0\n");
    assert!(!dir.join("12_pred.csv").exists());

    let summary = fs::read_to_string(out.join("summary_reads_cutoff1.csv")).unwrap();
    let rows: Vec<&str> = summary.lines().skip(1).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].starts_with("C,PEPA,"));
    assert!(rows[1].starts_with("A,PEPB,"));
    assert!(rows[2].starts_with("B,PEPB,"));
}

#[test]
fn test_cutoff_paths() {
    let out = PathBuf::from("/tmp/out");
    assert_eq!(
        cutoff_dir(&out, "20.5"),
        PathBuf::from("/tmp/out/reads_cutoff_20.5")
    );
    assert_eq!(
        summary_path(&out, "20.5"),
        PathBuf::from("/tmp/out/summary_reads_cutoff20.csv")
    );
}

#[test]
fn test_write_run_summary() {
    let out = make_temp_dir();
    let outcomes = vec![
        outcome(1, "PEPA", vec![result("C", "PEPA", 0.5)]),
        outcome(2, "PEPB", Vec::new()),
    ];
    let cutoff = summarize_cutoff(1.0, "1.0", &outcomes);
    assert_eq!(cutoff.peptides, 2);
    assert_eq!(cutoff.peptides_with_results, 1);
    assert_eq!(cutoff.rows, 1);

    let summary = RunSummary {
        tool: "hla-comborate".to_string(),
        version: "0.1.0".to_string(),
        inputs: crate::report::json::InputSummary {
            allele_file: "alleles.tsv".to_string(),
            response_file: "responses.tsv".to_string(),
            prediction_file: None,
        },
        donors: crate::report::json::DonorSummary {
            typed: 4,
            with_responses: 4,
            shared: 4,
        },
        n_alleles: 3,
        n_peptides: 2,
        rank_cutoff: None,
        cutoffs: vec![cutoff],
    };
    let path = write_run_summary(&out, &summary).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(value["tool"], "hla-comborate");
    assert_eq!(value["cutoffs"][0]["label"], "1.0");
    assert_eq!(value["cutoffs"][0]["best_hits"][0]["hla"], "C");
    assert_eq!(
        value["cutoffs"][0]["best_hits"][0]["termination"],
        "too_few_candidates"
    );
    assert!(value["inputs"]["prediction_file"].is_null());
}
