mod combine;
mod input;
mod logging;
mod model;
mod pipeline;
mod report;

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, error, info, warn};

use crate::combine::combine_table;
use crate::input::alleles::write_allele_table;
use crate::input::{
    PredictionTable, ResponseTable, read_allele_table, read_prediction_table, read_response_table,
};
use crate::model::binders::BinderList;
use crate::model::params::EngineParams;
use crate::pipeline::stage2_binarize::{build_allele_matrix, build_response_matrix};
use crate::pipeline::stage3_contingency::DonorAlignment;
use crate::pipeline::stage5_grouping::search_all_peptides;
use crate::pipeline::stage6_report::{CutoffReport, write_cutoff_reports, write_run_summary};
use crate::report::json::{DonorSummary, InputSummary, RunSummary, summarize_cutoff};
use crate::report::{cutoff_stem, format_cutoff, peptide_number_width};

#[derive(Debug, Parser)]
#[command(
    name = "hla-comborate",
    version,
    about = "Iteratively group HLA alleles to lower the RATE association p-value"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log filter when RUST_LOG is unset (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run RATE statistics and allele grouping for every peptide and response cutoff.
    Run(RunArgs),
    /// Pair alpha/beta chains of a donor allele file.
    Combine(CombineArgs),
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Donor allele file (TSV, one column per donor).
    #[arg(short = 'a', long = "allele-file")]
    allele_file: PathBuf,

    /// Peptide response file (TSV).
    #[arg(short = 'r', long = "response-file")]
    response_file: PathBuf,

    /// Output directory.
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// HLA binding prediction file (CSV with allele, peptide and rank columns).
    #[arg(short = 'p', long = "prediction")]
    prediction: Option<PathBuf>,

    /// Binding rank cutoff for predicted binders.
    #[arg(short = 'c', long = "rank-cutoff", default_value_t = 25.0)]
    rank_cutoff: f64,

    /// Comma-separated response cutoffs.
    #[arg(
        short = 'k',
        long = "response-cutoff",
        default_value = "1",
        value_parser = parse_cutoff_list
    )]
    response_cutoffs: CutoffList,

    /// Maximum grouping iterations per peptide (default: number of alleles).
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Worker threads for the per-peptide searches.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Debug, Clone, Args)]
struct CombineArgs {
    /// Donor allele file (TSV, one column per donor).
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output TSV with alpha/beta pairs.
    #[arg(short = 'o', long = "output")]
    output: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
struct CutoffList(Vec<f64>);

fn parse_cutoff_list(value: &str) -> Result<CutoffList, String> {
    let mut cutoffs: Vec<f64> = Vec::new();
    for part in value.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let cutoff = part
            .parse::<f64>()
            .ok()
            .filter(|c| c.is_finite())
            .ok_or_else(|| format!("invalid response cutoff '{}'", part))?;
        if !cutoffs.contains(&cutoff) {
            cutoffs.push(cutoff);
        }
    }
    if cutoffs.is_empty() {
        return Err("no response cutoff given".to_string());
    }
    Ok(CutoffList(cutoffs))
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level);
    let result = match &cli.command {
        Command::Run(args) => run_rate(args),
        Command::Combine(args) => run_combine(args),
    };
    if let Err(err) = result {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run_rate(args: &RunArgs) -> Result<(), String> {
    let mut params = EngineParams::default_v1();
    params.max_iterations = args.max_iterations;

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| e.to_string())?;
    }

    let allele_table = read_allele_table(&args.allele_file).map_err(|e| e.to_string())?;
    let response_table = read_response_table(&args.response_file, params.donor_column_marker)
        .map_err(|e| e.to_string())?;
    let predictions = args
        .prediction
        .as_deref()
        .map(read_prediction_table)
        .transpose()
        .map_err(|e| e.to_string())?;

    info!(
        "{}: {} donors; {}: {} peptides",
        allele_table.path.display(),
        allele_table.donors.len(),
        response_table.path.display(),
        response_table.rows.len()
    );
    if let Some(predictions) = &predictions {
        info!(
            "{}: {} prediction rows",
            predictions.path.display(),
            predictions.rows.len()
        );
    }

    let alleles = build_allele_matrix(&allele_table, &params).map_err(|e| e.to_string())?;
    let alignment = DonorAlignment::new(&alleles.donors, &response_table.donors);
    log_alignment(&alignment);
    info!(
        "{} alleles over {} typed donors; {} shared donors",
        alleles.n_rows(),
        alleles.n_donors(),
        alignment.n_shared()
    );

    let binders = binder_lists(
        &response_table,
        predictions.as_ref(),
        args.rank_cutoff,
        &params,
    );

    fs::create_dir_all(&args.output).map_err(|e| e.to_string())?;
    let peptide_width = peptide_number_width(response_table.max_peptide_number());

    for (first, later) in shared_summary_stems(&args.response_cutoffs.0) {
        warn!(
            "response cutoffs {} and {} both write summary_reads_cutoff{}.csv; the {} summary replaces the {} one",
            first,
            later,
            cutoff_stem(&first),
            later,
            first
        );
    }

    let mut cutoffs = Vec::with_capacity(args.response_cutoffs.0.len());
    for &cutoff in &args.response_cutoffs.0 {
        let label = format_cutoff(cutoff);
        let responses =
            build_response_matrix(&response_table, cutoff, &params).map_err(|e| e.to_string())?;
        debug!(
            "response cutoff {}: {} peptides over {} donors",
            responses.cutoff,
            responses.rows.len(),
            responses.n_donors()
        );
        let outcomes =
            search_all_peptides(&alleles, &responses, &alignment, &binders, &params, &label)
                .map_err(|e| e.to_string())?;

        write_cutoff_reports(
            &args.output,
            &CutoffReport {
                label: &label,
                outcomes: &outcomes,
                predictions: predictions.as_ref(),
                peptide_width,
            },
        )
        .map_err(|e| e.to_string())?;

        let summary = summarize_cutoff(cutoff, &label, &outcomes);
        info!(
            "response cutoff {}: {}/{} peptides with results, {} accepted groups",
            label, summary.peptides_with_results, summary.peptides, summary.accepted_groups
        );
        cutoffs.push(summary);
    }

    let summary = RunSummary {
        tool: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        inputs: InputSummary {
            allele_file: args.allele_file.display().to_string(),
            response_file: args.response_file.display().to_string(),
            prediction_file: args.prediction.as_ref().map(|p| p.display().to_string()),
        },
        donors: DonorSummary {
            typed: alleles.n_donors(),
            with_responses: response_table.donors.len(),
            shared: alignment.n_shared(),
        },
        n_alleles: alleles.n_rows(),
        n_peptides: response_table.rows.len(),
        rank_cutoff: predictions.as_ref().map(|_| args.rank_cutoff),
        cutoffs,
    };
    let path = write_run_summary(&args.output, &summary).map_err(|e| e.to_string())?;
    info!("wrote {}", path.display());

    Ok(())
}

fn run_combine(args: &CombineArgs) -> Result<(), String> {
    let params = EngineParams::default_v1();
    let table = read_allele_table(&args.input).map_err(|e| e.to_string())?;
    let listing = combine_table(&table, &params);
    write_allele_table(&args.output, &listing.donors, &listing.columns)
        .map_err(|e| e.to_string())?;
    info!(
        "combined chains for {} donors into {}",
        listing.donors.len(),
        args.output.display()
    );
    Ok(())
}

fn binder_lists(
    responses: &ResponseTable,
    predictions: Option<&PredictionTable>,
    rank_cutoff: f64,
    params: &EngineParams,
) -> BTreeMap<String, BinderList> {
    let Some(predictions) = predictions else {
        return BTreeMap::new();
    };
    responses
        .rows
        .iter()
        .map(|r| {
            let binders = predictions.binders_for(&r.sequence, rank_cutoff, params.vendor_prefix);
            if binders.is_active() {
                debug!("peptide {}: {} predicted binders", r.sequence, binders.len());
            } else {
                warn!(
                    "peptide {}: no predicted binders at rank <= {}; not filtering",
                    r.sequence, rank_cutoff
                );
            }
            (r.sequence.clone(), binders)
        })
        .collect()
}

/// Pairs of cutoff labels whose summary files share a name, first label first.
fn shared_summary_stems(cutoffs: &[f64]) -> Vec<(String, String)> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    let mut shared = Vec::new();
    for &cutoff in cutoffs {
        let label = format_cutoff(cutoff);
        match seen.get(cutoff_stem(&label)) {
            Some(first) => shared.push((first.clone(), label)),
            None => {
                seen.insert(cutoff_stem(&label).to_string(), label);
            }
        }
    }
    shared
}

fn log_alignment(alignment: &DonorAlignment) {
    if !alignment.allele_only.is_empty() {
        warn!(
            "{} typed donors have no response data: {}",
            alignment.allele_only.len(),
            alignment.allele_only.join(", ")
        );
    }
    if !alignment.response_only.is_empty() {
        warn!(
            "{} response donors have no typing data: {}",
            alignment.response_only.len(),
            alignment.response_only.join(", ")
        );
    }
    if alignment.n_shared() == 0 {
        warn!("no donor is shared between the allele and response files");
    }
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
