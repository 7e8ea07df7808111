use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::input::PredictionTable;
use crate::model::stats::StatResult;
use crate::pipeline::stage5_grouping::SearchOutcome;
use crate::report::json::{RunSummary, render_run_summary};
use crate::report::table::{rate_header, render_rate_row};
use crate::report::{cutoff_stem, format_peptide_number};

#[derive(Debug, Clone)]
pub struct CutoffReport<'a> {
    pub label: &'a str,
    pub outcomes: &'a [SearchOutcome],
    pub predictions: Option<&'a PredictionTable>,
    pub peptide_width: usize,
}

pub fn cutoff_dir(out_dir: &Path, label: &str) -> PathBuf {
    out_dir.join(format!("reads_cutoff_{}", label))
}

pub fn summary_path(out_dir: &Path, label: &str) -> PathBuf {
    out_dir.join(format!("summary_reads_cutoff{}.csv", cutoff_stem(label)))
}

/// Writes the per-peptide tables of one cutoff and its summary table; returns the cutoff
/// directory.
pub fn write_cutoff_reports(out_dir: &Path, report: &CutoffReport<'_>) -> std::io::Result<PathBuf> {
    let dir = cutoff_dir(out_dir, report.label);
    fs::create_dir_all(&dir)?;

    for outcome in report.outcomes {
        let stem = format_peptide_number(outcome.peptide.number, report.peptide_width);
        let rate_path = dir.join(format!("{}_rate.csv", stem));
        write_rate_table(&rate_path, outcome.results.iter(), report.label)?;

        if let Some(predictions) = report.predictions {
            let rows: Vec<&str> = predictions
                .rows_for(&outcome.peptide.sequence)
                .map(|r| r.raw.as_str())
                .collect();
            if !rows.is_empty() {
                let pred_path = dir.join(format!("{}_pred.csv", stem));
                write_lines(&pred_path, &predictions.header_line, &rows)?;
            }
        }
    }

    let mut combined: Vec<&StatResult> = report
        .outcomes
        .iter()
        .flat_map(|o| o.results.iter())
        .collect();
    combined.sort_by(|a, b| {
        a.peptide()
            .cmp(b.peptide())
            .then_with(|| a.fisher_p.total_cmp(&b.fisher_p))
    });
    write_rate_table(
        &summary_path(out_dir, report.label),
        combined.into_iter(),
        report.label,
    )?;

    tracing::info!(
        "wrote {} peptide tables to {}",
        report.outcomes.len(),
        dir.display()
    );
    Ok(dir)
}

pub fn write_rate_table<'a, I>(path: &Path, results: I, cutoff_label: &str) -> std::io::Result<()>
where
    I: Iterator<Item = &'a StatResult>,
{
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "{}", rate_header())?;
    for result in results {
        writeln!(w, "{}", render_rate_row(result, cutoff_label))?;
    }
    w.flush()
}

fn write_lines(path: &Path, header: &str, rows: &[&str]) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "{}", header)?;
    for row in rows {
        writeln!(w, "{}", row)?;
    }
    w.flush()
}

pub fn write_run_summary(out_dir: &Path, summary: &RunSummary) -> std::io::Result<PathBuf> {
    let path = out_dir.join("summary.json");
    let json = render_run_summary(summary)?;
    fs::write(&path, json)?;
    Ok(path)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_report.rs"]
mod tests;
