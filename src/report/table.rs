use crate::model::stats::StatResult;
use crate::report::{format_f64, format_metric};

pub const RATE_COLUMNS: [&str; 11] = [
    "HLA",
    "Peptide",
    "A+R+",
    "A-R+",
    "A+R-",
    "A-R-",
    "N_donors",
    "Relative_freq",
    "Odds_ratio",
    "Fisher_pval",
    "Response_cutoff",
];

pub fn rate_header() -> String {
    RATE_COLUMNS.join(",")
}

pub fn render_rate_row(result: &StatResult, cutoff_label: &str) -> String {
    let q = &result.row.counts;
    [
        csv_field(result.hla().as_str()),
        csv_field(result.peptide()),
        q.ap_rp.to_string(),
        q.an_rp.to_string(),
        q.ap_rn.to_string(),
        q.an_rn.to_string(),
        result.n_donors.to_string(),
        format_metric(result.relative_freq),
        format_metric(result.odds_ratio),
        format_f64(result.fisher_p),
        cutoff_label.to_string(),
    ]
    .join(",")
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
