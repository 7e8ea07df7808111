pub mod json;
pub mod table;

use crate::model::stats::Metric;

pub const UNDEFINED: &str = "NA";

/// Shortest round-trip form, with a trailing `.0` on integral values and scientific notation for
/// very small or very large magnitudes.
pub fn format_f64(v: f64) -> String {
    if v.is_nan() {
        return UNDEFINED.to_string();
    }
    let abs = v.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        return format!("{:e}", v);
    }
    let s = format!("{}", v);
    if s.contains('.') || s.contains("inf") {
        s
    } else {
        format!("{}.0", s)
    }
}

pub fn format_metric(m: Metric) -> String {
    m.value().map_or_else(|| UNDEFINED.to_string(), format_f64)
}

/// Cutoff label used in directory names and the `Response_cutoff` column ("1.0", "20.5").
pub fn format_cutoff(cutoff: f64) -> String {
    format_f64(cutoff)
}

/// Integer part of a cutoff label ("1.0" -> "1").
pub fn cutoff_stem(label: &str) -> &str {
    label.split('.').next().unwrap_or(label)
}

pub fn peptide_number_width(max_number: u64) -> usize {
    max_number.to_string().len()
}

pub fn format_peptide_number(number: u64, width: usize) -> String {
    format!("{:0width$}", number, width = width)
}
