use statrs::distribution::{Discrete, Hypergeometric};

use crate::model::binders::BinderList;
use crate::model::stats::{ContingencyRow, Metric, Quadrants, StatResult};

/// Two-sided Fisher exact p-value for the table (A+R+, A-R+ / A+R-, A-R-).
///
/// Sums the hypergeometric probabilities of every table with the observed margins that is no
/// more likely than the observed one. `rel_tolerance` absorbs floating point noise when
/// comparing probabilities.
///
/// Works in log space: `binomial(N, k)` leaves the f64 range at roughly a thousand donors.
pub fn fisher_exact_two_sided(q: &Quadrants, rel_tolerance: f64) -> f64 {
    let row1 = u64::from(q.ap_rp + q.an_rp);
    let row2 = u64::from(q.ap_rn + q.an_rn);
    let col1 = u64::from(q.ap_rp + q.ap_rn);
    let col2 = u64::from(q.an_rp + q.an_rn);
    if row1 == 0 || row2 == 0 || col1 == 0 || col2 == 0 {
        return 1.0;
    }

    let Ok(dist) = Hypergeometric::new(row1 + row2, row1, col1) else {
        return 1.0;
    };
    let lo = col1.saturating_sub(row2);
    let hi = col1.min(row1);

    let ln_observed = dist.ln_pmf(u64::from(q.ap_rp));
    if !ln_observed.is_finite() {
        return 1.0;
    }
    let ln_threshold = ln_observed + rel_tolerance.ln_1p();

    // Terms relative to the observed table, summed smallest first so mirrored tables give
    // bit-identical p-values.
    let mut tail: Vec<f64> = (lo..=hi)
        .map(|x| dist.ln_pmf(x))
        .filter(|&lp| lp <= ln_threshold)
        .map(|lp| (lp - ln_observed).exp())
        .collect();
    tail.sort_by(f64::total_cmp);
    let scale: f64 = tail.iter().sum();
    (ln_observed + scale.ln()).exp().min(1.0)
}

pub fn odds_ratio(q: &Quadrants) -> Metric {
    let num = f64::from(q.ap_rp) * f64::from(q.an_rn);
    let denom = f64::from(q.an_rp) * f64::from(q.ap_rn);
    Metric::ratio(num, denom)
}

/// Response rate among allele carriers over the overall response rate.
pub fn relative_frequency(q: &Quadrants) -> Metric {
    let n = q.total();
    let carriers = q.ap_rp + q.ap_rn;
    let responders = q.ap_rp + q.an_rp;
    if n == 0 || carriers == 0 || responders == 0 {
        return Metric::Undefined;
    }
    let carrier_rate = f64::from(q.ap_rp) / f64::from(carriers);
    let overall_rate = f64::from(responders) / f64::from(n);
    Metric::ratio(carrier_rate, overall_rate)
}

pub fn evaluate(row: ContingencyRow, rel_tolerance: f64) -> StatResult {
    let q = row.counts;
    StatResult {
        n_donors: q.total(),
        relative_freq: relative_frequency(&q),
        odds_ratio: odds_ratio(&q),
        fisher_p: fisher_exact_two_sided(&q, rel_tolerance),
        row,
    }
}

/// Ascending p-value; ties by HLA id then peptide.
pub fn sort_by_pvalue(results: &mut [StatResult]) {
    results.sort_by(|a, b| {
        a.fisher_p
            .total_cmp(&b.fisher_p)
            .then_with(|| a.hla().as_str().cmp(b.hla().as_str()))
            .then_with(|| a.peptide().cmp(b.peptide()))
    });
}

pub fn compute_stats(rows: Vec<ContingencyRow>, rel_tolerance: f64) -> Vec<StatResult> {
    let mut results: Vec<StatResult> = rows
        .into_iter()
        .map(|row| evaluate(row, rel_tolerance))
        .collect();
    sort_by_pvalue(&mut results);
    results
}

/// Drops rows without a defined, positive relative frequency.
pub fn remove_non_positive_rf(results: Vec<StatResult>) -> Vec<StatResult> {
    results
        .into_iter()
        .filter(|r| r.relative_freq.is_positive())
        .collect()
}

pub fn retain_binders(results: Vec<StatResult>, binders: &BinderList) -> Vec<StatResult> {
    if !binders.is_active() {
        return results;
    }
    results
        .into_iter()
        .filter(|r| binders.contains(r.hla().as_str()))
        .collect()
}

pub fn apply_filters(results: Vec<StatResult>, binders: &BinderList) -> Vec<StatResult> {
    retain_binders(remove_non_positive_rf(results), binders)
}

pub fn min_pvalue(results: &[StatResult]) -> Option<f64> {
    results.iter().map(|r| r.fisher_p).min_by(f64::total_cmp)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_stats.rs"]
mod tests;
