#[derive(Debug, Clone)]
pub struct EngineParams {
    pub null_tokens: &'static [&'static str],
    pub vendor_prefix: &'static str,
    pub required_loci: &'static [&'static str],
    pub donor_column_marker: &'static str,
    pub group_separator: char,
    pub key_separator: char,
    pub fisher_rel_tolerance: f64,
    pub max_iterations: Option<usize>,
}

impl EngineParams {
    pub fn default_v1() -> Self {
        Self {
            null_tokens: &["n/a", "N/A", "-", "NA", "na"],
            vendor_prefix: "HLA-",
            required_loci: &["DR", "DQ", "DP"],
            donor_column_marker: "Donor",
            group_separator: '+',
            key_separator: '_',
            fisher_rel_tolerance: 1e-7,
            max_iterations: None,
        }
    }

    pub fn is_null_token(&self, value: &str) -> bool {
        value.is_empty() || self.null_tokens.contains(&value)
    }

    /// Iteration cap for one grouping search over `n_alleles` candidate rows.
    pub fn iteration_cap(&self, n_alleles: usize) -> usize {
        self.max_iterations.unwrap_or(n_alleles)
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        Self::default_v1()
    }
}
