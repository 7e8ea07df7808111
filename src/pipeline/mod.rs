use thiserror::Error;

pub mod stage2_binarize;
pub mod stage3_contingency;
pub mod stage4_stats;
pub mod stage5_grouping;
pub mod stage6_report;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{what} '{value}' contains reserved separator '{separator}'")]
    ReservedSeparator {
        what: &'static str,
        value: String,
        separator: char,
    },
    #[error("non-numeric response '{value}' for peptide {peptide}, donor {donor}")]
    NonNumericResponse {
        peptide: String,
        donor: String,
        value: String,
    },
    #[error("group member '{0}' is not an allele row")]
    UnknownMember(String),
    #[error("peptide {peptide} (response cutoff {cutoff}): {source}")]
    InPeptide {
        peptide: String,
        cutoff: String,
        #[source]
        source: Box<EngineError>,
    },
}
