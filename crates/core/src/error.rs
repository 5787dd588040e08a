use thiserror::Error;

#[derive(Error, Debug)]
pub enum MendelError {
    #[error("Pedigree error: {0}")]
    Pedigree(String),

    #[error("Genotype '{genotype}' is not in the reverse table of model {model}")]
    ModelMismatch {
        genotype: String,
        model: &'static str,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, MendelError>;
