use std::path::PathBuf;

use hf_sim::SimError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read case file: {path}")]
    CaseRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse case file: {path}")]
    CaseParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to write results: {path}")]
    OutputWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode results: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Sim(#[from] SimError),
}

pub type CliResult<T> = Result<T, CliError>;
