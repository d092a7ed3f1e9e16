use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(
        "All series are too short for the backtest settings, at least {min_samples} \
         samples per series are required. Reduce `n_windows` or `h`."
    )]
    AllSeriesTooShort { min_samples: usize },

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, PrepError>;
