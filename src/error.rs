use thiserror::Error;

pub type AccrualResult<T> = Result<T, AccrualError>;

#[derive(Error, Debug)]
pub enum AccrualError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The tabular source could not supply a sheet or cell. Fatal for the
    /// document named here, never for the rest of a batch.
    #[error("Grid access failed for '{document}': {message}")]
    GridAccess { document: String, message: String },

    #[error("Import error: {0}")]
    Import(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl AccrualError {
    pub fn grid_access(document: impl Into<String>, message: impl Into<String>) -> Self {
        AccrualError::GridAccess {
            document: document.into(),
            message: message.into(),
        }
    }
}

/// Why a row or cell contributed nothing.
///
/// These never leave the engine as errors: the aggregation loop records them
/// in the [`Trace`](crate::types::Trace) and moves on to the next row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("empty period cell")]
    EmptyPeriod,

    #[error("terminator keyword '{0}'")]
    Terminator(String),

    #[error("unparseable text '{0}'")]
    Unparseable(String),

    #[error("period {label} is outside {month:02}/{year}")]
    OutOfPeriod { label: String, month: u32, year: i32 },

    #[error("non-positive value {0}")]
    NonPositiveValue(f64),

    #[error("no rate in force for {0}")]
    NoApplicableRate(String),
}
