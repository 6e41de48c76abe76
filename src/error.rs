use thiserror::Error;

/// Errors raised at the edges of the controller.
///
/// The control pipeline itself is total over finite inputs and never fails;
/// these variants cover rejected operator input, bad configuration and
/// history export.
#[derive(Debug, Error)]
pub enum CoolingError {
    #[error("Manual input rejected: {0}")]
    InvalidInput(#[from] validator::ValidationErrors),

    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("History export failed: {0}")]
    Export(#[from] std::io::Error),
}

pub type CoolingResult<T> = Result<T, CoolingError>;
