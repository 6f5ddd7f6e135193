use thiserror::Error;

#[derive(Debug, Error)]
pub enum FigmantError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Storage(String),
}
