use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not supported: {0}")]
    NotSupported(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
