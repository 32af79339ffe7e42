use crate::api::ApiError;
use crate::schema::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("form validation failed: {0}")]
    Validation(ValidationErrors),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Text(#[from] carebook_types::TextError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
