use crate::dispatch::DispatchError;
use crate::repository::error::DatabaseError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("DatabaseError: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("DispatchError: {0}")]
    DispatchError(#[from] DispatchError),
}
