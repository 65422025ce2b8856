use super::request::{Role, Status};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("required field '{field}' is empty")]
    EmptyField { field: &'static str },
    #[error("amount '{input}' is not a positive number")]
    InvalidAmount { input: String },
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] sled::Error),
    #[error("failed to encode request collection: {0}")]
    Encode(String),
    #[error("document is not a valid request collection: {0}")]
    MalformedDocument(String),
}

#[derive(thiserror::Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("request {number} not found")]
    NotFound { number: String },
    #[error("request is '{current}', cannot move it to '{attempted}'")]
    InvalidTransition { current: Status, attempted: Status },
    #[error("role '{role}' is not allowed to perform this action")]
    RoleNotAllowed { role: Role },
    #[error("could not generate an unused request number")]
    NumberExhausted,
}
