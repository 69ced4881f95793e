pub type AtlasResult<T> = Result<T, AtlasError>;

#[derive(thiserror::Error, Debug)]
pub enum AtlasError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("repair error: {0}")]
    Repair(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AtlasError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn repair(msg: impl Into<String>) -> Self {
        Self::Repair(msg.into())
    }
}
