use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<Error> for upkeep_core::Error {
    fn from(err: Error) -> Self {
        upkeep_core::Error::Store(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
