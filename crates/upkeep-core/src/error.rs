use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Data access error: {0}")]
    Store(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    #[error("SQL script not found: {0}")]
    ScriptNotFound(String),

    #[error("SQL script error: {0}")]
    Script(String),

    #[error("Statement {index}/{total} failed: {message}")]
    StatementFailed {
        index: usize,
        total: usize,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
