use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No recipients provided")]
    NoRecipients,

    #[error("Attachment not found: {0}")]
    AttachmentNotFound(String),

    #[error("Failed to attach '{path}': {source}")]
    Attachment {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<Error> for upkeep_core::Error {
    fn from(err: Error) -> Self {
        upkeep_core::Error::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
