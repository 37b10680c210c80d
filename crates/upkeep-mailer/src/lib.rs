pub mod attachment;
pub mod error;
pub mod smtp;

// Re-exports
pub use error::{Error, Result};
pub use smtp::SmtpMailer;
