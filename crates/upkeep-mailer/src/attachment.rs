use crate::{Error, Result};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, SinglePart};
use std::path::Path;

const OCTET_STREAM: &str = "application/octet-stream";

/// Content type guessed from the file extension.
pub fn content_type_for(path: &Path) -> ContentType {
    let guessed = mime_guess::from_path(path).first_or_octet_stream();
    ContentType::parse(guessed.as_ref())
        .or_else(|_| ContentType::parse(OCTET_STREAM))
        .unwrap_or(ContentType::TEXT_PLAIN)
}

/// Read a file into a MIME attachment part.
pub async fn load(path: &Path) -> Result<SinglePart> {
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::AttachmentNotFound(path.display().to_string()));
        }
        Err(e) => {
            return Err(Error::Attachment {
                path: path.display().to_string(),
                source: e,
            });
        }
    };

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());

    Ok(Attachment::new(filename).body(data, content_type_for(path)))
}
