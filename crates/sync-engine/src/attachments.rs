//! Outgoing attachments.

use std::path::Path;

use wa_bridge::OutgoingContent;

use crate::error::EngineError;
use crate::Result;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Whether a file is sent as an inline image rather than a document.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|i| e.eq_ignore_ascii_case(i)))
}

/// Read a file and build the message that carries it.
///
/// JPEG and PNG files become images. Anything else becomes a document named
/// after the file, with the MIME type guessed from its extension.
pub async fn outgoing_for(path: &Path) -> Result<OutgoingContent> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| EngineError::Attachment {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    if is_image(path) {
        return Ok(OutgoingContent::image(&bytes));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    let mimetype = mime_guess::from_path(path).first_or_octet_stream();

    Ok(OutgoingContent::document(&bytes, file_name, mimetype.essence_str()))
}
