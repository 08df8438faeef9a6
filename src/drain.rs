//! Response draining: find the first image in a response and write it out.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::error::GemimgError;
use crate::gemini::ResponseBody;
use crate::gemini::types::GenerateContentResponse;

/// An image written to disk.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutputArtifact {
    /// Where the bytes went
    pub path: PathBuf,
    /// MIME type reported by the model
    pub mime_type: String,
    /// Number of bytes written
    pub size: usize,
}

struct DecodedImage {
    mime_type: String,
    bytes: Vec<u8>,
}

/// Consumes `body` until the first image part and writes it to `destination`.
///
/// Text parts seen on the way are logged. Nothing is written when the
/// response ends without an image.
pub async fn drain_to_file(
    body: ResponseBody,
    destination: &Path,
) -> Result<OutputArtifact, GemimgError> {
    let mut finish_reason = None;

    let image = match body {
        ResponseBody::Composite(unit) => {
            finish_reason = unit.finish_reason().map(str::to_string);
            scan_unit(&unit)?
        }
        ResponseBody::Streamed(mut units) => {
            let mut found = None;
            while let Some(unit) = units.next().await {
                let unit = unit?;
                if let Some(reason) = unit.finish_reason() {
                    finish_reason = Some(reason.to_string());
                }
                if let Some(image) = scan_unit(&unit)? {
                    found = Some(image);
                    break;
                }
            }
            found
        }
    };

    let Some(image) = image else {
        if let Some(reason) = finish_reason {
            warn!("Model finished without an image (finish reason: {reason})");
        }
        return Err(GemimgError::NoImageInResponse);
    };

    write_atomically(destination, &image.bytes).await?;
    info!("Image saved to: {}", destination.display());

    Ok(OutputArtifact {
        path: destination.to_path_buf(),
        mime_type: image.mime_type,
        size: image.bytes.len(),
    })
}

/// Hidden sibling the bytes are written to before being renamed into place.
fn staging_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{name}.part"))
}

/// An interrupted write leaves at most the staging file, never a truncated image.
async fn write_atomically(destination: &Path, bytes: &[u8]) -> Result<(), GemimgError> {
    let staging = staging_path(destination);
    if let Err(err) = tokio::fs::write(&staging, bytes).await {
        tokio::fs::remove_file(&staging).await.ok();
        return Err(err.into());
    }
    tokio::fs::rename(&staging, destination).await?;
    Ok(())
}

/// Walks one unit's parts, logging text until an image turns up.
fn scan_unit(unit: &GenerateContentResponse) -> Result<Option<DecodedImage>, GemimgError> {
    let parts = unit.parts();
    if parts.is_empty() {
        debug!("Skipping response unit without content");
        return Ok(None);
    }

    for part in parts {
        if let Some(inline) = &part.inline_data
            && !inline.data.is_empty()
        {
            let bytes = general_purpose::STANDARD.decode(inline.data.trim())?;
            return Ok(Some(DecodedImage {
                mime_type: inline.mime_type.clone(),
                bytes,
            }));
        }
        if let Some(text) = part.text.as_deref()
            && !text.trim().is_empty()
        {
            info!("{}", text.trim());
        }
    }

    Ok(None)
}
