//! Error handling

use std::path::PathBuf;

use crate::constants::API_KEY_ENV;

/// Errors raised while turning prompts into images.
#[derive(Debug)]
pub enum GemimgError {
    /// No API key in the environment or on the command line
    MissingCredential,
    /// The style document given with `--style` does not exist
    StyleNotFound(PathBuf),
    /// The image given with `--edit` does not exist
    SourceImageNotFound(PathBuf),
    /// The style document has no template header followed by a code block
    TemplateNotFound(PathBuf),
    /// The template has format fields other than the subject placeholder
    MalformedTemplate(String),
    /// The response finished without carrying any image data
    NoImageInResponse,
    /// The response carried image data that was not valid base64
    InvalidImageData(String),
    /// The API answered with a non-success status
    Api {
        /// HTTP status returned by the API
        status: u16,
        /// Raw response body, for diagnostics
        body: String,
    },
    /// Transport failures talking to the API
    Http(reqwest::Error),
    /// A response unit could not be decoded
    Json(serde_json::Error),
    /// Local file system failures
    Io(std::io::Error),
    /// Decoding or encoding an image failed
    Image(image::ImageError),
    /// Upscale factor must be at least one
    InvalidScale(u32),
}

impl GemimgError {
    /// True for setup problems the operator fixes before re-running.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential | Self::StyleNotFound(_) | Self::SourceImageNotFound(_)
        )
    }

    /// Actionable guidance shown under a configuration error.
    pub fn guidance(&self) -> Option<String> {
        match self {
            Self::MissingCredential => Some(format!(
                "Create a .env file containing: {API_KEY_ENV}=your_api_key\nObtain an API key from: https://aistudio.google.com/apikey"
            )),
            Self::StyleNotFound(_) => {
                Some("Check the --style path; it is resolved against --cwd.".to_string())
            }
            Self::SourceImageNotFound(_) => {
                Some("Check the --edit path; it is resolved against --cwd.".to_string())
            }
            Self::TemplateNotFound(_) => Some(
                "Add a '## Prompt Template' section followed by a fenced code block.".to_string(),
            ),
            _ => None,
        }
    }
}

impl std::fmt::Display for GemimgError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "{API_KEY_ENV} not found in environment"),
            Self::StyleNotFound(path) => {
                write!(f, "Style template not found: {}", path.display())
            }
            Self::SourceImageNotFound(path) => {
                write!(f, "Source image not found: {}", path.display())
            }
            Self::TemplateNotFound(path) => write!(
                f,
                "Invalid template format in {}: no 'Prompt Template' section with a code block",
                path.display()
            ),
            Self::MalformedTemplate(reason) => write!(f, "Malformed template: {reason}"),
            Self::NoImageInResponse => write!(f, "No image data in response"),
            Self::InvalidImageData(err) => write!(f, "Failed to decode image data: {err}"),
            Self::Api { status, body } => write!(f, "Gemini API error {status}: {body}"),
            Self::Http(err) => write!(f, "Request to Gemini failed: {err}"),
            Self::Json(err) => write!(f, "Failed to parse Gemini response: {err}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Image(err) => write!(f, "Image error: {err}"),
            Self::InvalidScale(scale) => {
                write!(f, "Scale factor must be at least 1, got {scale}")
            }
        }
    }
}

impl std::error::Error for GemimgError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Image(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GemimgError {
    fn from(err: reqwest::Error) -> Self {
        GemimgError::Http(err)
    }
}

impl From<serde_json::Error> for GemimgError {
    fn from(err: serde_json::Error) -> Self {
        GemimgError::Json(err)
    }
}

impl From<std::io::Error> for GemimgError {
    fn from(err: std::io::Error) -> Self {
        GemimgError::Io(err)
    }
}

impl From<image::ImageError> for GemimgError {
    fn from(err: image::ImageError) -> Self {
        GemimgError::Image(err)
    }
}

impl From<base64::DecodeError> for GemimgError {
    fn from(err: base64::DecodeError) -> Self {
        GemimgError::InvalidImageData(err.to_string())
    }
}
