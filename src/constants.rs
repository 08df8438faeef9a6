//! Shared constants for talking to Gemini
//!

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "GOOGLE_AI_API_KEY";

/// Environment variable overriding the API base URL
pub const API_BASE_ENV: &str = "GEMINI_API_BASE";

/// Default Gemini REST endpoint
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default image model
pub const DEFAULT_MODEL: &str = "gemini-3-pro-image-preview";

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Hard ceiling on images in a single request, primary image included.
pub const MAX_IMAGES_PER_REQUEST: usize = 14;

/// Image size requested on the streaming path
pub const STREAMING_IMAGE_SIZE: &str = "1K";

/// Modalities requested on every call.
pub const RESPONSE_MODALITIES: [&str; 2] = ["IMAGE", "TEXT"];

/// The one placeholder spelling templates are normalized to
pub const SUBJECT_PLACEHOLDER: &str = "{subject}";

/// Default per-call timeout in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// Name of the dotenv file read at startup
pub const DOTENV_FILENAME: &str = ".env";
