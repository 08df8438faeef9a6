//! Request assembly: prompt first, then the image being edited, then references,
//! never more images than one call accepts.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose;
use clap::ValueEnum;
use tracing::{debug, warn};

use crate::constants::MAX_IMAGES_PER_REQUEST;
use crate::error::GemimgError;
use crate::gemini::types::{InlineData, Part};

/// Output aspect ratios the image model accepts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum AspectRatio {
    /// Square, the default for icons
    #[default]
    #[value(name = "1:1")]
    Square,
    /// 3:4 portrait
    #[value(name = "3:4")]
    Portrait3x4,
    /// 4:3 landscape
    #[value(name = "4:3")]
    Landscape4x3,
    /// 4:5 portrait
    #[value(name = "4:5")]
    Portrait4x5,
    /// 5:4 landscape
    #[value(name = "5:4")]
    Landscape5x4,
    /// 9:16 tall
    #[value(name = "9:16")]
    Tall9x16,
    /// 16:9 wide, the default for infographics
    #[value(name = "16:9")]
    Wide16x9,
    /// 21:9 ultra wide
    #[value(name = "21:9")]
    UltraWide21x9,
}

impl AspectRatio {
    /// Wire spelling, e.g. `16:9`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait3x4 => "3:4",
            Self::Landscape4x3 => "4:3",
            Self::Portrait4x5 => "4:5",
            Self::Landscape5x4 => "5:4",
            Self::Tall9x16 => "9:16",
            Self::Wide16x9 => "16:9",
            Self::UltraWide21x9 => "21:9",
        }
    }

    /// Infographic styles default to 16:9, everything else to 1:1.
    pub fn default_for_style(style: Option<&Path>) -> Self {
        let is_infographic = style
            .and_then(Path::file_stem)
            .map(|stem| stem.to_string_lossy().to_lowercase().contains("infographic"))
            .unwrap_or(false);
        if is_infographic {
            Self::Wide16x9
        } else {
            Self::Square
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a request asks the model to do.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Intent {
    /// Create a fresh image
    Generate,
    /// Modify an existing image
    Edit {
        /// The image being modified
        primary: PathBuf,
    },
}

impl Intent {
    /// How many reference images fit next to this intent's own images.
    pub fn reference_budget(&self) -> usize {
        match self {
            Self::Generate => MAX_IMAGES_PER_REQUEST,
            Self::Edit { .. } => MAX_IMAGES_PER_REQUEST - 1,
        }
    }
}

/// How the request goes over the wire, and so how its response comes back.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CallShape {
    /// One `generateContent` call returning a single composite result
    Composite,
    /// `streamGenerateContent`, with explicit aspect ratio control
    Streaming {
        /// Requested output aspect ratio
        aspect_ratio: AspectRatio,
    },
}

/// Knobs for [`assemble`].
#[derive(Clone, Copy, Debug)]
pub struct AssemblyOptions {
    /// Aspect ratio used on the streaming path
    pub aspect_ratio: AspectRatio,
    /// When set, reference images force the composite call shape
    pub references_disable_streaming: bool,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::default(),
            references_disable_streaming: true,
        }
    }
}

/// An ordered, ready-to-send request.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    /// Prompt text, then primary image, then references
    pub parts: Vec<Part>,
    /// Call shape picked for this request
    pub shape: CallShape,
    /// References that made it into `parts`, in order
    pub references: Vec<PathBuf>,
}

impl GenerationRequest {
    /// Number of image parts in the request.
    pub fn image_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| matches!(part, Part::InlineData { .. }))
            .count()
    }

    /// The prompt text part.
    pub fn prompt(&self) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            Part::Text { text } => Some(text.as_str()),
            Part::InlineData { .. } => None,
        })
    }
}

/// Builds a request for one prompt.
///
/// References beyond the intent's budget are dropped from the tail, then
/// references missing on disk are skipped with a warning.
pub fn assemble(
    intent: &Intent,
    prompt: &str,
    references: &[PathBuf],
    options: AssemblyOptions,
) -> Result<GenerationRequest, GemimgError> {
    let mut parts = vec![Part::Text {
        text: prompt.to_string(),
    }];

    if let Intent::Edit { primary } = intent {
        parts.push(image_part(primary)?);
    }

    let budget = intent.reference_budget();
    if references.len() > budget {
        warn!(
            "{} reference images supplied, only the first {budget} fit in one request",
            references.len()
        );
    }

    let mut included = Vec::new();
    for reference in references.iter().take(budget) {
        if !reference.exists() {
            warn!("Reference image not found: {}", reference.display());
            continue;
        }
        parts.push(image_part(reference)?);
        included.push(reference.clone());
    }

    let shape = select_shape(intent, !included.is_empty(), options);
    debug!(
        "Assembled request with {} parts ({} references), shape {shape:?}",
        parts.len(),
        included.len()
    );

    Ok(GenerationRequest {
        parts,
        shape,
        references: included,
    })
}

/// Edits and reference-guided generations go composite; plain generations stream.
pub fn select_shape(intent: &Intent, has_references: bool, options: AssemblyOptions) -> CallShape {
    match (intent, has_references) {
        (Intent::Edit { .. }, _) => CallShape::Composite,
        (Intent::Generate, true) if options.references_disable_streaming => CallShape::Composite,
        (Intent::Generate, _) => CallShape::Streaming {
            aspect_ratio: options.aspect_ratio,
        },
    }
}

/// Reads an image file into an inline data part.
pub fn image_part(path: &Path) -> Result<Part, GemimgError> {
    let bytes = std::fs::read(path)?;
    Ok(Part::InlineData {
        inline_data: InlineData {
            mime_type: mime_type_for(path, &bytes).to_string(),
            data: general_purpose::STANDARD.encode(&bytes),
        },
    })
}

/// Sniffs the content first, then falls back to the file extension.
fn mime_type_for(path: &Path, bytes: &[u8]) -> &'static str {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type();
    }
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => "image/png",
    }
}
