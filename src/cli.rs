//! CLI parser
use clap::Parser;
use std::path::PathBuf;

use crate::constants::{API_KEY_ENV, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECONDS};
use crate::request::AspectRatio;

const GEMIMG_EXAMPLES: &str = "Examples:
  # Generate a single image
  gemimg output.png \"A minimal 3D cube on solid black background\"

  # Use a style template
  gemimg output.png \"gear icon\" --style styles/purple_glass_3d.md

  # Three variations: output_1.png, output_2.png, output_3.png
  gemimg output.png cube sphere pyramid --style styles/emerald_glass_3d.md

  # Edit an existing image
  gemimg output.png \"Change the background to white\" --edit input.png

  # Reference images for style consistency
  gemimg output.png \"database icon\" --ref styles/purple_glass_3d/examples/1.png

  # Wide output
  gemimg output.png \"YouTube thumbnail design\" --aspect 16:9";

#[derive(Parser, Debug)]
#[command(name = "gemimg", after_help = GEMIMG_EXAMPLES)]
/// Generate and edit images with Gemini, optionally from style templates
pub struct CliOptions {
    /// Output path (base name when several subjects are given)
    pub output: PathBuf,

    /// Subject(s) or full prompt(s)
    #[clap(required = true, num_args = 1..)]
    pub subjects: Vec<String>,

    #[clap(long, short, value_name = "PATH")]
    /// Style template (.md with a '## Prompt Template' code block)
    pub style: Option<PathBuf>,

    #[clap(long, short, value_name = "PATH")]
    /// Edit mode: the existing image to modify
    pub edit: Option<PathBuf>,

    #[clap(long = "ref", short = 'r', value_name = "PATH")]
    /// Reference image, repeatable (max 14, or 13 when editing)
    pub references: Vec<PathBuf>,

    #[clap(long, short, value_enum)]
    /// Output aspect ratio, defaults to 16:9 for infographic styles and 1:1 otherwise.
    /// Only applied when no reference images are used.
    pub aspect: Option<AspectRatio>,

    #[clap(long, value_name = "DIR")]
    /// Base directory for relative paths, defaults to $PWD
    pub cwd: Option<PathBuf>,

    #[clap(long, env = API_KEY_ENV, hide_env_values = true)]
    /// Gemini API key. Env: GOOGLE_AI_API_KEY
    pub api_key: Option<String>,

    #[clap(long, default_value = DEFAULT_MODEL, env = "GEMINI_IMAGE_MODEL")]
    /// Image model. Env: GEMINI_IMAGE_MODEL
    pub model: String,

    #[clap(long, default_value_t = DEFAULT_TIMEOUT_SECONDS, env = "GEMIMG_TIMEOUT")]
    /// Per-call timeout in seconds. Env: GEMIMG_TIMEOUT
    pub timeout: u64,

    #[clap(long)]
    /// Keep the streaming call (and aspect ratio) even when reference images are given
    pub stream_with_refs: bool,

    #[clap(long, help = "Enable debug logging", env = "GEMIMG_DEBUG")]
    /// Enable debug logging. Env: GEMIMG_DEBUG
    pub debug: bool,
}

#[derive(Parser, Debug)]
#[command(name = "upscale")]
/// Upscale an image with Lanczos resampling
pub struct UpscaleOptions {
    /// Image to upscale
    pub input: PathBuf,

    /// Where to write the result; the extension picks the format
    pub output: PathBuf,

    /// Integer scale factor
    #[clap(default_value_t = 2)]
    pub scale: u32,

    #[clap(long, help = "Enable debug logging", env = "GEMIMG_DEBUG")]
    /// Enable debug logging. Env: GEMIMG_DEBUG
    pub debug: bool,
}
