use anyhow::{Context, Result};
use clap::Parser;
use gemimg::cli::UpscaleOptions;
use gemimg::config::setup_logging;
use gemimg::upscale::upscale_file;

fn main() -> Result<()> {
    let opts = UpscaleOptions::parse();
    setup_logging(opts.debug).map_err(|err| anyhow::anyhow!("{err}"))?;

    if !opts.input.exists() {
        anyhow::bail!("Input image not found: {}", opts.input.display());
    }

    upscale_file(&opts.input, &opts.output, opts.scale)
        .with_context(|| format!("Failed to upscale {}", opts.input.display()))?;
    Ok(())
}
