//! Wiring between the command line and the batch driver.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::batch::{self, BatchPlan, BatchReport};
use crate::cli::CliOptions;
use crate::config::resolve_path;
use crate::error::GemimgError;
use crate::gemini::{ClientSettings, GenerationBackend};
use crate::request::{AspectRatio, AssemblyOptions};
use crate::template::{StyleTemplate, load_style_template};

/// Everything needed to run a batch, resolved and validated.
#[derive(Clone, Debug)]
pub struct Prepared {
    /// Jobs to run
    pub plan: BatchPlan,
    /// Reference images, resolved against the base directory
    pub references: Vec<PathBuf>,
    /// Shared assembly options
    pub options: AssemblyOptions,
}

/// Client settings from the command line. An absent or blank key is an error.
pub fn client_settings(cli: &CliOptions) -> Result<ClientSettings, GemimgError> {
    let api_key = cli
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(GemimgError::MissingCredential)?;

    Ok(ClientSettings::new(api_key)
        .with_model(cli.model.clone())
        .with_timeout(Duration::from_secs(cli.timeout)))
}

/// Final prompts, one per subject, in input order.
pub fn compose_prompts(
    template: Option<&StyleTemplate>,
    subjects: &[String],
) -> Result<Vec<String>, GemimgError> {
    match template {
        Some(template) => subjects
            .iter()
            .map(|subject| template.compose(subject))
            .collect(),
        None => Ok(subjects.to_vec()),
    }
}

/// Resolves paths, loads the style and plans the batch. Nothing is sent yet.
pub fn prepare(cli: &CliOptions, base: &Path) -> Result<Prepared, GemimgError> {
    let output = resolve_path(base, &cli.output);
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let style = cli.style.as_deref().map(|style| resolve_path(base, style));
    let template = match &style {
        Some(path) => {
            let template = load_style_template(path)?;
            info!("Loaded style template from: {}", path.display());
            Some(template)
        }
        None => None,
    };

    let aspect_ratio = cli
        .aspect
        .unwrap_or_else(|| AspectRatio::default_for_style(style.as_deref()));
    debug!("Aspect ratio: {aspect_ratio}");

    let prompts = compose_prompts(template.as_ref(), &cli.subjects)?;
    let references = cli
        .references
        .iter()
        .map(|reference| resolve_path(base, reference))
        .collect();
    let edit_source = cli.edit.as_deref().map(|edit| resolve_path(base, edit));

    let plan = batch::plan(&output, prompts, edit_source)?;

    Ok(Prepared {
        plan,
        references,
        options: AssemblyOptions {
            aspect_ratio,
            references_disable_streaming: !cli.stream_with_refs,
        },
    })
}

/// Runs a prepared batch against `backend`.
pub async fn execute<B, F>(backend: &B, prepared: &Prepared, shutdown: F) -> BatchReport
where
    B: GenerationBackend,
    F: Future<Output = ()>,
{
    let report = batch::run(
        backend,
        &prepared.plan,
        &prepared.references,
        prepared.options,
        shutdown,
    )
    .await;

    if prepared.plan.jobs.len() > 1 {
        info!(
            "Generated {}/{} images",
            report.written.len(),
            prepared.plan.jobs.len()
        );
    }
    report
}
