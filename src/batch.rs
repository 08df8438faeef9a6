//! Batch driver: one request per prompt, run one after another.

use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::drain::{OutputArtifact, drain_to_file};
use crate::error::GemimgError;
use crate::gemini::GenerationBackend;
use crate::request::{AssemblyOptions, Intent, assemble};

/// One prompt and where its image goes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Job {
    /// Final prompt text
    pub prompt: String,
    /// Output file
    pub destination: PathBuf,
}

/// The jobs of one invocation, all sharing an intent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchPlan {
    /// Generate, or edit a given image
    pub intent: Intent,
    /// Jobs in input order
    pub jobs: Vec<Job>,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Images written, in input order
    pub written: Vec<OutputArtifact>,
    /// Destination and error for every failed job
    pub failed: Vec<(PathBuf, GemimgError)>,
    /// Jobs never started because the run was interrupted
    pub skipped: usize,
}

impl BatchReport {
    /// True when every job wrote its image.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped == 0
    }
}

/// `<dir>/<stem>_<index><ext>`, e.g. `out.png` → `out_2.png`.
pub fn numbered_output(output: &Path, index: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = output
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    output.with_file_name(format!("{stem}_{index}{extension}"))
}

/// Lays out the jobs for `prompts`.
///
/// Editing checks the source image up front and only ever uses the first
/// prompt. Several prompts get numbered outputs next to `output`.
pub fn plan(
    output: &Path,
    prompts: Vec<String>,
    edit_source: Option<PathBuf>,
) -> Result<BatchPlan, GemimgError> {
    if let Some(primary) = edit_source {
        if !primary.exists() {
            return Err(GemimgError::SourceImageNotFound(primary));
        }
        if prompts.len() > 1 {
            warn!(
                "Edit mode uses only the first prompt; ignoring {} more",
                prompts.len() - 1
            );
        }
        let jobs = prompts
            .into_iter()
            .take(1)
            .map(|prompt| Job {
                prompt,
                destination: output.to_path_buf(),
            })
            .collect();
        return Ok(BatchPlan {
            intent: Intent::Edit { primary },
            jobs,
        });
    }

    let jobs = if prompts.len() == 1 {
        prompts
            .into_iter()
            .map(|prompt| Job {
                prompt,
                destination: output.to_path_buf(),
            })
            .collect()
    } else {
        prompts
            .into_iter()
            .enumerate()
            .map(|(idx, prompt)| Job {
                prompt,
                destination: numbered_output(output, idx + 1),
            })
            .collect()
    };

    Ok(BatchPlan {
        intent: Intent::Generate,
        jobs,
    })
}

/// Assembles, sends and drains a single job.
pub async fn generate_one<B: GenerationBackend>(
    backend: &B,
    intent: &Intent,
    job: &Job,
    references: &[PathBuf],
    options: AssemblyOptions,
) -> Result<OutputArtifact, GemimgError> {
    let request = assemble(intent, &job.prompt, references, options)?;
    let body = backend.send(&request).await?;
    drain_to_file(body, &job.destination).await
}

/// Runs every job in order. A failed job is recorded and the next one starts;
/// once `shutdown` resolves the in-flight call is dropped and the rest skipped.
pub async fn run<B, F>(
    backend: &B,
    plan: &BatchPlan,
    references: &[PathBuf],
    options: AssemblyOptions,
    shutdown: F,
) -> BatchReport
where
    B: GenerationBackend,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let total = plan.jobs.len();
    let mut report = BatchReport::default();

    for (idx, job) in plan.jobs.iter().enumerate() {
        if total > 1 {
            info!("Generating image {}/{total}...", idx + 1);
        }

        let outcome = tokio::select! {
            outcome = generate_one(backend, &plan.intent, job, references, options) => outcome,
            () = &mut shutdown => {
                report.skipped = total - idx;
                warn!("Interrupted, skipping {} remaining image(s)", report.skipped);
                break;
            }
        };

        match outcome {
            Ok(artifact) => report.written.push(artifact),
            Err(err) => {
                error!(
                    "Failed to generate {}: {err}",
                    job.destination.display()
                );
                report.failed.push((job.destination.clone(), err));
            }
        }
    }

    report
}
