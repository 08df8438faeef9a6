use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose;
use clap::Parser;
use futures::StreamExt;
use futures::stream;
use gemimg::app::{execute, prepare};
use gemimg::cli::CliOptions;
use gemimg::error::GemimgError;
use gemimg::gemini::types::{GenerateContentResponse, ResponsePart};
use gemimg::gemini::{GenerationBackend, ResponseBody};
use gemimg::request::{CallShape, GenerationRequest};

enum Reply {
    Image(&'static [u8]),
    TextOnly,
    ServerError,
    Hang,
}

/// Answers calls from a script and keeps every request it saw.
struct MockBackend {
    replies: Mutex<VecDeque<Reply>>,
    seen: Mutex<Vec<GenerationRequest>>,
}

impl MockBackend {
    fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        self.seen.lock().expect("seen lock").clone()
    }
}

fn body_for(shape: CallShape, parts: Vec<ResponsePart>) -> ResponseBody {
    let unit = GenerateContentResponse::with_parts(parts);
    match shape {
        CallShape::Composite => ResponseBody::Composite(unit),
        CallShape::Streaming { .. } => ResponseBody::Streamed(
            stream::iter(vec![Ok(GenerateContentResponse::default()), Ok(unit)]).boxed(),
        ),
    }
}

impl GenerationBackend for MockBackend {
    async fn send(&self, request: &GenerationRequest) -> Result<ResponseBody, GemimgError> {
        self.seen.lock().expect("seen lock").push(request.clone());
        let reply = self
            .replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or(Reply::ServerError);
        match reply {
            Reply::Image(bytes) => Ok(body_for(
                request.shape,
                vec![
                    ResponsePart::text("Here you go"),
                    ResponsePart::image("image/png", general_purpose::STANDARD.encode(bytes)),
                ],
            )),
            Reply::TextOnly => Ok(body_for(
                request.shape,
                vec![ResponsePart::text("I can only describe it")],
            )),
            Reply::ServerError => Err(GemimgError::Api {
                status: 500,
                body: "internal".to_string(),
            }),
            Reply::Hang => std::future::pending().await,
        }
    }
}

fn cli(cwd: &Path, args: &[&str]) -> CliOptions {
    let cwd = cwd.to_string_lossy().into_owned();
    let mut argv = vec!["gemimg", "--cwd", cwd.as_str()];
    argv.extend_from_slice(args);
    CliOptions::try_parse_from(argv).expect("parse")
}

fn write_style(dir: &Path, name: &str, template: &str) {
    std::fs::write(
        dir.join(name),
        format!("# Purple glass\n\n## Prompt Template\n\n```text\n{template}\n```\n"),
    )
    .expect("write style");
}

#[tokio::test]
async fn styled_single_subject_writes_one_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_style(
        dir.path(),
        "purple.md",
        "A 3D {subject} made of purple glass, isolated on black",
    );
    let options = cli(dir.path(), &["out.png", "gear icon", "--style", "purple.md"]);
    let backend = MockBackend::new(vec![Reply::Image(b"gear")]);

    let prepared = prepare(&options, dir.path()).expect("prepare");
    let report = execute(&backend, &prepared, std::future::pending()).await;

    assert!(report.is_success());
    assert_eq!(
        std::fs::read(dir.path().join("out.png")).expect("read"),
        b"gear"
    );
    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].prompt(),
        Some("A 3D gear icon made of purple glass, isolated on black")
    );
    assert!(matches!(requests[0].shape, CallShape::Streaming { .. }));
}

#[tokio::test]
async fn several_subjects_get_numbered_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_style(dir.path(), "emerald.md", "Emerald glass [SUBJECT]");
    let options = cli(
        dir.path(),
        &["out.png", "cube", "sphere", "pyramid", "--style", "emerald.md"],
    );
    let backend = MockBackend::new(vec![
        Reply::Image(b"one"),
        Reply::Image(b"two"),
        Reply::Image(b"three"),
    ]);

    let prepared = prepare(&options, dir.path()).expect("prepare");
    let report = execute(&backend, &prepared, std::future::pending()).await;

    assert!(report.is_success());
    assert_eq!(report.written.len(), 3);
    for (name, bytes) in [
        ("out_1.png", b"one".as_slice()),
        ("out_2.png", b"two".as_slice()),
        ("out_3.png", b"three".as_slice()),
    ] {
        assert_eq!(std::fs::read(dir.path().join(name)).expect("read"), bytes);
    }
    assert!(!dir.path().join("out.png").exists());
    let prompts: Vec<_> = backend
        .requests()
        .iter()
        .map(|request| request.prompt().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        prompts,
        vec![
            "Emerald glass cube".to_string(),
            "Emerald glass sphere".to_string(),
            "Emerald glass pyramid".to_string()
        ]
    );
}

#[tokio::test]
async fn edit_with_missing_source_makes_no_calls() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = cli(
        dir.path(),
        &["out.png", "make the sky pink", "--edit", "missing.png"],
    );
    let backend = MockBackend::new(vec![Reply::Image(b"never")]);

    let err = prepare(&options, dir.path()).expect_err("missing source");

    assert!(matches!(err, GemimgError::SourceImageNotFound(_)));
    assert!(err.is_configuration());
    assert!(backend.requests().is_empty());
    assert!(!dir.path().join("out.png").exists());
}

#[tokio::test]
async fn text_only_stream_reports_no_image() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = cli(dir.path(), &["out.png", "something unsafe"]);
    let backend = MockBackend::new(vec![Reply::TextOnly]);

    let prepared = prepare(&options, dir.path()).expect("prepare");
    let report = execute(&backend, &prepared, std::future::pending()).await;

    assert!(!report.is_success());
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(report.failed[0].1, GemimgError::NoImageInResponse));
    assert!(!dir.path().join("out.png").exists());
}

#[tokio::test]
async fn failure_mid_batch_does_not_stop_the_rest() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = cli(dir.path(), &["out.png", "cube", "sphere", "pyramid"]);
    let backend = MockBackend::new(vec![
        Reply::Image(b"one"),
        Reply::ServerError,
        Reply::Image(b"three"),
    ]);

    let prepared = prepare(&options, dir.path()).expect("prepare");
    let report = execute(&backend, &prepared, std::future::pending()).await;

    assert_eq!(report.written.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, dir.path().join("out_2.png"));
    assert!(dir.path().join("out_1.png").exists());
    assert!(!dir.path().join("out_2.png").exists());
    assert!(dir.path().join("out_3.png").exists());
    assert_eq!(backend.requests().len(), 3);
}

#[tokio::test]
async fn shutdown_skips_remaining_jobs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = cli(dir.path(), &["out.png", "cube", "sphere", "pyramid"]);
    let backend = MockBackend::new(vec![Reply::Image(b"one"), Reply::Hang]);

    let prepared = prepare(&options, dir.path()).expect("prepare");
    let report = execute(
        &backend,
        &prepared,
        tokio::time::sleep(Duration::from_millis(100)),
    )
    .await;

    assert_eq!(report.written.len(), 1);
    assert_eq!(report.skipped, 2);
    assert!(!report.is_success());
    assert_eq!(backend.requests().len(), 2);
    assert!(!dir.path().join("out_3.png").exists());
}

#[tokio::test]
async fn references_switch_to_composite_unless_streaming_is_kept() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("ref.png"), b"\x89PNG\r\n\x1a\nfake").expect("write ref");

    let composite = cli(dir.path(), &["out.png", "database icon", "--ref", "ref.png"]);
    let streaming = cli(
        dir.path(),
        &[
            "kept.png",
            "database icon",
            "--ref",
            "ref.png",
            "--stream-with-refs",
            "-a",
            "4:3",
        ],
    );
    let backend = MockBackend::new(vec![Reply::Image(b"a"), Reply::Image(b"b")]);

    for options in [&composite, &streaming] {
        let prepared = prepare(options, dir.path()).expect("prepare");
        let report = execute(&backend, &prepared, std::future::pending()).await;
        assert!(report.is_success());
    }

    let requests = backend.requests();
    assert_eq!(requests[0].shape, CallShape::Composite);
    assert_eq!(requests[0].image_count(), 1);
    assert!(matches!(
        requests[1].shape,
        CallShape::Streaming { aspect_ratio } if aspect_ratio.as_str() == "4:3"
    ));
}

#[tokio::test]
async fn edit_sends_source_then_references() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("input.png"), b"\x89PNG\r\n\x1a\nsource").expect("write");
    std::fs::write(dir.path().join("ref.jpg"), b"\xff\xd8\xff\xe0ref").expect("write");
    let options = cli(
        dir.path(),
        &[
            "edited.png",
            "Change the background to white",
            "--edit",
            "input.png",
            "-r",
            "ref.jpg",
            "-r",
            "gone.png",
        ],
    );
    let backend = MockBackend::new(vec![Reply::Image(b"edited")]);

    let prepared = prepare(&options, dir.path()).expect("prepare");
    let report = execute(&backend, &prepared, std::future::pending()).await;

    assert!(report.is_success());
    let requests = backend.requests();
    assert_eq!(requests[0].shape, CallShape::Composite);
    assert_eq!(requests[0].image_count(), 2);
    assert_eq!(requests[0].references, vec![dir.path().join("ref.jpg")]);
}
