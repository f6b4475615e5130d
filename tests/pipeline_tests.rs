use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use editplan_cli::domain::model::PipelineState;
use editplan_cli::engine::command::ToolCommand;
use editplan_cli::engine::EngineConfig;
use editplan_cli::ports::{DurationProbePort, ToolOutput, TranscodePort, TranslatorPort};
use editplan_cli::*;

/// Test doubles standing in for ffmpeg, ffprobe and the translator service
mod fakes {
    use super::*;

    /// Records every command and writes plausible output files
    #[derive(Default)]
    pub struct FakeTranscoder {
        pub commands: Mutex<Vec<ToolCommand>>,
        /// Operation prefix that exits non-zero
        pub fail_on: Option<String>,
        /// Operation prefix that triggers cancellation
        pub cancel_on: Option<(String, CancelHandle)>,
        /// Operations held back so later jobs finish first
        pub slow: Vec<String>,
        pub finished: Mutex<Vec<String>>,
    }

    impl FakeTranscoder {
        pub fn operations(&self) -> Vec<String> {
            self.commands
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.operation().to_string())
                .collect()
        }
    }

    #[async_trait]
    impl TranscodePort for FakeTranscoder {
        async fn run(&self, command: &ToolCommand, cancel: &CancelToken) -> Result<ToolOutput, DomainError> {
            self.commands.lock().unwrap().push(command.clone());
            if self.slow.iter().any(|op| op == command.operation()) {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            }

            if let Some((prefix, handle)) = &self.cancel_on {
                if command.operation().starts_with(prefix.as_str()) {
                    handle.cancel();
                }
            }
            cancel.check()?;

            if let Some(prefix) = &self.fail_on {
                if command.operation().starts_with(prefix.as_str()) {
                    // Leave a partial file behind like a crashed encoder would.
                    std::fs::write(command.output(), b"partial").unwrap();
                    return Err(DomainError::ToolFailed {
                        operation: command.operation().to_string(),
                        exit_code: Some(1),
                        stderr: "Conversion failed!".to_string(),
                    });
                }
            }

            let contents = if command.is_concat() {
                std::fs::read(command.input()).unwrap()
            } else {
                format!("{} <- {}", command.operation(), command.input().display()).into_bytes()
            };
            std::fs::write(command.output(), contents).unwrap();
            self.finished.lock().unwrap().push(command.operation().to_string());
            Ok(ToolOutput::default())
        }
    }

    pub struct FixedProbe(pub Result<f64, DomainError>);

    #[async_trait]
    impl DurationProbePort for FixedProbe {
        async fn probe_duration(&self, _file_path: &Path) -> Result<f64, DomainError> {
            self.0.clone()
        }
    }

    pub struct FakeTranslator {
        pub reply: Result<String, DomainError>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeTranslator {
        pub fn replying(reply: Result<String, DomainError>) -> Self {
            Self {
                reply,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TranslatorPort for FakeTranslator {
        async fn translate(&self, instruction: &str) -> Result<String, DomainError> {
            self.calls.lock().unwrap().push(instruction.to_string());
            self.reply.clone()
        }
    }
}

use fakes::*;

struct Harness {
    dir: TempDir,
    source: PathBuf,
    transcoder: Arc<FakeTranscoder>,
    translator: Arc<FakeTranslator>,
    interactor: PipelineInteractor,
}

impl Harness {
    fn new(transcoder: FakeTranscoder, probe: Result<f64, DomainError>) -> Self {
        Self::with_translator(transcoder, probe, FakeTranslator::replying(Ok(String::new())))
    }

    fn with_translator(
        transcoder: FakeTranscoder,
        probe: Result<f64, DomainError>,
        translator: FakeTranslator,
    ) -> Self {
        Self::build(transcoder, probe, translator, 1)
    }

    fn parallel(transcoder: FakeTranscoder, probe: Result<f64, DomainError>, jobs: usize) -> Self {
        Self::build(transcoder, probe, FakeTranslator::replying(Ok(String::new())), jobs)
    }

    fn build(
        transcoder: FakeTranscoder,
        probe: Result<f64, DomainError>,
        translator: FakeTranslator,
        jobs: usize,
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, b"source video").unwrap();

        let transcoder = Arc::new(transcoder);
        let translator = Arc::new(translator);
        let config = EngineConfig {
            effects_dir: dir.path().join("effects"),
            max_parallel_jobs: jobs,
            ..EngineConfig::default()
        };
        let interactor = PipelineInteractor::new(
            transcoder.clone(),
            Arc::new(FixedProbe(probe)),
            translator.clone(),
            config,
        );

        Self {
            dir,
            source,
            transcoder,
            translator,
            interactor,
        }
    }

    fn files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn scenario_a_plan() -> EditPlan {
    EditPlan::new(vec![
        Segment::keep(0.0, 10.0),
        Segment::edit(10.0, 20.0, "zoom_in"),
        Segment::keep(20.0, 30.0),
    ])
}

#[tokio::test]
async fn test_keep_edit_keep_produces_single_output() {
    let harness = Harness::new(FakeTranscoder::default(), Ok(30.0));

    let report = harness
        .interactor
        .run_plan(&harness.source, scenario_a_plan(), &CancelToken::never())
        .await
        .expect("pipeline should succeed");

    assert_eq!(report.output, harness.path("clip_final.mp4"));
    assert_eq!(report.segment_count, 3);
    assert_eq!(report.applied_effects.len(), 1);
    assert_eq!(report.applied_effects[0].segment, 2);
    assert!(report.warnings.is_empty());
    assert_eq!(
        report.states,
        vec![
            PipelineState::Normalizing,
            PipelineState::Cutting,
            PipelineState::Applying,
            PipelineState::Merging,
            PipelineState::Cleanup,
            PipelineState::Done,
        ]
    );

    assert_eq!(
        harness.transcoder.operations(),
        vec![
            "cut segment 1",
            "cut segment 2",
            "cut segment 3",
            "effect zoom_in",
            "merge",
        ]
    );

    // The merge saw the effect output in the middle slot.
    let manifest = std::fs::read_to_string(&report.output).unwrap();
    let listed: Vec<&str> = manifest.lines().collect();
    assert_eq!(listed.len(), 3);
    assert!(listed[0].contains("clip_part_1.mp4"));
    assert!(listed[1].contains("clip_part_2_zoom_in.mp4"));
    assert!(listed[2].contains("clip_part_3.mp4"));

    assert_eq!(harness.files(), vec!["clip.mp4", "clip_final.mp4"]);
}

#[tokio::test]
async fn test_parallel_jobs_keep_segment_order() {
    let transcoder = FakeTranscoder {
        slow: vec!["cut segment 1".to_string(), "effect blur".to_string()],
        ..FakeTranscoder::default()
    };
    let harness = Harness::parallel(transcoder, Ok(30.0), 3);
    let plan = EditPlan::new(vec![
        Segment::edit(0.0, 10.0, "blur"),
        Segment::edit(10.0, 20.0, "grayscale"),
        Segment::edit(20.0, 30.0, "invert"),
    ]);

    let report = harness
        .interactor
        .run_plan(&harness.source, plan, &CancelToken::never())
        .await
        .unwrap();

    let finished = harness.transcoder.finished.lock().unwrap().clone();
    let position = |op: &str| finished.iter().position(|f| f == op).unwrap();
    assert!(position("cut segment 1") > position("cut segment 3"));
    assert!(position("effect blur") > position("effect invert"));

    let segments: Vec<usize> = report.applied_effects.iter().map(|a| a.segment).collect();
    assert_eq!(segments, vec![1, 2, 3]);

    let manifest = std::fs::read_to_string(&report.output).unwrap();
    let listed: Vec<&str> = manifest.lines().collect();
    assert_eq!(listed.len(), 3);
    assert!(listed[0].contains("clip_part_1_blur.mp4"));
    assert!(listed[1].contains("clip_part_2_grayscale.mp4"));
    assert!(listed[2].contains("clip_part_3_invert.mp4"));
    assert_eq!(harness.files(), vec!["clip.mp4", "clip_final.mp4"]);
}

#[tokio::test]
async fn test_end_beyond_duration_is_clamped_before_cutting() {
    let harness = Harness::new(FakeTranscoder::default(), Ok(30.0));
    let plan = EditPlan::new(vec![Segment::keep(0.0, 35.0)]);

    let report = harness
        .interactor
        .run_plan(&harness.source, plan, &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(report.plan.segments()[0].end_sec, 30.0);
    let commands = harness.transcoder.commands.lock().unwrap().clone();
    assert_eq!(commands[0].output_value("-ss"), Some("0.000"));
    assert_eq!(commands[0].output_value("-t"), Some("30.000"));
    assert_eq!(harness.files(), vec!["clip.mp4", "clip_final.mp4"]);
}

#[tokio::test]
async fn test_fenced_translator_reply_matches_raw_json() {
    let raw = r#"{"parts":[{"start_sec":0,"end_sec":10,"action":"keep"},{"start_sec":10,"end_sec":30,"action":"edit","effect_name":"blur"}]}"#;
    let prose = format!("Sure! Here is your plan:\n```json\n{}\n```\nEnjoy.", raw);
    let harness = Harness::with_translator(
        FakeTranscoder::default(),
        Ok(30.0),
        FakeTranslator::replying(Ok(prose)),
    );

    let report = harness
        .interactor
        .run_instruction(&harness.source, "blur the second half", &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(
        harness.translator.calls.lock().unwrap().as_slice(),
        ["blur the second half".to_string()]
    );
    let direct = editplan_cli::planner::PlanExtractor::extract(raw).unwrap();
    assert_eq!(report.plan.segments(), direct.parts.as_slice());
    assert_eq!(report.states[0], PipelineState::Extracting);
}

#[tokio::test]
async fn test_merge_failure_rolls_back_everything() {
    let transcoder = FakeTranscoder {
        fail_on: Some("merge".to_string()),
        ..FakeTranscoder::default()
    };
    let harness = Harness::new(transcoder, Ok(30.0));

    let failure = harness
        .interactor
        .run_plan(&harness.source, scenario_a_plan(), &CancelToken::never())
        .await
        .unwrap_err();

    assert_eq!(failure.state, PipelineState::Merging);
    assert_eq!(failure.errors.len(), 1);
    assert!(matches!(failure.errors[0], DomainError::MergeFailed(_)));
    assert_eq!(harness.files(), vec!["clip.mp4"]);
}

#[tokio::test]
async fn test_cut_failure_rolls_back_and_stops() {
    let transcoder = FakeTranscoder {
        fail_on: Some("cut segment 2".to_string()),
        ..FakeTranscoder::default()
    };
    let harness = Harness::new(transcoder, Ok(30.0));

    let failure = harness
        .interactor
        .run_plan(&harness.source, scenario_a_plan(), &CancelToken::never())
        .await
        .unwrap_err();

    assert_eq!(failure.state, PipelineState::Cutting);
    assert!(matches!(
        failure.primary(),
        Some(DomainError::SegmentCutFailed { index: 2, .. })
    ));
    let operations = harness.transcoder.operations();
    assert!(!operations.iter().any(|op| op == "merge" || op.starts_with("effect")));
    assert_eq!(harness.files(), vec!["clip.mp4"]);
}

#[tokio::test]
async fn test_empty_plan_touches_nothing() {
    let harness = Harness::new(FakeTranscoder::default(), Ok(30.0));

    let failure = harness
        .interactor
        .run_plan(&harness.source, EditPlan::new(Vec::new()), &CancelToken::never())
        .await
        .unwrap_err();

    assert_eq!(failure.errors, vec![DomainError::EmptyPlan]);
    assert!(harness.transcoder.operations().is_empty());
    assert_eq!(harness.files(), vec!["clip.mp4"]);
}

#[tokio::test]
async fn test_unknown_effect_keeps_original_segment() {
    let harness = Harness::new(FakeTranscoder::default(), Ok(20.0));
    let plan = EditPlan::new(vec![
        Segment::keep(0.0, 10.0),
        Segment::edit(10.0, 20.0, "nonexistent_fx"),
    ]);

    let report = harness
        .interactor
        .run_plan(&harness.source, plan, &CancelToken::never())
        .await
        .unwrap();

    assert!(report.applied_effects.is_empty());
    assert_eq!(report.skipped_effects.len(), 1);
    assert_eq!(report.skipped_effects[0].effect, "nonexistent_fx");
    assert_eq!(report.warnings.len(), 1);

    let manifest = std::fs::read_to_string(&report.output).unwrap();
    assert!(manifest.lines().nth(1).unwrap().contains("clip_part_2.mp4"));
    assert_eq!(harness.files(), vec!["clip.mp4", "clip_final.mp4"]);
}

#[tokio::test]
async fn test_substitute_clip_replaces_segment() {
    let harness = Harness::new(FakeTranscoder::default(), Ok(20.0));
    std::fs::create_dir(harness.path("effects")).unwrap();
    std::fs::write(harness.path("effects").join("fireworks.mp4"), b"boom").unwrap();
    let plan = EditPlan::new(vec![
        Segment::keep(0.0, 10.0),
        Segment::edit(10.0, 20.0, "Fireworks"),
    ]);

    let report = harness
        .interactor
        .run_plan(&harness.source, plan, &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(report.applied_effects.len(), 1);
    // Substitutes are copied, never transcoded.
    assert!(!harness
        .transcoder
        .operations()
        .iter()
        .any(|op| op.starts_with("effect")));
    assert_eq!(harness.files(), vec!["clip.mp4", "clip_final.mp4"]);
}

#[tokio::test]
async fn test_cancel_during_effects_rolls_back() {
    let (handle, token) = CancelHandle::pair();
    let transcoder = FakeTranscoder {
        cancel_on: Some(("effect".to_string(), handle)),
        ..FakeTranscoder::default()
    };
    let harness = Harness::new(transcoder, Ok(30.0));

    let failure = harness
        .interactor
        .run_plan(&harness.source, scenario_a_plan(), &token)
        .await
        .unwrap_err();

    assert!(failure.is_cancelled());
    assert_eq!(failure.state, PipelineState::Applying);
    assert!(!harness.transcoder.operations().contains(&"merge".to_string()));
    assert_eq!(harness.files(), vec!["clip.mp4"]);
}

#[tokio::test]
async fn test_probe_failure_runs_raw_plan_with_warning() {
    let harness = Harness::new(
        FakeTranscoder::default(),
        Err(DomainError::ProbeUnavailable("ffprobe not found".to_string())),
    );
    let plan = EditPlan::new(vec![Segment::keep(0.0, 12.5)]);

    let report = harness
        .interactor
        .run_plan(&harness.source, plan, &CancelToken::never())
        .await
        .unwrap();

    assert!(!report.plan.is_probed());
    assert_eq!(report.plan.segments()[0].end_sec, 12.5);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("ffprobe not found"));
}

#[tokio::test]
async fn test_missing_source_fails_without_tool_calls() {
    let harness = Harness::new(FakeTranscoder::default(), Ok(30.0));
    let missing = harness.path("absent.mp4");

    let failure = harness
        .interactor
        .run_plan(&missing, scenario_a_plan(), &CancelToken::never())
        .await
        .unwrap_err();

    assert_eq!(failure.errors, vec![DomainError::SourceMissing(missing)]);
    assert!(harness.transcoder.operations().is_empty());
}

#[tokio::test]
async fn test_translator_error_is_surfaced_verbatim() {
    let error = DomainError::TranslatorHttpError {
        status: 503,
        body: "model loading".to_string(),
    };
    let harness = Harness::with_translator(
        FakeTranscoder::default(),
        Ok(30.0),
        FakeTranslator::replying(Err(error.clone())),
    );

    let failure = harness
        .interactor
        .run_instruction(&harness.source, "make it pop", &CancelToken::never())
        .await
        .unwrap_err();

    assert_eq!(failure.state, PipelineState::Extracting);
    assert_eq!(failure.errors, vec![error]);
    assert!(failure.errors[0].is_translator_error());
    assert!(harness.transcoder.operations().is_empty());
}

#[tokio::test]
async fn test_prose_without_plan_is_malformed() {
    let harness = Harness::new(FakeTranscoder::default(), Ok(30.0));

    let failure = harness
        .interactor
        .run_text(&harness.source, "I could not understand the request.", &CancelToken::never())
        .await
        .unwrap_err();

    assert!(matches!(failure.primary(), Some(DomainError::MalformedPlan { .. })));
    assert_eq!(harness.files(), vec!["clip.mp4"]);
}
