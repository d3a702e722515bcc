//! Compile-then-run orchestration off the interactive thread.
//!
//! One worker thread per triggered build runs the toolchain stages
//! sequentially. The worker reports `BuildState` transitions, stage output
//! and stage failures only through the caller's [`PipelineContext`], and
//! checks the context's liveness token before every dispatch.
//!
//! Overlapping invocations are not serialized. The `Running` event lets the
//! presentation disable its build control, but a second trigger that lands
//! before that event is applied will start a second worker. The pipeline
//! counts workers in flight, so [`CompileRunPipeline::state`] stays `Running`
//! until the last one finishes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::types::{BuildState, Notification, PipelineResult, RunPolicy, Stage, StageReport};
use crate::error::StageFailure;
use crate::io::toolchain::Toolchain;
use crate::io::ui::{LivenessToken, UiDispatcher, UiEvent};

const FAILURE_TITLE: &str = "Warning";
const ERROR_TITLE: &str = "Error";

/// Where a worker sends its events, and whether anyone is still listening.
#[derive(Clone)]
pub struct PipelineContext {
    pub dispatcher: Arc<dyn UiDispatcher>,
    pub liveness: LivenessToken,
}

impl PipelineContext {
    fn signal(&self, event: UiEvent) {
        if self.liveness.is_alive() {
            self.dispatcher.dispatch(event);
        } else {
            debug!(?event, "surface closed, event not dispatched");
        }
    }
}

pub struct CompileRunPipeline<T> {
    toolchain: Arc<T>,
    policy: RunPolicy,
    clean_after_run: bool,
    in_flight: Arc<AtomicUsize>,
}

impl<T> Clone for CompileRunPipeline<T> {
    fn clone(&self) -> Self {
        Self {
            toolchain: Arc::clone(&self.toolchain),
            policy: self.policy,
            clean_after_run: self.clean_after_run,
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<T: Toolchain + 'static> CompileRunPipeline<T> {
    pub fn new(toolchain: T, policy: RunPolicy) -> Self {
        Self {
            toolchain: Arc::new(toolchain),
            policy,
            clean_after_run: false,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Also invoke the toolchain's clean stage after run.
    pub fn with_clean_after_run(mut self, clean: bool) -> Self {
        self.clean_after_run = clean;
        self
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    pub fn policy(&self) -> RunPolicy {
        self.policy
    }

    /// `Running` while any worker of this pipeline (or its clones) is executing.
    pub fn state(&self) -> BuildState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            BuildState::Running
        } else {
            BuildState::Idle
        }
    }

    /// Start a worker thread running [`Self::execute`] for `root`.
    pub fn spawn(&self, root: PathBuf, ctx: PipelineContext) -> Result<JoinHandle<PipelineResult>> {
        let pipeline = self.clone();
        thread::Builder::new()
            .name("codeview-build".to_string())
            .spawn(move || pipeline.execute(&root, &ctx))
            .context("spawn build worker")
    }

    /// Run compile then run for `root` on the current thread.
    ///
    /// Emits exactly one `Running` then one `Idle` transition (when the
    /// surface is alive), whatever the stage outcomes. A failed stage raises
    /// one notification naming it; a passing stage that printed something
    /// raises one info notification carrying its transcript.
    #[instrument(skip_all, fields(root = %root.display(), policy = ?self.policy))]
    pub fn execute(&self, root: &Path, ctx: &PipelineContext) -> PipelineResult {
        let _idle = self.enter_running(ctx);

        let compiled = self.stage(Stage::Compile, root, ctx);
        let ran = if compiled || self.policy == RunPolicy::Always {
            self.stage(Stage::Run, root, ctx)
        } else {
            info!("compile failed, skipping run");
            false
        };
        let cleaned = self
            .clean_after_run
            .then(|| self.stage(Stage::Clean, root, ctx));

        info!(compiled, ran, ?cleaned, "pipeline finished");
        PipelineResult {
            compiled,
            ran,
            cleaned,
        }
    }

    fn enter_running<'a>(&'a self, ctx: &'a PipelineContext) -> IdleOnDrop<'a> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        ctx.signal(UiEvent::BuildState(BuildState::Running));
        IdleOnDrop {
            in_flight: &self.in_flight,
            ctx,
        }
    }

    fn stage(&self, stage: Stage, root: &Path, ctx: &PipelineContext) -> bool {
        let outcome = match stage {
            Stage::Compile => self.toolchain.compile(root),
            Stage::Run => self.toolchain.run(root),
            Stage::Clean => self.toolchain.clean(root),
        };
        let notification = match outcome {
            Ok(StageReport {
                success: true,
                output,
            }) => {
                if !output.trim().is_empty() {
                    ctx.signal(UiEvent::Notify(Notification::info(
                        format!("{stage} output"),
                        output,
                    )));
                }
                return true;
            }
            Ok(report) => {
                let failure = StageFailure {
                    stage,
                    reason: failure_reason(&report.output),
                };
                warn!(%stage, reason = %failure.reason, "stage failed");
                Notification::warning(FAILURE_TITLE, failure.to_string())
            }
            Err(err) => {
                let failure = StageFailure {
                    stage,
                    reason: format!("{err:#}"),
                };
                warn!(%stage, reason = %failure.reason, "stage could not be started");
                Notification::error(ERROR_TITLE, failure.to_string())
            }
        };
        ctx.signal(UiEvent::Notify(notification));
        false
    }
}

/// Releases the in-flight slot and signals `Idle` even if a stage panics.
struct IdleOnDrop<'a> {
    in_flight: &'a AtomicUsize,
    ctx: &'a PipelineContext,
}

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.ctx.signal(UiEvent::BuildState(BuildState::Idle));
    }
}

fn failure_reason(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        "toolchain reported failure".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Severity;
    use crate::test_support::{RecordingDispatcher, Scripted, ScriptedToolchain};
    use crate::io::ui::SurfaceLifetime;

    fn context(lifetime: &SurfaceLifetime) -> (Arc<RecordingDispatcher>, PipelineContext) {
        let recorder = Arc::new(RecordingDispatcher::default());
        let ctx = PipelineContext {
            dispatcher: recorder.clone(),
            liveness: lifetime.token(),
        };
        (recorder, ctx)
    }

    #[test]
    fn failed_compile_still_runs_under_always_policy() {
        let lifetime = SurfaceLifetime::new();
        let (recorder, ctx) = context(&lifetime);
        let pipeline = CompileRunPipeline::new(
            ScriptedToolchain::new(Scripted::Fail, Scripted::Pass),
            RunPolicy::Always,
        );

        let result = pipeline.execute(Path::new("/hw"), &ctx);

        assert_eq!(
            result,
            PipelineResult {
                compiled: false,
                ran: true,
                cleaned: None
            }
        );
        assert_eq!(pipeline.toolchain().calls(), vec![Stage::Compile, Stage::Run]);
        assert_eq!(
            recorder.build_states(),
            vec![BuildState::Running, BuildState::Idle]
        );
        let notes = recorder.notifications();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.starts_with("compile failed"));
        assert_eq!(pipeline.state(), BuildState::Idle);
    }

    #[test]
    fn skip_policy_does_not_run_after_failed_compile() {
        let lifetime = SurfaceLifetime::new();
        let (recorder, ctx) = context(&lifetime);
        let pipeline = CompileRunPipeline::new(
            ScriptedToolchain::new(Scripted::Fail, Scripted::Pass),
            RunPolicy::SkipOnCompileFailure,
        );

        let result = pipeline.execute(Path::new("/hw"), &ctx);

        assert!(!result.compiled);
        assert!(!result.ran);
        assert_eq!(pipeline.toolchain().calls(), vec![Stage::Compile]);
        assert_eq!(recorder.notifications().len(), 1);
    }

    #[test]
    fn success_emits_only_the_state_pair() {
        let lifetime = SurfaceLifetime::new();
        let (recorder, ctx) = context(&lifetime);
        let pipeline = CompileRunPipeline::new(
            ScriptedToolchain::new(Scripted::Pass, Scripted::Pass),
            RunPolicy::Always,
        );

        let result = pipeline.execute(Path::new("/hw"), &ctx);

        assert!(result.compiled && result.ran);
        assert_eq!(
            recorder.events(),
            vec![
                UiEvent::BuildState(BuildState::Running),
                UiEvent::BuildState(BuildState::Idle)
            ]
        );
    }

    #[test]
    fn toolchain_error_counts_as_failed_stage() {
        let lifetime = SurfaceLifetime::new();
        let (recorder, ctx) = context(&lifetime);
        let pipeline = CompileRunPipeline::new(
            ScriptedToolchain::new(Scripted::Pass, Scripted::Error),
            RunPolicy::Always,
        );

        let result = pipeline.execute(Path::new("/hw"), &ctx);

        assert!(result.compiled);
        assert!(!result.ran);
        let notes = recorder.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].severity, Severity::Error);
        assert!(notes[0].message.contains("run failed"));
        assert!(notes[0].message.contains("scripted run error"));
    }

    #[test]
    fn passing_stage_output_is_shown_as_info() {
        let lifetime = SurfaceLifetime::new();
        let (recorder, ctx) = context(&lifetime);
        let pipeline = CompileRunPipeline::new(
            ScriptedToolchain::new(Scripted::Pass, Scripted::PassWith("Hello, grader\n")),
            RunPolicy::Always,
        );

        let result = pipeline.execute(Path::new("/hw"), &ctx);

        assert!(result.compiled && result.ran);
        assert_eq!(
            recorder.notifications(),
            vec![Notification::info("run output", "Hello, grader\n")]
        );
        assert_eq!(
            recorder.build_states(),
            vec![BuildState::Running, BuildState::Idle]
        );
    }

    #[test]
    fn state_stays_running_until_last_worker_finishes() {
        let lifetime = SurfaceLifetime::new();
        let (recorder, ctx) = context(&lifetime);
        let pipeline = CompileRunPipeline::new(
            ScriptedToolchain::new(Scripted::Pass, Scripted::Pass),
            RunPolicy::Always,
        );
        let second = pipeline.clone();

        let first_guard = pipeline.enter_running(&ctx);
        let second_guard = second.enter_running(&ctx);
        drop(first_guard);
        assert_eq!(pipeline.state(), BuildState::Running);
        assert_eq!(second.state(), BuildState::Running);

        drop(second_guard);
        assert_eq!(pipeline.state(), BuildState::Idle);
        assert_eq!(
            recorder.build_states(),
            vec![
                BuildState::Running,
                BuildState::Running,
                BuildState::Idle,
                BuildState::Idle
            ]
        );
    }

    #[test]
    fn closed_surface_receives_nothing() {
        let lifetime = SurfaceLifetime::new();
        let (recorder, ctx) = context(&lifetime);
        lifetime.close();
        let pipeline = CompileRunPipeline::new(
            ScriptedToolchain::new(Scripted::Fail, Scripted::Fail),
            RunPolicy::Always,
        );

        let result = pipeline.execute(Path::new("/hw"), &ctx);

        assert!(!result.compiled && !result.ran);
        assert!(recorder.events().is_empty());
        assert_eq!(pipeline.state(), BuildState::Idle);
    }

    #[test]
    fn clean_stage_is_opt_in() {
        let lifetime = SurfaceLifetime::new();
        let (_recorder, ctx) = context(&lifetime);
        let pipeline = CompileRunPipeline::new(
            ScriptedToolchain::new(Scripted::Pass, Scripted::Pass),
            RunPolicy::Always,
        )
        .with_clean_after_run(true);

        let result = pipeline.execute(Path::new("/hw"), &ctx);

        assert_eq!(result.cleaned, Some(true));
        assert_eq!(
            pipeline.toolchain().calls(),
            vec![Stage::Compile, Stage::Run, Stage::Clean]
        );
    }

    #[test]
    fn spawned_worker_returns_result() {
        let lifetime = SurfaceLifetime::new();
        let (recorder, ctx) = context(&lifetime);
        let pipeline = CompileRunPipeline::new(
            ScriptedToolchain::new(Scripted::Pass, Scripted::Fail),
            RunPolicy::Always,
        );

        let handle = pipeline.spawn(PathBuf::from("/hw"), ctx).expect("spawn");
        let result = handle.join().expect("join");

        assert!(result.compiled);
        assert!(!result.ran);
        assert_eq!(pipeline.state(), BuildState::Idle);
        assert_eq!(
            recorder.build_states(),
            vec![BuildState::Running, BuildState::Idle]
        );
    }

    #[test]
    fn panicking_stage_still_restores_idle() {
        let lifetime = SurfaceLifetime::new();
        let (recorder, ctx) = context(&lifetime);
        let pipeline = CompileRunPipeline::new(
            ScriptedToolchain::new(Scripted::Panic, Scripted::Pass),
            RunPolicy::Always,
        );

        let handle = pipeline.spawn(PathBuf::from("/hw"), ctx).expect("spawn");
        assert!(handle.join().is_err());

        assert_eq!(pipeline.state(), BuildState::Idle);
        assert_eq!(
            recorder.build_states(),
            vec![BuildState::Running, BuildState::Idle]
        );
    }
}
