//! Test-only helpers: temp projects, scripted toolchains, recording UI sinks.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::core::types::{BuildState, Notification, Stage, StageReport};
use crate::io::toolchain::Toolchain;
use crate::io::ui::{BuildStateObserver, NotificationSink, UiDispatcher, UiEvent};

/// A throwaway project root on disk.
pub struct TempProject {
    dir: TempDir,
}

impl TempProject {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create tempdir")?;
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub fn mkdir(&self, relative: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        fs::create_dir_all(&path).with_context(|| format!("create {}", path.display()))?;
        Ok(path)
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.root().join(relative);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }

    /// Sorted names directly under the root.
    pub fn file_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.root()).context("read project root")? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

/// Predetermined outcome for one toolchain stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scripted {
    Pass,
    /// Pass with the given transcript.
    PassWith(&'static str),
    Fail,
    /// Return `Err`, as if the toolchain could not be started.
    Error,
    Panic,
}

/// Toolchain returning scripted outcomes and recording which stages ran.
#[derive(Debug)]
pub struct ScriptedToolchain {
    compile: Scripted,
    run: Scripted,
    clean: Scripted,
    calls: Mutex<Vec<Stage>>,
}

impl ScriptedToolchain {
    pub fn new(compile: Scripted, run: Scripted) -> Self {
        Self {
            compile,
            run,
            clean: Scripted::Pass,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Stage> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn stage(&self, stage: Stage, outcome: Scripted) -> Result<StageReport> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(stage);
        match outcome {
            Scripted::Pass => Ok(StageReport::passed()),
            Scripted::PassWith(output) => Ok(StageReport {
                success: true,
                output: output.to_string(),
            }),
            Scripted::Fail => Ok(StageReport::failed(format!("scripted {stage} failure"))),
            Scripted::Error => Err(anyhow!("scripted {stage} error")),
            Scripted::Panic => panic!("scripted {stage} panic"),
        }
    }
}

impl Toolchain for ScriptedToolchain {
    fn compile(&self, _root: &Path) -> Result<StageReport> {
        self.stage(Stage::Compile, self.compile)
    }

    fn run(&self, _root: &Path) -> Result<StageReport> {
        self.stage(Stage::Run, self.run)
    }

    fn clean(&self, _root: &Path) -> Result<StageReport> {
        self.stage(Stage::Clean, self.clean)
    }
}

/// Dispatcher that records every event it receives.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingDispatcher {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn build_states(&self) -> Vec<BuildState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::BuildState(state) => Some(state),
                UiEvent::Notify(_) => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Notify(notification) => Some(notification),
                UiEvent::BuildState(_) => None,
            })
            .collect()
    }
}

impl UiDispatcher for RecordingDispatcher {
    fn dispatch(&self, event: UiEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Presenter standing in for the build button and message boxes.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub control_enabled: Vec<bool>,
    pub shown: Vec<Notification>,
}

impl BuildStateObserver for RecordingPresenter {
    fn on_build_state(&mut self, state: BuildState) {
        self.control_enabled.push(state == BuildState::Idle);
    }
}

impl NotificationSink for RecordingPresenter {
    fn show(&mut self, notification: &Notification) {
        self.shown.push(notification.clone());
    }
}
