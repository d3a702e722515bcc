//! External compiler toolchain abstraction.
//!
//! The [`Toolchain`] trait decouples the build pipeline from the actual
//! compiler. Tests use scripted toolchains that return predetermined stage
//! outcomes without spawning processes.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::core::types::{Stage, StageReport};
use crate::io::config::ToolchainConfig;
use crate::io::process::run_captured;

/// Build, run and clean a source tree rooted at `root`.
///
/// `Ok` with `success = false` is a reported failure; `Err` means the stage
/// could not be attempted at all. The pipeline treats both as a failed stage.
pub trait Toolchain: Send + Sync {
    fn compile(&self, root: &Path) -> Result<StageReport>;
    fn run(&self, root: &Path) -> Result<StageReport>;
    fn clean(&self, root: &Path) -> Result<StageReport>;
}

/// Toolchain that spawns configured argv vectors in the project root.
#[derive(Debug, Clone)]
pub struct CommandToolchain {
    compile: Vec<String>,
    run: Vec<String>,
    clean: Vec<String>,
    timeout: Option<Duration>,
    output_limit_bytes: usize,
    run_inherits_stdin: bool,
}

impl CommandToolchain {
    pub fn from_config(cfg: &ToolchainConfig) -> Self {
        Self {
            compile: cfg.compile.clone(),
            run: cfg.run.clone(),
            clean: cfg.clean.clone(),
            timeout: cfg.timeout(),
            output_limit_bytes: cfg.output_limit_bytes,
            run_inherits_stdin: cfg.run_inherits_stdin,
        }
    }

    fn argv(&self, stage: Stage) -> &[String] {
        match stage {
            Stage::Compile => &self.compile,
            Stage::Run => &self.run,
            Stage::Clean => &self.clean,
        }
    }

    #[instrument(skip_all, fields(stage = %stage, root = %root.display()))]
    fn stage(&self, stage: Stage, root: &Path) -> Result<StageReport> {
        let (program, args) = self
            .argv(stage)
            .split_first()
            .ok_or_else(|| anyhow!("no {stage} command configured"))?;
        info!(program = %program, "starting {stage}");

        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(root);
        let inherit_stdin = stage == Stage::Run && self.run_inherits_stdin;
        let output = run_captured(cmd, self.timeout, self.output_limit_bytes, inherit_stdin)
            .with_context(|| format!("run {stage} command"))?;

        if output.timed_out {
            warn!(timeout = ?self.timeout, "{stage} timed out");
        } else if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "{stage} failed");
        } else {
            debug!("{stage} succeeded");
        }
        Ok(StageReport {
            success: output.success(),
            output: output.transcript(),
        })
    }
}

impl Toolchain for CommandToolchain {
    fn compile(&self, root: &Path) -> Result<StageReport> {
        self.stage(Stage::Compile, root)
    }

    fn run(&self, root: &Path) -> Result<StageReport> {
        self.stage(Stage::Run, root)
    }

    fn clean(&self, root: &Path) -> Result<StageReport> {
        self.stage(Stage::Clean, root)
    }
}
