//! Viewer configuration stored under `<root>/.codeview/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::fold::FoldOptions;
use crate::core::types::RunPolicy;

pub const CONFIG_DIR: &str = ".codeview";
pub const CONFIG_FILE: &str = "config.toml";

/// Default config location for a project root.
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Viewer configuration (TOML).
///
/// Intended to be edited by humans. Missing tables and fields fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ViewerConfig {
    pub fold: FoldOptions,
    pub format: FormatConfig,
    pub toolchain: ToolchainConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FormatConfig {
    /// Spaces per brace depth.
    pub indent_width: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self { indent_width: 4 }
    }
}

/// Commands run with the project root as working directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolchainConfig {
    pub compile: Vec<String>,
    pub run: Vec<String>,
    pub clean: Vec<String>,
    /// Keep at most this many bytes of each output stream per stage.
    pub output_limit_bytes: usize,
    /// Per-stage wall-clock limit. Unset means wait indefinitely.
    pub timeout_secs: Option<u64>,
    /// Let the run stage read the terminal's stdin. Other stages never do.
    pub run_inherits_stdin: bool,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compile: vec!["make".to_string()],
            run: vec!["make".to_string(), "run".to_string()],
            clean: vec!["make".to_string(), "clean".to_string()],
            output_limit_bytes: 100_000,
            timeout_secs: None,
            run_inherits_stdin: true,
        }
    }
}

impl ToolchainConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    pub run_policy: RunPolicy,
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fold.display_width == 0 {
            return Err(anyhow!("fold.display_width must be > 0"));
        }
        for (name, token) in [
            ("fold.region_open", &self.fold.region_open),
            ("fold.region_close", &self.fold.region_close),
            ("fold.doc_open", &self.fold.doc_open),
            ("fold.doc_close", &self.fold.doc_close),
        ] {
            if token.trim().is_empty() {
                return Err(anyhow!("{name} must not be empty"));
            }
        }
        if self.format.indent_width == 0 {
            return Err(anyhow!("format.indent_width must be > 0"));
        }
        for (name, command) in [
            ("toolchain.compile", &self.toolchain.compile),
            ("toolchain.run", &self.toolchain.run),
            ("toolchain.clean", &self.toolchain.clean),
        ] {
            if command.is_empty() || command[0].trim().is_empty() {
                return Err(anyhow!("{name} must be a non-empty array"));
            }
        }
        if self.toolchain.output_limit_bytes == 0 {
            return Err(anyhow!("toolchain.output_limit_bytes must be > 0"));
        }
        if self.toolchain.timeout_secs == Some(0) {
            return Err(anyhow!("toolchain.timeout_secs must be > 0 when set"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ViewerConfig::default()`.
pub fn load_config(path: &Path) -> Result<ViewerConfig> {
    if !path.exists() {
        let cfg = ViewerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ViewerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ViewerConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
