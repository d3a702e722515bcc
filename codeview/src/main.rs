//! `codeview`: browse a homework submission, inspect folds, build and run it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};

use codeview::core::fold::{FoldExtraction, extract_from_text};
use codeview::core::format::format_code;
use codeview::core::types::{BuildState, Notification, PipelineResult, RunPolicy, Severity};
use codeview::exit_codes;
use codeview::io::config::{ViewerConfig, config_path, load_config, write_config};
use codeview::io::document::{load_text, save_text};
use codeview::io::fs_query::StdFileSystem;
use codeview::io::toolchain::CommandToolchain;
use codeview::io::ui::{self, BuildStateObserver, NotificationSink, SurfaceLifetime};
use codeview::logging;
use codeview::pipeline::{CompileRunPipeline, PipelineContext};
use codeview::session::Session;

#[derive(Parser)]
#[command(
    name = "codeview",
    version,
    about = "Browse, fold, and build homework source trees"
)]
struct Cli {
    /// Config file (defaults to `<root>/.codeview/config.toml` for root commands).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default `.codeview/config.toml` under the project root.
    Init {
        root: PathBuf,
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// List a directory of the project, descending through `dirs` from the root.
    Ls { root: PathBuf, dirs: Vec<String> },
    /// Print fold markers for a source file.
    Folds {
        file: PathBuf,
        #[arg(long)]
        json: bool,
        /// End column reported on every marker.
        #[arg(long)]
        width: Option<usize>,
    },
    /// Re-indent a source file by brace depth.
    Format {
        file: PathBuf,
        #[arg(long)]
        indent: Option<usize>,
        /// Rewrite the file instead of printing to stdout.
        #[arg(short, long)]
        write: bool,
    },
    /// Compile then run the project with the configured toolchain.
    Build {
        root: PathBuf,
        /// Do not run when compilation fails.
        #[arg(long)]
        skip_run_on_compile_failure: bool,
        /// Invoke the clean command after run.
        #[arg(long)]
        clean: bool,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = cli.config.as_deref();
    match cli.command {
        Command::Init { root, force } => cmd_init(&root, config, force),
        Command::Ls { root, dirs } => cmd_ls(&root, config, &dirs),
        Command::Folds { file, json, width } => cmd_folds(&file, config, json, width),
        Command::Format {
            file,
            indent,
            write,
        } => cmd_format(&file, config, indent, write),
        Command::Build {
            root,
            skip_run_on_compile_failure,
            clean,
        } => cmd_build(&root, config, skip_run_on_compile_failure, clean),
    }
}

/// Config for commands scoped to a project root.
fn root_config(root: &Path, explicit: Option<&Path>) -> Result<ViewerConfig> {
    let path = explicit.map_or_else(|| config_path(root), Path::to_path_buf);
    load_config(&path).context("load config")
}

/// Config for commands working on a single file: explicit path or defaults.
fn file_config(explicit: Option<&Path>) -> Result<ViewerConfig> {
    match explicit {
        Some(path) => load_config(path).context("load config"),
        None => Ok(ViewerConfig::default()),
    }
}

fn cmd_init(root: &Path, explicit: Option<&Path>, force: bool) -> Result<i32> {
    if !root.is_dir() {
        return Err(anyhow!("{} is not a directory", root.display()));
    }
    let path = explicit.map_or_else(|| config_path(root), Path::to_path_buf);
    if !force && path.exists() {
        println!("{} already exists", path.display());
        return Ok(exit_codes::OK);
    }
    write_config(&path, &ViewerConfig::default())?;
    println!("wrote {}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_ls(root: &Path, explicit: Option<&Path>, dirs: &[String]) -> Result<i32> {
    let cfg = root_config(root, explicit)?;
    let mut session = Session::open(StdFileSystem, root, cfg.fold)?;
    for dir in dirs {
        session.enter(dir)?;
    }
    let listing = session.list()?;
    if listing.show_parent {
        println!("../");
    }
    for entry in &listing.entries {
        if entry.is_directory {
            println!("{}/", entry.name);
        } else {
            println!("{}", entry.name);
        }
    }
    Ok(exit_codes::OK)
}

fn cmd_folds(file: &Path, explicit: Option<&Path>, json: bool, width: Option<usize>) -> Result<i32> {
    let mut cfg = file_config(explicit)?;
    if let Some(width) = width {
        cfg.fold.display_width = width;
        cfg.validate()?;
    }
    let text = load_text(file)?;
    let folds = extract_from_text(&text, &cfg.fold);
    if json {
        let payload = serde_json::to_string_pretty(&folds).context("serialize folds")?;
        println!("{payload}");
    } else {
        print_folds(&folds);
    }
    Ok(exit_codes::OK)
}

fn print_folds(folds: &FoldExtraction) {
    for marker in &folds.markers {
        println!(
            "{:<11} {}:{}-{}:{} {}",
            marker.kind.to_string(),
            marker.start_line + 1,
            marker.start_column,
            marker.end_line + 1,
            marker.end_column,
            marker.label
        );
    }
    for diagnostic in &folds.diagnostics {
        eprintln!("warning: {diagnostic}");
    }
}

fn cmd_format(
    file: &Path,
    explicit: Option<&Path>,
    indent: Option<usize>,
    write: bool,
) -> Result<i32> {
    let mut cfg = file_config(explicit)?;
    if let Some(indent) = indent {
        cfg.format.indent_width = indent;
        cfg.validate()?;
    }
    let text = load_text(file)?;
    let formatted = format_code(&text, cfg.format.indent_width);
    if write {
        save_text(file, &formatted)?;
    } else {
        print!("{formatted}");
    }
    Ok(exit_codes::OK)
}

/// Terminal stand-in for the build button and message boxes.
struct TerminalPresenter;

impl BuildStateObserver for TerminalPresenter {
    fn on_build_state(&mut self, state: BuildState) {
        tracing::debug!(?state, "build state changed");
    }
}

impl NotificationSink for TerminalPresenter {
    /// Stage output goes to stdout as-is; warnings and errors go to stderr.
    fn show(&mut self, notification: &Notification) {
        match notification.severity {
            Severity::Info => {
                print!("{}", notification.message);
                if !notification.message.ends_with('\n') {
                    println!();
                }
            }
            Severity::Warning | Severity::Error => {
                eprintln!("[{}] {}", notification.title, notification.message);
            }
        }
    }
}

fn cmd_build(
    root: &Path,
    explicit: Option<&Path>,
    skip_run_on_compile_failure: bool,
    clean: bool,
) -> Result<i32> {
    let cfg = root_config(root, explicit)?;
    let session = Session::open(StdFileSystem, root, cfg.fold.clone())?;
    let policy = if skip_run_on_compile_failure {
        RunPolicy::SkipOnCompileFailure
    } else {
        cfg.pipeline.run_policy
    };
    let pipeline = CompileRunPipeline::new(CommandToolchain::from_config(&cfg.toolchain), policy)
        .with_clean_after_run(clean);

    let surface = SurfaceLifetime::new();
    let (dispatcher, events) = ui::channel();
    let ctx = PipelineContext {
        dispatcher: Arc::new(dispatcher),
        liveness: surface.token(),
    };
    let worker = pipeline.spawn(session.root().to_path_buf(), ctx)?;

    ui::pump_until_closed(&events, &mut TerminalPresenter);
    let result = worker
        .join()
        .map_err(|_| anyhow!("build worker panicked"))?;

    Ok(build_exit_code(&result))
}

fn build_exit_code(result: &PipelineResult) -> i32 {
    if !result.compiled {
        exit_codes::COMPILE_FAILED
    } else if !result.ran {
        exit_codes::RUN_FAILED
    } else if result.cleaned == Some(false) {
        exit_codes::CLEAN_FAILED
    } else {
        exit_codes::OK
    }
}
