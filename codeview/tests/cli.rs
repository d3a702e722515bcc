//! CLI tests: spawn the `codeview` binary and check output and exit codes.

use std::process::Command;

use codeview::exit_codes;
use codeview::io::config::{ViewerConfig, config_path, write_config};
use codeview::test_support::TempProject;

fn codeview() -> Command {
    Command::new(env!("CARGO_BIN_EXE_codeview"))
}

#[test]
fn ls_lists_directories_first() {
    let project = TempProject::new().expect("project");
    project.write("b.cpp", "").expect("seed");
    project.write("src/a.cpp", "").expect("seed");

    let output = codeview()
        .arg("ls")
        .arg(project.root())
        .output()
        .expect("codeview ls");
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "src/\nb.cpp\n");

    let output = codeview()
        .arg("ls")
        .arg(project.root())
        .arg("src")
        .output()
        .expect("codeview ls src");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "../\na.cpp\n");
}

#[test]
fn ls_refuses_to_leave_root() {
    let project = TempProject::new().expect("project");
    let status = codeview()
        .arg("ls")
        .arg(project.root())
        .arg("..")
        .status()
        .expect("codeview ls ..");
    assert_eq!(status.code(), Some(exit_codes::INVALID));
}

#[test]
fn folds_json_reports_markers() {
    let project = TempProject::new().expect("project");
    let file = project.write("main.cpp", "{\n{\n}\n}\n").expect("seed");

    let output = codeview()
        .arg("folds")
        .arg(&file)
        .arg("--json")
        .output()
        .expect("codeview folds");
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let markers = value["markers"].as_array().expect("markers");
    assert_eq!(markers.len(), 2);
    assert_eq!(markers[0]["start_line"], 1);
    assert_eq!(markers[1]["start_line"], 0);
    assert_eq!(markers[0]["end_column"], 57);
}

#[test]
fn format_write_reindents_file() {
    let project = TempProject::new().expect("project");
    let file = project
        .write("main.cpp", "int main() {\nreturn 0;\n}\n")
        .expect("seed");

    let status = codeview()
        .args(["format", "--indent", "2", "--write"])
        .arg(&file)
        .status()
        .expect("codeview format");
    assert_eq!(status.code(), Some(exit_codes::OK));
    assert_eq!(
        project.read("main.cpp").expect("read"),
        "int main() {\n  return 0;\n}\n"
    );
}

#[cfg(unix)]
fn write_sh_config(project: &TempProject, compile: &str, run: &str) {
    write_sh_config_with_clean(project, compile, run, "true");
}

#[cfg(unix)]
fn write_sh_config_with_clean(project: &TempProject, compile: &str, run: &str, clean: &str) {
    let sh = |script: &str| vec!["sh".to_string(), "-c".to_string(), script.to_string()];
    let mut cfg = ViewerConfig::default();
    cfg.toolchain.compile = sh(compile);
    cfg.toolchain.run = sh(run);
    cfg.toolchain.clean = sh(clean);
    write_config(&config_path(project.root()), &cfg).expect("write config");
}

#[cfg(unix)]
#[test]
fn build_reports_compile_failure_and_still_runs() {
    let project = TempProject::new().expect("project");
    write_sh_config(&project, "exit 1", "touch ran");

    let output = codeview()
        .arg("build")
        .arg(project.root())
        .output()
        .expect("codeview build");

    assert_eq!(output.status.code(), Some(exit_codes::COMPILE_FAILED));
    assert!(String::from_utf8_lossy(&output.stderr).contains("compile failed"));
    assert!(project.root().join("ran").exists());
}

#[cfg(unix)]
#[test]
fn build_skip_flag_suppresses_run() {
    let project = TempProject::new().expect("project");
    write_sh_config(&project, "exit 1", "touch ran");

    let status = codeview()
        .arg("build")
        .arg(project.root())
        .arg("--skip-run-on-compile-failure")
        .status()
        .expect("codeview build");

    assert_eq!(status.code(), Some(exit_codes::COMPILE_FAILED));
    assert!(!project.root().join("ran").exists());
}

#[cfg(unix)]
#[test]
fn build_success_exits_ok() {
    let project = TempProject::new().expect("project");
    write_sh_config(&project, "touch built", "test -f built");

    let status = codeview()
        .arg("build")
        .arg(project.root())
        .status()
        .expect("codeview build");

    assert_eq!(status.code(), Some(exit_codes::OK));
}

#[cfg(unix)]
#[test]
fn build_prints_program_output_and_forwards_stdin() {
    use std::io::Write;
    use std::process::Stdio;

    let project = TempProject::new().expect("project");
    write_sh_config(
        &project,
        "true",
        "echo HELLO_FROM_PROGRAM; read x; echo got:$x",
    );

    let mut child = codeview()
        .arg("build")
        .arg(project.root())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn codeview build");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"42\n")
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait codeview build");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("HELLO_FROM_PROGRAM"), "stdout: {stdout}");
    assert!(stdout.contains("got:42"), "stdout: {stdout}");
}

#[cfg(unix)]
#[test]
fn build_clean_failure_exits_clean_failed() {
    let project = TempProject::new().expect("project");
    write_sh_config_with_clean(&project, "true", "true", "echo cannot clean 1>&2; exit 1");

    let output = codeview()
        .arg("build")
        .arg(project.root())
        .arg("--clean")
        .output()
        .expect("codeview build");

    assert_eq!(output.status.code(), Some(exit_codes::CLEAN_FAILED));
    assert!(String::from_utf8_lossy(&output.stderr).contains("clean failed: cannot clean"));
}
