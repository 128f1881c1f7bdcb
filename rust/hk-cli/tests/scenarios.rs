//! End-to-end scenarios run through the built `hk` binary, one per
//! numbered case in the language's scenario table.

use std::io::Write;
use std::process::Command;

fn run(source: &str) -> (bool, String, String) {
    let mut file = tempfile().expect("create temp script");
    file.write_all(source.as_bytes()).expect("write script");
    let path = file.into_temp_path();

    let output = Command::new(env!("CARGO_BIN_EXE_hk"))
        .arg(&path)
        .output()
        .expect("spawn hk");

    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

/// Minimal named-temp-file helper, avoiding a `tempfile` crate dependency
/// for a handful of throwaway `.hk` scripts.
fn tempfile() -> std::io::Result<NamedTempFile> {
    let mut path = std::env::temp_dir();
    let unique = format!("hk-scenario-{}-{}.hk", std::process::id(), COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed));
    path.push(unique);
    let file = std::fs::File::create(&path)?;
    Ok(NamedTempFile { file, path })
}

static COUNTER: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

struct NamedTempFile {
    file: std::fs::File,
    path: std::path::PathBuf,
}

impl Write for NamedTempFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

impl NamedTempFile {
    fn into_temp_path(self) -> TempPath {
        TempPath(self.path)
    }
}

struct TempPath(std::path::PathBuf);

impl Drop for TempPath {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

impl AsRef<std::path::Path> for TempPath {
    fn as_ref(&self) -> &std::path::Path {
        &self.0
    }
}

#[test]
fn scenario_1_addition() {
    let (ok, stdout, stderr) = run("x = 3\nprint(x+4)\n");
    assert!(ok, "stderr: {stderr}");
    assert_eq!(stdout.trim(), "7");
}

#[test]
fn scenario_2_currying() {
    let (ok, stdout, stderr) = run("f = fn(a,b): a+b\nprint(f(2)(5))\n");
    assert!(ok, "stderr: {stderr}");
    assert_eq!(stdout.trim(), "7");
}

#[test]
fn scenario_3_infix_function() {
    let (ok, stdout, stderr) = run("infix fn plus(a,b): a+b\nprint(2 plus 3)\n");
    assert!(ok, "stderr: {stderr}");
    assert_eq!(stdout.trim(), "5");
}

#[test]
fn scenario_3_non_infix_function_used_infix_fails() {
    let (ok, _stdout, stderr) = run("fn plus(a,b): a+b\nprint(2 plus 3)\n");
    assert!(!ok);
    assert!(stderr.contains("E0203"), "stderr: {stderr}");
}

#[test]
fn scenario_4_matrix_transpose_pretty_prints() {
    let (ok, stdout, stderr) = run("A = [1,2;3,4]\nprint(A')\n");
    assert!(ok, "stderr: {stderr}");
    assert_eq!(stdout.trim_end(), "[ 1 3\n  2 4 ]");
}

#[test]
fn scenario_5_while_with_continue() {
    let (ok, stdout, stderr) = run("x = 0\nwhile x < 3:\n\tx += 1\n\tif x == 2: continue\nprint(x)\n");
    assert!(ok, "stderr: {stderr}");
    assert_eq!(stdout.trim(), "3");
}

#[test]
fn scenario_6_sqrt_of_negative_is_complex() {
    let (ok, stdout, stderr) = run("print(sqrt(-4))\n");
    assert!(ok, "stderr: {stderr}");
    assert_eq!(stdout.trim(), "0.0 + 2.0i");
}

#[test]
fn no_pretty_print_flag_disables_matrix_padding() {
    let mut file = tempfile().expect("create temp script");
    file.write_all(b"A = [1,2;3,4]\nprint(A')\n").expect("write script");
    let path = file.into_temp_path();

    let output = Command::new(env!("CARGO_BIN_EXE_hk"))
        .arg("--no-pretty-print")
        .arg(&path)
        .output()
        .expect("spawn hk");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "[[1, 3], [2, 4]]");
}

#[test]
fn dump_tokens_emits_json() {
    let mut file = tempfile().expect("create temp script");
    file.write_all(b"x = 1\n").expect("write script");
    let path = file.into_temp_path();

    let output = Command::new(env!("CARGO_BIN_EXE_hk"))
        .arg("--dump-tokens")
        .arg(&path)
        .output()
        .expect("spawn hk");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.trim_start().starts_with('['));
}

#[test]
fn runtime_error_exits_non_zero_with_diagnostic() {
    let (ok, _stdout, stderr) = run("A = [1,2;3,4]\nB = [1,2,3]\nC = A + B\n");
    assert!(!ok);
    assert!(stderr.contains("E02"), "stderr: {stderr}");
}
