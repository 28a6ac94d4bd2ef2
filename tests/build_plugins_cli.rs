//! End-to-end tests for the `build-plugins` binary.
//!
//! A stand-in `cmake` script placed first on PATH records its arguments and
//! selected environment variables, and can be told to fail either step.

#![cfg(unix)]

use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const FAKE_CMAKE: &str = r#"#!/bin/sh
{
  echo "ARGS $*"
  echo "LAUNCHERS C=${CMAKE_C_COMPILER_LAUNCHER:-none} CXX=${CMAKE_CXX_COMPILER_LAUNCHER:-none}"
  echo "CI_VARS ${KDECI_CACHE_PATH:-unset} ${KDECI_BUILD_TYPE:-unset} ${KDECI_INTERNAL_USE_CCACHE:-unset}"
} >> "$FAKE_CMAKE_LOG"
case "$1" in
  --build)
    [ -n "$FAKE_CMAKE_FAIL_BUILD" ] && exit 2
    touch built.marker
    ;;
  *)
    [ -n "$FAKE_CMAKE_FAIL_CONFIGURE" ] && exit 1
    touch configured.marker
    ;;
esac
exit 0
"#;

struct Fixture {
    work: TempDir,
    cache: TempDir,
    bin: TempDir,
    log: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let work = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();

        let script = bin.path().join("cmake");
        fs::write(&script, FAKE_CMAKE).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let log = work.path().join("cmake-calls.log");
        Fixture { work, cache, bin, log }
    }

    fn build_dir(&self) -> PathBuf {
        self.work.path().join("_build_plugins")
    }

    fn command(&self, use_ccache: &str) -> Command {
        let path = format!(
            "{}:{}",
            self.bin.path().display(),
            std::env::var("PATH").unwrap_or_default()
        );
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_build-plugins"));
        cmd.current_dir(self.work.path())
            .env_clear()
            .env("PATH", path)
            .env("FAKE_CMAKE_LOG", &self.log)
            .env("KDECI_CACHE_PATH", self.cache.path())
            .env("KDECI_BUILD_TYPE", "Debug")
            .env("KDECI_INTERNAL_USE_CCACHE", use_ccache);
        cmd
    }

    fn calls(&self) -> String {
        fs::read_to_string(&self.log).unwrap_or_default()
    }

    fn raw_calls(&self) -> Vec<u8> {
        fs::read(&self.log).unwrap_or_default()
    }
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_successful_build_exits_zero() {
    let fixture = Fixture::new();
    let output = fixture.command("False").output().unwrap();

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(fixture.build_dir().join("configured.marker").exists());
    assert!(fixture.build_dir().join("built.marker").exists());
    assert!(fixture.cache.path().join("krita-deps").is_dir());

    let out = stdout(&output);
    assert!(out.contains("## RUNNING: cmake -G Ninja"));
    assert!(out.contains(&format!(
        "## RUNNING: cmake --build . --target all --parallel {}",
        num_cpus::get()
    )));

    let calls = fixture.calls();
    assert!(calls.contains("-DCMAKE_BUILD_TYPE=Debug"));
    assert!(calls.contains("LAUNCHERS C=none CXX=none"));
    assert!(!calls.contains("COMPILER_LAUNCHER=ccache"));
}

#[test]
fn test_ccache_true_sets_launchers_for_children() {
    let fixture = Fixture::new();
    let output = fixture.command("True").output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let calls = fixture.calls();
    assert!(calls.contains("-DCMAKE_C_COMPILER_LAUNCHER=ccache"));
    assert!(calls.contains("-DCMAKE_CXX_COMPILER_LAUNCHER=ccache"));
    assert_eq!(calls.matches("LAUNCHERS C=ccache CXX=ccache").count(), 2);
}

#[test]
fn test_ci_variables_are_consumed() {
    let fixture = Fixture::new();
    fixture.command("False").output().unwrap();

    for line in fixture.calls().lines().filter(|l| l.starts_with("CI_VARS")) {
        assert_eq!(line, "CI_VARS unset unset unset");
    }
}

#[test]
fn test_previous_build_tree_is_replaced() {
    let fixture = Fixture::new();
    fs::create_dir_all(fixture.build_dir().join("old")).unwrap();
    fs::write(fixture.build_dir().join("old/artifact.o"), b"stale").unwrap();

    let output = fixture.command("False").output().unwrap();
    assert_eq!(output.status.code(), Some(0));

    let mut entries: Vec<String> = fs::read_dir(fixture.build_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    entries.sort();
    assert_eq!(entries, vec!["built.marker", "configured.marker"]);
}

#[test]
fn test_configure_failure_exits_one_without_building() {
    let fixture = Fixture::new();
    let output = fixture
        .command("False")
        .env("FAKE_CMAKE_FAIL_CONFIGURE", "1")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("## Failed to configure plugins"));
    assert!(!out.contains("## Failed to build plugins"));
    assert!(!out.contains("--build"));
    assert!(!fixture.calls().contains("ARGS --build"));
}

#[test]
fn test_build_failure_exits_one() {
    let fixture = Fixture::new();
    let output = fixture
        .command("False")
        .env("FAKE_CMAKE_FAIL_BUILD", "1")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("## Failed to build plugins"));
    assert!(!out.contains("## Failed to configure plugins"));
}

#[test]
fn test_missing_variable_fails_before_touching_disk() {
    let fixture = Fixture::new();
    let output = fixture
        .command("False")
        .env_remove("KDECI_BUILD_TYPE")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("KDECI_BUILD_TYPE"));
    assert!(!fixture.build_dir().exists());
    assert!(fixture.calls().is_empty());
}

#[test]
fn test_dry_run_prints_without_running() {
    let fixture = Fixture::new();
    let output = fixture
        .command("True")
        .env("KDECI_DRY_RUN", "1")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("## RUNNING: cmake --build ."));
    assert!(fixture.build_dir().is_dir());
    assert!(fixture.calls().is_empty());
}

#[test]
fn test_empty_cache_path_uses_working_directory() {
    let fixture = Fixture::new();
    let output = fixture
        .command("False")
        .env("KDECI_CACHE_PATH", "")
        .output()
        .unwrap();

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(fixture.work.path().join("krita-deps").is_dir());
    assert!(fixture.calls().contains("-DEXTERNALS_DOWNLOAD_DIR=krita-deps "));
}

#[test]
fn test_non_utf8_cache_path_is_used_and_consumed() {
    let fixture = Fixture::new();
    let cache = fixture.cache.path().join(OsStr::from_bytes(b"cache\xff"));
    let output = fixture
        .command("False")
        .env("KDECI_CACHE_PATH", &cache)
        .output()
        .unwrap();

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(cache.join("krita-deps").is_dir());

    let mut expected = b"-DEXTERNALS_DOWNLOAD_DIR=".to_vec();
    expected.extend_from_slice(cache.join("krita-deps").as_os_str().as_bytes());
    let calls = fixture.raw_calls();
    assert!(contains_bytes(&calls, &expected));
    assert!(contains_bytes(&calls, b"CI_VARS unset unset unset"));
}
