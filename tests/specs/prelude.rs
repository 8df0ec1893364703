//! Test helpers for behavioral specifications.
//!
//! Provides a high-level DSL for invoking the `panicforged` binary the way
//! a user would, mirroring the CLI-builder style the rest of the pack's
//! workspace-level specs use.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Returns the path to the built `panicforged` binary, checking
/// llvm-cov's target directory first so coverage runs find it too.
fn binary_path() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug/panicforged");
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug/panicforged");
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join("panicforged");
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

/// Create a CLI builder for `panicforged` invocations.
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

pub struct CliBuilder {
    args: Vec<String>,
}

impl CliBuilder {
    fn new() -> Self {
        Self { args: Vec::new() }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn command(self) -> Command {
        let mut cmd = Command::new(binary_path());
        cmd.args(&self.args);
        cmd
    }

    /// Run and expect success (exit code 0).
    pub fn passes(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code).
    pub fn fails(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            self.stdout().contains(needle),
            "expected stdout to contain {needle:?}, got: {}",
            self.stdout()
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            self.stderr().contains(needle),
            "expected stderr to contain {needle:?}, got: {}",
            self.stderr()
        );
        self
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.output.status.code()
    }
}

/// Returns an almost-certainly-free TCP port for the IPC server to bind.
/// Binding port 0 and reading back the assigned port avoids races that a
/// fixed port would risk across parallel test processes.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}

/// Writes a minimal valid `panicforged` config file to `dir` and returns
/// its path. `ipc_port` and `store_path`/`base_repo_path` are the only
/// knobs callers need to vary per test.
pub fn write_config(dir: &Path, ipc_port: u16, store_path: &Path, base_repo_path: &Path) -> PathBuf {
    let config_path = dir.join("panicforge.toml");
    let contents = format!(
        r#"
store_path = {store_path:?}
base_repo_path = {base_repo_path:?}
max_parallel_panics = 1
ipc_port = {ipc_port}
dry_run = true

[budgets]
reproducer_ms = 60000
fixer_ms = 60000

[git]
host_token = "test-token"
repo_slug = "example/repo"
pr_reviewer = "octocat"
pr_labels = ["panic-fix"]
"#
    );
    std::fs::write(&config_path, contents).expect("write config");
    config_path
}
