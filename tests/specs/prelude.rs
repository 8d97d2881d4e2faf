// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fluent helpers shared by the specs.

use assert_cmd::Command;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Output;

pub struct Cli {
    cmd: Command,
}

/// `burner` with an isolated environment: no user config, no color.
pub fn cli() -> Cli {
    let mut cmd = Command::cargo_bin("burner").expect("burner binary");
    cmd.env("NO_COLOR", "1")
        .env("BURNER_CONFIG", "/nonexistent/burner.toml")
        .env_remove("BURNER_LOG")
        .env("BURNER_TICK_MS", "10");
    Cli { cmd }
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    fn run(mut self) -> Run {
        let output = self.cmd.output().expect("run burner");
        Run { output }
    }

    /// Run and expect success.
    pub fn passes(self) -> Run {
        let run = self.run();
        assert!(run.output.status.success(), "expected success\n{}", run.describe());
        run
    }

    /// Run and expect exit `code`.
    pub fn exits(self, code: i32) -> Run {
        let run = self.run();
        assert_eq!(run.output.status.code(), Some(code), "unexpected exit\n{}", run.describe());
        run
    }
}

pub struct Run {
    output: Output,
}

impl Run {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    fn describe(&self) -> String {
        format!("status: {:?}\nstdout:\n{}\nstderr:\n{}", self.output.status, self.stdout(), self.stderr())
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout().contains(needle), "stdout lacks {needle:?}\n{}", self.describe());
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr().contains(needle), "stderr lacks {needle:?}\n{}", self.describe());
        self
    }
}

/// A scratch directory with a config file of its own.
pub struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self { dir: tempfile::tempdir().expect("tempdir") }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn file(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(&path, contents).expect("write file");
        path
    }

    pub fn script(&self, rel: &str, body: &str) -> PathBuf {
        let path = self.file(rel, body);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// `burner` reading `config.toml` from this workspace.
    pub fn burner(&self) -> Cli {
        cli().env("BURNER_CONFIG", self.path("config.toml")).env("BURNER_TMPDIR", self.root())
    }
}
