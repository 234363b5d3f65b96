#![allow(dead_code)]

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub fn focusany_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_focusany"))
}

pub fn release_check_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_focusany-release-check"))
}

/// Run `cmd` and require a zero exit status.
pub fn run_command(cmd: Command) -> Result<Output> {
    let output = capture(cmd)?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command failed: status {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

/// Run `cmd` and return its output whatever the exit status.
pub fn capture(mut cmd: Command) -> Result<Output> {
    cmd.env_remove("RUST_LOG")
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))
}

/// Write `body` to `dir/relative`, creating parent directories.
pub fn write_config(dir: &Path, relative: &str, body: &str) -> Result<PathBuf> {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
