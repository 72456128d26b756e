//! The call boundary to the external orthogonal drawing engine.
//!
//! The engine takes no arguments and returns nothing but a status code. It
//! reads `input.txt` and writes `output.svg` / `output.graphml` in its working
//! directory, which is always the [`StagingArea`] root.

use std::io;
use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;

use crate::staging::StagingArea;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to start engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("engine '{program}' was terminated without an exit status")]
    Terminated { program: String },
}

/// A drawing engine reachable through the zero-argument status-code contract.
pub trait Engine {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Run the engine once against the staged input and return its status.
    fn compute(&mut self, staging: &StagingArea) -> Result<i32, EngineError>;
}

/// Runs the engine as a child process in the staging directory.
///
/// Exit statuses are 8-bit, so the engine's negative status codes arrive as
/// `256 + code`; they are decoded back with [`decode_exit_status`].
#[derive(Debug, Clone)]
pub struct SubprocessEngine {
    program: PathBuf,
    args: Vec<String>,
    label: String,
}

impl SubprocessEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let label = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.display().to_string());
        Self {
            program,
            args: Vec::new(),
            label,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Reinterpret a process exit code as the engine's signed status byte.
pub fn decode_exit_status(code: i32) -> i32 {
    (code & 0xFF) as u8 as i8 as i32
}

impl Engine for SubprocessEngine {
    fn name(&self) -> &str {
        &self.label
    }

    fn compute(&mut self, staging: &StagingArea) -> Result<i32, EngineError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(staging.root())
            .output()
            .map_err(|e| EngineError::Spawn {
                program: self.label.clone(),
                source: e,
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            log::debug!("[{}] {}", self.label, line);
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            log::debug!("[{} stderr] {}", self.label, line);
        }

        let code = output.status.code().ok_or_else(|| EngineError::Terminated {
            program: self.label.clone(),
        })?;
        Ok(decode_exit_status(code))
    }
}

/// An engine linked into the process, called through a closure.
pub struct FnEngine<F> {
    name: String,
    entry: F,
}

impl<F> FnEngine<F>
where
    F: FnMut(&StagingArea) -> i32,
{
    pub fn new(name: &str, entry: F) -> Self {
        Self {
            name: name.to_string(),
            entry,
        }
    }
}

impl<F> Engine for FnEngine<F>
where
    F: FnMut(&StagingArea) -> i32,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&mut self, staging: &StagingArea) -> Result<i32, EngineError> {
        Ok((self.entry)(staging))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_exit_status() {
        assert_eq!(decode_exit_status(0), 0);
        assert_eq!(decode_exit_status(255), -1);
        assert_eq!(decode_exit_status(254), -2);
        assert_eq!(decode_exit_status(253), -3);
        assert_eq!(decode_exit_status(5), 5);
        // Windows reports the full 32-bit value.
        assert_eq!(decode_exit_status(-1), -1);
    }

    #[test]
    fn test_fn_engine_sees_staging() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path()).unwrap();
        staging.stage(b"nodes:\n1\n").unwrap();
        let mut engine = FnEngine::new("stub", |staging: &StagingArea| {
            if staging.read_input().is_ok() {
                0
            } else {
                -3
            }
        });
        assert_eq!(engine.name(), "stub");
        assert_eq!(engine.compute(&staging).unwrap(), 0);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path()).unwrap();
        let mut engine = SubprocessEngine::new("/no/such/domus-engine");
        assert_eq!(engine.name(), "domus-engine");
        assert!(matches!(engine.compute(&staging), Err(EngineError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_subprocess_status_codes() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path()).unwrap();
        for (exit, status) in [("0", 0), ("255", -1), ("254", -2), ("253", -3)] {
            let script = format!("exit {exit}");
            let mut engine = SubprocessEngine::new("sh").with_args(["-c", script.as_str()]);
            assert_eq!(engine.compute(&staging).unwrap(), status);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_subprocess_runs_in_staging_dir() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path()).unwrap();
        staging.stage(b"nodes:\n1\n").unwrap();
        let mut engine = SubprocessEngine::new("sh")
            .with_args(["-c", "cat input.txt > output.graphml && echo '<svg/>' > output.svg"]);
        assert_eq!(engine.compute(&staging).unwrap(), 0);
        assert_eq!(
            staging.read_artifact(crate::Artifact::Exchange).unwrap(),
            b"nodes:\n1\n"
        );
    }
}
