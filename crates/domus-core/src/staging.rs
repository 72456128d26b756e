//! Fixed-path file exchange with the drawing engine.
//!
//! The engine reads its input from, and writes its artifacts to, well-known
//! file names relative to its working directory. [`StagingArea`] owns that
//! directory and is the only place those names are spelled out.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::corpus::{CorpusError, ExampleCorpus};

/// File the engine reads the graph from.
pub const INPUT_FILE: &str = "input.txt";
/// File the engine writes the SVG drawing to.
pub const OUTPUT_SVG_FILE: &str = "output.svg";
/// File the engine writes the GraphML export to.
pub const OUTPUT_GRAPHML_FILE: &str = "output.graphml";

/// An output the engine produces on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    /// The vector drawing.
    Drawing,
    /// The GraphML exchange file.
    Exchange,
}

impl Artifact {
    pub const ALL: [Artifact; 2] = [Artifact::Drawing, Artifact::Exchange];

    /// Name of the staging file the engine writes this artifact to.
    pub fn staging_name(&self) -> &'static str {
        match self {
            Artifact::Drawing => OUTPUT_SVG_FILE,
            Artifact::Exchange => OUTPUT_GRAPHML_FILE,
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.staging_name())
    }
}

/// Where the currently staged input came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    /// A file picked by the user.
    Upload(PathBuf),
    /// An entry of the example corpus.
    Example(String),
}

impl InputSource {
    /// Label shown next to the upload control.
    pub fn label(&self) -> String {
        match self {
            InputSource::Upload(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            InputSource::Example(name) => name.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("artifact '{artifact}' has not been produced")]
    NotFound { artifact: Artifact },

    #[error("no input has been staged")]
    InputMissing,

    #[error("example corpus: {0}")]
    Corpus(#[from] CorpusError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StagingError {
    fn io(path: &Path, source: io::Error) -> Self {
        StagingError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The directory the engine runs in, holding its input and output files.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// Open a staging area at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StagingError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StagingError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn input_path(&self) -> PathBuf {
        self.root.join(INPUT_FILE)
    }

    pub fn artifact_path(&self, artifact: Artifact) -> PathBuf {
        self.root.join(artifact.staging_name())
    }

    // ── Input ─────────────────────────────────────────────────────────

    /// Replace the staged input with `content`.
    pub fn stage(&self, content: &[u8]) -> Result<(), StagingError> {
        let path = self.input_path();
        fs::write(&path, content).map_err(|e| StagingError::io(&path, e))?;
        log::info!("staged {} bytes at {}", content.len(), path.display());
        Ok(())
    }

    /// Stage the contents of an uploaded file.
    pub fn stage_file(&self, upload: &Path) -> Result<InputSource, StagingError> {
        let content = fs::read(upload).map_err(|e| StagingError::io(upload, e))?;
        self.stage(&content)?;
        Ok(InputSource::Upload(upload.to_path_buf()))
    }

    /// Stage an entry of the example corpus.
    pub fn stage_example(
        &self,
        corpus: &ExampleCorpus,
        name: &str,
    ) -> Result<InputSource, StagingError> {
        let content = corpus.read(name)?;
        self.stage(&content)?;
        Ok(InputSource::Example(name.to_string()))
    }

    pub fn read_input(&self) -> Result<Vec<u8>, StagingError> {
        let path = self.input_path();
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StagingError::InputMissing),
            Err(e) => Err(StagingError::io(&path, e)),
        }
    }

    // ── Artifacts ─────────────────────────────────────────────────────

    pub fn has_artifact(&self, artifact: Artifact) -> bool {
        self.artifact_path(artifact).is_file()
    }

    /// Read an artifact the engine wrote.
    pub fn read_artifact(&self, artifact: Artifact) -> Result<Vec<u8>, StagingError> {
        let path = self.artifact_path(artifact);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StagingError::NotFound { artifact })
            }
            Err(e) => Err(StagingError::io(&path, e)),
        }
    }

    /// Remove every artifact left by a previous run.
    pub fn clear_artifacts(&self) -> Result<(), StagingError> {
        for artifact in Artifact::ALL {
            let path = self.artifact_path(artifact);
            match fs::remove_file(&path) {
                Ok(()) => log::debug!("removed stale {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(StagingError::io(&path, e)),
            }
        }
        Ok(())
    }
}
