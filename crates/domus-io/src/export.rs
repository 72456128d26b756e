use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use domus_core::corpus::{CorpusError, ExampleCorpus};
use domus_core::staging::{Artifact, StagingArea, StagingError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name an artifact is saved under, independent of its staging name.
pub fn display_name(artifact: Artifact) -> &'static str {
    match artifact {
        Artifact::Drawing => "drawing.svg",
        Artifact::Exchange => "graph.graphml",
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("{0} is not available; compute a drawing first")]
    ArtifactUnavailable(Artifact),

    #[error("staging: {0}")]
    Staging(#[from] StagingError),

    #[error("example corpus: {0}")]
    Corpus(#[from] CorpusError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Enablement of the two export actions.
///
/// Flags only ever go from disabled to enabled within a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportState {
    drawing: bool,
    exchange: bool,
}

impl ExportState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable both exports. Returns whether any flag changed.
    pub fn enable_all(&mut self) -> bool {
        let changed = !(self.drawing && self.exchange);
        self.drawing = true;
        self.exchange = true;
        if changed {
            log::info!("exports enabled");
        }
        changed
    }

    pub fn is_enabled(&self, artifact: Artifact) -> bool {
        match artifact {
            Artifact::Drawing => self.drawing,
            Artifact::Exchange => self.exchange,
        }
    }
}

fn write_file(path: &Path, content: &[u8]) -> Result<(), ExportError> {
    fs::write(path, content).map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Save a staged artifact into `dest_dir` under its display name.
pub fn export_artifact(
    staging: &StagingArea,
    state: &ExportState,
    artifact: Artifact,
    dest_dir: &Path,
) -> Result<PathBuf, ExportError> {
    if !state.is_enabled(artifact) {
        return Err(ExportError::ArtifactUnavailable(artifact));
    }
    let content = match staging.read_artifact(artifact) {
        Ok(content) => content,
        Err(StagingError::NotFound { .. }) => return Err(ExportError::ArtifactUnavailable(artifact)),
        Err(e) => return Err(e.into()),
    };
    let path = dest_dir.join(display_name(artifact));
    write_file(&path, &content)?;
    log::info!("exported {} ({} bytes) to {}", artifact, content.len(), path.display());
    Ok(path)
}

/// Save an example graph into `dest_dir` unmodified, under its own name.
pub fn download_example(
    corpus: &ExampleCorpus,
    name: &str,
    dest_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let content = corpus.read(name)?;
    let path = dest_dir.join(name);
    write_file(&path, &content)?;
    log::info!("downloaded example {} to {}", name, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staging_with_artifacts() -> (tempfile::TempDir, StagingArea) {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path().join("stage")).unwrap();
        fs::write(staging.artifact_path(Artifact::Drawing), "<svg>\u{e9}</svg>\n").unwrap();
        fs::write(staging.artifact_path(Artifact::Exchange), "<graphml/>").unwrap();
        (dir, staging)
    }

    #[test]
    fn test_enable_all_is_idempotent() {
        let mut state = ExportState::new();
        assert!(!state.is_enabled(Artifact::Drawing));
        assert!(state.enable_all());
        assert!(!state.enable_all());
        assert!(state.is_enabled(Artifact::Drawing));
        assert!(state.is_enabled(Artifact::Exchange));
    }

    #[test]
    fn test_export_requires_enabled_flag() {
        let (dir, staging) = staging_with_artifacts();
        let err = export_artifact(&staging, &ExportState::new(), Artifact::Drawing, dir.path()).unwrap_err();
        assert!(matches!(err, ExportError::ArtifactUnavailable(Artifact::Drawing)));
        assert!(!dir.path().join("drawing.svg").exists());
    }

    #[test]
    fn test_export_uses_display_name_and_exact_bytes() {
        let (dir, staging) = staging_with_artifacts();
        let mut state = ExportState::new();
        state.enable_all();

        let path = export_artifact(&staging, &state, Artifact::Drawing, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "drawing.svg");
        assert_eq!(
            fs::read(&path).unwrap(),
            staging.read_artifact(Artifact::Drawing).unwrap()
        );

        let path = export_artifact(&staging, &state, Artifact::Exchange, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "graph.graphml");
        assert_eq!(fs::read(&path).unwrap(), b"<graphml/>");
    }

    #[test]
    fn test_export_missing_staged_file() {
        let (dir, staging) = staging_with_artifacts();
        staging.clear_artifacts().unwrap();
        let mut state = ExportState::new();
        state.enable_all();
        assert!(matches!(
            export_artifact(&staging, &state, Artifact::Exchange, dir.path()),
            Err(ExportError::ArtifactUnavailable(Artifact::Exchange))
        ));
    }

    #[test]
    fn test_download_example_unmodified() {
        let corpus_dir = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        fs::write(corpus_dir.path().join("k4.txt"), "nodes:\n0\n1\n2\n3\n").unwrap();
        let corpus = ExampleCorpus::new(corpus_dir.path());

        let path = download_example(&corpus, "k4.txt", dest.path()).unwrap();
        assert_eq!(path, dest.path().join("k4.txt"));
        assert_eq!(fs::read(path).unwrap(), b"nodes:\n0\n1\n2\n3\n");

        assert!(matches!(
            download_example(&corpus, "../k4.txt", dest.path()),
            Err(ExportError::Corpus(CorpusError::InvalidName(_)))
        ));
    }
}
