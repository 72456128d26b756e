use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Extension of files listed as example graphs.
const EXAMPLE_EXTENSION: &str = "txt";

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("invalid example name '{0}'")]
    InvalidName(String),

    #[error("example '{0}' not found")]
    NotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Read-only directory of example input graphs.
#[derive(Debug, Clone)]
pub struct ExampleCorpus {
    dir: PathBuf,
}

impl ExampleCorpus {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of all example graphs, sorted.
    pub fn list(&self) -> Result<Vec<String>, CorpusError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| CorpusError::Io {
            path: self.dir.clone(),
            source: e,
        })?;
        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().is_some_and(|ext| ext == EXAMPLE_EXTENSION))
            .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Resolve an example name to its file, rejecting anything that is not a
    /// plain file name inside the corpus directory.
    pub fn path_of(&self, name: &str) -> Result<PathBuf, CorpusError> {
        let is_plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if !is_plain {
            return Err(CorpusError::InvalidName(name.to_string()));
        }
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(CorpusError::NotFound(name.to_string()));
        }
        Ok(path)
    }

    pub fn read(&self, name: &str) -> Result<Vec<u8>, CorpusError> {
        let path = self.path_of(name)?;
        fs::read(&path).map_err(|e| CorpusError::Io { path, source: e })
    }
}
