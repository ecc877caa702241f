use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output path {0:?} is not a directory")]
    NotADirectory(PathBuf),
    #[error("cannot create output directory {path:?}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("cannot save {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Saves downloaded subtitle files as `{dir}/{filename}`.
///
/// Bytes land in a temp file beside the target and are renamed over it, so an
/// interrupted download never leaves a truncated subtitle behind. The output
/// directory is created on first use.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        self.prepare_dir()?;

        let target = self.dir.join(filename);
        let write_err = |source| PersistError::Write {
            path: target.clone(),
            source,
        };
        let mut staged = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        staged.write_all(content).map_err(write_err)?;
        staged.as_file_mut().sync_all().map_err(write_err)?;

        replace(staged, &target).map_err(write_err)?;
        Ok(target)
    }

    fn prepare_dir(&self) -> Result<(), PersistError> {
        match fs::metadata(&self.dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(PersistError::NotADirectory(self.dir.clone())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => fs::create_dir_all(&self.dir)
                .map_err(|source| PersistError::CreateDir {
                    path: self.dir.clone(),
                    source,
                }),
            Err(source) => Err(PersistError::CreateDir {
                path: self.dir.clone(),
                source,
            }),
        }
    }
}

/// A repeated download of the same artifact overwrites the earlier copy.
fn replace(staged: NamedTempFile, target: &Path) -> io::Result<()> {
    if target.exists() {
        fs::remove_file(target)?;
    }
    staged.persist(target).map(|_| ()).map_err(|err| err.error)
}
