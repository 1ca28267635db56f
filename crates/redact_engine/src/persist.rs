use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use engine_logging::engine_debug;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{} exists but is not a directory", path.display())]
    NotADirectory { path: PathBuf },
    #[error("cannot use output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Create `dir` if needed and check that files can be created in it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let unusable = |source| PersistError::OutputDir {
        path: dir.to_path_buf(),
        source,
    };
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(PersistError::NotADirectory {
                path: dir.to_path_buf(),
            })
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            engine_debug!("creating output directory {}", dir.display());
            fs::create_dir_all(dir).map_err(unusable)?;
        }
        Err(err) => return Err(unusable(err)),
    }
    NamedTempFile::new_in(dir).map_err(unusable)?;
    Ok(())
}

/// Destination for tokenized downloads and JSON reports.
///
/// Each file is staged next to its target and renamed into place once it
/// is synced, so an interrupted write leaves the previous copy intact.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store `content` as `filename`, replacing any earlier file of that name.
    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;
        let staged = self.stage(content)?;
        let target = self.dir.join(filename);
        staged.persist(&target).map_err(|err| PersistError::Io(err.error))?;
        engine_debug!("wrote {} bytes to {}", content.len(), target.display());
        Ok(target)
    }

    fn stage(&self, content: &[u8]) -> io::Result<NamedTempFile> {
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(content)?;
        staged.as_file().sync_all()?;
        Ok(staged)
    }
}
