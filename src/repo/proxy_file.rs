use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::{
    error::{FetcherError, Result},
    models::proxy::ProxyUrl,
};

#[cfg(unix)]
const OWNER_READ_WRITE: u32 = 0o600;

/// Plain-text proxy list on disk. Every write replaces the previous file
/// atomically, so readers only ever see a complete list.
pub struct ProxyFileRepo {
    path: PathBuf,
}

impl ProxyFileRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, proxies: &[ProxyUrl]) -> Result<()> {
        let parent = self.parent_dir()?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|err| self.write_error(err))?;
        write_lines(tmp.as_file_mut(), proxies).map_err(|err| self.write_error(err))?;
        restrict_permissions(tmp.as_file()).map_err(|err| self.write_error(err))?;
        tmp.as_file()
            .sync_all()
            .map_err(|err| self.write_error(err))?;

        // the temp file is deleted on drop if persisting fails
        tmp.persist(&self.path)
            .map_err(|err| self.write_error(err.error))?;

        log::debug!("persisted {} lines to {}", proxies.len(), self.path.display());
        Ok(())
    }

    fn parent_dir(&self) -> Result<&Path> {
        let file_name = self.path.file_name().ok_or_else(|| FetcherError::Path {
            message: format!("{} does not name a file", self.path.display()),
            source: None,
        })?;
        if self.path.is_dir() {
            return Err(FetcherError::Path {
                message: format!("{} is a directory", self.path.display()),
                source: None,
            });
        }

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        match fs::metadata(parent) {
            Ok(meta) if meta.is_dir() => Ok(parent),
            Ok(_) => Err(FetcherError::Path {
                message: format!(
                    "cannot write {:?}: {} is not a directory",
                    file_name,
                    parent.display()
                ),
                source: None,
            }),
            Err(err) => Err(FetcherError::Path {
                message: format!("parent directory {} is not accessible", parent.display()),
                source: Some(err),
            }),
        }
    }

    fn write_error(&self, err: io::Error) -> FetcherError {
        FetcherError::Write {
            message: format!("failed to write {}: {err}", self.path.display()),
            source: err,
        }
    }
}

fn write_lines(file: &mut fs::File, proxies: &[ProxyUrl]) -> io::Result<()> {
    let mut writer = BufWriter::new(file);
    for proxy in proxies {
        writeln!(writer, "{proxy}")?;
    }
    writer.flush()
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(OWNER_READ_WRITE))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> io::Result<()> {
    Ok(())
}
