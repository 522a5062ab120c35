use std::io;
use std::path::{Path, PathBuf};

/// Joins a relative path onto the working directory; absolute paths pass through.
pub fn resolve_path(path: impl AsRef<Path>) -> io::Result<PathBuf> {
    let path = path.as_ref();
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// True only for existing regular files.
pub fn file_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_file()
}

/// Reads a file, resolving relative paths against the working directory.
pub fn read_file(path: impl AsRef<Path>) -> io::Result<Vec<u8>> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty file path"));
    }
    std::fs::read(resolve_path(path)?)
}

/// Like [`read_file`], but returns an empty buffer on any failure.
pub fn try_read_file(path: impl AsRef<Path>) -> Vec<u8> {
    read_file(path).unwrap_or_default()
}
