#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    ffi::OsString,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use which::which;

/// Finds and returns the path to a POSIX shell
pub fn shell_path() -> Result<OsString> {
    which("sh")
        .map(PathBuf::into_os_string)
        .context("Cannot find a shell on path (sh)")
}

/// Creates the parent directory of `path` if needed
fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Writes `contents` to `path`, replacing the file and creating missing
/// directories
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, contents).with_context(|| format!("Could not write {}", path.display()))
}

/// Appends `contents` to `path`, creating it first if needed
pub fn append_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    ensure_parent(path)?;
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| file.write_all(contents.as_ref()))
        .with_context(|| format!("Could not append to {}", path.display()))
}

/// Reads a text file lossily. A missing file reads as empty text.
pub fn read_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }
    let bytes = fs::read(path).with_context(|| format!("Could not read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Removes `path` if it exists.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Could not remove {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use std::env::temp_dir;

    use super::*;

    #[test]
    fn missing_files_read_as_empty_and_remove_quietly() {
        let dir = temp_dir().join(format!("checkgrade-util-{}", uuid::Uuid::new_v4()));
        let file = dir.join("nested").join("log.txt");

        assert_eq!(read_text(&file).unwrap(), "");
        remove_if_exists(&file).unwrap();

        write_file(&file, "a\n").unwrap();
        append_file(&file, "b\n").unwrap();
        assert_eq!(read_text(&file).unwrap(), "a\nb\n");

        remove_if_exists(&file).unwrap();
        assert!(!file.exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
