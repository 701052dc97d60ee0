//! File system helpers for scratch files.

use std::{fs, io, path::Path};

/// Checks if a file exists at the given path.
///
/// Returns `false` for directories.
pub fn file_exist(path: impl AsRef<Path>) -> bool {
    match fs::metadata(path) {
        Ok(md) => md.is_file(),
        _ => false,
    }
}

/// Removes a file, treating "not found" as success.
///
/// Returns `Ok(true)` if a file was actually removed.
pub fn remove_file_if_exists(path: impl AsRef<Path>) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Extracts the file name from a path.
///
/// # Examples
///
/// ```
/// use cutil::fs::file_name;
///
/// assert_eq!(file_name("/tmp/shot.png"), "shot.png");
/// ```
pub fn file_name(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_exist() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test.txt");

        assert!(!file_exist(&file_path));
        fs::write(&file_path, "test").unwrap();
        assert!(file_exist(&file_path));

        // directories are not files
        assert!(!file_exist(temp_dir.path()));
    }

    #[test]
    fn test_remove_file_if_exists() -> io::Result<()> {
        let temp_dir = tempdir()?;
        let file_path = temp_dir.path().join("scratch.png");

        assert!(!remove_file_if_exists(&file_path)?);
        fs::write(&file_path, "x")?;
        assert!(remove_file_if_exists(&file_path)?);
        assert!(!file_path.exists());
        Ok(())
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("/path/to/file.txt"), "file.txt");
        assert_eq!(file_name("file.txt"), "file.txt");
        assert_eq!(file_name(""), "");
    }
}
