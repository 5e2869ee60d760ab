//! Pid directory creation and access verification.

use std::fs;
use std::path::Path;

use nix::unistd::{AccessFlags, access};
use pidguard_core::PathError;

/// Ensure the pid directory exists and is usable.
///
/// A missing directory is created with its parents. An existing path must be
/// a directory the effective user can read, write and search.
pub fn ensure_directory(path: &Path) -> Result<(), PathError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(PathError::NotADirectory(path.to_path_buf()));
        }
    } else {
        fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    }

    verify_access(path)
}

/// Verify a directory can be listed and written to.
pub fn verify_access(path: &Path) -> Result<(), PathError> {
    access(path, AccessFlags::R_OK).map_err(|errno| PathError::NotReadable {
        path: path.to_path_buf(),
        reason: errno.desc().to_string(),
    })?;

    access(path, AccessFlags::W_OK | AccessFlags::X_OK).map_err(|errno| PathError::NotWritable {
        path: path.to_path_buf(),
        reason: errno.desc().to_string(),
    })
}

/// Whether `path` is an existing directory that passes [`verify_access`].
pub fn is_usable_dir(path: &Path) -> bool {
    path.is_dir() && verify_access(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_nested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");

        ensure_directory(&nested).expect("ensure");
        assert!(nested.is_dir());
    }

    #[test]
    fn rejects_file_in_place_of_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("not-a-dir");
        fs::write(&file, b"x").unwrap();

        let err = ensure_directory(&file).unwrap_err();
        assert!(matches!(err, PathError::NotADirectory(p) if p == file));
    }

    #[test]
    fn existing_directory_is_usable() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(is_usable_dir(tmp.path()));
        assert!(!is_usable_dir(&tmp.path().join("missing")));
    }
}
