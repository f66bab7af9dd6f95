//! Project root discovery

use crate::error::{RegistryError, RegistryResult};
use std::path::{Component, Path, PathBuf};

/// File whose presence marks the project root
pub const ROOT_MARKER: &str = ".fdd-config.json";

/// Walk upward from `start` (a file or directory) to the first directory holding [`ROOT_MARKER`]
///
/// # Errors
/// Returns [`RegistryError::RootNotFound`] when no ancestor has the marker.
pub fn find_project_root(start: &Path) -> RegistryResult<PathBuf> {
    let start_dir = if start.is_file() {
        start.parent().unwrap_or(start)
    } else {
        start
    };

    start_dir
        .ancestors()
        .find(|dir| dir.join(ROOT_MARKER).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| RegistryError::RootNotFound {
            start: start.to_path_buf(),
            marker: ROOT_MARKER,
        })
}

/// Lexically normalize a path: drop `.` and fold `..` without touching the filesystem
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_marker_in_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ROOT_MARKER), "{}").unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        let file = nested.join("DESIGN.md");
        fs::write(&file, "").unwrap();

        assert_eq!(find_project_root(&file).unwrap(), dir.path());
        assert_eq!(find_project_root(&nested).unwrap(), dir.path());
    }

    #[test]
    fn missing_marker_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_project_root(dir.path()).unwrap_err();
        assert!(matches!(err, RegistryError::RootNotFound { .. }));
    }

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize(Path::new("./x")), PathBuf::from("x"));
    }
}
