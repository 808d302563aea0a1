//! Crash-safe file writes.
//!
//! Every stage treats an existing output file as finished work, so a file
//! must never be visible at its final path until it is complete.

use std::path::{Path, PathBuf};

use crate::error::{Result, TailorError};

/// Suffix of the sibling file written before the final rename.
pub const PARTIAL_SUFFIX: &str = "part";

/// Sibling path `contents` are staged at before being renamed into `path`.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

/// Write `contents` to `path` through a `<name>.part` sibling and a rename.
///
/// Parent directories are created. An interrupted write leaves at most a
/// stale `.part` file, which the next write overwrites.
pub fn write_atomic(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| TailorError::io(parent, e))?;
    }

    let partial = partial_path(path);
    std::fs::write(&partial, contents).map_err(|e| TailorError::io(&partial, e))?;
    std::fs::rename(&partial, path).map_err(|e| {
        let _ = std::fs::remove_file(&partial);
        TailorError::io(path, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_path_is_a_sibling() {
        assert_eq!(
            partial_path(Path::new("data/md/fleet.md")),
            PathBuf::from("data/md/fleet.md.part")
        );
    }

    #[test]
    fn replaces_stale_partial_and_leaves_no_residue() {
        let dir = std::env::temp_dir().join(format!("tailor-fs-{}", uuid::Uuid::now_v7()));
        let target = dir.join("nested/fleet.md");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(partial_path(&target), "trunc").unwrap();

        write_atomic(&target, "full text").unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "full text");
        assert!(!partial_path(&target).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
