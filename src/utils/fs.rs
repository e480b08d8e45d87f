use crate::utils::error::{ContestError, Result};
use std::io::Write;
use std::path::Path;

/// Writes `data` to a sibling temp file, syncs it, then renames it over `path`.
///
/// A failure at any step leaves the previous file untouched.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let persist_err = |source: std::io::Error| ContestError::PersistenceError {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(persist_err)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    let written = (|| {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)
    })();

    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(persist_err(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data.toml");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!dir.path().join("nested").join("data.toml.tmp").exists());
    }

    #[test]
    fn test_write_atomic_reports_persistence_error() {
        let dir = TempDir::new().unwrap();
        // 目標是既有目錄，rename 必定失敗
        let target = dir.path().join("occupied");
        std::fs::create_dir_all(target.join("child")).unwrap();

        let err = write_atomic(&target, b"x").unwrap_err();
        assert!(matches!(err, ContestError::PersistenceError { .. }));
    }
}
