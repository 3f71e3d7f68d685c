//! Data directory layout.
//!
//! Everything Parley persists lives under one directory: the SQLite database
//! (`parley.db`) and the optional `config.toml`.

use std::path::{Path, PathBuf};

/// Resolve the data directory.
///
/// `PARLEY_DATA_DIR` wins; otherwise `~/.parley`, falling back to a relative
/// `.parley` when no home directory is known.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PARLEY_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".parley");
    }

    PathBuf::from(".parley")
}

/// Create the data directory if it does not exist yet.
pub async fn ensure_data_dir(data_dir: &Path) -> Result<(), std::io::Error> {
    tokio::fs::create_dir_all(data_dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_data_dir_from_env() {
        // SAFETY: the only test touching this variable; restored immediately.
        unsafe {
            std::env::set_var("PARLEY_DATA_DIR", "/tmp/test-parley");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-parley"));
        unsafe {
            std::env::remove_var("PARLEY_DATA_DIR");
        }
    }

    #[tokio::test]
    async fn test_ensure_data_dir_creates_nested() {
        let root = tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        ensure_data_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        // Idempotent
        ensure_data_dir(&nested).await.unwrap();
    }
}
