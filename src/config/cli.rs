use crate::domain::ports::Storage;
use crate::utils::error::{LogoError, Result};
use std::path::{Path, PathBuf};

/// Writes saved logos under a base directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Storage rooted at the parent of `path`, plus the file name within it.
    pub fn for_file(path: &Path) -> Result<(Self, String)> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| LogoError::validation(format!("Not a file path: {}", path.display())))?;
        let base_path = path.parent().unwrap_or_else(|| Path::new(""));
        Ok((Self::new(base_path), file_name.to_string()))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&full_path, data).await?;
        tracing::debug!("Wrote {} bytes to {}", data.len(), full_path.display());
        Ok(full_path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().join("logos"));

        let written = storage.write_file("acme/acme_logo.png", b"png-bytes").await.unwrap();
        assert!(written.ends_with("acme_logo.png"));

        let data = storage.read_file("acme/acme_logo.png").await.unwrap();
        assert_eq!(data, b"png-bytes");
    }

    #[tokio::test]
    async fn test_for_file_splits_directory_and_name() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in").join("acme.svg");

        let (storage, name) = LocalStorage::for_file(&input).unwrap();
        assert_eq!(storage.base_path(), temp_dir.path().join("in").as_path());
        assert_eq!(name, "acme.svg");

        storage.write_file(&name, b"<svg/>").await.unwrap();
        assert_eq!(std::fs::read(&input).unwrap(), b"<svg/>");
        assert_eq!(storage.read_file(&name).await.unwrap(), b"<svg/>");

        let (relative, name) = LocalStorage::for_file(Path::new("logo.png")).unwrap();
        assert_eq!(relative.base_path(), Path::new(""));
        assert_eq!(name, "logo.png");

        assert!(LocalStorage::for_file(Path::new("/")).is_err());
    }

    #[tokio::test]
    async fn test_read_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        assert!(storage.read_file("missing.svg").await.is_err());
    }
}
