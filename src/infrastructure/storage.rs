use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Filesystem storage rooted at a single configured directory. Every lookup
/// re-bases through the basename so path separators smuggled into a filename
/// can never escape the root.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolve a stored filename to its on-disk path, basename only.
    pub fn resolve(&self, filename: &str) -> PathBuf {
        let name = Path::new(filename)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        self.base_dir.join(name)
    }

    /// Write a buffer to the resolved path, creating the base directory as
    /// needed.
    pub async fn write(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let dest = self.resolve(filename);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&dest, bytes).await?;
        Ok(dest)
    }

    /// Open a stored file for streaming, returning the handle and its size.
    pub async fn open(&self, filename: &str) -> io::Result<(fs::File, u64)> {
        let path = self.resolve(filename);
        let file = fs::File::open(&path).await?;
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    pub async fn exists(&self, filename: &str) -> bool {
        fs::try_exists(self.resolve(filename)).await.unwrap_or(false)
    }
}
