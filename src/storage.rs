use std::path::PathBuf;

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;

/// Narrow store/delete/load interface for uploaded photo files. Handlers and
/// the record engine depend on this trait only; the backing store is wired in
/// at startup.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn store(&self, filename: &str, body: Bytes) -> anyhow::Result<()>;
    /// Returns whether a file was actually removed.
    async fn delete(&self, filename: &str) -> anyhow::Result<bool>;
    async fn load(&self, filename: &str) -> anyhow::Result<Option<Bytes>>;
}

/// Uploads directory on local disk.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Filenames are single path segments; anything that could traverse out
    /// of the uploads directory is refused.
    fn safe_path(&self, filename: &str) -> Option<PathBuf> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return None;
        }
        Some(self.root.join(filename))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, filename: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self
            .safe_path(filename)
            .with_context(|| format!("unsafe filename {filename:?}"))?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .context("create upload dir")?;
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    async fn delete(&self, filename: &str) -> anyhow::Result<bool> {
        let Some(path) = self.safe_path(filename) else {
            return Ok(false);
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("delete {}", path.display())),
        }
    }

    async fn load(&self, filename: &str) -> anyhow::Result<Option<Bytes>> {
        let Some(path) = self.safe_path(filename) else {
            return Ok(None);
        };
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }
}
