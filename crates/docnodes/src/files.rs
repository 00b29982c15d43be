use async_trait::async_trait;
use doccore::FileStore;
use std::io;
use std::path::{Path, PathBuf};

/// File store rooted in a local directory; logical paths like
/// `uploads/x.pdf` resolve relative to the root.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a logical path, rejecting any that climbs out of the root
    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        if Path::new(path)
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path escapes the storage root: {path}"),
            ));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(full) => tokio::fs::try_exists(&full).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn read_binary(&self, path: &str) -> Result<Vec<u8>, io::Error> {
        let full = self.resolve(path)?;
        tokio::fs::read(&full).await
    }

    async fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<(), io::Error> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await
    }
}
