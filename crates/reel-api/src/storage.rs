use anyhow::{Result, bail};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Local object storage for uploaded videos.
///
/// Objects live at `{dir}/{key}` and are served by the router under
/// `/static`, so `public_base_url` should point at that mount.
pub struct Storage {
    dir: PathBuf,
    public_base_url: String,
}

impl Storage {
    pub async fn new(dir: PathBuf, public_base_url: impl Into<String>) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Object storage directory: {}", dir.display());
        Ok(Self {
            dir,
            public_base_url: public_base_url.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }

    /// Write an object and return the URL it is served at. Keys are
    /// relative paths; nothing may escape the storage directory.
    pub async fn put(&self, key: &str, data: &[u8]) -> Result<String> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        info!("Stored object {} ({} bytes)", key, data.len());
        Ok(self.public_url(key))
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let path = self.object_path(key)?;
        fs::remove_file(&path).await?;
        info!("Removed object {}", key);
        Ok(())
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        if key.is_empty() || !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            bail!("Invalid object key '{}'", key);
        }
        Ok(self.dir.join(relative))
    }
}
