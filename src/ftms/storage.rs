use super::schema::FileType;
use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Saved document bodies on disk, organized by date.
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `{workspace_dir}/ftms/files`.
    pub fn new(workspace_dir: &Path) -> Self {
        Self {
            base_dir: workspace_dir.join("ftms").join("files"),
        }
    }

    /// Store a document body, returns (relative_path, absolute_path).
    pub async fn store(&self, content: &str, file_type: FileType) -> Result<(String, PathBuf)> {
        let now = Local::now();
        let date_dir = now.format("%Y/%m/%d").to_string();
        let abs_dir = self.base_dir.join(&date_dir);
        fs::create_dir_all(&abs_dir)
            .await
            .context("Failed to create date directory")?;

        let stored_name = format!("{}.{}", Uuid::new_v4(), file_type.extension());
        let abs_path = abs_dir.join(&stored_name);
        fs::write(&abs_path, content.as_bytes())
            .await
            .context("Failed to write document")?;

        let rel_path = format!("{}/{}", date_dir, stored_name);
        Ok((rel_path, abs_path))
    }

    /// Read a document body by relative path.
    pub async fn read(&self, rel_path: &str) -> Result<String> {
        let abs = self.absolute_path(rel_path);
        fs::read_to_string(&abs)
            .await
            .with_context(|| format!("Failed to read document {}", abs.display()))
    }

    /// Delete a document body by relative path. Missing files are not an error.
    pub async fn delete(&self, rel_path: &str) -> Result<()> {
        let abs = self.absolute_path(rel_path);
        if fs::try_exists(&abs).await.unwrap_or(false) {
            fs::remove_file(&abs)
                .await
                .context("Failed to delete document")?;
        }
        Ok(())
    }

    pub fn absolute_path(&self, rel_path: &str) -> PathBuf {
        self.base_dir.join(rel_path)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
