use crate::core::progression;
use crate::core::{Document, DocumentStore};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// The shared document as one JSON file, rewritten whole on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    pretty: bool,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pretty: true,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "data.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn load(&self) -> Result<Document> {
        if !tokio::fs::try_exists(&self.path).await? {
            tracing::info!("📁 No data file at {}, creating an empty one", self.path.display());
            let empty = Document::default();
            self.save(&empty).await?;
            return Ok(empty);
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let mut document: Document = serde_json::from_str(&content).map_err(|e| {
            tracing::error!("❌ {} is not a valid document: {}", self.path.display(), e);
            e
        })?;

        // 在邊界上統一正規化，核心邏輯可假設資料完整
        document.normalize();
        progression::sync_levels(&mut document.users);

        tracing::debug!(
            "Loaded {} users, {} requests from {}",
            document.users.len(),
            document.requests.len(),
            self.path.display()
        );
        Ok(document)
    }

    async fn save(&self, document: &Document) -> Result<()> {
        let data = if self.pretty {
            serde_json::to_vec_pretty(document)?
        } else {
            serde_json::to_vec(document)?
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, &data).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!("💾 Saved document to {}", self.path.display());
        Ok(())
    }
}
