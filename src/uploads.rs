use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Kinds of binary object the platform accepts. Video is hosted elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Image,
    Document,
    Audio,
}

impl UploadKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "image" => Some(UploadKind::Image),
            "document" | "raw" | "auto" => Some(UploadKind::Document),
            "audio" => Some(UploadKind::Audio),
            _ => None,
        }
    }

    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Image => &["jpg", "jpeg", "png", "webp"],
            UploadKind::Document => &["pdf", "docx", "xlsx", "pptx"],
            UploadKind::Audio => &["mp3", "m4a", "ogg", "wav"],
        }
    }

    fn folder(&self) -> &'static str {
        match self {
            UploadKind::Image => "images",
            UploadKind::Document => "documents",
            UploadKind::Audio => "audios",
        }
    }
}

/// Where uploaded files end up. Callers only ever see the returned reference.
#[async_trait]
pub trait UploadStore: Send + Sync {
    async fn save(&self, kind: UploadKind, filename: &str, data: &[u8]) -> Result<String>;
    async fn delete(&self, reference: &str) -> Result<()>;
}

pub struct LocalUploadStore {
    root: PathBuf,
    max_file_size: usize,
}

impl LocalUploadStore {
    pub fn new(root: impl Into<PathBuf>, max_file_size: usize) -> Self {
        Self {
            root: root.into(),
            max_file_size,
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Checks size and extension, returning the normalized extension.
    fn validate(&self, kind: UploadKind, filename: &str, data: &[u8]) -> Result<String> {
        if data.is_empty() {
            return Err(AppError::Validation("File is empty".to_string()));
        }

        if data.len() > self.max_file_size {
            return Err(AppError::Validation(format!(
                "File too large (max {} MB)",
                self.max_file_size / (1024 * 1024)
            )));
        }

        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .ok_or_else(|| AppError::Validation("Invalid filename".to_string()))?;

        if !kind.allowed_extensions().contains(&extension.as_str()) {
            return Err(AppError::Validation(format!(
                "Invalid file type. Allowed: {}",
                kind.allowed_extensions().join(", ")
            )));
        }

        Ok(extension)
    }
}

#[async_trait]
impl UploadStore for LocalUploadStore {
    async fn save(&self, kind: UploadKind, filename: &str, data: &[u8]) -> Result<String> {
        let extension = self.validate(kind, filename, data)?;

        let dir = self.root.join(kind.folder());
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::Internal(format!("Failed to create uploads directory: {}", e))
        })?;

        let new_filename = format!("{}.{}", Uuid::new_v4(), extension);

        let mut file = fs::File::create(dir.join(&new_filename)).await.map_err(|e| {
            AppError::Internal(format!("Failed to create file: {}", e))
        })?;

        file.write_all(data).await.map_err(|e| {
            AppError::Internal(format!("Failed to write file: {}", e))
        })?;

        tracing::debug!("Stored {:?} upload {}", kind, new_filename);

        Ok(format!("/uploads/{}/{}", kind.folder(), new_filename))
    }

    async fn delete(&self, reference: &str) -> Result<()> {
        // Only local references are ours to delete
        let Some(relative) = reference.strip_prefix("/uploads/") else {
            return Ok(());
        };

        if relative.contains("..") {
            return Err(AppError::BadRequest("Invalid upload reference".to_string()));
        }

        let path = self.root.join(relative);
        if fs::try_exists(&path).await.unwrap_or(false) {
            fs::remove_file(&path).await.map_err(|e| {
                AppError::Internal(format!("Failed to delete file: {}", e))
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> LocalUploadStore {
        let root = std::env::temp_dir().join(format!("aula-uploads-{}", Uuid::new_v4()));
        LocalUploadStore::new(root, 1024)
    }

    #[test]
    fn test_upload_kind_parse() {
        assert_eq!(UploadKind::parse("image"), Some(UploadKind::Image));
        assert_eq!(UploadKind::parse("IMAGE"), Some(UploadKind::Image));
        assert_eq!(UploadKind::parse("auto"), Some(UploadKind::Document));
        assert_eq!(UploadKind::parse("video"), None);
    }

    #[test]
    fn test_validate_rejects_bad_files() {
        let store = store();
        assert!(store.validate(UploadKind::Image, "voucher.png", b"png").is_ok());
        assert!(store.validate(UploadKind::Image, "voucher.PNG", b"png").is_ok());
        assert!(store.validate(UploadKind::Image, "voucher.pdf", b"pdf").is_err());
        assert!(store.validate(UploadKind::Image, "voucher", b"png").is_err());
        assert!(store.validate(UploadKind::Image, "voucher.png", b"").is_err());
        assert!(store.validate(UploadKind::Image, "voucher.png", &[0u8; 2048]).is_err());
    }

    #[tokio::test]
    async fn test_save_then_delete() {
        let store = store();
        let reference = store
            .save(UploadKind::Image, "yape.jpg", b"fake image bytes")
            .await
            .unwrap();
        assert!(reference.starts_with("/uploads/images/"));
        assert!(reference.ends_with(".jpg"));

        let path = store.root().join(reference.trim_start_matches("/uploads/"));
        assert!(path.exists());

        store.delete(&reference).await.unwrap();
        assert!(!path.exists());

        let _ = std::fs::remove_dir_all(store.root());
    }
}
