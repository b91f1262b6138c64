//! Avatar file storage on the local filesystem.

use crate::entities::Media;
use crate::types::{DomainError, StorageError};
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

const ALLOWED_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".gif"];

/// Writes avatar files under `{root}/media/avatars/{user_id}/`.
pub struct AvatarStorage {
    media_root: PathBuf,
}

impl AvatarStorage {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    /// Store an uploaded avatar for a user, replacing any previous one.
    /// The stored file is always named `avatar{ext}` so one file per user
    /// exists per extension.
    pub async fn save_avatar(
        &self,
        user_id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Media, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::EmptyFile);
        }

        let extension = file_name
            .rfind('.')
            .map(|idx| file_name[idx..].to_lowercase())
            .ok_or(StorageError::InvalidExtension)?;
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(StorageError::InvalidExtension);
        }

        let dir = self
            .media_root
            .join("media")
            .join("avatars")
            .join(user_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let file_path = dir.join(format!("avatar{extension}"));
        tokio::fs::write(&file_path, bytes).await?;

        let web_path = format!("/media/avatars/{user_id}/avatar{extension}");
        debug!(user = %user_id, path = %web_path, size = bytes.len(), "avatar stored");

        Media::new(
            &file_path.to_string_lossy(),
            &web_path,
            &extension,
            bytes.len() as u64,
        )
        .map_err(|err| match err {
            DomainError::Validation(msg) => {
                StorageError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, msg))
            }
            other => StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                other.to_string(),
            )),
        })
    }
}
