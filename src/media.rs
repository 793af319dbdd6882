use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::ApiError;

/// Where recipe images live. The production implementation writes files under
/// `MEDIA_ROOT`; tests swap in an in-memory store.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn save(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn save(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create media dir {}", parent.display()))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write media file {}", path.display()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let path = self.root.join(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove media file {}", path.display())),
        }
    }
}

#[derive(Debug)]
pub struct DecodedImage {
    pub bytes: Bytes,
    pub extension: &'static str,
}

/// Parses a `data:image/...;base64,...` payload as uploaded by clients.
pub fn decode_data_url(data_url: &str) -> Result<DecodedImage, ApiError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| ApiError::Validation("image must be a base64 data URL".into()))?;
    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| ApiError::Validation("image must be base64-encoded".into()))?;
    let extension = ext_from_mime(mime)
        .ok_or_else(|| ApiError::Validation(format!("unsupported image type {mime}")))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| ApiError::Validation("invalid base64 image payload".into()))?;
    Ok(DecodedImage {
        bytes: Bytes::from(bytes),
        extension,
    })
}

/// Builds the relative storage key for a new recipe image.
pub fn recipe_image_key(extension: &str) -> String {
    format!("recipes/{}.{}", Uuid::new_v4(), extension)
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_data_url() {
        // 1x1 transparent PNG
        let data = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
        let img = decode_data_url(data).expect("decode");
        assert_eq!(img.extension, "png");
        assert!(!img.bytes.is_empty());
    }

    #[test]
    fn rejects_plain_strings() {
        assert!(decode_data_url("not a data url").is_err());
        assert!(decode_data_url("data:image/png,missing-base64-marker").is_err());
    }

    #[test]
    fn rejects_unknown_mime() {
        let err = decode_data_url("data:application/pdf;base64,AAAA").unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn rejects_broken_base64() {
        assert!(decode_data_url("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn image_keys_are_namespaced() {
        let key = recipe_image_key("jpg");
        assert!(key.starts_with("recipes/"));
        assert!(key.ends_with(".jpg"));
    }

    #[test]
    fn ext_from_mime_covers_supported_types() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[tokio::test]
    async fn fs_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("recipebox-media-{}", Uuid::new_v4()));
        let store = FsMediaStore::new(&dir);
        store
            .save("recipes/test.png", Bytes::from_static(b"png-bytes"))
            .await
            .expect("save");
        let on_disk = tokio::fs::read(dir.join("recipes/test.png")).await.expect("read back");
        assert_eq!(on_disk, b"png-bytes");
        store.delete("recipes/test.png").await.expect("delete");
        // deleting a missing key is not an error
        store.delete("recipes/test.png").await.expect("delete again");
        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
