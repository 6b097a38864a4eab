//! Identity image intake: reads selected files and encodes them as data URIs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::AssetError;

use super::model::IdentityImage;

/// A file the user picked for upload.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Display name (file name).
    fn name(&self) -> &str;

    /// Declared MIME type, e.g. `image/jpeg`.
    fn mime_type(&self) -> &str;

    /// Read the whole file.
    async fn read(&self) -> Result<Vec<u8>, AssetError>;
}

/// A file already held in memory (drag-and-drop, tests).
#[derive(Debug, Clone)]
pub struct InMemoryFile {
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl InMemoryFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

#[async_trait]
impl FileSource for InMemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn read(&self) -> Result<Vec<u8>, AssetError> {
        Ok(self.bytes.clone())
    }
}

/// A file on the local filesystem. The MIME type comes from the extension.
#[derive(Debug, Clone)]
pub struct PathFile {
    path: PathBuf,
    name: String,
    mime_type: String,
}

impl PathFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_from_extension(&path).to_string();
        Self {
            path,
            name,
            mime_type,
        }
    }
}

#[async_trait]
impl FileSource for PathFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn read(&self) -> Result<Vec<u8>, AssetError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|source| AssetError::Read {
                name: self.name.clone(),
                source,
            })
    }
}

fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Read and encode a single file.
pub async fn encode_file(file: &dyn FileSource) -> Result<IdentityImage, AssetError> {
    let mime_type = file.mime_type();
    if !mime_type.starts_with("image/") {
        return Err(AssetError::UnsupportedType {
            name: file.name().to_string(),
            mime_type: mime_type.to_string(),
        });
    }
    let bytes = file.read().await?;
    if bytes.is_empty() {
        return Err(AssetError::Empty {
            name: file.name().to_string(),
        });
    }
    Ok(IdentityImage::from_data_uri(format!(
        "data:{mime_type};base64,{}",
        BASE64.encode(&bytes)
    )))
}

/// Read a multi-file selection.
///
/// Files are read concurrently but the result keeps the selection order.
/// Unreadable files are dropped with a warning.
pub async fn read_selection(files: &[Box<dyn FileSource>]) -> Vec<IdentityImage> {
    let results = join_all(files.iter().map(|f| encode_file(f.as_ref()))).await;

    let mut images = Vec::with_capacity(results.len());
    for (file, result) in files.iter().zip(results) {
        match result {
            Ok(image) => images.push(image),
            Err(e) => warn!(file = file.name(), error = %e, "Dropping unreadable identity image"),
        }
    }
    debug!(selected = files.len(), read = images.len(), "Identity images read");
    images
}
