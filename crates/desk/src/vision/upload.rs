//! Validated image uploads.

use std::path::Path;
use std::sync::Arc;

use image::ImageFormat;

use super::VisionError;

/// Largest accepted upload (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// An image file accepted for identification.
///
/// The bytes are shared so every source can read them without copying.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    name: String,
    format: ImageFormat,
    bytes: Arc<[u8]>,
}

impl ImageUpload {
    /// Read and validate an image file.
    ///
    /// # Errors
    ///
    /// Returns `VisionError::Io` if the file cannot be read,
    /// `VisionError::TooLarge` over [`MAX_UPLOAD_BYTES`] and
    /// `VisionError::NotAnImage` for anything that is not a known image format.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, VisionError> {
        let path = path.as_ref();
        let io_err = |source| VisionError::Io {
            path: path.to_path_buf(),
            source,
        };

        let size = tokio::fs::metadata(path).await.map_err(io_err)?.len();
        check_size(size)?;

        let bytes = tokio::fs::read(path).await.map_err(io_err)?;
        let name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
        Self::from_bytes(name, bytes)
    }

    /// Validate in-memory image bytes.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_path`] minus I/O.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, VisionError> {
        check_size(bytes.len() as u64)?;
        let format = image::guess_format(&bytes).map_err(|_| VisionError::NotAnImage)?;

        Ok(Self {
            name: name.into(),
            format,
            bytes: bytes.into(),
        })
    }

    /// File name shown to the user.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Detected image format.
    #[must_use]
    pub const fn format(&self) -> ImageFormat {
        self.format
    }

    /// MIME type for the detected format.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Raw file contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the contents.
    #[must_use]
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the upload is empty (never true for a validated upload).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn check_size(size: u64) -> Result<(), VisionError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(VisionError::TooLarge { size });
    }
    Ok(())
}
