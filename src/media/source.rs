use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::foundation::{
    error::{ImgcmpError, ImgcmpResult},
    mime::ImageMimeType,
};

#[derive(Clone, Debug)]
enum SourceData {
    Memory(Arc<[u8]>),
    Path(PathBuf),
}

/// Immutable handle to an image selected for a sweep.
///
/// The MIME type is checked against the allow-set at construction, so every live
/// `SourceImage` is transcodable as far as the comparator is concerned.
#[derive(Clone, Debug)]
pub struct SourceImage {
    name: String,
    mime: ImageMimeType,
    len: u64,
    data: SourceData,
}

impl SourceImage {
    /// Wrap in-memory bytes. `mime` is a raw MIME string as reported by the caller.
    pub fn from_bytes(
        name: impl Into<String>,
        mime: &str,
        bytes: impl Into<Arc<[u8]>>,
    ) -> ImgcmpResult<Self> {
        let mime = ImageMimeType::parse(mime)?;
        let name = normalize_file_name(&name.into())?;
        let bytes = bytes.into();
        Ok(Self {
            name,
            mime,
            len: bytes.len() as u64,
            data: SourceData::Memory(bytes),
        })
    }

    /// Reference a file on disk; its type is inferred from the extension.
    ///
    /// Only metadata is read here. The bytes are read later by [`read_as_bytes`].
    pub fn from_path(path: impl AsRef<Path>) -> ImgcmpResult<Self> {
        let path = path.as_ref();
        let mime = ImageMimeType::from_path(path)?;
        Self::from_path_with_mime(path, mime)
    }

    /// Reference a file on disk with an explicit type, bypassing extension inference.
    pub fn from_path_with_mime(path: impl AsRef<Path>, mime: ImageMimeType) -> ImgcmpResult<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                ImgcmpError::validation(format!("'{}' has no usable file name", path.display()))
            })?;
        let name = normalize_file_name(file_name)?;
        let meta = std::fs::metadata(path)
            .map_err(|e| ImgcmpError::read(format!("stat '{}': {e}", path.display())))?;
        if !meta.is_file() {
            return Err(ImgcmpError::read(format!(
                "'{}' is not a regular file",
                path.display()
            )));
        }
        Ok(Self {
            name,
            mime,
            len: meta.len(),
            data: SourceData::Path(path.to_path_buf()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> ImageMimeType {
        self.mime
    }

    /// Byte length recorded when the source was selected.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.data {
            SourceData::Path(p) => Some(p),
            SourceData::Memory(_) => None,
        }
    }
}

/// Materialize the source into a byte buffer.
///
/// Fails with [`ImgcmpError::ReadError`] when the backing file is gone, unreadable, or changed
/// size since selection. No retry is attempted.
pub async fn read_as_bytes(source: &SourceImage) -> ImgcmpResult<Arc<[u8]>> {
    let bytes: Arc<[u8]> = match &source.data {
        SourceData::Memory(b) => return Ok(Arc::clone(b)),
        SourceData::Path(path) => tokio::fs::read(path)
            .await
            .map_err(|e| ImgcmpError::read(format!("read '{}': {e}", path.display())))?
            .into(),
    };

    if bytes.len() as u64 != source.len {
        return Err(ImgcmpError::read(format!(
            "'{}' changed size since it was selected ({} -> {} bytes)",
            source.name,
            source.len,
            bytes.len()
        )));
    }
    tracing::debug!(name = %source.name, bytes = bytes.len(), "materialized source");
    Ok(bytes)
}

/// Reduce a caller-supplied name to a bare file name usable as a staging key.
///
/// Directory components (either separator) are dropped; `.` and `..` are rejected.
pub fn normalize_file_name(raw: &str) -> ImgcmpResult<String> {
    let base = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        return Err(ImgcmpError::validation(format!(
            "source name '{raw}' must contain a file name"
        )));
    }
    Ok(base.to_string())
}

#[cfg(test)]
#[path = "../../tests/unit/media/source.rs"]
mod tests;
