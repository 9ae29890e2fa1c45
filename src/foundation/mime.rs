use std::{fmt, path::Path, str::FromStr};

use crate::foundation::error::{ImgcmpError, ImgcmpResult};

/// Image MIME types accepted as sweep sources.
///
/// `image/jpg` is not a registered type but browsers and upload forms emit it, so it is kept
/// distinct from `image/jpeg` to round-trip whatever the caller supplied.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum ImageMimeType {
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/jpg")]
    Jpg,
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/gif")]
    Gif,
    #[serde(rename = "image/webp")]
    Webp,
}

impl ImageMimeType {
    /// Every accepted type, in declaration order.
    pub const ALL: [ImageMimeType; 5] = [
        ImageMimeType::Png,
        ImageMimeType::Jpg,
        ImageMimeType::Jpeg,
        ImageMimeType::Gif,
        ImageMimeType::Webp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImageMimeType::Png => "image/png",
            ImageMimeType::Jpg => "image/jpg",
            ImageMimeType::Jpeg => "image/jpeg",
            ImageMimeType::Gif => "image/gif",
            ImageMimeType::Webp => "image/webp",
        }
    }

    /// Parse a MIME string against the allow-set.
    pub fn parse(raw: &str) -> ImgcmpResult<Self> {
        let s = raw.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ImgcmpError::unsupported_mime(raw))
    }

    /// Infer the type from a file extension (`png`, `jpg`, `jpeg`, `gif`, `webp`).
    pub fn from_extension(ext: &str) -> ImgcmpResult<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageMimeType::Png),
            "jpg" => Ok(ImageMimeType::Jpg),
            "jpeg" => Ok(ImageMimeType::Jpeg),
            "gif" => Ok(ImageMimeType::Gif),
            "webp" => Ok(ImageMimeType::Webp),
            other => Err(ImgcmpError::unsupported_mime(format!(
                "no accepted image type for extension '.{other}'"
            ))),
        }
    }

    pub fn from_path(path: &Path) -> ImgcmpResult<Self> {
        let ext = path.extension().and_then(|s| s.to_str()).ok_or_else(|| {
            ImgcmpError::unsupported_mime(format!(
                "cannot infer image type of '{}' without an extension",
                path.display()
            ))
        })?;
        Self::from_extension(ext)
    }

    /// `true` for container types that may hold more than one frame.
    pub fn may_be_animated(self) -> bool {
        matches!(self, ImageMimeType::Gif | ImageMimeType::Webp)
    }
}

impl fmt::Display for ImageMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageMimeType {
    type Err = ImgcmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/mime.rs"]
mod tests;
