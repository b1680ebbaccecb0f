use std::path::{Path, PathBuf};

/// Convenience result type used across introreel.
pub type ReelResult<T> = Result<T, ReelError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Which input an asset error refers to.
pub enum AssetKind {
    /// Still photo (JPEG/PNG).
    Photo,
    /// Voice recording.
    Audio,
    /// Intro script (UTF-8 text).
    Text,
    /// Pre-rendered lip-sync video.
    Video,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Photo => "photo",
            Self::Audio => "audio",
            Self::Text => "text",
            Self::Video => "video",
        };
        f.write_str(s)
    }
}

/// Top-level error taxonomy used by pipeline stages.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// An input path does not exist.
    #[error("asset not found: {kind} '{}'", path.display())]
    AssetNotFound {
        /// Which input was missing.
        kind: AssetKind,
        /// Path as given by the caller.
        path: PathBuf,
    },

    /// An input exists but cannot be used (corrupt image, empty text, unreadable audio).
    #[error("invalid asset: {kind} '{}': {reason}", path.display())]
    AssetInvalid {
        /// Which input was rejected.
        kind: AssetKind,
        /// Path as given by the caller.
        path: PathBuf,
        /// Human-readable cause.
        reason: String,
    },

    /// Audio could not be decoded, or decoded to a zero-length signal.
    #[error("audio decode error: {0}")]
    AudioDecode(String),

    /// The timeline cannot be laid out (no captions, non-positive duration).
    #[error("layout error: {0}")]
    Layout(String),

    /// The external encoder failed; carries its diagnostic output.
    #[error("encode error: {0}")]
    Encode(String),

    /// Invalid configuration or API misuse.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::AssetNotFound`] value.
    pub fn not_found(kind: AssetKind, path: impl AsRef<Path>) -> Self {
        Self::AssetNotFound {
            kind,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Build a [`ReelError::AssetInvalid`] value.
    pub fn invalid(kind: AssetKind, path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::AssetInvalid {
            kind,
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Build a [`ReelError::AudioDecode`] value.
    pub fn audio_decode(msg: impl Into<String>) -> Self {
        Self::AudioDecode(msg.into())
    }

    /// Build a [`ReelError::Layout`] value.
    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    /// Build a [`ReelError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
