use std::path::{Path, PathBuf};

use crate::assets::decode::{PreparedImage, decode_image};
use crate::foundation::error::{AssetKind, ReelError, ReelResult};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
/// A validated handle to one input file.
pub struct MediaAsset {
    /// What the file is used for.
    pub kind: AssetKind,
    /// Path as given by the caller.
    pub path: PathBuf,
    /// Always `true` for handles returned by the loader.
    pub validated: bool,
}

impl MediaAsset {
    fn validated(kind: AssetKind, path: &Path) -> Self {
        Self {
            kind,
            path: path.to_path_buf(),
            validated: true,
        }
    }
}

#[derive(Clone, Debug)]
/// Photo handle plus its decoded pixels.
pub struct PhotoAsset {
    pub asset: MediaAsset,
    pub image: PreparedImage,
}

#[derive(Clone, Debug)]
/// Script handle plus its sentence split.
pub struct TextAsset {
    pub asset: MediaAsset,
    /// Ordered, non-empty, trimmed sentences.
    pub sentences: Vec<String>,
}

#[derive(Clone, Debug)]
/// All three validated inputs of one run.
pub struct LoadedAssets {
    pub photo: PhotoAsset,
    pub audio: MediaAsset,
    pub text: TextAsset,
}

/// Validate and load photo, audio and text, in that order.
///
/// Fails fast: a missing photo is reported before the audio file is even looked at.
#[tracing::instrument]
pub fn load_assets(photo: &Path, audio: &Path, text: &Path) -> ReelResult<LoadedAssets> {
    let photo = load_photo(photo)?;
    let audio = load_audio(audio)?;
    let text = load_text(text)?;
    tracing::info!(
        photo_w = photo.image.width,
        photo_h = photo.image.height,
        sentences = text.sentences.len(),
        "assets loaded"
    );
    Ok(LoadedAssets { photo, audio, text })
}

pub fn load_photo(path: &Path) -> ReelResult<PhotoAsset> {
    let bytes = read_existing(AssetKind::Photo, path)?;
    let image = decode_image(&bytes)
        .map_err(|e| ReelError::invalid(AssetKind::Photo, path, e.to_string()))?;
    if image.width == 0 || image.height == 0 {
        return Err(ReelError::invalid(
            AssetKind::Photo,
            path,
            "image has zero width or height",
        ));
    }
    Ok(PhotoAsset {
        asset: MediaAsset::validated(AssetKind::Photo, path),
        image,
    })
}

/// Check the audio file exists and is non-empty. Decoding happens in the analyzer.
pub fn load_audio(path: &Path) -> ReelResult<MediaAsset> {
    let meta = metadata_existing(AssetKind::Audio, path)?;
    if !meta.is_file() {
        return Err(ReelError::invalid(AssetKind::Audio, path, "not a regular file"));
    }
    if meta.len() == 0 {
        return Err(ReelError::invalid(AssetKind::Audio, path, "file is empty"));
    }
    Ok(MediaAsset::validated(AssetKind::Audio, path))
}

pub fn load_text(path: &Path) -> ReelResult<TextAsset> {
    let bytes = read_existing(AssetKind::Text, path)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| ReelError::invalid(AssetKind::Text, path, format!("not UTF-8: {e}")))?;
    if text.trim().is_empty() {
        return Err(ReelError::invalid(AssetKind::Text, path, "text is empty"));
    }
    Ok(TextAsset {
        asset: MediaAsset::validated(AssetKind::Text, path),
        sentences: split_sentences(&text),
    })
}

/// Split on `.`, `!` and `?` followed by whitespace or end of input.
///
/// The terminator stays attached to its sentence. Line breaks count as spaces, runs of
/// whitespace collapse, and fragments with no word characters are dropped, so `"..."` yields
/// nothing and `"v1.2 is out."` stays one sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars: Vec<char> = normalized.chars().collect();

    let mut out = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        current.push(c);
        let is_terminator = matches!(c, '.' | '!' | '?');
        let at_boundary = chars.get(i + 1).is_none_or(|n| n.is_whitespace());
        if is_terminator && at_boundary {
            push_sentence(&mut out, &current);
            current.clear();
        }
    }
    push_sentence(&mut out, &current);
    out
}

fn push_sentence(out: &mut Vec<String>, fragment: &str) {
    let s = fragment.trim();
    if s.chars().any(char::is_alphanumeric) {
        out.push(s.to_string());
    }
}

fn metadata_existing(kind: AssetKind, path: &Path) -> ReelResult<std::fs::Metadata> {
    match std::fs::metadata(path) {
        Ok(m) => Ok(m),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ReelError::not_found(kind, path))
        }
        Err(e) => Err(ReelError::invalid(kind, path, e.to_string())),
    }
}

fn read_existing(kind: AssetKind, path: &Path) -> ReelResult<Vec<u8>> {
    match std::fs::read(path) {
        Ok(b) => Ok(b),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ReelError::not_found(kind, path))
        }
        Err(e) => Err(ReelError::invalid(kind, path, e.to_string())),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
