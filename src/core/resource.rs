use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{PlanError, PlanResult};

static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(?P<ext>png|jpe?g|gif|bmp|tga|webp|qoi)$").unwrap()
});

static SOUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(?P<ext>ogg|wav|mp3|flac|xm|mod)$").unwrap()
});

/// Kind of external resource a card can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Image,
    Sound,
}

/// Mimetype for a resource path, derived from its extension.
pub fn mime_type(path: &str) -> Option<String> {
    let path = path.trim();
    if let Some(caps) = IMAGE_RE.captures(path) {
        let ext = caps["ext"].to_ascii_lowercase();
        let sub = match ext.as_str() {
            "jpg" | "jpeg" => "jpeg",
            "tga" => "x-tga",
            other => other,
        };
        return Some(format!("image/{}", sub));
    }
    if let Some(caps) = SOUND_RE.captures(path) {
        let ext = caps["ext"].to_ascii_lowercase();
        let sub = match ext.as_str() {
            "mp3" => "mpeg",
            "xm" | "mod" => "x-mod",
            other => other,
        };
        return Some(format!("audio/{}", sub));
    }
    None
}

pub fn classify(path: &str) -> Option<ResourceKind> {
    let mime = mime_type(path)?;
    if mime.starts_with("image/") {
        Some(ResourceKind::Image)
    } else if mime.starts_with("audio/") {
        Some(ResourceKind::Sound)
    } else {
        None
    }
}

/// Check that a resource exists and is of a recognised type.
pub fn probe(path: &str) -> PlanResult<ResourceKind> {
    let trimmed = path.trim();
    if trimmed.is_empty() || !Path::new(trimmed).exists() {
        return Err(PlanError::NotFound(trimmed.into()));
    }
    classify(trimmed).ok_or_else(|| PlanError::Decode(format!("resource {}", trimmed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(classify("/tmp/cat.PNG"), Some(ResourceKind::Image));
        assert_eq!(classify("song.ogg"), Some(ResourceKind::Sound));
        assert_eq!(classify("notes.txt"), None);
        assert_eq!(mime_type("a.jpg").as_deref(), Some("image/jpeg"));
        assert_eq!(mime_type("b.mp3").as_deref(), Some("audio/mpeg"));
    }

    #[test]
    fn probe_missing_file_is_not_found() {
        let path = std::env::temp_dir().join(format!("{}.png", uuid::Uuid::new_v4()));
        let err = probe(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, PlanError::NotFound(_)));
    }

    #[test]
    fn probe_unknown_type_is_decode_error() {
        let path = std::env::temp_dir().join(format!("{}.bin", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"x").unwrap();
        let err = probe(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, PlanError::Decode(_)));
        std::fs::remove_file(&path).unwrap();
    }
}
