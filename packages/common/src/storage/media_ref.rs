use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace prefix shared by every media reference.
const NAMESPACE: &str = "media";

/// The kind of blob a reference points at.
///
/// The category is encoded in the reference path, so it is recoverable from
/// the string form alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaCategory {
    /// Book cover art.
    Cover,
    /// Image attached to an entry.
    EntryImage,
    /// Audio recording attached to an entry.
    EntryAudio,
    /// User avatar.
    Avatar,
    /// Compiled document artifact.
    Document,
}

impl MediaCategory {
    /// All categories, used to pre-create storage directories.
    pub const ALL: [MediaCategory; 5] = [
        MediaCategory::Cover,
        MediaCategory::EntryImage,
        MediaCategory::EntryAudio,
        MediaCategory::Avatar,
        MediaCategory::Document,
    ];

    /// Path segment for this category.
    pub fn segment(&self) -> &'static str {
        match self {
            MediaCategory::Cover => "cover",
            MediaCategory::EntryImage => "entryImage",
            MediaCategory::EntryAudio => "entryAudio",
            MediaCategory::Avatar => "avatar",
            MediaCategory::Document => "pdf",
        }
    }

    fn from_segment(s: &str) -> Option<Self> {
        match s {
            "cover" => Some(MediaCategory::Cover),
            "entryImage" => Some(MediaCategory::EntryImage),
            "entryAudio" => Some(MediaCategory::EntryAudio),
            "avatar" => Some(MediaCategory::Avatar),
            "pdf" => Some(MediaCategory::Document),
            _ => None,
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Reasons a media reference string fails to parse.
#[derive(Debug, thiserror::Error)]
pub enum MediaRefError {
    #[error("expected 'media/<category>/<file>', got {0:?}")]
    Malformed(String),
    #[error("unknown media category {0:?}")]
    UnknownCategory(String),
    #[error("invalid blob filename {0:?}")]
    InvalidFilename(String),
}

/// A validated handle to a stored blob: `media/<category>/<file>.<ext>`.
///
/// A reference is borrowed, not owned: the blob behind it belongs to the
/// record that persists the reference, and replacing the reference orphans
/// the blob.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MediaRef {
    category: MediaCategory,
    filename: String,
}

impl MediaRef {
    /// Build a reference from a category and a validated flat filename.
    pub fn new(category: MediaCategory, filename: &str) -> Result<Self, MediaRefError> {
        validate_filename(filename)?;
        Ok(Self {
            category,
            filename: filename.to_string(),
        })
    }

    /// Parse the string form of a reference.
    pub fn parse(s: &str) -> Result<Self, MediaRefError> {
        let mut parts = s.split('/');
        let (ns, category, filename) = match (parts.next(), parts.next(), parts.next(), parts.next())
        {
            (Some(ns), Some(cat), Some(file), None) => (ns, cat, file),
            _ => return Err(MediaRefError::Malformed(s.to_string())),
        };

        if ns != NAMESPACE {
            return Err(MediaRefError::Malformed(s.to_string()));
        }

        let category = MediaCategory::from_segment(category)
            .ok_or_else(|| MediaRefError::UnknownCategory(category.to_string()))?;

        Self::new(category, filename)
    }

    pub fn category(&self) -> MediaCategory {
        self.category
    }

    /// The blob's filename within its category directory.
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

/// The full string form, e.g. `media/entryImage/1f0a….png`.
impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{NAMESPACE}/{}/{}", self.category.segment(), self.filename)
    }
}

impl Serialize for MediaRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MediaRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Blob filenames are flat: a single path segment, no traversal, no control
/// characters, not hidden.
fn validate_filename(filename: &str) -> Result<(), MediaRefError> {
    let invalid = filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains('\0')
        || filename.chars().any(|c| c.is_ascii_control())
        || filename == ".."
        || filename.starts_with('.');

    if invalid {
        return Err(MediaRefError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trip() {
        let r = MediaRef::parse("media/entryImage/abc123.png").unwrap();
        assert_eq!(r.category(), MediaCategory::EntryImage);
        assert_eq!(r.filename(), "abc123.png");
        assert_eq!(r.to_string(), "media/entryImage/abc123.png");
    }

    #[test]
    fn parse_all_categories() {
        for cat in MediaCategory::ALL {
            let s = format!("media/{}/file.bin", cat.segment());
            let r = MediaRef::parse(&s).unwrap();
            assert_eq!(r.category(), cat);
        }
    }

    #[test]
    fn parse_rejects_wrong_namespace() {
        assert!(matches!(
            MediaRef::parse("files/cover/a.png"),
            Err(MediaRefError::Malformed(_))
        ));
    }

    #[test]
    fn parse_rejects_unknown_category() {
        assert!(matches!(
            MediaRef::parse("media/video/a.mp4"),
            Err(MediaRefError::UnknownCategory(_))
        ));
    }

    #[test]
    fn parse_rejects_extra_segments() {
        assert!(MediaRef::parse("media/cover/a/b.png").is_err());
        assert!(MediaRef::parse("media/cover").is_err());
    }

    #[test]
    fn rejects_traversal_and_hidden_filenames() {
        assert!(MediaRef::new(MediaCategory::Cover, "..").is_err());
        assert!(MediaRef::new(MediaCategory::Cover, ".hidden").is_err());
        assert!(MediaRef::new(MediaCategory::Cover, "a\0b").is_err());
        assert!(MediaRef::new(MediaCategory::Cover, "a\r\nb").is_err());
        assert!(MediaRef::parse("media/cover/../escape.png").is_err());
    }

    #[test]
    fn filename_without_extension_is_allowed() {
        // Extension handling is the lifecycle manager's concern, not the ref's.
        assert!(MediaRef::new(MediaCategory::EntryAudio, "noext").is_ok());
    }

    #[test]
    fn serde_round_trip() {
        let r = MediaRef::parse("media/pdf/book.pdf").unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"media/pdf/book.pdf\"");
        let parsed: MediaRef = serde_json::from_str(&json).unwrap();
        assert_eq!(r, parsed);
    }
}
