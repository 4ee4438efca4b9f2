//! Upload content-type gate.
//!
//! Runs before the lifecycle manager: an upload whose declared filename maps
//! outside the allowed image/audio sets never reaches storage.

use memoir_common::MediaCategory;

use crate::error::AppError;

/// Validate an upload's declared filename against the category's allowed
/// content types.
pub fn validate_media_type(filename: &str, category: MediaCategory) -> Result<(), AppError> {
    let mime = mime_guess::from_path(filename).first();

    let allowed = match category {
        MediaCategory::Cover | MediaCategory::EntryImage | MediaCategory::Avatar => mime
            .as_ref()
            .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE),
        MediaCategory::EntryAudio => mime
            .as_ref()
            .is_some_and(|m| m.type_() == mime_guess::mime::AUDIO),
        // Artifacts are produced internally, never uploaded.
        MediaCategory::Document => false,
    };

    if allowed {
        Ok(())
    } else {
        let detected = mime.map_or_else(|| "unknown".to_string(), |m| m.to_string());
        Err(AppError::UnsupportedMedia(format!(
            "'{filename}' ({detected}) is not an accepted {} upload",
            category_noun(category)
        )))
    }
}

fn category_noun(category: MediaCategory) -> &'static str {
    match category {
        MediaCategory::Cover => "cover image",
        MediaCategory::EntryImage => "image",
        MediaCategory::EntryAudio => "audio",
        MediaCategory::Avatar => "avatar image",
        MediaCategory::Document => "document",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_image_types() {
        for name in ["a.png", "b.jpg", "c.jpeg", "d.gif", "e.webp"] {
            assert!(validate_media_type(name, MediaCategory::EntryImage).is_ok());
            assert!(validate_media_type(name, MediaCategory::Cover).is_ok());
        }
    }

    #[test]
    fn accepts_common_audio_types() {
        for name in ["a.mp3", "b.wav", "c.ogg", "d.m4a"] {
            assert!(validate_media_type(name, MediaCategory::EntryAudio).is_ok());
        }
    }

    #[test]
    fn rejects_cross_category_uploads() {
        assert!(matches!(
            validate_media_type("song.mp3", MediaCategory::Cover),
            Err(AppError::UnsupportedMedia(_))
        ));
        assert!(matches!(
            validate_media_type("photo.png", MediaCategory::EntryAudio),
            Err(AppError::UnsupportedMedia(_))
        ));
    }

    #[test]
    fn rejects_unknown_and_dangerous_types() {
        assert!(validate_media_type("script.exe", MediaCategory::EntryImage).is_err());
        assert!(validate_media_type("noext", MediaCategory::EntryImage).is_err());
        assert!(validate_media_type("doc.pdf", MediaCategory::Document).is_err());
    }
}
