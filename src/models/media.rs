//! Media Models
//!
//! Media references attached to entities and files queued for upload.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Content type tag selecting the in-memory bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaType {
    #[default]
    Photo,
    Video,
    Audio,
    Document,
}

impl MediaType {
    pub fn code(&self) -> i64 {
        match self {
            MediaType::Photo => 0,
            MediaType::Video => 1,
            MediaType::Audio => 2,
            MediaType::Document => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(MediaType::Photo),
            1 => Some(MediaType::Video),
            2 => Some(MediaType::Audio),
            3 => Some(MediaType::Document),
            _ => None,
        }
    }

    /// Best guess from a MIME type, documents by default
    pub fn from_mime(mime: &str) -> Self {
        match mime.split('/').next() {
            Some("image") => MediaType::Photo,
            Some("video") => MediaType::Video,
            Some("audio") => MediaType::Audio,
            _ => MediaType::Document,
        }
    }
}

/// Row of an entity's media list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItemRef {
    /// Pairing record id, used for deletion
    #[serde(default)]
    pub itemuid: String,
    #[serde(default)]
    pub mediauid: String,
    #[serde(default)]
    pub contenttype: i64,
}

impl MediaItemRef {
    pub fn media_type(&self) -> Option<MediaType> {
        MediaType::from_code(self.contenttype)
    }
}

/// Resolved photo ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageItem {
    pub itemuid: String,
    /// Data URL of the downloaded bytes
    pub src: String,
}

/// Media ids sorted by content type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaBuckets {
    pub photos: Vec<MediaItemRef>,
    pub videos: Vec<String>,
    pub audio: Vec<String>,
    pub documents: Vec<String>,
}

impl MediaBuckets {
    /// Items without a media id or with an unknown content type are dropped
    pub fn sort(items: Vec<MediaItemRef>) -> Self {
        let mut buckets = Self::default();
        for item in items {
            if item.mediauid.is_empty() {
                continue;
            }
            match item.media_type() {
                Some(MediaType::Photo) => buckets.photos.push(item),
                Some(MediaType::Video) => buckets.videos.push(item.mediauid),
                Some(MediaType::Audio) => buckets.audio.push(item.mediauid),
                Some(MediaType::Document) => buckets.documents.push(item.mediauid),
                None => {}
            }
        }
        buckets
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
            && self.videos.is_empty()
            && self.audio.is_empty()
            && self.documents.is_empty()
    }
}

/// File selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Content type guessed from the file name
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }

    pub fn media_type(&self) -> MediaType {
        MediaType::from_mime(&self.content_type)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(mediauid: &str, contenttype: i64) -> MediaItemRef {
        MediaItemRef {
            itemuid: format!("pair-{}", mediauid),
            mediauid: mediauid.to_string(),
            contenttype,
        }
    }

    #[test]
    fn test_sort_into_buckets() {
        let buckets = MediaBuckets::sort(vec![
            media("p1", 0),
            media("v1", 1),
            media("a1", 2),
            media("d1", 3),
            media("x1", 9),
            media("", 0),
            media("p2", 0),
        ]);

        assert_eq!(buckets.photos.len(), 2);
        assert_eq!(buckets.photos[1].itemuid, "pair-p2");
        assert_eq!(buckets.videos, vec!["v1"]);
        assert_eq!(buckets.audio, vec!["a1"]);
        assert_eq!(buckets.documents, vec!["d1"]);
    }

    #[test]
    fn test_upload_file_guesses_type() {
        let file = UploadFile::new("front.jpg", vec![1, 2, 3]);
        assert_eq!(file.content_type, "image/jpeg");
        assert_eq!(file.media_type(), MediaType::Photo);

        let doc = UploadFile::new("title.unknownext", vec![1]);
        assert_eq!(doc.content_type, "application/octet-stream");
        assert_eq!(doc.media_type(), MediaType::Document);
    }
}
