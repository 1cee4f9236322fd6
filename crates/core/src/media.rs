//! Library item and media stream model.
//!
//! These are snapshots of metadata that a prober has already gathered. The
//! gate and planner only read them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::Ticks;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Physical layout of a video item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoType {
    #[default]
    Normal,
    Dvd,
    BluRay,
    Iso,
}

/// Disc layout inside an ISO image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsoType {
    Dvd,
    BluRay,
}

/// Stereoscopic packing of a 3D video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Video3DFormat {
    HalfSideBySide,
    FullSideBySide,
    FullTopAndBottom,
    HalfTopAndBottom,
    Mvc,
}

/// How a media path is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaProtocol {
    #[default]
    File,
    Http,
    Rtmp,
    Rtsp,
    Udp,
    Rtp,
    Ftp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaStreamType {
    Video,
    Audio,
    Subtitle,
    EmbeddedImage,
    Data,
    Lyric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Jpg,
    Png,
    Webp,
}

/// Image slots a provider can fill. Frame grabs only ever fill `Primary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageType {
    Primary,
    Backdrop,
    Thumb,
}

// ---------------------------------------------------------------------------
// Streams and items
// ---------------------------------------------------------------------------

/// One stream within a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStream {
    pub stream_type: MediaStreamType,
    /// Position of the stream within the container.
    pub index: i32,
    /// Free-text comment; for attached pictures this often reads
    /// "Cover (front)" or similar.
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub codec: Option<String>,
}

impl MediaStream {
    pub fn new(stream_type: MediaStreamType, index: i32) -> Self {
        Self {
            stream_type,
            index,
            comment: None,
            codec: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// ASCII case-insensitive substring match on the comment. A missing
    /// comment never matches.
    pub fn comment_contains(&self, needle: &str) -> bool {
        self.comment
            .as_deref()
            .is_some_and(|c| c.to_ascii_lowercase().contains(&needle.to_ascii_lowercase()))
    }
}

/// A probed video file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoItem {
    /// Local filesystem path or a non-file locator such as a URL.
    pub path: String,
    #[serde(default)]
    pub is_placeholder: bool,
    #[serde(default)]
    pub video_type: VideoType,
    #[serde(default)]
    pub iso_type: Option<IsoType>,
    pub container: String,
    #[serde(default)]
    pub runtime_ticks: Option<Ticks>,
    #[serde(default)]
    pub video_3d_format: Option<Video3DFormat>,
    /// `None` when the prober found no decodable video stream.
    #[serde(default)]
    pub default_video_stream_index: Option<i32>,
    #[serde(default)]
    pub is_shortcut: bool,
    #[serde(default = "default_true")]
    pub is_file_protocol: bool,
    #[serde(default)]
    pub is_complete_media: bool,
    #[serde(default)]
    pub path_protocol: Option<MediaProtocol>,
    #[serde(default)]
    pub media_streams: Vec<MediaStream>,
}

fn default_true() -> bool {
    true
}

impl VideoItem {
    /// Streams of the given type, in container order.
    pub fn streams_of_type(
        &self,
        stream_type: MediaStreamType,
    ) -> impl Iterator<Item = &MediaStream> + '_ {
        self.media_streams
            .iter()
            .filter(move |s| s.stream_type == stream_type)
    }
}

/// A library entry that is not a video (audio track, photo, folder...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherItem {
    pub path: String,
    pub kind: String,
    #[serde(default)]
    pub is_shortcut: bool,
    #[serde(default = "default_true")]
    pub is_file_protocol: bool,
}

/// Any item handed over by the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item_type", rename_all = "snake_case")]
pub enum LibraryItem {
    Video(VideoItem),
    Other(OtherItem),
}

impl LibraryItem {
    pub fn path(&self) -> &str {
        match self {
            Self::Video(v) => &v.path,
            Self::Other(o) => &o.path,
        }
    }

    pub fn is_shortcut(&self) -> bool {
        match self {
            Self::Video(v) => v.is_shortcut,
            Self::Other(o) => o.is_shortcut,
        }
    }

    pub fn is_file_protocol(&self) -> bool {
        match self {
            Self::Video(v) => v.is_file_protocol,
            Self::Other(o) => o.is_file_protocol,
        }
    }

    pub fn as_video(&self) -> Option<&VideoItem> {
        match self {
            Self::Video(v) => Some(v),
            Self::Other(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Encoder input / planner output
// ---------------------------------------------------------------------------

/// Source description handed to the encoder for a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MediaSourceDescriptor {
    pub video_type: VideoType,
    pub iso_type: Option<IsoType>,
    pub protocol: MediaProtocol,
}

impl MediaSourceDescriptor {
    /// Whether the source is read as a Blu-ray structure rather than a
    /// plain container.
    pub fn is_bluray(&self) -> bool {
        self.video_type == VideoType::BluRay
            || (self.video_type == VideoType::Iso && self.iso_type == Some(IsoType::BluRay))
    }
}

/// Outcome of one extraction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageExtractionResult {
    pub has_image: bool,
    pub format: Option<ImageFormat>,
    pub path: Option<PathBuf>,
    pub protocol: Option<MediaProtocol>,
}

impl ImageExtractionResult {
    /// The "no image" result returned for ineligible items.
    pub fn none() -> Self {
        Self {
            has_image: false,
            format: None,
            path: None,
            protocol: None,
        }
    }

    /// A JPEG written by the encoder to a local file.
    pub fn local_jpeg(path: PathBuf) -> Self {
        Self {
            has_image: true,
            format: Some(ImageFormat::Jpg),
            path: Some(path),
            protocol: Some(MediaProtocol::File),
        }
    }
}
