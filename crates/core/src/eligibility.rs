//! Eligibility checks run before any image extraction.
//!
//! [`supports`] decides whether an item belongs to the screen grabber at
//! all; [`can_extract`] is the per-request check made right before
//! planning.

use crate::media::{LibraryItem, VideoItem, VideoType};

/// Why a request-scoped extraction was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Placeholder,
    Dvd,
    MissingVideoStream,
}

/// Whether the item should be handled by the screen grabber.
///
/// Only local, fully probed, real video files qualify.
pub fn supports(item: &LibraryItem) -> bool {
    if item.is_shortcut() {
        return false;
    }

    if !item.is_file_protocol() {
        return false;
    }

    matches!(item, LibraryItem::Video(video) if !video.is_placeholder && video.is_complete_media)
}

/// First failing request check, if any.
pub fn skip_reason(item: &VideoItem) -> Option<SkipReason> {
    if item.is_placeholder {
        return Some(SkipReason::Placeholder);
    }

    if item.video_type == VideoType::Dvd {
        return Some(SkipReason::Dvd);
    }

    if item.default_video_stream_index.is_none() {
        return Some(SkipReason::MissingVideoStream);
    }

    None
}

/// Whether extraction should be attempted for this request.
pub fn can_extract(item: &VideoItem) -> bool {
    match skip_reason(item) {
        None => true,
        Some(SkipReason::MissingVideoStream) => {
            tracing::info!(
                path = %item.path,
                "Skipping image extraction due to missing default video stream index"
            );
            false
        }
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::media::{MediaProtocol, OtherItem};

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` under a plain-text subscriber and return what it logged.
    fn captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();

        let value = tracing::subscriber::with_default(subscriber, f);
        let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        (value, logs)
    }

    fn video() -> VideoItem {
        VideoItem {
            path: "/media/movie.mkv".into(),
            is_placeholder: false,
            video_type: VideoType::Normal,
            iso_type: None,
            container: "matroska".into(),
            runtime_ticks: Some(72_000_000_000),
            video_3d_format: None,
            default_video_stream_index: Some(0),
            is_shortcut: false,
            is_file_protocol: true,
            is_complete_media: true,
            path_protocol: Some(MediaProtocol::File),
            media_streams: vec![],
        }
    }

    #[test]
    fn test_supports_complete_local_video() {
        assert!(supports(&LibraryItem::Video(video())));
    }

    #[test]
    fn test_supports_rejects_shortcut() {
        let item = VideoItem {
            is_shortcut: true,
            ..video()
        };
        assert!(!supports(&LibraryItem::Video(item)));
    }

    #[test]
    fn test_supports_rejects_remote_protocol() {
        let item = VideoItem {
            path: "http://example.com/live.ts".into(),
            is_file_protocol: false,
            path_protocol: Some(MediaProtocol::Http),
            ..video()
        };
        assert!(!supports(&LibraryItem::Video(item)));
    }

    #[test]
    fn test_supports_rejects_placeholder() {
        let item = VideoItem {
            is_placeholder: true,
            ..video()
        };
        assert!(!supports(&LibraryItem::Video(item)));
    }

    #[test]
    fn test_supports_rejects_unprobed_video() {
        let item = VideoItem {
            is_complete_media: false,
            ..video()
        };
        assert!(!supports(&LibraryItem::Video(item)));
    }

    #[test]
    fn test_supports_rejects_non_video() {
        let item = LibraryItem::Other(OtherItem {
            path: "/media/song.flac".into(),
            kind: "audio".into(),
            is_shortcut: false,
            is_file_protocol: true,
        });
        assert!(!supports(&item));
    }

    #[test]
    fn test_can_extract_normal_video() {
        assert!(can_extract(&video()));
        assert_eq!(skip_reason(&video()), None);
    }

    #[test]
    fn test_skip_reasons_in_order() {
        let placeholder_dvd = VideoItem {
            is_placeholder: true,
            video_type: VideoType::Dvd,
            default_video_stream_index: None,
            ..video()
        };
        assert_eq!(skip_reason(&placeholder_dvd), Some(SkipReason::Placeholder));

        let dvd = VideoItem {
            video_type: VideoType::Dvd,
            default_video_stream_index: None,
            ..video()
        };
        assert_eq!(skip_reason(&dvd), Some(SkipReason::Dvd));

        let no_stream = VideoItem {
            default_video_stream_index: None,
            ..video()
        };
        assert_eq!(skip_reason(&no_stream), Some(SkipReason::MissingVideoStream));
        assert!(!can_extract(&no_stream));
    }

    #[test]
    fn test_bluray_and_iso_are_extractable() {
        for video_type in [VideoType::BluRay, VideoType::Iso] {
            let item = VideoItem {
                video_type,
                ..video()
            };
            assert!(can_extract(&item));
        }
    }

    #[test]
    fn test_missing_stream_skip_logs_at_info() {
        let item = VideoItem {
            default_video_stream_index: None,
            ..video()
        };

        let (allowed, logs) = captured_logs(|| can_extract(&item));

        assert!(!allowed);
        assert!(logs.contains("INFO"), "unexpected log output: {logs}");
        assert!(logs.contains("missing default video stream index"));
        assert!(logs.contains("/media/movie.mkv"));
        assert!(!logs.contains("WARN") && !logs.contains("ERROR"));
    }

    #[test]
    fn test_placeholder_and_dvd_skips_are_silent() {
        let placeholder = VideoItem {
            is_placeholder: true,
            default_video_stream_index: None,
            ..video()
        };
        let dvd = VideoItem {
            video_type: VideoType::Dvd,
            ..video()
        };

        let (allowed, logs) = captured_logs(|| can_extract(&placeholder) || can_extract(&dvd));

        assert!(!allowed);
        assert!(logs.is_empty(), "unexpected log output: {logs}");
    }
}
