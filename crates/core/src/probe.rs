//! ffprobe-based item metadata.
//!
//! Turns `ffprobe -print_format json -show_format -show_streams` output
//! into a [`VideoItem`] for callers that have a bare path rather than a
//! library record. Disc folders and images are recognised before ffprobe
//! runs so they can be opened with the right input protocol.

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::io::AsyncReadExt;

use crate::error::EncodingError;
use crate::ffmpeg::{input_argument, spawn_error};
use crate::media::{
    IsoType, MediaProtocol, MediaSourceDescriptor, MediaStream, MediaStreamType, VideoItem,
    VideoType,
};
use crate::types::{Ticks, TICKS_PER_SECOND};

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct FfprobeOutput {
    #[serde(default)]
    pub streams: Vec<FfprobeStream>,
    #[serde(default)]
    pub format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    pub index: i32,
    pub codec_name: Option<String>,
    pub codec_type: Option<String>,
    pub disposition: Option<FfprobeDisposition>,
    pub tags: Option<FfprobeStreamTags>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FfprobeDisposition {
    #[serde(default)]
    pub attached_pic: i32,
}

#[derive(Debug, Deserialize)]
pub struct FfprobeStreamTags {
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
    pub format_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Leading bytes of a disc image scanned for `BDMV` / `VIDEO_TS` entries.
const ISO_SCAN_LIMIT: u64 = 8 * 1024 * 1024;

/// Describe a local path as a [`VideoItem`].
///
/// The disc layout is detected first. DVD folders are returned without
/// running ffprobe; they are never eligible for extraction. Blu-ray folders
/// and Blu-ray images are read through the `bluray:` protocol.
pub async fn probe_item(ffprobe_path: &Path, path: &Path) -> Result<VideoItem, EncodingError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(EncodingError::VideoNotFound(path.to_string_lossy().to_string()));
    }

    let video_type = detect_video_type(path);
    let iso_type = match video_type {
        VideoType::Iso => detect_iso_type(path).await?,
        _ => None,
    };

    if video_type == VideoType::Dvd {
        tracing::debug!(path = %path.display(), "DVD folder, skipping stream metadata");
        return Ok(VideoItem {
            video_type,
            ..video_item_from_probe(path, &FfprobeOutput::default())
        });
    }

    let source = MediaSourceDescriptor {
        video_type,
        iso_type,
        protocol: MediaProtocol::File,
    };
    let input = input_argument(&path.to_string_lossy(), &source);
    let probe = probe_media(ffprobe_path, &input).await?;

    Ok(VideoItem {
        video_type,
        iso_type,
        ..video_item_from_probe(path, &probe)
    })
}

/// Run ffprobe against an ffmpeg input (a path or a `bluray:` URL).
pub async fn probe_media(
    ffprobe_path: &Path,
    input: &str,
) -> Result<FfprobeOutput, EncodingError> {
    let mut command = tokio::process::Command::new(ffprobe_path);
    command
        .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(input)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let output = command.output().await.map_err(spawn_error)?;
    if !output.status.success() {
        return Err(EncodingError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    serde_json::from_slice(&output.stdout)
        .map_err(|e| EncodingError::ParseError(e.to_string()))
}

/// Map ffprobe output onto a plain file [`VideoItem`].
///
/// The disc layout is left at [`VideoType::Normal`]; [`probe_item`] fills it in.
pub fn video_item_from_probe(path: &Path, probe: &FfprobeOutput) -> VideoItem {
    let media_streams: Vec<MediaStream> =
        probe.streams.iter().filter_map(to_media_stream).collect();

    let default_video_stream_index = media_streams
        .iter()
        .find(|s| s.stream_type == MediaStreamType::Video)
        .map(|s| s.index);

    VideoItem {
        path: path.to_string_lossy().to_string(),
        is_placeholder: false,
        video_type: VideoType::Normal,
        iso_type: None,
        container: parse_container(probe),
        runtime_ticks: parse_runtime_ticks(probe),
        video_3d_format: None,
        default_video_stream_index,
        is_shortcut: false,
        is_file_protocol: true,
        is_complete_media: true,
        path_protocol: Some(MediaProtocol::File),
        media_streams,
    }
}

/// Disc type inside an `.iso` image, from the directory names near its start.
pub async fn detect_iso_type(path: &Path) -> Result<Option<IsoType>, EncodingError> {
    let file = tokio::fs::File::open(path).await?;
    let mut head = Vec::new();
    file.take(ISO_SCAN_LIMIT).read_to_end(&mut head).await?;

    let contains = |needle: &[u8]| head.windows(needle.len()).any(|w| w == needle);
    Ok(if contains(b"BDMV".as_slice()) {
        Some(IsoType::BluRay)
    } else if contains(b"VIDEO_TS".as_slice()) {
        Some(IsoType::Dvd)
    } else {
        None
    })
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn to_media_stream(stream: &FfprobeStream) -> Option<MediaStream> {
    let attached_pic = stream
        .disposition
        .as_ref()
        .is_some_and(|d| d.attached_pic == 1);

    let stream_type = match stream.codec_type.as_deref()? {
        "video" if attached_pic => MediaStreamType::EmbeddedImage,
        "video" => MediaStreamType::Video,
        "audio" => MediaStreamType::Audio,
        "subtitle" => MediaStreamType::Subtitle,
        "data" => MediaStreamType::Data,
        _ => return None,
    };

    Some(MediaStream {
        stream_type,
        index: stream.index,
        comment: stream.tags.as_ref().and_then(|t| t.comment.clone()),
        codec: stream.codec_name.clone(),
    })
}

/// Container name; ffprobe reports aliases like `"mov,mp4,m4a,3gp,3g2,mj2"`.
pub fn parse_container(probe: &FfprobeOutput) -> String {
    probe
        .format
        .format_name
        .as_deref()
        .and_then(|f| f.split(',').next())
        .unwrap_or_default()
        .to_string()
}

/// Runtime in ticks from the format-level duration.
pub fn parse_runtime_ticks(probe: &FfprobeOutput) -> Option<Ticks> {
    let secs = probe.format.duration.as_deref()?.parse::<f64>().ok()?;
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    Some((secs * TICKS_PER_SECOND as f64).round() as Ticks)
}

/// Disc layout from the path: `VIDEO_TS` / `BDMV` folders and `.iso` images.
pub fn detect_video_type(path: &Path) -> VideoType {
    if path.is_dir() {
        if path.join("VIDEO_TS").is_dir() {
            return VideoType::Dvd;
        }
        if path.join("BDMV").is_dir() {
            return VideoType::BluRay;
        }
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("iso") => VideoType::Iso,
        _ => VideoType::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MP4_WITH_COVER: &str = r#"{
        "streams": [
            { "index": 0, "codec_name": "h264", "codec_type": "video",
              "disposition": { "attached_pic": 0 } },
            { "index": 1, "codec_name": "aac", "codec_type": "audio" },
            { "index": 2, "codec_name": "mjpeg", "codec_type": "video",
              "disposition": { "attached_pic": 1 },
              "tags": { "comment": "Cover (front)" } },
            { "index": 3, "codec_name": "ttf", "codec_type": "attachment" }
        ],
        "format": { "duration": "5400.250000", "format_name": "mov,mp4,m4a,3gp,3g2,mj2" }
    }"#;

    fn parse(json: &str) -> FfprobeOutput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_attached_picture_becomes_embedded_image() {
        let item = video_item_from_probe(Path::new("/media/movie.mp4"), &parse(MP4_WITH_COVER));

        let types: Vec<_> = item.media_streams.iter().map(|s| s.stream_type).collect();
        assert_eq!(
            types,
            vec![
                MediaStreamType::Video,
                MediaStreamType::Audio,
                MediaStreamType::EmbeddedImage,
            ]
        );
        assert_eq!(item.media_streams[2].comment.as_deref(), Some("Cover (front)"));
        assert_eq!(item.default_video_stream_index, Some(0));
    }

    #[test]
    fn test_container_and_runtime() {
        let probe = parse(MP4_WITH_COVER);
        assert_eq!(parse_container(&probe), "mov");
        assert_eq!(parse_runtime_ticks(&probe), Some(54_002_500_000));
    }

    #[test]
    fn test_audio_only_has_no_video_stream_index() {
        let probe = parse(
            r#"{
                "streams": [{ "index": 0, "codec_name": "flac", "codec_type": "audio" }],
                "format": { "format_name": "flac" }
            }"#,
        );
        let item = video_item_from_probe(Path::new("/media/track.flac"), &probe);
        assert_eq!(item.default_video_stream_index, None);
        assert_eq!(item.runtime_ticks, None);
    }

    #[test]
    fn test_detect_disc_folders() {
        let dir = tempfile::tempdir().unwrap();
        let dvd = dir.path().join("dvd");
        std::fs::create_dir_all(dvd.join("VIDEO_TS")).unwrap();
        let bluray = dir.path().join("bluray");
        std::fs::create_dir_all(bluray.join("BDMV")).unwrap();

        assert_eq!(detect_video_type(&dvd), VideoType::Dvd);
        assert_eq!(detect_video_type(&bluray), VideoType::BluRay);
        assert_eq!(detect_video_type(Path::new("/media/disc.ISO")), VideoType::Iso);
        assert_eq!(detect_video_type(Path::new("/media/movie.mkv")), VideoType::Normal);
    }

    #[tokio::test]
    async fn test_missing_path_is_video_not_found() {
        let err = probe_item(Path::new("ffprobe"), Path::new("/definitely/not/here.mkv"))
            .await
            .unwrap_err();
        assert!(matches!(err, EncodingError::VideoNotFound(_)));
    }

    #[tokio::test]
    async fn test_dvd_folder_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("VIDEO_TS")).unwrap();

        // A missing ffprobe would fail with NotFound if it were spawned.
        let item = probe_item(&dir.path().join("no-ffprobe"), dir.path())
            .await
            .unwrap();
        assert_eq!(item.video_type, VideoType::Dvd);
        assert!(item.media_streams.is_empty());
        assert_eq!(item.default_video_stream_index, None);
    }

    #[tokio::test]
    async fn test_bluray_folder_spawns_metadata_tool() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("BDMV")).unwrap();

        let err = probe_item(&dir.path().join("no-ffprobe"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, EncodingError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_detect_iso_type() {
        let dir = tempfile::tempdir().unwrap();
        let bluray = dir.path().join("bluray.iso");
        let mut image = vec![0u8; 64 * 1024];
        image.extend_from_slice(b"\x04BDMV\x00");
        std::fs::write(&bluray, &image).unwrap();
        let dvd = dir.path().join("dvd.iso");
        std::fs::write(&dvd, b"\x00\x00VIDEO_TS\x00").unwrap();
        let blank = dir.path().join("blank.iso");
        std::fs::write(&blank, vec![0u8; 4096]).unwrap();

        assert_eq!(detect_iso_type(&bluray).await.unwrap(), Some(IsoType::BluRay));
        assert_eq!(detect_iso_type(&dvd).await.unwrap(), Some(IsoType::Dvd));
        assert_eq!(detect_iso_type(&blank).await.unwrap(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unexecutable_metadata_binary_is_io_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let ffprobe = dir.path().join("ffprobe");
        std::fs::write(&ffprobe, b"#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&ffprobe, std::fs::Permissions::from_mode(0o644)).unwrap();

        let err = probe_media(&ffprobe, "/media/movie.mkv").await.unwrap_err();
        match err {
            EncodingError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::PermissionDenied),
            other => panic!("expected an I/O error, got {other:?}"),
        }
    }
}
