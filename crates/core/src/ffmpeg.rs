//! ffmpeg-backed [`MediaEncoder`].
//!
//! Every call spawns one `ffmpeg` process that writes a single JPEG into
//! the configured output directory. The child is killed when the call is
//! cancelled, times out, or its future is dropped. The output file is only
//! kept once ffmpeg has exited cleanly and written something; on every
//! other path, dropped futures included, it is deleted.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempPath;
use tokio_util::sync::CancellationToken;

use crate::encoder::MediaEncoder;
use crate::error::EncodingError;
use crate::media::{MediaProtocol, MediaSourceDescriptor, MediaStream, Video3DFormat};

/// Default per-call limit for a single ffmpeg run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Encoder that shells out to the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    ffmpeg_path: PathBuf,
    output_dir: PathBuf,
    timeout: Duration,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            output_dir: output_dir.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Fresh output file name, deleted on drop until [`TempPath::keep`].
    fn next_output_path(&self) -> TempPath {
        TempPath::from_path(self.output_dir.join(format!("{}.jpg", uuid::Uuid::new_v4())))
    }

    /// Run ffmpeg with `args` and keep `output_path` if it produced an image.
    async fn run(
        &self,
        args: Vec<String>,
        output_path: TempPath,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, EncodingError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        tracing::debug!(
            ffmpeg = %self.ffmpeg_path.display(),
            args = %args.join(" "),
            "Running ffmpeg"
        );

        let child = tokio::process::Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EncodingError::Cancelled),
            waited = tokio::time::timeout(self.timeout, child.wait_with_output()) => match waited {
                Err(_) => return Err(EncodingError::Timeout(self.timeout)),
                Ok(Err(e)) => return Err(EncodingError::Io(e)),
                Ok(Ok(output)) => check_output(output, &output_path).await?,
            },
        }

        output_path.keep().map_err(|e| EncodingError::Io(e.error))
    }
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    async fn extract_embedded_image(
        &self,
        input_path: &str,
        container: &str,
        source: &MediaSourceDescriptor,
        _stream: &MediaStream,
        stream_index: i32,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, EncodingError> {
        ensure_local_input(input_path, source)?;

        let output_path = self.next_output_path();
        let input = input_argument(input_path, source);
        tracing::debug!(input = %input, container, stream_index, "Extracting embedded image");

        let args = embedded_image_args(&input, stream_index, &output_path);
        self.run(args, output_path, cancel).await
    }

    async fn extract_frame(
        &self,
        input_path: &str,
        container: &str,
        source: &MediaSourceDescriptor,
        video_stream: Option<&MediaStream>,
        three_d_format: Option<Video3DFormat>,
        offset: Duration,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, EncodingError> {
        let video_stream = video_stream.ok_or(EncodingError::MissingVideoStream)?;
        ensure_local_input(input_path, source)?;

        let output_path = self.next_output_path();
        let input = input_argument(input_path, source);
        tracing::debug!(
            input = %input,
            container,
            stream_index = video_stream.index,
            offset_ms = offset.as_millis() as u64,
            "Extracting video frame"
        );

        let args = frame_args(&input, video_stream.index, three_d_format, offset, &output_path);
        self.run(args, output_path, cancel).await
    }
}

// ---------------------------------------------------------------------------
// Command construction
// ---------------------------------------------------------------------------

/// ffmpeg input for a source. Blu-ray structures go through the `bluray:`
/// protocol; everything else is passed as-is.
pub fn input_argument(input_path: &str, source: &MediaSourceDescriptor) -> String {
    if source.protocol == MediaProtocol::File && source.is_bluray() {
        format!("bluray:{input_path}")
    } else {
        input_path.to_string()
    }
}

/// Video filter that keeps the left (or top) eye of a stereoscopic frame.
pub fn three_d_filter(format: Video3DFormat) -> Option<&'static str> {
    match format {
        Video3DFormat::HalfSideBySide => Some("crop=iw/2:ih:0:0,scale=(iw*2):ih"),
        Video3DFormat::FullSideBySide => Some("crop=iw/2:ih:0:0"),
        Video3DFormat::HalfTopAndBottom => Some("crop=iw:ih/2:0:0,scale=iw:(ih*2)"),
        Video3DFormat::FullTopAndBottom => Some("crop=iw:ih/2:0:0"),
        Video3DFormat::Mvc => None,
    }
}

/// Seek position in seconds with millisecond precision.
pub fn format_offset(offset: Duration) -> String {
    format!("{:.3}", offset.as_secs_f64())
}

pub fn embedded_image_args(input: &str, stream_index: i32, output_path: &Path) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-i", input]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.extend([
        "-map".to_string(),
        format!("0:{stream_index}"),
        "-an".to_string(),
        "-sn".to_string(),
        "-frames:v".to_string(),
        "1".to_string(),
    ]);
    push_output(&mut args, output_path);
    args
}

pub fn frame_args(
    input: &str,
    video_stream_index: i32,
    three_d_format: Option<Video3DFormat>,
    offset: Duration,
    output_path: &Path,
) -> Vec<String> {
    let mut args = vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-ss".to_string(),
        format_offset(offset),
        "-i".to_string(),
        input.to_string(),
        "-map".to_string(),
        format!("0:{video_stream_index}"),
        "-an".to_string(),
        "-sn".to_string(),
        "-frames:v".to_string(),
        "1".to_string(),
    ];
    if let Some(filter) = three_d_format.and_then(three_d_filter) {
        args.push("-vf".to_string());
        args.push(filter.to_string());
    }
    push_output(&mut args, output_path);
    args
}

fn push_output(args: &mut Vec<String>, output_path: &Path) {
    args.extend([
        "-f".to_string(),
        "image2".to_string(),
        "-y".to_string(),
        output_path.to_string_lossy().to_string(),
    ]);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Spawn failures: a missing binary is reported apart from other I/O errors.
pub(crate) fn spawn_error(e: std::io::Error) -> EncodingError {
    match e.kind() {
        std::io::ErrorKind::NotFound => EncodingError::NotFound(e),
        _ => EncodingError::Io(e),
    }
}

fn ensure_local_input(
    input_path: &str,
    source: &MediaSourceDescriptor,
) -> Result<(), EncodingError> {
    if source.protocol == MediaProtocol::File && !Path::new(input_path).exists() {
        return Err(EncodingError::VideoNotFound(input_path.to_string()));
    }
    Ok(())
}

async fn check_output(
    output: std::process::Output,
    output_path: &Path,
) -> Result<(), EncodingError> {
    if !output.status.success() {
        return Err(EncodingError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    match tokio::fs::metadata(output_path).await {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(EncodingError::EmptyOutput(
            output_path.to_string_lossy().to_string(),
        )),
    }
}
