//! The encoder capability consumed by the planner.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::EncodingError;
use crate::media::{MediaSourceDescriptor, MediaStream, Video3DFormat};

/// Something that can write a still image for a video to a local file.
///
/// Both operations return the path of the written JPEG.
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    /// Copy an attached picture stream out of the container.
    async fn extract_embedded_image(
        &self,
        input_path: &str,
        container: &str,
        source: &MediaSourceDescriptor,
        stream: &MediaStream,
        stream_index: i32,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, EncodingError>;

    /// Decode one frame of `video_stream` at `offset`.
    ///
    /// `video_stream` is passed through as found; implementations decide
    /// what a missing stream means.
    #[allow(clippy::too_many_arguments)]
    async fn extract_frame(
        &self,
        input_path: &str,
        container: &str,
        source: &MediaSourceDescriptor,
        video_stream: Option<&MediaStream>,
        three_d_format: Option<Video3DFormat>,
        offset: Duration,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, EncodingError>;
}
