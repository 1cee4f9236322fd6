//! Screen grabber: picks a thumbnail strategy for a video and runs it.
//!
//! An attached picture wins over a decoded frame. Among attached pictures
//! a "front" comment beats a "cover" comment, which beats container order.
//! Without one, a frame is sampled 10% into the runtime, or at 10 seconds
//! when the runtime is unknown or unreliable.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::eligibility::can_extract;
use crate::encoder::MediaEncoder;
use crate::error::ExtractionError;
use crate::media::{
    ImageExtractionResult, ImageType, MediaProtocol, MediaSourceDescriptor, MediaStream,
    MediaStreamType, VideoItem, VideoType,
};
use crate::types::{ticks_to_duration, Ticks};

/// Offset used when the runtime cannot be trusted.
pub const FALLBACK_FRAME_OFFSET: Duration = Duration::from_secs(10);

/// Fraction of the runtime at which a frame is sampled.
const RUNTIME_FRACTION: f64 = 0.1;

/// Pick the attached picture to use, if any.
pub fn select_image_stream(streams: &[MediaStream]) -> Option<&MediaStream> {
    let image_streams = streams
        .iter()
        .filter(|s| s.stream_type == MediaStreamType::EmbeddedImage);

    image_streams
        .clone()
        .find(|s| s.comment_contains("front"))
        .or_else(|| image_streams.clone().find(|s| s.comment_contains("cover")))
        .or_else(|| image_streams.clone().next())
}

/// Where to sample a frame for `item`.
///
/// DVDs always get the fallback, even though the request gate already
/// refuses them; the planner can be called without the gate.
pub fn frame_offset(item: &VideoItem) -> Duration {
    match item.runtime_ticks {
        Some(ticks) if item.video_type != VideoType::Dvd && ticks > 0 => {
            let offset = (ticks as f64 * RUNTIME_FRACTION).round_ties_even() as Ticks;
            ticks_to_duration(offset)
        }
        _ => FALLBACK_FRAME_OFFSET,
    }
}

fn source_descriptor(item: &VideoItem, protocol: MediaProtocol) -> MediaSourceDescriptor {
    MediaSourceDescriptor {
        video_type: item.video_type,
        iso_type: item.iso_type,
        protocol,
    }
}

// ---------------------------------------------------------------------------
// ScreenGrabber
// ---------------------------------------------------------------------------

/// Produces primary images for videos through an injected encoder.
#[derive(Clone)]
pub struct ScreenGrabber {
    encoder: Arc<dyn MediaEncoder>,
}

impl ScreenGrabber {
    pub const NAME: &'static str = "Screen Grabber";

    /// Composition order hint; runs after remote image sources.
    pub const ORDER: i32 = 100;

    pub fn new(encoder: Arc<dyn MediaEncoder>) -> Self {
        Self { encoder }
    }

    pub fn supported_images(&self) -> &'static [ImageType] {
        &[ImageType::Primary]
    }

    /// Check the request gate, then extract.
    ///
    /// Ineligible items yield [`ImageExtractionResult::none`] without
    /// touching the encoder.
    pub async fn get_image(
        &self,
        item: &VideoItem,
        cancel: &CancellationToken,
    ) -> Result<ImageExtractionResult, ExtractionError> {
        if !can_extract(item) {
            return Ok(ImageExtractionResult::none());
        }

        self.get_video_image(item, cancel).await
    }

    /// Extract an image for `item` without the request gate.
    pub async fn get_video_image(
        &self,
        item: &VideoItem,
        cancel: &CancellationToken,
    ) -> Result<ImageExtractionResult, ExtractionError> {
        let protocol = item.path_protocol.unwrap_or_default();
        let source = source_descriptor(item, protocol);

        let extraction = async {
            match select_image_stream(&item.media_streams) {
                Some(stream) => {
                    tracing::debug!(
                        path = %item.path,
                        stream_index = stream.index,
                        comment = stream.comment.as_deref().unwrap_or_default(),
                        "Using embedded image stream"
                    );
                    self.encoder
                        .extract_embedded_image(
                            &item.path,
                            &item.container,
                            &source,
                            stream,
                            stream.index,
                            cancel,
                        )
                        .await
                }
                None => {
                    let offset = frame_offset(item);
                    let video_stream = item.streams_of_type(MediaStreamType::Video).next();
                    tracing::debug!(
                        path = %item.path,
                        offset_ms = offset.as_millis() as u64,
                        video_stream_index = video_stream.map(|s| s.index),
                        "Sampling video frame"
                    );
                    self.encoder
                        .extract_frame(
                            &item.path,
                            &item.container,
                            &source,
                            video_stream,
                            item.video_3d_format,
                            offset,
                            cancel,
                        )
                        .await
                }
            }
        };

        let path = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ExtractionError::Cancelled),
            result = extraction => result?,
        };

        tracing::info!(path = %item.path, image = %path.display(), "Extracted video image");

        Ok(ImageExtractionResult::local_jpeg(path))
    }
}
