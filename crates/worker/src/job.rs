//! One extraction job: load an item, gate it, grab its image.

use std::path::Path;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use screengrab_core::media::{ImageExtractionResult, LibraryItem};
use screengrab_core::probe::probe_item;
use screengrab_core::{supports, ExtractionError, ScreenGrabber};

/// Load the item to process.
///
/// `.json` files are read as a serialized [`LibraryItem`]; anything else is
/// treated as a media file or disc folder and described with ffprobe.
pub async fn load_item(path: &Path, ffprobe_path: &Path) -> anyhow::Result<LibraryItem> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read item file {}", path.display()))?;
        return serde_json::from_str(&raw)
            .with_context(|| format!("invalid item description in {}", path.display()));
    }

    let video = probe_item(ffprobe_path, path)
        .await
        .with_context(|| format!("failed to read media metadata for {}", path.display()))?;
    Ok(LibraryItem::Video(video))
}

/// Run the screen grabber for `item` if it supports it.
pub async fn process_item(
    grabber: &ScreenGrabber,
    item: &LibraryItem,
    cancel: &CancellationToken,
) -> Result<ImageExtractionResult, ExtractionError> {
    let video = match item.as_video() {
        Some(video) if supports(item) => video,
        _ => {
            tracing::info!(path = %item.path(), "Item not supported by the screen grabber");
            return Ok(ImageExtractionResult::none());
        }
    };

    grabber.get_image(video, cancel).await
}
