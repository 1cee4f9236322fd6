//! Video thumbnail selection and extraction.
//!
//! [`eligibility`] decides whether a video gets a grabbed image,
//! [`planner::ScreenGrabber`] decides how, and [`encoder::MediaEncoder`] is
//! the capability that does the decoding. [`ffmpeg::FfmpegEncoder`] is the
//! production encoder.

pub mod eligibility;
pub mod encoder;
pub mod error;
pub mod ffmpeg;
pub mod media;
pub mod planner;
pub mod probe;
pub mod types;

pub use crate::eligibility::{can_extract, supports, SkipReason};
pub use crate::encoder::MediaEncoder;
pub use crate::error::{EncodingError, ExtractionError};
pub use crate::planner::ScreenGrabber;
