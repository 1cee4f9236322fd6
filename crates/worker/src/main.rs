//! `screengrab-worker` -- one-shot video thumbnail extraction.
//!
//! Loads an item (a JSON item description or a media file to probe), runs
//! the screen grabber with ffmpeg and prints the result as JSON on stdout.
//! Ctrl-C cancels a running extraction.
//!
//! # Usage
//!
//! ```text
//! screengrab-worker <item.json | media file>
//! ```
//!
//! See [`WorkerConfig::from_env`] for environment variables.
//!
//! # Exit codes
//!
//! | Code  | Meaning                                   |
//! |-------|-------------------------------------------|
//! | `0`   | image extracted, or item not eligible     |
//! | `1`   | configuration, input or encoder failure   |
//! | `130` | cancelled                                 |

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use screengrab_core::ffmpeg::FfmpegEncoder;
use screengrab_core::ScreenGrabber;
use screengrab_worker::config::WorkerConfig;
use screengrab_worker::job;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "screengrab_worker=info,screengrab_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(input) = std::env::args_os().nth(1).map(PathBuf::from) else {
        tracing::error!("usage: screengrab-worker <item.json | media file>");
        return ExitCode::FAILURE;
    };

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        input = %input.display(),
        output_dir = %config.output_dir.display(),
        timeout_secs = config.extract_timeout_secs,
        "Starting screengrab-worker",
    );

    let item = match job::load_item(&input, &config.ffprobe_path).await {
        Ok(item) => item,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Failed to load item");
            return ExitCode::FAILURE;
        }
    };

    let encoder = FfmpegEncoder::new(&config.ffmpeg_path, &config.output_dir)
        .with_timeout(config.extract_timeout());
    let grabber = ScreenGrabber::new(Arc::new(encoder));

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling extraction");
            ctrl_c_cancel.cancel();
        }
    });

    match job::process_item(&grabber, &item, &cancel).await {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize result");
                ExitCode::FAILURE
            }
        },
        Err(e) if e.is_cancelled() => {
            tracing::info!("Extraction cancelled");
            ExitCode::from(130)
        }
        Err(e) => {
            tracing::error!(path = %item.path(), error = %e, "Image extraction failed");
            ExitCode::FAILURE
        }
    }
}
