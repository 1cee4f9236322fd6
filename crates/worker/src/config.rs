use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// ffmpeg binary (default: `ffmpeg` on `PATH`).
    pub ffmpeg_path: PathBuf,
    /// ffprobe binary (default: `ffprobe` on `PATH`).
    pub ffprobe_path: PathBuf,
    /// Directory extracted images are written to.
    pub output_dir: PathBuf,
    /// Per-extraction ffmpeg time limit in seconds (default: `120`).
    pub extract_timeout_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a valid {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                        |
    /// |------------------------|--------------------------------|
    /// | `FFMPEG_PATH`          | `ffmpeg`                       |
    /// | `FFPROBE_PATH`         | `ffprobe`                      |
    /// | `IMAGE_OUTPUT_DIR`     | `<system temp>/screengrab`     |
    /// | `EXTRACT_TIMEOUT_SECS` | `120`                          |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let ffmpeg_path = lookup("FFMPEG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| "ffmpeg".into());

        let ffprobe_path = lookup("FFPROBE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| "ffprobe".into());

        let output_dir = lookup("IMAGE_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("screengrab"));

        let extract_timeout_secs = match lookup("EXTRACT_TIMEOUT_SECS") {
            None => 120,
            Some(value) => value.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: "EXTRACT_TIMEOUT_SECS",
                expected: "u64",
                value,
            })?,
        };

        Ok(Self {
            ffmpeg_path,
            ffprobe_path,
            output_dir,
            extract_timeout_secs,
        })
    }

    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }
}
