//! Error types surfaced to the presentation layer.

use thiserror::Error;

/// Failures of background work (metadata fetch or download).
#[derive(Debug, Error)]
pub enum AppError {
    /// The tool could not produce a title or thumbnail URL.
    #[error("yt-dlp {flag} failed: {reason}")]
    Metadata { flag: &'static str, reason: String },
    /// The download process ran but exited unsuccessfully.
    #[error("yt-dlp exited with {}", describe_code(.code))]
    DownloadProcess { code: Option<i32> },
    /// A download is already running.
    #[error("A download is already running.")]
    Busy,
    /// The download worker has shut down.
    #[error("The download worker is not running.")]
    WorkerStopped,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not fetch thumbnail: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Could not decode thumbnail: {0}")]
    Image(#[from] image::ImageError),
    #[error("Background task failed: {0}")]
    Runtime(#[from] tokio::task::JoinError),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_owned(),
    }
}

/// Reasons a download click is refused before anything is spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputWarning {
    #[error("Please paste a YouTube URL.")]
    MissingUrl,
    #[error("Please choose a download folder.")]
    MissingDestination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_error_mentions_exit_code() {
        let err = AppError::DownloadProcess { code: Some(2) };
        assert_eq!(err.to_string(), "yt-dlp exited with exit code 2");
        let err = AppError::DownloadProcess { code: None };
        assert!(err.to_string().contains("signal"));
    }

    #[test]
    fn warnings_read_as_prompts() {
        assert_eq!(InputWarning::MissingUrl.to_string(), "Please paste a YouTube URL.");
        assert_eq!(
            InputWarning::MissingDestination.to_string(),
            "Please choose a download folder."
        );
    }
}
