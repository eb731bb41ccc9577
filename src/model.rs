use std::{fmt, path::PathBuf, str::FromStr};

use crate::{error::InputWarning, selector::format_selector, thumbnail::Thumbnail};

/// Quality choices offered in the dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    P360,
    #[default]
    P480,
    P720,
    Best,
}

impl Quality {
    /// Dropdown order
    pub const ALL: [Quality; 4] = [Quality::P360, Quality::P480, Quality::P720, Quality::Best];

    pub fn label(self) -> &'static str {
        match self {
            Quality::P360 => "360p",
            Quality::P480 => "480p",
            Quality::P720 => "720p",
            Quality::Best => "Best",
        }
    }

    /// Format expression handed to yt-dlp for this quality
    pub fn format_selector(self) -> &'static str {
        format_selector(self.label())
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quality::ALL
            .into_iter()
            .find(|q| q.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown quality {s:?}, expected one of 360p, 480p, 720p, Best"))
    }
}

/// A validated download: both text fields are non-empty and trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub destination: PathBuf,
    pub quality: Quality,
}

impl DownloadRequest {
    pub fn new(url: &str, destination: &str, quality: Quality) -> Result<Self, InputWarning> {
        let url = url.trim();
        if url.is_empty() {
            return Err(InputWarning::MissingUrl);
        }
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(InputWarning::MissingDestination);
        }
        Ok(Self {
            url: url.to_owned(),
            destination: PathBuf::from(destination),
            quality,
        })
    }

    pub fn format_selector(&self) -> &'static str {
        self.quality.format_selector()
    }
}

pub const DOWNLOADING: &str = "Downloading...";
pub const DOWNLOAD_COMPLETE: &str = "✅ Download complete!";
/// Generic message for a non-zero tool exit
pub const DOWNLOAD_FAILED: &str = "❌ Download failed!";
pub const ERROR_OCCURRED: &str = "❌ Error occurred.";

/// Lifecycle of the current request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    /// Title and thumbnail are being fetched
    Fetching,
    Downloading,
    Succeeded,
    /// Holds the status text shown to the user
    Failed(String),
}

impl Status {
    /// Position in the lifecycle; transitions never lower it.
    pub fn stage(&self) -> u8 {
        match self {
            Status::Idle | Status::Fetching => 0,
            Status::Downloading => 1,
            Status::Succeeded | Status::Failed(_) => 2,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Status::Downloading)
    }

    pub fn is_terminal(&self) -> bool {
        self.stage() == 2
    }

    pub fn can_advance_to(&self, next: &Status) -> bool {
        next.stage() >= self.stage() && !(self.is_terminal() && next.is_terminal())
    }

    /// Text for the status line
    pub fn text(&self) -> &str {
        match self {
            Status::Idle => "",
            Status::Fetching => "Fetching video info...",
            Status::Downloading => DOWNLOADING,
            Status::Succeeded => DOWNLOAD_COMPLETE,
            Status::Failed(reason) => reason,
        }
    }
}

/// Title and thumbnail shown for the URL in the input field
#[derive(Debug, Clone, PartialEq)]
pub struct VideoPreview {
    pub url: String,
    pub title: String,
    pub thumbnail: Thumbnail,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Preview {
    #[default]
    Empty,
    /// Waiting on metadata for this URL
    Loading(String),
    Ready(VideoPreview),
    /// The last fetch failed
    Unavailable,
}

impl Preview {
    pub fn caption(&self) -> String {
        match self {
            Preview::Empty | Preview::Loading(_) => String::new(),
            Preview::Ready(video) => format!("🎵 Title: {}", video.title),
            Preview::Unavailable => "⚠️ Could not fetch title".to_owned(),
        }
    }

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        match self {
            Preview::Ready(video) => Some(&video.thumbnail),
            _ => None,
        }
    }

    /// True when `url` is already shown or on its way
    pub fn covers(&self, url: &str) -> bool {
        match self {
            Preview::Loading(loading) => loading == url,
            Preview::Ready(video) => video.url == url,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_requires_url_first() {
        assert_eq!(
            DownloadRequest::new("  ", "", Quality::Best),
            Err(InputWarning::MissingUrl)
        );
        assert_eq!(
            DownloadRequest::new("https://youtu.be/x", " ", Quality::Best),
            Err(InputWarning::MissingDestination)
        );
    }

    #[test]
    fn request_trims_fields() {
        let req = DownloadRequest::new(" https://youtu.be/x ", " /tmp/videos ", Quality::P720).unwrap();
        assert_eq!(req.url, "https://youtu.be/x");
        assert_eq!(req.destination, PathBuf::from("/tmp/videos"));
        assert_eq!(req.format_selector(), "best[height<=720]");
    }

    #[test]
    fn quality_labels_parse_back() {
        for q in Quality::ALL {
            assert_eq!(q.to_string().parse::<Quality>(), Ok(q));
        }
        assert_eq!("best".parse::<Quality>(), Ok(Quality::Best));
        assert!("1080p".parse::<Quality>().is_err());
        assert_eq!(Quality::default(), Quality::P480);
        assert_eq!(Quality::Best.format_selector(), "best");
    }

    #[test]
    fn status_only_moves_forward() {
        assert!(Status::Idle.can_advance_to(&Status::Fetching));
        assert!(Status::Fetching.can_advance_to(&Status::Idle));
        assert!(Status::Fetching.can_advance_to(&Status::Downloading));
        assert!(Status::Downloading.can_advance_to(&Status::Succeeded));
        assert!(!Status::Downloading.can_advance_to(&Status::Idle));
        assert!(!Status::Succeeded.can_advance_to(&Status::Failed("x".into())));
        assert!(!Status::Failed("x".into()).can_advance_to(&Status::Downloading));
    }

    #[test]
    fn failed_status_shows_reason() {
        assert_eq!(Status::Failed(DOWNLOAD_FAILED.into()).text(), DOWNLOAD_FAILED);
        assert_eq!(Status::Succeeded.text(), DOWNLOAD_COMPLETE);
        assert_eq!(Status::Idle.text(), "");
    }
}
