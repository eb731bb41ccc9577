//! Application state and the single function that changes it.
//!
//! The UI renders from [`AppState`] and reports user input as [`Message`]s.
//! Background results come back as messages too. `update` never performs IO;
//! it returns an [`Effect`] for the orchestrator to carry out.

use std::path::{Path, PathBuf};

use crate::{
    error::{AppError, InputWarning},
    model::{DOWNLOAD_FAILED, DownloadRequest, ERROR_OCCURRED, Preview, Quality, Status, VideoPreview},
    progress::Progress,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A dialog waiting to be acknowledged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: &'static str,
    pub message: String,
}

impl Notice {
    fn input(warning: InputWarning) -> Self {
        Self { level: NoticeLevel::Warning, title: "Input Error", message: warning.to_string() }
    }

    /// Dialog for a request the worker refused to take
    fn rejected(error: &AppError) -> Self {
        let (level, title) = match error {
            AppError::Busy => (NoticeLevel::Warning, "Download in progress"),
            _ => (NoticeLevel::Error, "Download unavailable"),
        };
        Self { level, title, message: error.to_string() }
    }
}

#[derive(Debug)]
pub enum Message {
    UrlEdited(String),
    /// The URL field lost focus
    UrlCommitted,
    DestinationEdited(String),
    QualityChosen(Quality),
    DownloadClicked,
    /// The worker accepted the request
    DownloadStarted,
    DownloadRejected(AppError),
    DownloadProgress(Progress),
    DownloadFinished(Result<(), AppError>),
    MetadataLoaded { url: String, result: Result<VideoPreview, AppError> },
    DismissNotice,
}

#[derive(Debug, PartialEq)]
pub enum Effect {
    None,
    FetchMetadata(String),
    StartDownload(DownloadRequest),
}

#[derive(Debug, Default)]
pub struct AppState {
    pub url: String,
    pub destination: String,
    pub quality: Quality,
    pub status: Status,
    pub preview: Preview,
    /// Reported fraction of the running download, if yt-dlp printed one
    pub progress: Option<f32>,
    /// Last file yt-dlp said it was writing
    pub last_file: Option<PathBuf>,
    pub notice: Option<Notice>,
    /// Bumped whenever `preview` changes so the view can rebuild its texture
    preview_revision: u64,
}

impl AppState {
    pub fn new(destination: String, quality: Quality) -> Self {
        Self { destination, quality, ..Self::default() }
    }

    pub fn preview_revision(&self) -> u64 {
        self.preview_revision
    }

    /// File written by the last successful download, when yt-dlp named it
    pub fn saved_file(&self) -> Option<&Path> {
        match self.status {
            Status::Succeeded => self.last_file.as_deref(),
            _ => None,
        }
    }

    fn set_preview(&mut self, preview: Preview) {
        if self.preview != preview {
            self.preview = preview;
            self.preview_revision += 1;
        }
    }

    /// Moves within the current lifecycle; backward moves are dropped.
    fn advance(&mut self, next: Status) {
        if self.status.can_advance_to(&next) {
            self.status = next;
        } else {
            tracing::warn!(from = ?self.status, to = ?next, "ignoring backward status change");
        }
    }

    pub fn update(&mut self, message: Message) -> Effect {
        match message {
            Message::UrlEdited(url) => {
                if url != self.url {
                    self.url = url;
                    self.set_preview(Preview::Empty);
                    // A running download keeps owning the status line
                    if !self.status.is_busy() {
                        self.status = Status::Idle;
                    }
                }
                Effect::None
            }
            Message::UrlCommitted => {
                let url = self.url.trim().to_owned();
                // Blank field: nothing to look up, drop whatever was shown
                if url.is_empty() {
                    self.set_preview(Preview::Empty);
                    return Effect::None;
                }
                // Already shown or in flight; a failed fetch is retried
                if self.preview.covers(&url) {
                    return Effect::None;
                }
                self.set_preview(Preview::Loading(url.clone()));
                // Only before a download; a finished or running one keeps its status line
                if self.status.stage() == 0 {
                    self.status = Status::Fetching;
                }
                Effect::FetchMetadata(url)
            }
            Message::MetadataLoaded { url, result } => {
                // The field changed (or was re-fetched) since this lookup started
                if !matches!(&self.preview, Preview::Loading(loading) if *loading == url) {
                    tracing::debug!(%url, "discarding stale metadata");
                    return Effect::None;
                }
                match result {
                    Ok(video) => self.set_preview(Preview::Ready(video)),
                    Err(e) => {
                        tracing::warn!(%url, error = %e, "could not fetch video info");
                        self.set_preview(Preview::Unavailable);
                    }
                }
                // Idle and Fetching share a stage, so this is not a step back
                if self.status == Status::Fetching {
                    self.advance(Status::Idle);
                }
                Effect::None
            }
            Message::DestinationEdited(destination) => {
                self.destination = destination;
                Effect::None
            }
            Message::QualityChosen(quality) => {
                self.quality = quality;
                Effect::None
            }
            Message::DownloadClicked => {
                // One download at a time; the worker enforces the same rule
                if self.status.is_busy() {
                    self.notice = Some(Notice::rejected(&AppError::Busy));
                    return Effect::None;
                }
                match DownloadRequest::new(&self.url, &self.destination, self.quality) {
                    Ok(request) => Effect::StartDownload(request),
                    Err(warning) => {
                        self.notice = Some(Notice::input(warning));
                        Effect::None
                    }
                }
            }
            Message::DownloadStarted => {
                // New lifecycle
                self.status = Status::Downloading;
                self.progress = None;
                self.last_file = None;
                Effect::None
            }
            Message::DownloadRejected(e) => {
                // Status is untouched: DownloadStarted was never sent
                self.notice = Some(Notice::rejected(&e));
                Effect::None
            }
            Message::DownloadProgress(update) => {
                // Updates can trail a result that was already applied
                if self.status.is_busy() {
                    match update {
                        // Never let the bar move backwards between streams
                        Progress::Fraction(f) => {
                            self.progress = Some(self.progress.map_or(f, |p| p.max(f)));
                        }
                        Progress::Destination(path) => self.last_file = Some(path),
                    }
                }
                Effect::None
            }
            Message::DownloadFinished(result) => {
                if !self.status.is_busy() {
                    tracing::debug!("ignoring download result with no download in flight");
                    return Effect::None;
                }
                self.progress = None;
                // Non-zero exit gets the generic line; anything else also opens a dialog
                match result {
                    Ok(()) => self.advance(Status::Succeeded),
                    Err(AppError::DownloadProcess { .. }) => {
                        self.advance(Status::Failed(DOWNLOAD_FAILED.to_owned()))
                    }
                    Err(e) => {
                        self.notice = Some(Notice {
                            level: NoticeLevel::Error,
                            title: "Error",
                            message: e.to_string(),
                        });
                        self.advance(Status::Failed(ERROR_OCCURRED.to_owned()));
                    }
                }
                Effect::None
            }
            Message::DismissNotice => {
                self.notice = None;
                Effect::None
            }
        }
    }
}
