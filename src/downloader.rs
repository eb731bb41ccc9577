use std::{
    ffi::{OsStr, OsString},
    io::Write,
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use rust_embed::RustEmbed;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
    sync::mpsc::UnboundedSender,
};

use crate::{
    error::AppError,
    model::DownloadRequest,
    progress::{Progress, parse_progress_from_line},
};

#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Asset;

/// Where a bundled binary was unpacked, once per process
static EXTRACTED: OnceCell<PathBuf> = OnceCell::new();

fn bin_name() -> &'static str {
    if cfg!(target_os = "windows") { "yt-dlp.exe" } else { "yt-dlp" }
}

/// Picks the executable: explicit path, then a bundled copy, then `yt-dlp` on PATH.
pub fn locate_tool(explicit: Option<PathBuf>) -> Result<PathBuf, AppError> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let bin = bin_name();
    match Asset::get(bin) {
        Some(data) => EXTRACTED
            .get_or_try_init(|| extract(bin, &data.data))
            .cloned(),
        None => Ok(PathBuf::from(bin)),
    }
}

/// Unpacks the bundled binary into the temp dir under a versioned name.
fn extract(bin: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
    extract_into(&std::env::temp_dir(), bin, bytes)
}

fn extract_into(dir: &Path, bin: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
    // "yt-dlp" -> "yt-dlp-<app version>", keeping ".exe" on Windows
    let (stem, ext) = bin.split_once('.').unwrap_or((bin, ""));
    let dot = if ext.is_empty() { "" } else { "." };
    let target = dir.join(format!("{stem}-{}{dot}{ext}", env!("CARGO_PKG_VERSION")));

    // Reuse only a byte-identical copy; stale, truncated or foreign files are replaced
    if std::fs::read(&target).is_ok_and(|existing| existing == bytes) {
        tracing::info!(path = %target.display(), "using bundled yt-dlp");
        return Ok(target);
    }

    // Write under a random name first so a half-written file is never executed
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!("{stem}-"))
        .suffix(&format!("{dot}{ext}"))
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o755))?;
    }

    let path = match tmp.persist(&target) {
        Ok(_) => target,
        Err(e) => {
            // Target owned by someone else (e.g. sticky /tmp); run our private copy instead
            tracing::warn!(path = %target.display(), error = %e.error, "could not replace bundled yt-dlp, using private copy");
            let (_, path) = e.file.keep().map_err(std::io::Error::from)?;
            path
        }
    };
    tracing::info!(path = %path.display(), "using bundled yt-dlp");
    Ok(path)
}

/// The external media tool.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// `--get-title <url>`
    async fn title(&self, url: &str) -> Result<String, AppError>;
    /// `--get-thumbnail <url>`
    async fn thumbnail_url(&self, url: &str) -> Result<String, AppError>;
    /// `-f <expr> -P <dir> <url>`; progress is best-effort.
    async fn download(
        &self,
        request: &DownloadRequest,
        progress_tx: UnboundedSender<Progress>,
    ) -> Result<(), AppError>;
}

/// Drives a yt-dlp executable through `tokio::process`.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    /// Placed before every invocation, e.g. `-m yt_dlp` for a python launcher
    leading_args: Vec<String>,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), leading_args: Vec::new() }
    }

    pub fn with_leading_args(mut self, args: Vec<String>) -> Self {
        self.leading_args = args;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        #[cfg(target_os = "windows")]
        {
            // CREATE_NO_WINDOW
            cmd.creation_flags(0x08000000);
        }
        cmd
    }

    async fn query(&self, flag: &'static str, url: &str) -> Result<String, AppError> {
        tracing::debug!(flag, url, "querying yt-dlp");
        let output = self
            .command([flag, url])
            .output()
            .await
            .map_err(|e| AppError::Metadata { flag, reason: e.to_string() })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Metadata {
                flag,
                reason: last_line(&stderr).unwrap_or("no error output").to_owned(),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let value = stdout.trim();
        if value.is_empty() {
            return Err(AppError::Metadata { flag, reason: "empty output".to_owned() });
        }
        Ok(value.to_owned())
    }
}

/// Arguments for the download invocation, in the order yt-dlp expects them.
pub fn download_args(request: &DownloadRequest) -> Vec<OsString> {
    vec![
        "-f".into(),
        request.format_selector().into(),
        "-P".into(),
        request.destination.clone().into_os_string(),
        request.url.clone().into(),
    ]
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).rev().find(|l| !l.is_empty())
}

#[async_trait]
impl MediaTool for YtDlp {
    async fn title(&self, url: &str) -> Result<String, AppError> {
        self.query("--get-title", url).await
    }

    async fn thumbnail_url(&self, url: &str) -> Result<String, AppError> {
        self.query("--get-thumbnail", url).await
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        progress_tx: UnboundedSender<Progress>,
    ) -> Result<(), AppError> {
        let args = download_args(request);
        tracing::info!(url = %request.url, format = request.format_selector(), dest = %request.destination.display(), "starting download");

        let mut child = self
            .command(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let out = child.stdout.take().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout not captured")
        })?;
        let err = child.stderr.take().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stderr not captured")
        })?;

        // Drain stderr alongside stdout so neither pipe fills up
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(err).lines();
            let mut last = None;
            while let Ok(Some(line)) = lines.next_line().await {
                if !line.trim().is_empty() {
                    last = Some(line);
                }
            }
            last
        });

        let mut lines = BufReader::new(out).lines();
        while let Some(line) = lines.next_line().await? {
            tracing::trace!(target: "yt_dlp", "{line}");
            // Progress updates may be joined by carriage returns
            for segment in line.split('\r') {
                if let Some(update) = parse_progress_from_line(segment) {
                    let _ = progress_tx.send(update);
                }
            }
        }

        let status = child.wait().await?;
        let last_err = stderr_task.await?;
        if status.success() {
            tracing::info!(url = %request.url, "download finished");
            Ok(())
        } else {
            tracing::warn!(url = %request.url, code = ?status.code(), stderr = last_err.as_deref().unwrap_or(""), "download failed");
            Err(AppError::DownloadProcess { code: status.code() })
        }
    }
}
