use std::sync::Arc;

use tokio::{
    runtime::Handle,
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
};

use crate::{
    downloader::MediaTool,
    error::AppError,
    model::{DownloadRequest, VideoPreview},
    state::{AppState, Effect, Message},
    thumbnail,
    worker::DownloadWorker,
};

/// Called from background tasks after a message is queued (e.g. to request a repaint)
pub type Notify = Arc<dyn Fn() + Send + Sync>;

/// Owns the state and runs the effects `AppState::update` asks for.
pub struct Orchestrator {
    state: AppState,
    tool: Arc<dyn MediaTool>,
    worker: DownloadWorker,
    handle: Handle,
    events_tx: UnboundedSender<Message>,
    events_rx: UnboundedReceiver<Message>,
    notify: Notify,
}

impl Orchestrator {
    pub fn new(handle: Handle, tool: Arc<dyn MediaTool>, state: AppState, notify: Notify) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        // The worker keeps its own copy of the hook for progress and completion
        let worker =
            DownloadWorker::spawn(&handle, Arc::clone(&tool), events_tx.clone(), Arc::clone(&notify));
        Self { state, tool, worker, handle, events_tx, events_rx, notify }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, message: Message) {
        match self.state.update(message) {
            Effect::None => {}
            Effect::FetchMetadata(url) => self.fetch_metadata(url),
            Effect::StartDownload(request) => self.start_download(request),
        }
    }

    /// Applies every finished background result. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        // Never blocks: the UI calls this every frame
        while let Ok(message) = self.events_rx.try_recv() {
            self.dispatch(message);
            applied += 1;
        }
        applied
    }

    fn fetch_metadata(&self, url: String) {
        let tool = Arc::clone(&self.tool);
        let tx = self.events_tx.clone();
        let notify = Arc::clone(&self.notify);
        self.handle.spawn(async move {
            let result = fetch_preview(tool.as_ref(), &url).await;
            // The url travels back so stale results can be recognised
            if tx.send(Message::MetadataLoaded { url, result }).is_ok() {
                notify();
            }
        });
    }

    fn start_download(&mut self, request: DownloadRequest) {
        tracing::debug!(url = %request.url, busy = self.worker.is_busy(), "submitting download");
        // Status moves to Downloading only once the worker has the job
        match self.worker.try_submit(request) {
            Ok(()) => self.dispatch(Message::DownloadStarted),
            Err(e) => {
                tracing::warn!(error = %e, "download rejected");
                self.dispatch(Message::DownloadRejected(e));
            }
        }
    }

    #[cfg(test)]
    async fn next(&mut self) {
        let message = tokio::time::timeout(std::time::Duration::from_secs(5), self.events_rx.recv())
            .await
            .expect("background result")
            .expect("channel open");
        self.dispatch(message);
    }
}

/// Title, then thumbnail URL, then the image itself. The first failure wins.
pub async fn fetch_preview(tool: &dyn MediaTool, url: &str) -> Result<VideoPreview, AppError> {
    let title = tool.title(url).await?;
    let thumbnail_url = tool.thumbnail_url(url).await?;
    let thumbnail = thumbnail::fetch_thumbnail(thumbnail_url).await?;
    Ok(VideoPreview { url: url.to_owned(), title, thumbnail })
}
