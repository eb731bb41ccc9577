//! Background download execution.
//!
//! One worker task owns a queue with a single slot. A busy flag is raised on
//! submit and lowered before the completion message is sent, so at most one
//! download runs at a time and overlapping submits are rejected.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::{
    runtime::Handle,
    sync::mpsc::{self, UnboundedSender, error::TrySendError},
};

use crate::{
    downloader::MediaTool, error::AppError, model::DownloadRequest, orchestrator::Notify,
    state::Message,
};

pub struct DownloadWorker {
    jobs: mpsc::Sender<DownloadRequest>,
    busy: Arc<AtomicBool>,
}

impl DownloadWorker {
    /// Starts the worker loop on `handle`; results are sent to `events`.
    pub fn spawn(
        handle: &Handle,
        tool: Arc<dyn MediaTool>,
        events: UnboundedSender<Message>,
        notify: Notify,
    ) -> Self {
        // Capacity 1: the slot only ever holds the job being handed over
        let (jobs, mut rx) = mpsc::channel::<DownloadRequest>(1);
        let busy = Arc::new(AtomicBool::new(false));
        let busy_c = Arc::clone(&busy);
        // Needed inside the loop to spawn the per-job progress forwarder
        let inner = handle.clone();

        handle.spawn(async move {
            while let Some(request) = rx.recv().await {
                // Forward progress until the tool drops its sender
                let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
                let forward_events = events.clone();
                let forward_notify = Arc::clone(&notify);
                let forwarder = inner.spawn(async move {
                    while let Some(update) = progress_rx.recv().await {
                        if forward_events.send(Message::DownloadProgress(update)).is_err() {
                            break;
                        }
                        forward_notify();
                    }
                });

                let result = tool.download(&request, progress_tx).await;
                // All progress is queued before the result
                let _ = forwarder.await;
                // Lower the flag before reporting, so a click made after the
                // UI sees the result is never refused
                busy_c.store(false, Ordering::Release);
                if events.send(Message::DownloadFinished(result)).is_err() {
                    tracing::debug!("download finished after the UI went away");
                    break;
                }
                // Wake the UI for the result
                notify();
            }
            tracing::debug!("download worker stopped");
        });

        Self { jobs, busy }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Queues `request` unless a download is already running.
    pub fn try_submit(&self, request: DownloadRequest) -> Result<(), AppError> {
        // Claim the flag atomically; losing the race means a download is running
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AppError::Busy);
        }
        match self.jobs.try_send(request) {
            Ok(()) => Ok(()),
            Err(e) => {
                // Nothing was queued, hand the flag back
                self.busy.store(false, Ordering::Release);
                Err(match e {
                    TrySendError::Full(_) => AppError::Busy,
                    TrySendError::Closed(_) => AppError::WorkerStopped,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::Quality, progress::Progress};
    use async_trait::async_trait;
    use std::{sync::atomic::AtomicUsize, time::Duration};
    use tokio::sync::Semaphore;

    /// Download blocks until the test releases a permit.
    struct GatedTool {
        gate: Semaphore,
        started: AtomicUsize,
    }

    #[async_trait]
    impl MediaTool for GatedTool {
        async fn title(&self, _url: &str) -> Result<String, AppError> {
            unreachable!()
        }

        async fn thumbnail_url(&self, _url: &str) -> Result<String, AppError> {
            unreachable!()
        }

        async fn download(
            &self,
            _request: &DownloadRequest,
            progress_tx: UnboundedSender<Progress>,
        ) -> Result<(), AppError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let _ = progress_tx.send(Progress::Fraction(0.3));
            let permit = self.gate.acquire().await.map_err(|_| AppError::WorkerStopped)?;
            permit.forget();
            Ok(())
        }
    }

    fn request() -> DownloadRequest {
        DownloadRequest::new("https://youtu.be/abc", "/tmp", Quality::P480).unwrap()
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Message>) -> Message {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("worker event")
            .expect("channel open")
    }

    #[tokio::test]
    async fn second_submit_rejected_while_busy() {
        let tool = Arc::new(GatedTool { gate: Semaphore::new(0), started: AtomicUsize::new(0) });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let worker = DownloadWorker::spawn(&Handle::current(), tool.clone(), tx, Arc::new(|| {}));

        worker.try_submit(request()).unwrap();
        assert!(worker.is_busy());
        assert!(matches!(worker.try_submit(request()), Err(AppError::Busy)));

        // Progress arrives while the download is still held
        assert!(matches!(next(&mut rx).await, Message::DownloadProgress(Progress::Fraction(_))));
        tool.gate.add_permits(1);
        assert!(matches!(next(&mut rx).await, Message::DownloadFinished(Ok(()))));
        assert!(!worker.is_busy());
        assert_eq!(tool.started.load(Ordering::SeqCst), 1);

        // Free again after completion
        worker.try_submit(request()).unwrap();
        tool.gate.add_permits(1);
        loop {
            if let Message::DownloadFinished(result) = next(&mut rx).await {
                assert!(result.is_ok());
                break;
            }
        }
        assert_eq!(tool.started.load(Ordering::SeqCst), 2);
    }
}
