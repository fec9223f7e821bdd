//! Serial download worker and queue state.

use crate::error::{DownloadError, Result};
use crate::types::{DownloadItem, DownloadRequest, DownloadStatus, QueueStats};
use futures_util::StreamExt;
use herald_cache::{NewRecord, OfflineStore};
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Background download queue.
///
/// Cheap to clone; all clones share the same queue and worker. Must be used
/// from within a tokio runtime (the worker is a spawned task).
#[derive(Clone)]
pub struct DownloadQueue {
    inner: Arc<Inner>,
}

struct Inner {
    items: Mutex<Vec<DownloadItem>>,
    // Re-entrancy guard: enqueue while the worker runs only appends work.
    worker_active: AtomicBool,
    // Set by clear_all: the worker stops picking new items. The in-flight
    // transfer is not aborted; its result is discarded with the item gone.
    stopped: AtomicBool,
    http: Client,
    store: OfflineStore,
}

impl DownloadQueue {
    /// Create a queue writing into `store`.
    pub fn new(store: OfflineStore) -> Self {
        Self::with_http(Client::new(), store)
    }

    /// Create a queue reusing an existing HTTP connection pool.
    pub fn with_http(http: Client, store: OfflineStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                items: Mutex::new(Vec::new()),
                worker_active: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                http,
                store,
            }),
        }
    }

    /// Append requests as pending items and start the worker if it is idle.
    ///
    /// No de-duplication happens here; see [`enqueue_if_missing`]
    /// for the caller-facing helper that skips known items.
    ///
    /// [`enqueue_if_missing`]: DownloadQueue::enqueue_if_missing
    pub fn enqueue(&self, requests: Vec<DownloadRequest>) {
        if requests.is_empty() {
            return;
        }

        self.inner.stopped.store(false, Ordering::SeqCst);
        {
            let mut items = self.inner.items.lock().expect("download queue poisoned");
            for request in requests {
                debug!(story_id = %request.story_id, "Enqueued download");
                items.push(DownloadItem::new(request));
            }
        }

        Inner::maybe_start(&self.inner);
    }

    /// Enqueue only the requests that are not already cached, queued, or
    /// in flight. Returns how many were actually enqueued.
    pub async fn enqueue_if_missing(&self, requests: Vec<DownloadRequest>) -> usize {
        let mut fresh = Vec::new();

        for request in requests {
            if self.inner.store.contains(&request.story_id).await {
                continue;
            }

            let already_tracked = {
                let items = self.inner.items.lock().expect("download queue poisoned");
                items.iter().any(|item| {
                    item.request.story_id == request.story_id
                        && item.status != DownloadStatus::Failed
                })
            };
            if already_tracked {
                continue;
            }

            fresh.push(request);
        }

        let count = fresh.len();
        self.enqueue(fresh);
        count
    }

    /// Remove all `Complete` items, keeping pending, in-flight, and failed ones.
    pub fn clear_completed(&self) {
        let mut items = self.inner.items.lock().expect("download queue poisoned");
        items.retain(|item| item.status != DownloadStatus::Complete);
    }

    /// Remove one item by story id.
    pub fn remove(&self, story_id: &str) {
        let mut items = self.inner.items.lock().expect("download queue poisoned");
        items.retain(|item| item.request.story_id != story_id);
    }

    /// Drop every item and stop the worker from picking up new ones.
    ///
    /// An in-flight transfer finishes or fails on its own; its terminal status
    /// is discarded because the item is already gone.
    pub fn clear_all(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        let mut items = self.inner.items.lock().expect("download queue poisoned");
        items.clear();
    }

    /// Current items, in insertion order.
    pub fn snapshot(&self) -> Vec<DownloadItem> {
        self.inner
            .items
            .lock()
            .expect("download queue poisoned")
            .clone()
    }

    /// Aggregate queue state.
    pub fn stats(&self) -> QueueStats {
        let items = self.inner.items.lock().expect("download queue poisoned");

        let mut stats = QueueStats {
            pending: 0,
            downloading: 0,
            completed: 0,
            failed: 0,
            total: items.len(),
            overall_progress: 0,
        };

        for item in items.iter() {
            match item.status {
                DownloadStatus::Pending => stats.pending += 1,
                DownloadStatus::Downloading => stats.downloading += 1,
                DownloadStatus::Complete => stats.completed += 1,
                DownloadStatus::Failed => stats.failed += 1,
            }
        }

        if stats.total > 0 {
            stats.overall_progress =
                ((stats.completed as f64 / stats.total as f64) * 100.0).round() as u8;
        }

        stats
    }
}

impl Inner {
    /// Spawn the worker unless one is already running.
    fn maybe_start(inner: &Arc<Inner>) {
        if inner
            .worker_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let inner = Arc::clone(inner);
            tokio::spawn(async move {
                Inner::run(&inner).await;
            });
        }
    }

    /// Serial worker loop: one item at a time, FIFO by insertion order.
    async fn run(inner: &Arc<Inner>) {
        loop {
            if inner.stopped.load(Ordering::SeqCst) {
                break;
            }

            let job = {
                let mut items = inner.items.lock().expect("download queue poisoned");
                match items
                    .iter_mut()
                    .find(|item| item.status == DownloadStatus::Pending)
                {
                    Some(item) => {
                        item.status = DownloadStatus::Downloading;
                        Some(item.request.clone())
                    }
                    None => None,
                }
            };

            let Some(request) = job else { break };

            let result = Inner::download_one(inner, &request).await;
            inner.finish(&request.story_id, result);
        }

        inner.worker_active.store(false, Ordering::SeqCst);

        // An enqueue could have raced the shutdown above; restart if work
        // remains so nothing is left stranded in Pending.
        let has_pending = {
            let items = inner.items.lock().expect("download queue poisoned");
            items
                .iter()
                .any(|item| item.status == DownloadStatus::Pending)
        };
        if has_pending && !inner.stopped.load(Ordering::SeqCst) {
            Inner::maybe_start(inner);
        }
    }

    /// Stream one item into memory and hand the payload to the store.
    async fn download_one(inner: &Arc<Inner>, request: &DownloadRequest) -> Result<u64> {
        debug!(story_id = %request.story_id, url = %request.audio_url, "Downloading audio");

        let response = inner
            .http
            .get(&request.audio_url)
            .send()
            .await
            .map_err(|e| DownloadError::Transfer(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DownloadError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let total = response.content_length().filter(|len| *len > 0);
        let mut payload: Vec<u8> = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::Transfer(e.to_string()))?;
            payload.extend_from_slice(&chunk);

            // Progress only moves when the length is known; otherwise it
            // stays at 0 until completion.
            if let Some(total) = total {
                let pct = ((payload.len() as u64).saturating_mul(100) / total).min(100) as u8;
                inner.set_progress(&request.story_id, pct);
            }
        }

        let size = payload.len() as u64;
        let stored = inner
            .store
            .put(NewRecord {
                story_id: request.story_id.clone(),
                title: request.title.clone(),
                source: request.source.clone(),
                kind: request.kind,
                duration_secs: request.duration_secs,
                audio_url: Some(request.audio_url.clone()),
                audio: Some(payload),
            })
            .await;

        if !stored {
            return Err(DownloadError::Store("cache put failed".into()));
        }

        Ok(size)
    }

    /// Monotonic progress update for the in-flight item.
    fn set_progress(&self, story_id: &str, pct: u8) {
        let mut items = self.items.lock().expect("download queue poisoned");
        if let Some(item) = items.iter_mut().find(|item| {
            item.request.story_id == story_id && item.status == DownloadStatus::Downloading
        }) {
            item.progress = item.progress.max(pct);
        }
    }

    /// Write the terminal status; a no-op when the item was cleared meanwhile.
    fn finish(&self, story_id: &str, result: Result<u64>) {
        let mut items = self.items.lock().expect("download queue poisoned");
        let Some(item) = items.iter_mut().find(|item| {
            item.request.story_id == story_id && item.status == DownloadStatus::Downloading
        }) else {
            debug!(story_id = %story_id, "Discarding result for cleared download");
            return;
        };

        match result {
            Ok(size) => {
                item.status = DownloadStatus::Complete;
                item.progress = 100;
                info!(story_id = %story_id, size, "Download complete");
            }
            Err(e) => {
                item.status = DownloadStatus::Failed;
                warn!(story_id = %story_id, error = %e, "Download failed");
            }
        }
    }
}
