use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::error;

use crate::common::{PageData, PageId, Result, TesseraError, PAGE_SIZE};

use super::DiskManager;

/// What the worker should do with a page
enum DiskOp {
    Read,
    Write(PageData),
}

/// A disk I/O request. The worker answers on `reply` with the page image
/// (for reads) or an echo of the written image (for writes).
struct DiskRequest {
    page_id: PageId,
    op: DiskOp,
    reply: Sender<Result<PageData>>,
}

/// DiskScheduler runs page I/O on a background worker thread.
/// Requests own their buffers, so nothing borrowed crosses the thread boundary.
pub struct DiskScheduler {
    /// The disk manager for actual I/O operations
    disk_manager: Arc<DiskManager>,
    /// Channel sender for queuing requests
    request_sender: Sender<DiskRequest>,
    /// Flag to signal shutdown
    shutdown: Arc<AtomicBool>,
    /// Handle to the background worker thread
    worker_handle: Option<JoinHandle<()>>,
}

impl DiskScheduler {
    /// Creates a new DiskScheduler and spawns its worker thread.
    pub fn new(disk_manager: Arc<DiskManager>) -> Self {
        let (sender, receiver) = bounded::<DiskRequest>(128);
        let shutdown = Arc::new(AtomicBool::new(false));

        let dm_clone = Arc::clone(&disk_manager);
        let shutdown_clone = Arc::clone(&shutdown);

        let worker_handle = thread::spawn(move || {
            Self::start_worker_thread(dm_clone, receiver, shutdown_clone);
        });

        Self {
            disk_manager,
            request_sender: sender,
            shutdown,
            worker_handle: Some(worker_handle),
        }
    }

    /// Reads a page and waits for the result.
    pub fn schedule_read_sync(&self, page_id: PageId) -> Result<PageData> {
        self.submit(page_id, DiskOp::Read)
    }

    /// Writes a page and waits for completion.
    pub fn schedule_write_sync(&self, page_id: PageId, data: PageData) -> Result<()> {
        self.submit(page_id, DiskOp::Write(data)).map(|_| ())
    }

    fn submit(&self, page_id: PageId, op: DiskOp) -> Result<PageData> {
        let (reply, rx) = bounded(1);
        self.request_sender
            .send(DiskRequest { page_id, op, reply })
            .map_err(|e| TesseraError::DiskScheduler(format!("Failed to schedule request: {}", e)))?;

        rx.recv().map_err(|e| {
            TesseraError::DiskScheduler(format!("Failed to receive completion: {}", e))
        })?
    }

    /// The background worker loop.
    /// Processes requests from the queue until shutdown is signaled.
    fn start_worker_thread(
        disk_manager: Arc<DiskManager>,
        receiver: Receiver<DiskRequest>,
        shutdown: Arc<AtomicBool>,
    ) {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                while let Ok(request) = receiver.try_recv() {
                    Self::process_request(&disk_manager, request);
                }
                break;
            }

            match receiver.recv_timeout(Duration::from_millis(100)) {
                Ok(request) => Self::process_request(&disk_manager, request),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn process_request(disk_manager: &DiskManager, request: DiskRequest) {
        let page_id = request.page_id;
        let result = match request.op {
            DiskOp::Read => {
                let mut buf: PageData = Box::new([0u8; PAGE_SIZE]);
                disk_manager.read_page(page_id, &mut buf[..]).map(|_| buf)
            }
            DiskOp::Write(buf) => disk_manager.write_page(page_id, &buf[..]).map(|_| buf),
        };

        if let Err(e) = &result {
            error!("Disk request for {} failed: {}", page_id, e);
        }
        // The requester may have given up waiting
        let _ = request.reply.send(result);
    }

    /// Returns a reference to the underlying DiskManager.
    pub fn disk_manager(&self) -> &Arc<DiskManager> {
        &self.disk_manager
    }
}

impl Drop for DiskScheduler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);

        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.join();
        }
    }
}
