use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::{FrameId, PageData, PageId, PAGE_SIZE};

/// FrameHeader is one in-memory cell of the buffer pool: the cached page
/// bytes plus the metadata the pool needs to decide whether it can be reused.
pub struct FrameHeader {
    /// The frame ID (index in the buffer pool)
    frame_id: FrameId,
    /// The page cached in this frame, None while the frame is free
    page_id: RwLock<Option<PageId>>,
    /// Number of live page guards on this frame
    pin_count: AtomicU32,
    /// Whether the page has been modified since being read from disk
    is_dirty: AtomicBool,
    /// The page bytes (pub(crate) for page guard access)
    pub(crate) data: Arc<RwLock<PageData>>,
}

impl FrameHeader {
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            page_id: RwLock::new(None),
            pin_count: AtomicU32::new(0),
            is_dirty: AtomicBool::new(false),
            data: Arc::new(RwLock::new(Box::new([0u8; PAGE_SIZE]))),
        }
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    pub fn page_id(&self) -> Option<PageId> {
        *self.page_id.read()
    }

    pub fn set_page_id(&self, page_id: Option<PageId>) {
        *self.page_id.write() = page_id;
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// Increments the pin count and returns the new value.
    pub fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the pin count and returns the new value.
    /// Returns None if the pin count was already 0.
    pub fn unpin(&self) -> Option<u32> {
        loop {
            let current = self.pin_count.load(Ordering::Acquire);
            if current == 0 {
                return None;
            }
            if self
                .pin_count
                .compare_exchange(current, current - 1, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return Some(current - 1);
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::Acquire)
    }

    pub fn set_dirty(&self, dirty: bool) {
        self.is_dirty.store(dirty, Ordering::Release);
    }

    /// Replaces the frame contents with the given page image.
    pub fn load(&self, data: &[u8; PAGE_SIZE]) {
        self.data.write().copy_from_slice(data);
    }

    /// Returns an owned copy of the page image.
    pub fn snapshot(&self) -> PageData {
        self.data.read().clone()
    }

    /// Resets the frame to its initial state.
    pub fn reset(&self) {
        *self.page_id.write() = None;
        self.pin_count.store(0, Ordering::Release);
        self.is_dirty.store(false, Ordering::Release);
        self.data.write().fill(0);
    }
}
