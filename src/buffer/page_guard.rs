use std::ops::{Deref, DerefMut};

use parking_lot::{ArcRwLockReadGuard, ArcRwLockWriteGuard, RawRwLock};

use crate::common::{PageData, PageId};

use super::FrameHeader;

/// Callback type for releasing a page guard
pub(crate) type ReleaseCallback = Box<dyn FnOnce(PageId, bool) + Send + Sync>;

/// Runs the release callback exactly once when dropped.
///
/// Guards declare this field after their data lock so that the lock is
/// released before the frame is unpinned.
struct PageRelease {
    page_id: PageId,
    is_dirty: bool,
    callback: Option<ReleaseCallback>,
}

impl PageRelease {
    fn new(page_id: PageId, callback: ReleaseCallback) -> Self {
        Self {
            page_id,
            is_dirty: false,
            callback: Some(callback),
        }
    }
}

impl Drop for PageRelease {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback(self.page_id, self.is_dirty);
        }
    }
}

/// RAII guard for read-only access to a page.
/// Holds one pin on the frame and unpins it when dropped.
pub struct ReadPageGuard {
    data: ArcRwLockReadGuard<RawRwLock, PageData>,
    release: PageRelease,
}

impl ReadPageGuard {
    /// Locks the frame for reading. The frame must already be pinned on
    /// behalf of this guard.
    pub(crate) fn new(page_id: PageId, frame: &FrameHeader, callback: ReleaseCallback) -> Self {
        Self {
            data: frame.data.read_arc(),
            release: PageRelease::new(page_id, callback),
        }
    }

    pub fn page_id(&self) -> PageId {
        self.release.page_id
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }
}

impl Deref for ReadPageGuard {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data()
    }
}

/// RAII guard for read-write access to a page.
/// Marks the page dirty on mutable access and unpins it when dropped.
pub struct WritePageGuard {
    data: ArcRwLockWriteGuard<RawRwLock, PageData>,
    release: PageRelease,
}

impl WritePageGuard {
    /// Locks the frame for writing. The frame must already be pinned on
    /// behalf of this guard.
    pub(crate) fn new(page_id: PageId, frame: &FrameHeader, callback: ReleaseCallback) -> Self {
        Self {
            data: frame.data.write_arc(),
            release: PageRelease::new(page_id, callback),
        }
    }

    pub fn page_id(&self) -> PageId {
        self.release.page_id
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }

    /// Returns a mutable reference to the page data.
    /// Automatically marks the page as dirty.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.release.is_dirty = true;
        &mut self.data[..]
    }
}

impl Deref for WritePageGuard {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data()
    }
}

impl DerefMut for WritePageGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.data_mut()
    }
}
