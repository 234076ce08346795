use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::Mutex;

use crate::common::{FileId, FrameId, PageId, Result, TesseraError};
use crate::storage::disk::{DiskManager, DiskScheduler};

use super::{FrameHeader, LruReplacer, ReadPageGuard, ReleaseCallback, WritePageGuard};

/// Internal state shared with the release callbacks of outstanding guards
struct BufferPoolState {
    /// The buffer pool frames
    frames: Vec<Arc<FrameHeader>>,
    /// Page table: maps page IDs to frame IDs
    page_table: Mutex<HashMap<PageId, FrameId>>,
    /// Frames that hold no page
    free_list: Mutex<VecDeque<FrameId>>,
    /// LRU replacer for eviction decisions
    replacer: LruReplacer,
}

impl BufferPoolState {
    /// Drops one pin on the page; the frame becomes evictable when the last
    /// pin goes away.
    fn release(&self, page_id: PageId, is_dirty: bool) {
        let page_table = self.page_table.lock();
        if let Some(&frame_id) = page_table.get(&page_id) {
            let frame = &self.frames[frame_id.as_usize()];
            if is_dirty {
                frame.set_dirty(true);
            }
            if let Some(0) = frame.unpin() {
                self.replacer.unpin(frame_id);
            }
        }
    }
}

/// BufferPoolManager caches pages of every open file in a fixed number of
/// frames. It owns the pool-size limit; the LRU replacer only tells it which
/// unpinned frame to reuse next.
pub struct BufferPoolManager {
    /// Number of frames in the buffer pool
    pool_size: usize,
    /// Shared state
    state: Arc<BufferPoolState>,
    /// Disk scheduler for page I/O
    disk_scheduler: DiskScheduler,
}

impl BufferPoolManager {
    pub fn new(pool_size: usize, disk_manager: Arc<DiskManager>) -> Self {
        let mut frames = Vec::with_capacity(pool_size);
        let mut free_list = VecDeque::with_capacity(pool_size);

        for i in 0..pool_size {
            let frame_id = FrameId::new(i as u32);
            frames.push(Arc::new(FrameHeader::new(frame_id)));
            free_list.push_back(frame_id);
        }

        let state = Arc::new(BufferPoolState {
            frames,
            page_table: Mutex::new(HashMap::new()),
            free_list: Mutex::new(free_list),
            replacer: LruReplacer::new(pool_size),
        });

        Self {
            pool_size,
            state,
            disk_scheduler: DiskScheduler::new(disk_manager),
        }
    }

    /// Returns the disk manager behind this pool.
    pub fn disk_manager(&self) -> &Arc<DiskManager> {
        self.disk_scheduler.disk_manager()
    }

    /// Allocates the next page of a file and gives it a frame.
    /// The new page is zeroed and unpinned; acquire a guard to use it.
    pub fn new_page(&self, file_id: FileId) -> Result<PageId> {
        let mut page_table = self.state.page_table.lock();
        let frame_id = self.get_free_frame(&mut page_table)?;
        let page_id = match self.disk_manager().allocate_page(file_id) {
            Ok(page_id) => page_id,
            Err(e) => {
                self.state.free_list.lock().push_back(frame_id);
                return Err(e);
            }
        };

        let frame = &self.state.frames[frame_id.as_usize()];
        frame.set_page_id(Some(page_id));
        // Never read back from disk, so it must be written on eviction
        frame.set_dirty(true);

        page_table.insert(page_id, frame_id);
        self.state.replacer.unpin(frame_id);

        debug!("Allocated {} in {}", page_id, frame_id);
        Ok(page_id)
    }

    /// Drops a page from the pool without writing it back.
    /// Returns false if the page was not resident.
    pub fn delete_page(&self, page_id: PageId) -> Result<bool> {
        let mut page_table = self.state.page_table.lock();

        let Some(&frame_id) = page_table.get(&page_id) else {
            return Ok(false);
        };
        let frame = &self.state.frames[frame_id.as_usize()];
        if frame.pin_count() > 0 {
            return Err(TesseraError::PageStillPinned(page_id));
        }

        page_table.remove(&page_id);
        self.state.replacer.pin(frame_id);
        frame.reset();
        self.state.free_list.lock().push_back(frame_id);
        Ok(true)
    }

    /// Pins a page for shared access.
    pub fn fetch_page_read(&self, page_id: PageId) -> Result<ReadPageGuard> {
        let frame_id = self.fetch_page(page_id)?;
        let frame = &self.state.frames[frame_id.as_usize()];
        Ok(ReadPageGuard::new(page_id, frame, self.release_callback()))
    }

    /// Pins a page for exclusive access.
    pub fn fetch_page_write(&self, page_id: PageId) -> Result<WritePageGuard> {
        let frame_id = self.fetch_page(page_id)?;
        let frame = &self.state.frames[frame_id.as_usize()];
        Ok(WritePageGuard::new(page_id, frame, self.release_callback()))
    }

    /// Writes a resident page to disk. Returns false if it is not resident.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let page_table = self.state.page_table.lock();

        if let Some(&frame_id) = page_table.get(&page_id) {
            let frame = &self.state.frames[frame_id.as_usize()];
            self.disk_scheduler
                .schedule_write_sync(page_id, frame.snapshot())?;
            frame.set_dirty(false);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Writes every dirty page of one file to disk.
    pub fn flush_file(&self, file_id: FileId) -> Result<()> {
        let page_table = self.state.page_table.lock();

        for (&page_id, &frame_id) in page_table.iter() {
            if page_id.file_id != file_id {
                continue;
            }
            let frame = &self.state.frames[frame_id.as_usize()];
            if frame.is_dirty() {
                self.disk_scheduler
                    .schedule_write_sync(page_id, frame.snapshot())?;
                frame.set_dirty(false);
            }
        }

        Ok(())
    }

    /// Writes back and evicts every page of a file, e.g. before closing it.
    /// Fails if any of its pages is still pinned.
    pub fn evict_file(&self, file_id: FileId) -> Result<()> {
        let mut page_table = self.state.page_table.lock();

        let resident: Vec<(PageId, FrameId)> = page_table
            .iter()
            .filter(|(page_id, _)| page_id.file_id == file_id)
            .map(|(&p, &f)| (p, f))
            .collect();

        if let Some((page_id, _)) = resident
            .iter()
            .find(|(_, f)| self.state.frames[f.as_usize()].pin_count() > 0)
        {
            return Err(TesseraError::PageStillPinned(*page_id));
        }

        for (page_id, frame_id) in resident {
            let frame = &self.state.frames[frame_id.as_usize()];
            if frame.is_dirty() {
                self.disk_scheduler
                    .schedule_write_sync(page_id, frame.snapshot())?;
            }
            page_table.remove(&page_id);
            self.state.replacer.pin(frame_id);
            frame.reset();
            self.state.free_list.lock().push_back(frame_id);
        }

        Ok(())
    }

    /// Writes every dirty page in the pool to disk.
    pub fn flush_all_pages(&self) -> Result<()> {
        let page_table = self.state.page_table.lock();

        for (&page_id, &frame_id) in page_table.iter() {
            let frame = &self.state.frames[frame_id.as_usize()];
            if frame.is_dirty() {
                self.disk_scheduler
                    .schedule_write_sync(page_id, frame.snapshot())?;
                frame.set_dirty(false);
            }
        }

        Ok(())
    }

    /// Returns the pin count for a resident page.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let page_table = self.state.page_table.lock();

        page_table
            .get(&page_id)
            .map(|&frame_id| self.state.frames[frame_id.as_usize()].pin_count())
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Returns the number of frames that hold no page.
    pub fn free_frame_count(&self) -> usize {
        self.state.free_list.lock().len()
    }

    /// Returns the number of resident pages that could be evicted right now.
    pub fn evictable_count(&self) -> usize {
        self.state.replacer.size()
    }

    fn release_callback(&self) -> ReleaseCallback {
        let state = Arc::clone(&self.state);
        Box::new(move |page_id, is_dirty| state.release(page_id, is_dirty))
    }

    /// Pins a page in the pool and returns its frame ID, reading it from disk
    /// if it is not resident.
    fn fetch_page(&self, page_id: PageId) -> Result<FrameId> {
        let mut page_table = self.state.page_table.lock();

        if let Some(&frame_id) = page_table.get(&page_id) {
            self.state.frames[frame_id.as_usize()].pin();
            self.state.replacer.pin(frame_id);
            return Ok(frame_id);
        }

        let frame_id = self.get_free_frame(&mut page_table)?;
        let data = match self.disk_scheduler.schedule_read_sync(page_id) {
            Ok(data) => data,
            Err(e) => {
                self.state.free_list.lock().push_back(frame_id);
                return Err(e);
            }
        };

        let frame = &self.state.frames[frame_id.as_usize()];
        frame.set_page_id(Some(page_id));
        frame.load(&data);
        frame.pin();

        page_table.insert(page_id, frame_id);
        self.state.replacer.pin(frame_id);

        trace!("Read {} into {}", page_id, frame_id);
        Ok(frame_id)
    }

    /// Gets a free frame, either from the free list or by evicting a page.
    /// The returned frame is reset and absent from the page table.
    fn get_free_frame(&self, page_table: &mut HashMap<PageId, FrameId>) -> Result<FrameId> {
        if let Some(frame_id) = self.state.free_list.lock().pop_front() {
            return Ok(frame_id);
        }

        let frame_id = self
            .state
            .replacer
            .victim()
            .ok_or(TesseraError::BufferPoolFull)?;
        let frame = &self.state.frames[frame_id.as_usize()];

        if let Some(old_page_id) = frame.page_id() {
            if frame.is_dirty() {
                debug!("Writing back dirty {} before evicting {}", old_page_id, frame_id);
                if let Err(e) = self
                    .disk_scheduler
                    .schedule_write_sync(old_page_id, frame.snapshot())
                {
                    self.state.replacer.unpin(frame_id);
                    return Err(e);
                }
            }
            page_table.remove(&old_page_id);
            trace!("Evicted {} from {}", old_page_id, frame_id);
        }

        frame.reset();
        Ok(frame_id)
    }
}
