use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::buffer::BufferPoolManager;
use crate::common::{
    FileId, PageId, Result, Rid, TesseraError, FILE_HEADER_PAGE, FIRST_RECORD_PAGE,
};
use crate::storage::page::{FileHeader, RecordPage, RecordPageRef};
use crate::tuple::Record;

use super::TableScanner;

/// HeapFile stores one table's fixed-length records in the pages of one file.
///
/// Page 0 carries the [`FileHeader`]; every later page is a [`RecordPage`].
/// Pages with at least one free slot form a LIFO list threaded through the
/// page headers, headed by `FileHeader::first_free_page_no`.
///
/// The header is kept in memory and written back to page 0 by
/// [`flush`](Self::flush) and [`close`](Self::close). Records added after the
/// last flush are lost if the handle is dropped without closing; reopening
/// reuses their pages.
pub struct HeapFile {
    bpm: Arc<BufferPoolManager>,
    file_id: FileId,
    header: FileHeader,
}

impl HeapFile {
    /// Creates a new heap file for records of `record_size` bytes and opens it.
    pub fn create<P: AsRef<Path>>(
        bpm: Arc<BufferPoolManager>,
        path: P,
        record_size: usize,
    ) -> Result<Self> {
        let path = path.as_ref();
        let header = FileHeader::new(record_size)?;

        let dm = bpm.disk_manager();
        dm.create_file(path)?;
        let file_id = dm.open_file(path)?;

        let header_page = bpm.new_page(file_id)?;
        if header_page.page_no != FILE_HEADER_PAGE {
            return Err(TesseraError::Internal(format!(
                "fresh file {} starts at {}",
                path.display(),
                header_page
            )));
        }

        let heap = Self {
            bpm,
            file_id,
            header,
        };
        heap.flush()?;

        info!(
            "Created heap file {} ({} bytes per record, {} per page)",
            path.display(),
            record_size,
            header.num_records_per_page
        );
        Ok(heap)
    }

    /// Opens an existing heap file and loads its header.
    pub fn open<P: AsRef<Path>>(bpm: Arc<BufferPoolManager>, path: P) -> Result<Self> {
        let path = path.as_ref();
        let dm = bpm.disk_manager();
        let file_id = dm.open_file(path)?;
        // Pages cached from an earlier handle that was never closed
        bpm.evict_file(file_id)?;

        let header = {
            let guard = bpm.fetch_page_read(PageId::new(file_id, FILE_HEADER_PAGE))?;
            FileHeader::decode(guard.data())?
        };

        let on_disk = dm.num_pages(file_id)?;
        if on_disk < header.num_pages {
            return Err(TesseraError::InvalidHeapFile(format!(
                "{} has {} pages, header records {}",
                path.display(),
                on_disk,
                header.num_pages
            )));
        }
        // The header is authoritative; pages past its count were never
        // recorded by a flush and get reallocated.
        if on_disk > header.num_pages {
            warn!(
                "{} has {} pages past its header, reusing them",
                path.display(),
                on_disk - header.num_pages
            );
            dm.set_num_pages(file_id, header.num_pages)?;
        }

        debug!("Opened heap file {} as {}", path.display(), file_id);
        Ok(Self {
            bpm,
            file_id,
            header,
        })
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.header
    }

    pub fn record_size(&self) -> usize {
        self.header.record_size as usize
    }

    /// Number of pages, header page included.
    pub fn num_pages(&self) -> u32 {
        self.header.num_pages
    }

    pub(crate) fn buffer_pool(&self) -> &Arc<BufferPoolManager> {
        &self.bpm
    }

    /// Returns a copy of the record stored at `rid`.
    pub fn get(&self, rid: Rid) -> Result<Record> {
        let page_id = self.record_page_id(rid.page_no)?;
        let guard = self.bpm.fetch_page_read(page_id)?;
        let page = RecordPageRef::new(guard.data(), &self.header);

        if !page.is_occupied(rid.slot_no as usize) {
            return Err(TesseraError::RecordNotFound(rid));
        }
        Ok(Record::from(page.slot(rid.slot_no as usize)))
    }

    /// Returns true if `rid` addresses a live record.
    pub fn is_record(&self, rid: Rid) -> Result<bool> {
        let page_id = self.record_page_id(rid.page_no)?;
        let guard = self.bpm.fetch_page_read(page_id)?;
        Ok(RecordPageRef::new(guard.data(), &self.header).is_occupied(rid.slot_no as usize))
    }

    /// Stores a record in the lowest free slot of the first page on the free
    /// list, allocating a page when the list is empty.
    pub fn insert(&mut self, record: &[u8]) -> Result<Rid> {
        self.check_size(record)?;

        let page_no = match self.header.first_free_page_no {
            Some(page_no) => page_no,
            None => self.create_page()?,
        };

        let mut guard = self.bpm.fetch_page_write(PageId::new(self.file_id, page_no))?;
        let mut page = RecordPage::new(guard.data_mut(), &self.header);

        let slot_no = page.view().first_free_slot().ok_or_else(|| {
            TesseraError::Internal(format!("no free slot on free-list page {}", page_no))
        })?;
        page.occupy(slot_no, record);

        if page.is_full() {
            self.header.first_free_page_no = page.next_free_page_no();
            debug!(
                "Page {} is full, free list head is now {:?}",
                page_no, self.header.first_free_page_no
            );
        }

        Ok(Rid::new(page_no, slot_no as u32))
    }

    /// Removes the record at `rid`. A page that was full goes back on the
    /// head of the free list.
    pub fn delete(&mut self, rid: Rid) -> Result<()> {
        let page_id = self.record_page_id(rid.page_no)?;
        let mut guard = self.bpm.fetch_page_write(page_id)?;
        let mut page = RecordPage::new(guard.data_mut(), &self.header);

        if !page.view().is_occupied(rid.slot_no as usize) {
            return Err(TesseraError::RecordNotFound(rid));
        }

        let was_full = page.is_full();
        page.vacate(rid.slot_no as usize);

        if was_full {
            page.set_next_free_page_no(self.header.first_free_page_no);
            self.header.first_free_page_no = Some(rid.page_no);
            debug!("Page {} has room again, pushed onto free list", rid.page_no);
        }
        Ok(())
    }

    /// Overwrites the record at `rid` in place.
    pub fn update(&mut self, rid: Rid, record: &[u8]) -> Result<()> {
        self.check_size(record)?;

        let page_id = self.record_page_id(rid.page_no)?;
        let mut guard = self.bpm.fetch_page_write(page_id)?;
        let mut page = RecordPage::new(guard.data_mut(), &self.header);

        if !page.view().is_occupied(rid.slot_no as usize) {
            return Err(TesseraError::RecordNotFound(rid));
        }
        page.slot_mut(rid.slot_no as usize).copy_from_slice(record);
        Ok(())
    }

    /// Starts a scan over the live records of this file.
    pub fn scan(&self) -> Result<TableScanner> {
        TableScanner::new(self)
    }

    /// Writes the header to page 0 and every dirty page of the file to disk.
    pub fn flush(&self) -> Result<()> {
        {
            let mut guard = self
                .bpm
                .fetch_page_write(PageId::new(self.file_id, FILE_HEADER_PAGE))?;
            self.header.encode(guard.data_mut());
        }
        self.bpm.flush_file(self.file_id)
    }

    /// Flushes the file, drops its pages from the pool and closes it.
    pub fn close(self) -> Result<()> {
        self.flush()?;
        self.bpm.evict_file(self.file_id)?;
        self.bpm.disk_manager().close_file(self.file_id)?;
        debug!("Closed heap file {}", self.file_id);
        Ok(())
    }

    /// Appends a fresh empty page and pushes it onto the free list.
    fn create_page(&mut self) -> Result<u32> {
        let page_id = self.bpm.new_page(self.file_id)?;
        if page_id.page_no != self.header.num_pages {
            return Err(TesseraError::Internal(format!(
                "allocated {} but file header counts {} pages",
                page_id, self.header.num_pages
            )));
        }

        {
            let mut guard = self.bpm.fetch_page_write(page_id)?;
            RecordPage::new(guard.data_mut(), &self.header).init(self.header.first_free_page_no);
        }

        self.header.first_free_page_no = Some(page_id.page_no);
        self.header.num_pages += 1;
        debug!("Allocated record page {} in {}", page_id.page_no, self.file_id);
        Ok(page_id.page_no)
    }

    fn record_page_id(&self, page_no: u32) -> Result<PageId> {
        let page_id = PageId::new(self.file_id, page_no);
        if page_no < FIRST_RECORD_PAGE || page_no >= self.header.num_pages {
            return Err(TesseraError::PageNotFound(page_id));
        }
        Ok(page_id)
    }

    fn check_size(&self, record: &[u8]) -> Result<()> {
        if record.len() != self.record_size() {
            return Err(TesseraError::RecordSizeMismatch {
                expected: self.record_size(),
                found: record.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::disk::DiskManager;
    use tempfile::TempDir;

    fn create_heap(record_size: usize) -> (HeapFile, TempDir) {
        let dir = TempDir::new().unwrap();
        let bpm = Arc::new(BufferPoolManager::new(16, Arc::new(DiskManager::new())));
        let heap = HeapFile::create(bpm, dir.path().join("t.tbl"), record_size).unwrap();
        (heap, dir)
    }

    #[test]
    fn test_heap_file_create() {
        let (heap, _dir) = create_heap(1000);
        assert_eq!(heap.num_pages(), 1);
        assert_eq!(heap.record_size(), 1000);
        assert_eq!(heap.file_header().first_free_page_no, None);
    }

    #[test]
    fn test_heap_file_insert_get() {
        let (mut heap, _dir) = create_heap(8);

        let rid = heap.insert(&42u64.to_le_bytes()).unwrap();
        assert_eq!(rid, Rid::new(1, 0));
        assert_eq!(heap.get(rid).unwrap().data(), &42u64.to_le_bytes());
        assert!(heap.is_record(rid).unwrap());
        assert!(!heap.is_record(Rid::new(1, 1)).unwrap());
    }

    #[test]
    fn test_heap_file_wrong_size() {
        let (mut heap, _dir) = create_heap(8);
        assert!(matches!(
            heap.insert(b"short"),
            Err(TesseraError::RecordSizeMismatch { expected: 8, found: 5 })
        ));
    }

    #[test]
    fn test_heap_file_page_out_of_range() {
        let (heap, _dir) = create_heap(8);
        assert!(matches!(
            heap.get(Rid::new(3, 0)),
            Err(TesseraError::PageNotFound(_))
        ));
        assert!(matches!(
            heap.get(Rid::new(0, 0)),
            Err(TesseraError::PageNotFound(_))
        ));
    }

    #[test]
    fn test_heap_file_delete_then_get() {
        let (mut heap, _dir) = create_heap(8);
        let rid = heap.insert(&[1u8; 8]).unwrap();

        heap.delete(rid).unwrap();
        assert!(matches!(heap.get(rid), Err(TesseraError::RecordNotFound(_))));
        assert!(matches!(heap.delete(rid), Err(TesseraError::RecordNotFound(_))));
        assert!(matches!(
            heap.update(rid, &[2u8; 8]),
            Err(TesseraError::RecordNotFound(_))
        ));
    }
}
