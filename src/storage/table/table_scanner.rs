use std::sync::Arc;

use crate::buffer::BufferPoolManager;
use crate::common::{FileId, PageId, Result, Rid, FIRST_RECORD_PAGE};
use crate::storage::page::{FileHeader, RecordPageRef};

use super::HeapFile;

/// Forward-only cursor over the occupied slots of a heap file, in page then
/// slot order.
///
/// The scanner copies the file layout when it is created, so pages appended
/// afterwards are not visited. It holds no page pinned between calls.
pub struct TableScanner {
    bpm: Arc<BufferPoolManager>,
    file_id: FileId,
    layout: FileHeader,
    rid: Rid,
}

impl TableScanner {
    /// Positions the scanner on the first live record, or at the end.
    pub fn new(heap: &HeapFile) -> Result<Self> {
        let mut scanner = Self {
            bpm: Arc::clone(heap.buffer_pool()),
            file_id: heap.file_id(),
            layout: *heap.file_header(),
            rid: Rid::new(FIRST_RECORD_PAGE, 0),
        };
        scanner.seek(FIRST_RECORD_PAGE, None)?;
        Ok(scanner)
    }

    /// Moves to the next live record after the current one.
    pub fn advance(&mut self) -> Result<()> {
        if self.done() {
            return Ok(());
        }
        self.seek(self.rid.page_no, Some(self.rid.slot_no as usize))
    }

    pub fn done(&self) -> bool {
        self.rid.page_no >= self.layout.num_pages
    }

    /// Current position. Only meaningful while not done.
    pub fn rid(&self) -> Rid {
        self.rid
    }

    /// Finds the first occupied slot after `after` on `page_no`, then on
    /// every following page from slot 0.
    fn seek(&mut self, mut page_no: u32, mut after: Option<usize>) -> Result<()> {
        while page_no < self.layout.num_pages {
            let guard = self
                .bpm
                .fetch_page_read(PageId::new(self.file_id, page_no))?;
            let page = RecordPageRef::new(guard.data(), &self.layout);

            if let Some(slot_no) = page.next_occupied_slot(after) {
                self.rid = Rid::new(page_no, slot_no as u32);
                return Ok(());
            }
            page_no += 1;
            after = None;
        }

        self.rid = Rid::new(self.layout.num_pages, 0);
        Ok(())
    }
}

impl Iterator for TableScanner {
    type Item = Result<Rid>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done() {
            return None;
        }
        let rid = self.rid;
        if let Err(e) = self.advance() {
            self.rid = Rid::new(self.layout.num_pages, 0);
            return Some(Err(e));
        }
        Some(Ok(rid))
    }
}
