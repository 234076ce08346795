use bytes::{Buf, BufMut};

use crate::common::{NO_PAGE, PAGE_SIZE};

use super::bitmap;
use super::FileHeader;

/// Record page layout:
///
/// +----------------------+
/// | num_records (u32)    |
/// | next_free_page (u32) |
/// +----------------------+
/// | Bitmap               |  (bitmap_size bytes, one bit per slot)
/// +----------------------+
/// | [slot 0]             |  (record_size bytes each)
/// | [slot 1]             |
/// | ...                  |
/// +----------------------+
const NUM_RECORDS_OFFSET: usize = 0;
const NEXT_FREE_PAGE_OFFSET: usize = 4;
const BITMAP_OFFSET: usize = 8;

fn read_u32(data: &[u8], offset: usize) -> u32 {
    (&data[offset..offset + 4]).get_u32_le()
}

fn write_u32(data: &mut [u8], offset: usize, value: u32) {
    (&mut data[offset..offset + 4]).put_u32_le(value);
}

/// RecordPage is a mutable view of one page of fixed-length slots,
/// laid out according to the file's header.
pub struct RecordPage<'a> {
    data: &'a mut [u8],
    layout: FileHeader,
}

impl<'a> RecordPage<'a> {
    /// Creates a view over the given data buffer.
    /// The buffer must be exactly PAGE_SIZE bytes.
    pub fn new(data: &'a mut [u8], layout: &FileHeader) -> Self {
        assert_eq!(data.len(), PAGE_SIZE);
        Self {
            data,
            layout: *layout,
        }
    }

    /// Initializes an empty page: no records, zeroed bitmap.
    pub fn init(&mut self, next_free_page_no: Option<u32>) {
        self.set_num_records(0);
        self.set_next_free_page_no(next_free_page_no);
        bitmap::init(self.bitmap_mut());
    }

    /// Borrows the page as a read-only view.
    pub fn view(&self) -> RecordPageRef<'_> {
        RecordPageRef {
            data: &*self.data,
            layout: self.layout,
        }
    }

    pub fn num_records(&self) -> u32 {
        self.view().num_records()
    }

    pub fn set_num_records(&mut self, n: u32) {
        write_u32(self.data, NUM_RECORDS_OFFSET, n);
    }

    pub fn next_free_page_no(&self) -> Option<u32> {
        self.view().next_free_page_no()
    }

    pub fn set_next_free_page_no(&mut self, page_no: Option<u32>) {
        write_u32(self.data, NEXT_FREE_PAGE_OFFSET, page_no.unwrap_or(NO_PAGE));
    }

    pub fn is_full(&self) -> bool {
        self.num_records() >= self.layout.num_records_per_page
    }

    fn bitmap_mut(&mut self) -> &mut [u8] {
        let size = self.layout.bitmap_size as usize;
        &mut self.data[BITMAP_OFFSET..BITMAP_OFFSET + size]
    }

    /// Stores `record` in a free slot, sets its bit and bumps the count.
    pub fn occupy(&mut self, slot_no: usize, record: &[u8]) {
        self.slot_mut(slot_no).copy_from_slice(record);
        bitmap::set(self.bitmap_mut(), slot_no);
        let n = self.num_records();
        self.set_num_records(n + 1);
    }

    /// Clears a slot's bit and decrements the count. The bytes stay behind.
    pub fn vacate(&mut self, slot_no: usize) {
        bitmap::reset(self.bitmap_mut(), slot_no);
        let n = self.num_records();
        self.set_num_records(n.saturating_sub(1));
    }

    pub fn slot_mut(&mut self, slot_no: usize) -> &mut [u8] {
        let (start, end) = self.layout.slot_range(slot_no);
        &mut self.data[start..end]
    }
}

/// Read-only view of a record page.
pub struct RecordPageRef<'a> {
    data: &'a [u8],
    layout: FileHeader,
}

impl<'a> RecordPageRef<'a> {
    pub fn new(data: &'a [u8], layout: &FileHeader) -> Self {
        assert_eq!(data.len(), PAGE_SIZE);
        Self {
            data,
            layout: *layout,
        }
    }

    pub fn num_records(&self) -> u32 {
        read_u32(self.data, NUM_RECORDS_OFFSET)
    }

    pub fn next_free_page_no(&self) -> Option<u32> {
        match read_u32(self.data, NEXT_FREE_PAGE_OFFSET) {
            NO_PAGE => None,
            page_no => Some(page_no),
        }
    }

    pub fn bitmap(&self) -> &'a [u8] {
        let size = self.layout.bitmap_size as usize;
        &self.data[BITMAP_OFFSET..BITMAP_OFFSET + size]
    }

    pub fn is_occupied(&self, slot_no: usize) -> bool {
        slot_no < self.layout.num_records_per_page as usize && bitmap::is_set(self.bitmap(), slot_no)
    }

    /// Lowest-numbered free slot.
    pub fn first_free_slot(&self) -> Option<usize> {
        bitmap::first_bit(false, self.bitmap(), self.capacity())
    }

    /// Next occupied slot after `curr`, or the first one when `curr` is None.
    pub fn next_occupied_slot(&self, curr: Option<usize>) -> Option<usize> {
        match curr {
            Some(curr) => bitmap::next_bit(true, self.bitmap(), self.capacity(), curr),
            None => bitmap::first_bit(true, self.bitmap(), self.capacity()),
        }
    }

    pub fn slot(&self, slot_no: usize) -> &'a [u8] {
        let (start, end) = self.layout.slot_range(slot_no);
        &self.data[start..end]
    }

    fn capacity(&self) -> usize {
        self.layout.num_records_per_page as usize
    }
}

impl FileHeader {
    /// Byte range of a slot within a record page.
    fn slot_range(&self, slot_no: usize) -> (usize, usize) {
        let size = self.record_size as usize;
        let start = self.slots_offset() + slot_no * size;
        (start, start + size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> FileHeader {
        FileHeader::new(1000).unwrap()
    }

    #[test]
    fn test_record_page_init() {
        let mut data = [0xffu8; PAGE_SIZE];
        let mut page = RecordPage::new(&mut data, &layout());
        page.init(Some(5));

        assert_eq!(page.num_records(), 0);
        assert_eq!(page.next_free_page_no(), Some(5));
        assert!(!page.is_full());
        assert_eq!(page.view().first_free_slot(), Some(0));
        assert_eq!(page.view().next_occupied_slot(None), None);
    }

    #[test]
    fn test_record_page_occupy_vacate() {
        let mut data = [0u8; PAGE_SIZE];
        let mut page = RecordPage::new(&mut data, &layout());
        page.init(None);

        let record = vec![7u8; 1000];
        for slot_no in 0..4 {
            page.occupy(slot_no, &record);
        }
        assert!(page.is_full());
        assert_eq!(page.view().first_free_slot(), None);

        page.vacate(1);
        assert_eq!(page.num_records(), 3);
        assert_eq!(bitmap::count_ones(page.view().bitmap(), 4), 3);
        assert_eq!(page.view().first_free_slot(), Some(1));
        assert!(!page.view().is_occupied(1));

        let view = RecordPageRef::new(&data, &layout());
        assert_eq!(view.next_occupied_slot(Some(0)), Some(2));
        assert_eq!(view.slot(3), &record[..]);
        assert_eq!(view.next_free_page_no(), None);
    }
}
