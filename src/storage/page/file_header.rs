use bytes::{Buf, BufMut};

use crate::common::{Result, TesseraError, NO_PAGE, PAGE_SIZE};

const MAGIC_NUMBER: u32 = 0x5445_5353; // "TESS"
const VERSION: u32 = 1;

/// Encoded size of the file header: magic, version and six u32 fields
pub const FILE_HEADER_SIZE: usize = 4 * 8;

/// Size of the header at the start of every record page:
/// num_records (4) + next_free_page_no (4)
pub const PAGE_HEADER_SIZE: usize = 8;

/// Per-file metadata, stored at the start of page 0.
///
/// | Field                  | Offset | Size |
/// |------------------------|--------|------|
/// | magic                  | 0      | 4    |
/// | version                | 4      | 4    |
/// | record_size            | 8      | 4    |
/// | num_records_per_page   | 12     | 4    |
/// | bitmap_size            | 16     | 4    |
/// | num_pages              | 20     | 4    |
/// | first_free_page_no     | 24     | 4    |
/// | reserved               | 28     | 4    |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub record_size: u32,
    pub num_records_per_page: u32,
    pub bitmap_size: u32,
    /// Pages in the file, header page included
    pub num_pages: u32,
    /// Head of the free-page list
    pub first_free_page_no: Option<u32>,
}

impl FileHeader {
    /// Computes the page layout for records of `record_size` bytes.
    /// A file starts with only its header page.
    pub fn new(record_size: usize) -> Result<Self> {
        let per_page = Self::records_per_page(record_size);
        if record_size == 0 || per_page == 0 {
            return Err(TesseraError::InvalidHeapFile(format!(
                "record size {} does not fit in a page",
                record_size
            )));
        }

        Ok(Self {
            record_size: record_size as u32,
            num_records_per_page: per_page as u32,
            bitmap_size: per_page.div_ceil(8) as u32,
            num_pages: 1,
            first_free_page_no: None,
        })
    }

    /// Number of slots a page can hold: each slot costs `record_size` bytes
    /// plus one bitmap bit.
    pub fn records_per_page(record_size: usize) -> usize {
        if record_size == 0 {
            return 0;
        }
        8 * (PAGE_SIZE - PAGE_HEADER_SIZE) / (8 * record_size + 1)
    }

    pub fn encode(&self, data: &mut [u8]) {
        let mut buf = &mut data[..FILE_HEADER_SIZE];
        buf.put_u32_le(MAGIC_NUMBER);
        buf.put_u32_le(VERSION);
        buf.put_u32_le(self.record_size);
        buf.put_u32_le(self.num_records_per_page);
        buf.put_u32_le(self.bitmap_size);
        buf.put_u32_le(self.num_pages);
        buf.put_u32_le(self.first_free_page_no.unwrap_or(NO_PAGE));
        buf.put_u32_le(0);
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < FILE_HEADER_SIZE {
            return Err(TesseraError::InvalidHeapFile("header page too short".into()));
        }

        let mut buf = &data[..FILE_HEADER_SIZE];
        let magic = buf.get_u32_le();
        if magic != MAGIC_NUMBER {
            return Err(TesseraError::InvalidHeapFile(format!(
                "bad magic number {:#010x}",
                magic
            )));
        }
        let version = buf.get_u32_le();
        if version != VERSION {
            return Err(TesseraError::InvalidHeapFile(format!(
                "unsupported version {}",
                version
            )));
        }

        let header = Self {
            record_size: buf.get_u32_le(),
            num_records_per_page: buf.get_u32_le(),
            bitmap_size: buf.get_u32_le(),
            num_pages: buf.get_u32_le(),
            first_free_page_no: match buf.get_u32_le() {
                NO_PAGE => None,
                page_no => Some(page_no),
            },
        };

        let expected = Self::new(header.record_size as usize)?;
        if header.num_records_per_page != expected.num_records_per_page
            || header.bitmap_size != expected.bitmap_size
            || header.num_pages == 0
        {
            return Err(TesseraError::InvalidHeapFile(
                "inconsistent page layout".into(),
            ));
        }

        Ok(header)
    }

    /// Byte offset of the first slot within a record page.
    pub fn slots_offset(&self) -> usize {
        PAGE_HEADER_SIZE + self.bitmap_size as usize
    }
}
