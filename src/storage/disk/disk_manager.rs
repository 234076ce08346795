use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use log::debug;
use parking_lot::Mutex;

use crate::common::{FileId, PageId, Result, TesseraError, PAGE_SIZE};

/// One file opened through the disk manager
struct OpenFile {
    file: File,
    path: PathBuf,
    num_pages: u32,
}

/// DiskManager reads and writes fixed-size pages of the files it has opened.
/// Each open file gets a `FileId`; pages are addressed by `(FileId, page_no)`.
pub struct DiskManager {
    /// Open files by id
    files: Mutex<HashMap<FileId, OpenFile>>,
    /// Next file id to hand out
    next_file_id: AtomicU32,
    /// Number of page reads performed
    num_reads: AtomicU32,
    /// Number of page writes performed
    num_writes: AtomicU32,
}

impl DiskManager {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            next_file_id: AtomicU32::new(0),
            num_reads: AtomicU32::new(0),
            num_writes: AtomicU32::new(0),
        }
    }

    /// Returns true if a regular file exists at the path.
    pub fn is_file<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    /// Creates an empty file. Fails if the file already exists.
    pub fn create_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if Self::is_file(path) {
            return Err(TesseraError::FileExists(path.display().to_string()));
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        debug!("Created file {}", path.display());
        Ok(())
    }

    /// Removes a file from disk. The file must not be open.
    pub fn destroy_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let is_open = self.files.lock().values().any(|f| f.path == path);
        if is_open {
            return Err(TesseraError::Internal(format!(
                "cannot destroy open file {}",
                path.display()
            )));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    /// Opens an existing file and returns its id.
    /// Opening an already open path returns the id it was given before.
    pub fn open_file<P: AsRef<Path>>(&self, path: P) -> Result<FileId> {
        let path = path.as_ref();
        let mut files = self.files.lock();
        if let Some((&id, _)) = files.iter().find(|(_, f)| f.path == path) {
            return Ok(id);
        }

        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let num_pages = (file.metadata()?.len() / PAGE_SIZE as u64) as u32;
        let file_id = FileId::new(self.next_file_id.fetch_add(1, Ordering::SeqCst));

        files.insert(
            file_id,
            OpenFile {
                file,
                path: path.to_path_buf(),
                num_pages,
            },
        );
        debug!("Opened {} as {} ({} pages)", path.display(), file_id, num_pages);
        Ok(file_id)
    }

    /// Closes a file, syncing it to disk first.
    pub fn close_file(&self, file_id: FileId) -> Result<()> {
        let open = self
            .files
            .lock()
            .remove(&file_id)
            .ok_or(TesseraError::FileNotOpen(file_id))?;
        open.file.sync_all()?;
        Ok(())
    }

    /// Reads a page from disk into the provided buffer.
    /// Reading past the end of the file yields zeros.
    pub fn read_page(&self, page_id: PageId, data: &mut [u8]) -> Result<()> {
        assert_eq!(data.len(), PAGE_SIZE, "Buffer must be PAGE_SIZE bytes");

        let mut files = self.files.lock();
        let open = files
            .get_mut(&page_id.file_id)
            .ok_or(TesseraError::FileNotOpen(page_id.file_id))?;

        let offset = (page_id.page_no as u64) * (PAGE_SIZE as u64);
        open.file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < PAGE_SIZE {
            let n = open.file.read(&mut data[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        data[filled..].fill(0);

        self.num_reads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Writes a page to disk from the provided buffer.
    pub fn write_page(&self, page_id: PageId, data: &[u8]) -> Result<()> {
        assert_eq!(data.len(), PAGE_SIZE, "Buffer must be PAGE_SIZE bytes");

        let mut files = self.files.lock();
        let open = files
            .get_mut(&page_id.file_id)
            .ok_or(TesseraError::FileNotOpen(page_id.file_id))?;

        let offset = (page_id.page_no as u64) * (PAGE_SIZE as u64);
        open.file.seek(SeekFrom::Start(offset))?;
        open.file.write_all(data)?;
        open.file.flush()?;
        if page_id.page_no >= open.num_pages {
            open.num_pages = page_id.page_no + 1;
        }

        self.num_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Allocates the next page of a file, extending it with a zeroed page.
    pub fn allocate_page(&self, file_id: FileId) -> Result<PageId> {
        let mut files = self.files.lock();
        let open = files
            .get_mut(&file_id)
            .ok_or(TesseraError::FileNotOpen(file_id))?;

        let page_no = open.num_pages;
        open.file.set_len((page_no as u64 + 1) * PAGE_SIZE as u64)?;
        open.num_pages += 1;

        Ok(PageId::new(file_id, page_no))
    }

    /// Moves the allocation point of a file: the next [`allocate_page`] returns
    /// page `num_pages` and cuts off anything stored past it.
    ///
    /// [`allocate_page`]: Self::allocate_page
    pub fn set_num_pages(&self, file_id: FileId, num_pages: u32) -> Result<()> {
        let mut files = self.files.lock();
        let open = files
            .get_mut(&file_id)
            .ok_or(TesseraError::FileNotOpen(file_id))?;
        open.num_pages = num_pages;
        Ok(())
    }

    /// Returns the number of pages currently in a file.
    pub fn num_pages(&self, file_id: FileId) -> Result<u32> {
        self.files
            .lock()
            .get(&file_id)
            .map(|f| f.num_pages)
            .ok_or(TesseraError::FileNotOpen(file_id))
    }

    /// Returns the path a file was opened from.
    pub fn file_path(&self, file_id: FileId) -> Result<PathBuf> {
        self.files
            .lock()
            .get(&file_id)
            .map(|f| f.path.clone())
            .ok_or(TesseraError::FileNotOpen(file_id))
    }

    pub fn get_num_reads(&self) -> u32 {
        self.num_reads.load(Ordering::Relaxed)
    }

    pub fn get_num_writes(&self) -> u32 {
        self.num_writes.load(Ordering::Relaxed)
    }
}

impl Default for DiskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DiskManager {
    fn drop(&mut self) {
        for open in self.files.get_mut().values() {
            let _ = open.file.sync_all();
        }
    }
}
