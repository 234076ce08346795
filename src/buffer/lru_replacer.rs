use parking_lot::Mutex;

use crate::common::FrameId;

/// Position of one frame in the recency list
#[derive(Debug, Clone, Copy, Default)]
struct Link {
    prev: Option<usize>,
    next: Option<usize>,
    linked: bool,
}

/// Doubly linked list threaded through a vector indexed by frame id.
/// Head holds the most recently unpinned frame, tail the least recently unpinned.
#[derive(Debug)]
struct RecencyList {
    links: Vec<Link>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl RecencyList {
    fn new(capacity: usize) -> Self {
        Self {
            links: vec![Link::default(); capacity],
            head: None,
            tail: None,
            len: 0,
        }
    }

    fn contains(&self, idx: usize) -> bool {
        self.links[idx].linked
    }

    fn push_front(&mut self, idx: usize) {
        self.links[idx] = Link {
            prev: None,
            next: self.head,
            linked: true,
        };
        match self.head {
            Some(old_head) => self.links[old_head].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
        self.len += 1;
    }

    fn unlink(&mut self, idx: usize) {
        let Link { prev, next, .. } = self.links[idx];
        match prev {
            Some(p) => self.links[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.links[n].prev = prev,
            None => self.tail = prev,
        }
        self.links[idx] = Link::default();
        self.len -= 1;
    }

    fn pop_back(&mut self) -> Option<usize> {
        let tail = self.tail?;
        self.unlink(tail);
        Some(tail)
    }
}

/// LRU Replacement Policy
///
/// Tracks the frames whose pin count has dropped to zero, ordered by the time
/// they were unpinned. The victim is always the least recently unpinned frame.
///
/// The replacer only records eviction order. It never drops a tracked frame on
/// its own; keeping the number of resident pages within the pool size is the
/// buffer pool's job. Frame ids at or beyond `max_frames` are ignored.
pub struct LruReplacer {
    /// Maximum number of frames the replacer can track
    max_frames: usize,
    /// Recency order of evictable frames
    list: Mutex<RecencyList>,
}

impl LruReplacer {
    /// Creates a new LRU replacer able to track `max_frames` frames.
    pub fn new(max_frames: usize) -> Self {
        Self {
            max_frames,
            list: Mutex::new(RecencyList::new(max_frames)),
        }
    }

    /// Removes and returns the least recently unpinned frame.
    /// Returns None if there are no evictable frames.
    pub fn victim(&self) -> Option<FrameId> {
        let mut list = self.list.lock();
        list.pop_back().map(|idx| FrameId::new(idx as u32))
    }

    /// Marks a frame as in use. It stops being an eviction candidate.
    pub fn pin(&self, frame_id: FrameId) {
        let idx = frame_id.as_usize();
        if idx >= self.max_frames {
            return;
        }

        let mut list = self.list.lock();
        if list.contains(idx) {
            list.unlink(idx);
        }
    }

    /// Marks a frame as evictable. A frame that is already tracked keeps its
    /// position, so repeated unpins leave a single entry.
    pub fn unpin(&self, frame_id: FrameId) {
        let idx = frame_id.as_usize();
        if idx >= self.max_frames {
            return;
        }

        let mut list = self.list.lock();
        if !list.contains(idx) {
            list.push_front(idx);
        }
    }

    /// Returns the number of evictable frames.
    pub fn size(&self) -> usize {
        self.list.lock().len
    }

    /// Returns the number of frames this replacer can track.
    pub fn capacity(&self) -> usize {
        self.max_frames
    }
}
