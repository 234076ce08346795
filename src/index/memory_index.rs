use std::collections::BTreeMap;

use log::trace;
use parking_lot::Mutex;

use crate::common::{Result, Rid, TesseraError, Transaction};

use super::IndexHandle;

/// Unique in-memory index ordered by key bytes.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    entries: Mutex<BTreeMap<Vec<u8>, Rid>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl IndexHandle for MemoryIndex {
    fn insert_entry(&self, key: &[u8], rid: Rid, txn: &Transaction) -> Result<()> {
        let mut entries = self.entries.lock();
        if entries.contains_key(key) {
            return Err(TesseraError::DuplicateKey);
        }
        entries.insert(key.to_vec(), rid);
        trace!("txn {}: index insert {:?} -> {}", txn.id(), key, rid);
        Ok(())
    }

    fn delete_entry(&self, key: &[u8], txn: &Transaction) -> Result<bool> {
        let removed = self.entries.lock().remove(key).is_some();
        trace!("txn {}: index delete {:?} ({})", txn.id(), key, removed);
        Ok(removed)
    }

    fn get(&self, key: &[u8]) -> Result<Option<Rid>> {
        Ok(self.entries.lock().get(key).copied())
    }
}
