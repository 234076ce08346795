use std::sync::Arc;

use crate::catalog::Catalog;
use crate::common::Transaction;

/// What every executor is handed at construction: the catalog to resolve
/// tables and indexes, and the transaction it runs under.
#[derive(Clone)]
pub struct ExecContext {
    catalog: Arc<Catalog>,
    txn: Transaction,
}

impl ExecContext {
    pub fn new(catalog: Arc<Catalog>, txn: Transaction) -> Self {
        Self { catalog, txn }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn txn(&self) -> &Transaction {
        &self.txn
    }
}
