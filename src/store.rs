// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Record store — the only code that reads or writes the persisted collection.
//!
//! The whole collection lives under a single storage key as a JSON array and
//! is rewritten in full on every mutation. Reads always go back to storage, so
//! the persisted value stays the single source of truth.

use chrono::Local;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{SiteError, Result};
use crate::record::{login_timestamp, Record, RecordDraft, RecordPatch};
use crate::source;
use crate::storage::kv::{FileKv, KvStore};

pub struct RecordStore {
    kv: Box<dyn KvStore>,
    key: String,
}

impl RecordStore {
    pub fn new(kv: Box<dyn KvStore>, key: impl Into<String>) -> Self {
        Self { kv, key: key.into() }
    }

    /// Open a file-backed store from configuration. Records persisted before
    /// ids existed are re-keyed here, before any reader sees them.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let kv = FileKv::open(&config.dir)?;
        let mut store = Self::new(Box::new(kv), config.key.clone());
        store.assign_missing_ids()?;
        Ok(store)
    }

    /// Give every record with a nil id a fresh one and persist the result.
    /// Returns how many records were re-keyed.
    pub fn assign_missing_ids(&mut self) -> Result<usize> {
        let mut records = self.load();
        let mut assigned = 0usize;
        for r in records.iter_mut().filter(|r| r.id.is_nil()) {
            r.id = Uuid::new_v4();
            assigned += 1;
        }
        if assigned > 0 {
            self.save(&records)?;
            info!(key = self.key, assigned, "Assigned ids to legacy records");
        }
        Ok(assigned)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether a collection has been persisted yet.
    pub fn is_seeded(&self) -> Result<bool> {
        Ok(self.kv.get(&self.key)?.is_some())
    }

    /// Populate the store from CSV bytes. Skipped (returns `None`) when a
    /// collection is already persisted, unless `force` is set.
    pub fn seed(&mut self, csv: impl AsRef<[u8]>, force: bool) -> Result<Option<usize>> {
        if !force && self.is_seeded()? {
            info!(key = self.key, "Store already populated, skipping import");
            return Ok(None);
        }
        let records = source::parse(csv);
        self.save(&records)?;
        info!(key = self.key, records = records.len(), "Store populated from source");
        Ok(Some(records.len()))
    }

    /// Current persisted collection. A missing or unreadable value is an empty
    /// collection.
    pub fn load(&self) -> Vec<Record> {
        let raw = match self.kv.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = self.key, error = %e, "Cannot read stored collection, treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(key = self.key, error = %e, "Stored collection is corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    /// Replace the persisted collection with `records`.
    pub fn save(&mut self, records: &[Record]) -> Result<()> {
        let raw = serde_json::to_string(records)
            .map_err(|e| SiteError::Storage(format!("Cannot serialize collection: {e}")))?;
        self.kv.set(&self.key, &raw)
    }

    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: Uuid) -> Option<Record> {
        self.load().into_iter().find(|r| r.id == id)
    }

    /// Persisted records whose website name contains `term`, ignoring case.
    pub fn search(&self, term: &str) -> Vec<Record> {
        search(&self.load(), term)
    }

    /// Validate `draft` and append it as a new record.
    pub fn insert(&mut self, draft: RecordDraft) -> Result<Record> {
        draft.validate()?;
        let record = draft.into_record(Uuid::new_v4(), login_timestamp(Local::now()));

        let mut records = self.load();
        records.push(record.clone());
        self.save(&records)?;

        info!(id = %record.id, website = record.website_name, "Record inserted");
        Ok(record)
    }

    /// Merge `patch` into the record with `id` and refresh its login time.
    /// Returns `None` without writing when no such record exists.
    pub fn update(&mut self, id: Uuid, patch: RecordPatch) -> Result<Option<Record>> {
        let mut records = self.load();
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            warn!(%id, "Record not found for update");
            return Ok(None);
        };
        record.apply(patch, login_timestamp(Local::now()));
        let updated = record.clone();
        self.save(&records)?;

        info!(%id, website = updated.website_name, "Record updated");
        Ok(Some(updated))
    }

    /// Remove the record with `id`. Returns `false` without writing when no
    /// such record exists.
    pub fn delete(&mut self, id: Uuid) -> Result<bool> {
        let mut records = self.load();
        let Some(pos) = records.iter().position(|r| r.id == id) else {
            warn!(%id, "Record not found for delete");
            return Ok(false);
        };
        let removed = records.remove(pos);
        self.save(&records)?;

        info!(%id, website = removed.website_name, "Record deleted");
        Ok(true)
    }
}

/// Case-insensitive substring filter on `website_name`. Order is preserved;
/// an empty term keeps everything.
pub fn search(records: &[Record], term: &str) -> Vec<Record> {
    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|r| r.website_name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}
