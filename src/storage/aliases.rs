use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{AliasEntry, AliasRecord, ResourceId};
use super::tables::*;

impl Database {
    // ========================================================================
    // Canonical alias field
    // ========================================================================

    /// Store the alias field of a page. An empty value removes the field.
    /// Returns `false` when the page does not exist.
    pub fn set_alias(&self, id: ResourceId, alias_path: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let page_exists = {
            let table = write_txn.open_table(PAGES)?;
            let exists = table.get(id.0)?.is_some();
            exists
        };
        if !page_exists {
            write_txn.abort()?;
            return Ok(false);
        }

        if alias_path.is_empty() {
            let mut table = write_txn.open_table(PAGE_ALIASES)?;
            table.remove(id.0)?;
        } else {
            let existing_seq = {
                let table = write_txn.open_table(PAGE_ALIASES)?;
                let result = match table.get(id.0)? {
                    Some(data) => Some(rmp_serde::from_slice::<AliasRecord>(data.value())?.seq),
                    None => None,
                };
                result
            };
            let seq = match existing_seq {
                Some(seq) => seq,
                None => Self::next_counter(&write_txn, ALIAS_SEQ_COUNTER)?,
            };

            let record = AliasRecord {
                alias_path: alias_path.to_string(),
                seq,
                updated_at: chrono::Utc::now(),
            };
            let data = rmp_serde::to_vec_named(&record)?;
            let mut table = write_txn.open_table(PAGE_ALIASES)?;
            table.insert(id.0, data.as_slice())?;
        }

        write_txn.commit()?;
        Ok(true)
    }

    /// Get the alias field of a page
    pub fn get_alias(&self, id: ResourceId) -> Result<Option<AliasRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(PAGE_ALIASES)?;

        match table.get(id.0)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// All alias entries in registration order. Empty values are skipped.
    pub fn list_aliases(&self) -> Result<Vec<AliasEntry>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(PAGE_ALIASES)?;

        let mut records: Vec<(u64, AliasEntry)> = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            let record: AliasRecord = rmp_serde::from_slice(value.value())?;
            let entry = AliasEntry::new(ResourceId(key.value()), record.alias_path);
            if entry.is_active() {
                records.push((record.seq, entry));
            }
        }
        records.sort_by_key(|(seq, _)| *seq);

        Ok(records.into_iter().map(|(_, entry)| entry).collect())
    }
}
