use async_trait::async_trait;
use thiserror::Error;

use crate::storage::models::{AliasEntry, ResourceId};
use crate::storage::{Database, DatabaseError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("{0}")]
    Unavailable(String),
}

/// The persisted side of the alias router: where alias fields live.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Every active alias, in registration order.
    async fn list_alias_entries(&self) -> Result<Vec<AliasEntry>, StoreError>;
    /// Write the alias field of a resource; an empty value clears it.
    /// Returns `false` when the resource does not exist.
    async fn set_alias_field(&self, id: ResourceId, value: &str) -> Result<bool, StoreError>;
    async fn get_alias_field(&self, id: ResourceId) -> Result<Option<String>, StoreError>;
}

#[async_trait]
impl ResourceStore for Database {
    async fn list_alias_entries(&self) -> Result<Vec<AliasEntry>, StoreError> {
        Ok(self.list_aliases()?)
    }

    async fn set_alias_field(&self, id: ResourceId, value: &str) -> Result<bool, StoreError> {
        Ok(self.set_alias(id, value)?)
    }

    async fn get_alias_field(&self, id: ResourceId) -> Result<Option<String>, StoreError> {
        Ok(self.get_alias(id)?.map(|record| record.alias_path))
    }
}
