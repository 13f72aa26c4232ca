use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{PageRecord, ResourceId};
use super::tables::*;

impl Database {
    // ========================================================================
    // Page operations
    // ========================================================================

    /// Create a page, allocating its id, and index its slug.
    /// Callers check slug uniqueness first; an existing slug entry is overwritten.
    pub fn create_page(
        &self,
        title: &str,
        slug: &str,
        body: &str,
    ) -> Result<PageRecord, DatabaseError> {
        debug_assert!(!slug.is_empty(), "page slug must not be empty");

        let write_txn = self.begin_write()?;
        let id = ResourceId(Self::next_counter(&write_txn, PAGE_ID_COUNTER)?);
        let now = chrono::Utc::now();
        let page = PageRecord {
            id,
            title: title.to_string(),
            slug: slug.to_string(),
            body: body.to_string(),
            created_at: now,
            updated_at: now,
        };
        {
            let mut table = write_txn.open_table(PAGES)?;
            let data = rmp_serde::to_vec_named(&page)?;
            table.insert(id.0, data.as_slice())?;

            let mut slug_table = write_txn.open_table(PAGE_SLUGS)?;
            slug_table.insert(page.slug.as_str(), id.0)?;
        }
        write_txn.commit()?;
        Ok(page)
    }

    /// Get a page by id
    pub fn get_page(&self, id: ResourceId) -> Result<Option<PageRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(PAGES)?;

        match table.get(id.0)? {
            Some(data) => {
                let page: PageRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(page))
            }
            None => Ok(None),
        }
    }

    /// Get a page by its slug (resolves slug -> id -> page)
    pub fn get_page_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let slug_table = read_txn.open_table(PAGE_SLUGS)?;

        let id = match slug_table.get(slug)? {
            Some(data) => data.value(),
            None => return Ok(None),
        };

        let pages_table = read_txn.open_table(PAGES)?;
        match pages_table.get(id)? {
            Some(data) => {
                let page: PageRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(page))
            }
            None => Ok(None),
        }
    }

    /// Update a page's mutable fields. Returns the updated record, or `None` if
    /// the page does not exist.
    pub fn update_page(
        &self,
        id: ResourceId,
        title: Option<&str>,
        slug: Option<&str>,
        body: Option<&str>,
    ) -> Result<Option<PageRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing = {
            let table = write_txn.open_table(PAGES)?;
            let result = match table.get(id.0)? {
                Some(data) => Some(rmp_serde::from_slice::<PageRecord>(data.value())?),
                None => None,
            };
            result
        };

        let updated = match existing {
            Some(mut page) => {
                if let Some(t) = title {
                    page.title = t.to_string();
                }
                if let Some(b) = body {
                    page.body = b.to_string();
                }
                if let Some(new_slug) = slug {
                    let mut slug_table = write_txn.open_table(PAGE_SLUGS)?;
                    slug_table.remove(page.slug.as_str())?;
                    page.slug = new_slug.to_string();
                    slug_table.insert(new_slug, id.0)?;
                }

                page.updated_at = chrono::Utc::now();

                let serialized = rmp_serde::to_vec_named(&page)?;
                let mut table = write_txn.open_table(PAGES)?;
                table.insert(id.0, serialized.as_slice())?;
                Some(page)
            }
            None => None,
        };

        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete a page along with its slug index entry and its alias field
    pub fn delete_page(&self, id: ResourceId) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let slug: Option<String> = {
            let table = write_txn.open_table(PAGES)?;
            let result = match table.get(id.0)? {
                Some(data) => Some(rmp_serde::from_slice::<PageRecord>(data.value())?.slug),
                None => None,
            };
            result
        };

        let deleted = match slug {
            Some(slug) => {
                {
                    let mut table = write_txn.open_table(PAGES)?;
                    table.remove(id.0)?;
                }
                {
                    let mut slug_table = write_txn.open_table(PAGE_SLUGS)?;
                    slug_table.remove(slug.as_str())?;
                }
                {
                    let mut alias_table = write_txn.open_table(PAGE_ALIASES)?;
                    alias_table.remove(id.0)?;
                }
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(deleted)
    }

    /// List all pages in id order
    pub fn list_pages(&self) -> Result<Vec<PageRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(PAGES)?;

        let mut pages = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let page: PageRecord = rmp_serde::from_slice(value.value())?;
            pages.push(page);
        }

        Ok(pages)
    }

    /// Check if a slug is already in use
    pub fn slug_exists(&self, slug: &str) -> Result<bool, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(PAGE_SLUGS)?;
        Ok(table.get(slug)?.is_some())
    }
}
