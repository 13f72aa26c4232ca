use redb::TableDefinition;

/// Page records: page id -> PageRecord (msgpack)
pub const PAGES: TableDefinition<u64, &[u8]> = TableDefinition::new("pages");

/// Slug index: slug -> page id (default routing lookups)
pub const PAGE_SLUGS: TableDefinition<&str, u64> = TableDefinition::new("page_slugs");

/// Canonical alias field: page id -> AliasRecord (msgpack)
pub const PAGE_ALIASES: TableDefinition<u64, &[u8]> = TableDefinition::new("page_aliases");

/// Monotonic counters (next page id, next alias sequence)
pub const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

pub const PAGE_ID_COUNTER: &str = "page_id";
pub const ALIAS_SEQ_COUNTER: &str = "alias_seq";
