use redb::TableDefinition;

/// Place records: uuid -> Place (msgpack)
pub const PLACES: TableDefinition<&str, &[u8]> = TableDefinition::new("places");
