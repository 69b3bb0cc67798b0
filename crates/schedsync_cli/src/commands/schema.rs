//! Schema command implementation.

use schedsync_protocol::Collection;
use schedsync_server::TableMap;
use schedsync_storage::{FileRowStore, RowStore};
use std::path::Path;

/// Runs the schema command: prints the columns of one or every collection's table.
pub async fn run(
    path: &Path,
    tables: &TableMap,
    collection: Option<Collection>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileRowStore::open(path)?;
    let collections = match collection {
        Some(c) => vec![c],
        None => Collection::ALL.to_vec(),
    };

    for collection in collections {
        let table = tables.table(collection);
        let fields = store.list_schema(table).await?;
        println!("{} ({})", collection, table);
        for field in fields {
            println!("  {}", field);
        }
    }
    Ok(())
}
