//! Init command implementation.

use schedsync_protocol::Collection;
use schedsync_server::TableMap;
use schedsync_storage::{FileRowStore, StoreSnapshot};
use std::path::Path;
use tracing::info;

/// Builds an empty scheduler snapshot with the default columns of each collection.
pub fn scheduler_snapshot(tables: &TableMap) -> StoreSnapshot {
    Collection::ALL
        .into_iter()
        .fold(StoreSnapshot::new(), |snapshot, collection| {
            snapshot.with_table(
                tables.table(collection),
                collection.default_fields().iter().copied(),
            )
        })
}

/// Runs the init command.
pub fn run(path: &Path, tables: &TableMap, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!("{:?} already exists (use --force to overwrite)", path).into());
    }

    let store = FileRowStore::create(path, scheduler_snapshot(tables))?;
    info!(path = %store.path().display(), "store initialized");

    println!("Initialized {}", path.display());
    for collection in Collection::ALL {
        println!("  {:<14} -> {}", collection.as_str(), tables.table(collection));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn snapshot_uses_table_map() {
        let tables = TableMap::new().with_table(Collection::Events, "65f0a1");
        let snapshot = scheduler_snapshot(&tables);
        assert!(snapshot.tables.contains_key("65f0a1"));
        assert!(snapshot.tables["calendars"].schema.contains("intervals"));
        assert_eq!(snapshot.tables.len(), 5);
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scheduler.json");
        run(&path, &TableMap::new(), false).unwrap();
        assert!(run(&path, &TableMap::new(), false).is_err());
        assert!(run(&path, &TableMap::new(), true).is_ok());
        assert!(FileRowStore::open(&path).is_ok());
    }
}
