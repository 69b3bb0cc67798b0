//! CLI command implementations.

pub mod init;
pub mod read;
pub mod schema;
pub mod write;

use schedsync_server::{ServerConfig, SyncServer};
use schedsync_storage::FileRowStore;
use std::path::Path;
use std::sync::Arc;

/// Opens the snapshot at `path` behind a sync server.
pub fn open_server(
    path: &Path,
    config: ServerConfig,
) -> Result<SyncServer<FileRowStore>, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No store found at {:?} (run `schedsync init`)", path).into());
    }
    let store = FileRowStore::open(path)?;
    Ok(SyncServer::new(config, Arc::new(store))?)
}

/// Formats JSON text for output.
pub fn render(json: &str, pretty: bool) -> Result<String, Box<dyn std::error::Error>> {
    if !pretty {
        return Ok(json.to_owned());
    }
    let value: serde_json::Value = serde_json::from_str(json)?;
    Ok(serde_json::to_string_pretty(&value)?)
}
