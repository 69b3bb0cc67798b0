//! Read command implementation.

use super::{open_server, render};
use schedsync_server::ServerConfig;
use std::path::Path;

/// Runs the read command: prints every collection as the client would see it.
pub async fn run(
    path: &Path,
    config: ServerConfig,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let server = open_server(path, config)?;
    let json = server.handle_read_json().await?;
    println!("{}", render(&json, pretty)?);
    Ok(())
}
