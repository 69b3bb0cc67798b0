//! Write command implementation.

use super::{open_server, render};
use schedsync_server::ServerConfig;
use std::io::Read;
use std::path::Path;

/// Reads a request body from a file, or from stdin when `input` is `-`.
fn read_body(input: &Path) -> std::io::Result<String> {
    if input == Path::new("-") {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        Ok(body)
    } else {
        std::fs::read_to_string(input)
    }
}

/// Runs the write command: applies one change set and prints the response.
///
/// Returns an error after printing if the change set was not applied.
pub async fn run(
    path: &Path,
    input: &Path,
    config: ServerConfig,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let server = open_server(path, config)?;
    let body = read_body(input)?;

    let json = server.handle_write_json(&body).await?;
    println!("{}", render(&json, pretty)?);

    let response: serde_json::Value = serde_json::from_str(&json)?;
    if response["success"] != serde_json::Value::Bool(true) {
        return Err("change set was not applied".into());
    }
    Ok(())
}
