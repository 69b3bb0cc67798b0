//! Main sync server.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{HandlerContext, RequestHandler};
use schedsync_protocol::{ReadResponse, RequestId, SyncMessage, WriteRequest, WriteResponse};
use schedsync_storage::RowStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// The sync server.
///
/// This server backs a scheduler widget: reads return every collection, and
/// writes apply a multi-collection change set, answering with the persistent
/// identifiers of the rows it created.
///
/// # Example
///
/// ```
/// use schedsync_server::{ServerConfig, SyncServer};
/// use schedsync_storage::InMemoryRowStore;
/// use std::sync::Arc;
///
/// let store = Arc::new(InMemoryRowStore::new().with_table("events", ["name"]));
/// let server = SyncServer::new(ServerConfig::default(), store).unwrap();
///
/// // In a real application, an HTTP endpoint would call
/// // server.handle_read() and server.handle_write_json().
/// ```
pub struct SyncServer<S: ?Sized> {
    handler: RequestHandler<S>,
    context: Arc<HandlerContext<S>>,
}

impl<S: RowStore + ?Sized> SyncServer<S> {
    /// Creates a new sync server over `store`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::DependencyCycle`] if the configured references
    /// form a cycle.
    pub fn new(config: ServerConfig, store: Arc<S>) -> ServerResult<Self> {
        let context = Arc::new(HandlerContext::new(config, store)?);
        let handler = RequestHandler::new(Arc::clone(&context));
        Ok(Self { handler, context })
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        self.context.config()
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<S> {
        self.context.orchestrator.store()
    }

    /// Handles a read request.
    pub async fn handle_read(&self) -> ReadResponse {
        self.handler.handle_read().await
    }

    /// Handles a write request.
    pub async fn handle_write(&self, request: WriteRequest) -> WriteResponse {
        self.handler.handle_write(request).await
    }

    /// Handles a sync message (dispatches to the appropriate handler).
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidRequest`] for response messages.
    pub async fn handle_message(&self, message: SyncMessage) -> ServerResult<SyncMessage> {
        match message {
            SyncMessage::ReadRequest => Ok(SyncMessage::ReadResponse(self.handle_read().await)),
            SyncMessage::WriteRequest(request) => {
                Ok(SyncMessage::WriteResponse(self.handle_write(request).await))
            }
            _ => Err(ServerError::InvalidRequest("unexpected message type".into())),
        }
    }

    /// Handles a JSON write body and returns the JSON response.
    ///
    /// A body that cannot be decoded is answered with a failure envelope.
    /// Its `requestId` is echoed when the body is a JSON object with a
    /// readable `requestId`, and is null otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error only if the response cannot be encoded.
    pub async fn handle_write_json(&self, body: &str) -> ServerResult<String> {
        let response = match WriteRequest::decode(body) {
            Ok(request) => self.handle_write(request).await,
            Err(e) => {
                warn!(error = %e, "undecodable write request");
                WriteResponse::failure(salvage_request_id(body), e.to_string())
            }
        };
        Ok(response.encode()?)
    }

    /// Handles a read and returns the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error only if the response cannot be encoded.
    pub async fn handle_read_json(&self) -> ServerResult<String> {
        Ok(self.handle_read().await.encode()?)
    }

    /// Drops the cached schema of `table`.
    pub fn invalidate_schema(&self, table: &str) {
        self.context.orchestrator.schemas().invalidate(table);
    }

    /// Drops every cached schema.
    pub fn clear_schema_cache(&self) {
        self.context.orchestrator.schemas().clear();
    }
}

/// Reads `requestId` from a body that failed to decode as a write request.
fn salvage_request_id(body: &str) -> Option<RequestId> {
    let mut value: Value = serde_json::from_str(body).ok()?;
    let id = value.get_mut("requestId")?.take();
    serde_json::from_value(id).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchemaCacheMode;
    use schedsync_protocol::{Collection, Delta, Record};
    use schedsync_storage::InMemoryRowStore;
    use serde_json::{json, Value};

    fn server(config: ServerConfig) -> SyncServer<InMemoryRowStore> {
        let store = InMemoryRowStore::new()
            .with_table("resources", ["name"])
            .with_table("events", ["name"])
            .with_table("assignments", ["eventId", "resourceId"])
            .with_table("dependencies", ["from", "to"])
            .with_table("calendars", ["name"]);
        SyncServer::new(config, Arc::new(store)).unwrap()
    }

    #[tokio::test]
    async fn message_dispatch() {
        let server = server(ServerConfig::default());

        let response = server.handle_message(SyncMessage::ReadRequest).await.unwrap();
        assert!(matches!(response, SyncMessage::ReadResponse(r) if r.success));

        let unexpected = SyncMessage::ReadResponse(ReadResponse::success());
        assert!(server.handle_message(unexpected).await.is_err());
    }

    #[tokio::test]
    async fn undecodable_body_gets_null_request_id() {
        let server = server(ServerConfig::default());
        let body = server.handle_write_json("{ not json").await.unwrap();

        let response: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(response["requestId"], Value::Null);
        assert_eq!(response["success"], json!(false));
        assert!(response["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[test]
    fn request_id_is_salvaged_from_bad_entries() {
        let body = r#"{"requestId":77,"events":{"removed":[{"id":null}]}}"#;
        assert_eq!(salvage_request_id(body), Some(RequestId::Number(77)));
        assert_eq!(salvage_request_id(r#"{"requestId":"w-1","events":3}"#), Some("w-1".into()));
        assert_eq!(salvage_request_id(r#"{"requestId":[1]}"#), None);
        assert_eq!(salvage_request_id("[1, 2]"), None);
        assert_eq!(salvage_request_id("{ not json"), None);
    }

    #[tokio::test]
    async fn type_key_is_ignored() {
        let server = server(ServerConfig::default());
        let body = json!({
            "type": "sync",
            "requestId": 5,
            "calendars": { "added": [{ "$PhantomId": "_g1", "name": "Day" }] },
        });
        let out = server.handle_write_json(&body.to_string()).await.unwrap();

        let response = WriteResponse::decode(&out).unwrap();
        assert!(response.success);
        assert_eq!(response.request_id, Some(5_i64.into()));
        assert_eq!(response.rows(Collection::Calendars).map(<[_]>::len), Some(1));
    }

    #[tokio::test]
    async fn process_cache_survives_until_invalidated() {
        let server = server(ServerConfig::new().with_schema_cache(SchemaCacheMode::Process));
        let add = |name: &str| {
            let record: Record =
                serde_json::from_value(json!({ "$PhantomId": name, "name": name })).unwrap();
            WriteRequest::new(name).with_delta(
                Collection::Events,
                Delta {
                    added: vec![record],
                    ..Delta::default()
                },
            )
        };

        assert!(server.handle_write(add("_a")).await.success);
        assert_eq!(server.context.orchestrator.schemas().len(), 1);
        server.invalidate_schema("events");
        assert!(server.context.orchestrator.schemas().is_empty());
        assert!(server.handle_write(add("_b")).await.success);
        server.clear_schema_cache();
        assert!(server.context.orchestrator.schemas().is_empty());
    }
}
