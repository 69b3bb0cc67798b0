//! Request handlers for the sync endpoint.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::orchestrator::ChangeSetOrchestrator;
use schedsync_protocol::{ReadResponse, WriteRequest, WriteResponse};
use schedsync_storage::RowStore;
use std::sync::Arc;
use tracing::warn;

/// Message returned to the client when a read fails.
pub const READ_FAILURE_MESSAGE: &str = "scheduler data could not be loaded";

/// Context shared by request handlers.
pub struct HandlerContext<S: ?Sized> {
    /// Change-set engine over the store.
    pub orchestrator: ChangeSetOrchestrator<S>,
}

impl<S: RowStore + ?Sized> HandlerContext<S> {
    /// Creates a handler context.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured references form a cycle.
    pub fn new(config: ServerConfig, store: Arc<S>) -> ServerResult<Self> {
        Ok(Self {
            orchestrator: ChangeSetOrchestrator::new(store, config)?,
        })
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        self.orchestrator.config()
    }
}

/// Handler for sync requests.
///
/// Handlers never fail: every outcome, including engine errors, becomes a
/// response envelope the client can read.
pub struct RequestHandler<S: ?Sized> {
    context: Arc<HandlerContext<S>>,
}

impl<S: RowStore + ?Sized> RequestHandler<S> {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext<S>>) -> Self {
        Self { context }
    }

    /// Handles a read: every collection, cleaned for the client.
    pub async fn handle_read(&self) -> ReadResponse {
        match self.context.orchestrator.read_all().await {
            Ok(tables) => tables
                .into_iter()
                .fold(ReadResponse::success(), |response, (collection, rows)| {
                    response.with_rows(collection, rows)
                }),
            Err(e) => {
                warn!(error = %e, "read failed");
                ReadResponse::failure(READ_FAILURE_MESSAGE)
            }
        }
    }

    /// Handles a write: applies the change set and reports created rows.
    pub async fn handle_write(&self, request: WriteRequest) -> WriteResponse {
        let request_id = request.request_id.clone();
        match self.context.orchestrator.apply(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    request_id = ?request_id,
                    client_error = e.is_client_error(),
                    error = %e,
                    "write failed"
                );
                WriteResponse::failure(request_id, e.to_string())
            }
        }
    }
}
