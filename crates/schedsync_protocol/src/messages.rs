//! Protocol messages for sync.

use crate::collection::Collection;
use crate::delta::Delta;
use crate::error::ProtocolResult;
use crate::record::{Record, RowId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A sync protocol message.
#[derive(Debug, Clone)]
pub enum SyncMessage {
    /// Load every collection.
    ReadRequest,
    /// Rows of every collection.
    ReadResponse(ReadResponse),
    /// Push a multi-collection change set.
    WriteRequest(WriteRequest),
    /// Outcome of a change set.
    WriteResponse(WriteResponse),
}

impl SyncMessage {
    /// Returns true for client-to-server messages.
    pub fn is_request(&self) -> bool {
        matches!(self, SyncMessage::ReadRequest | SyncMessage::WriteRequest(_))
    }
}

/// Client correlation key for a write request, echoed in the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request id.
    Number(i64),
    /// Text request id.
    Text(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        RequestId::Text(id.to_owned())
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Number(id)
    }
}

/// A change set pushed by the client.
///
/// Any subset of the collections may be present. Unknown top-level keys are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRequest {
    /// Client correlation key.
    #[serde(default)]
    pub request_id: Option<RequestId>,
    /// Changes to resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Delta>,
    /// Changes to events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Delta>,
    /// Changes to assignments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignments: Option<Delta>,
    /// Changes to dependencies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Delta>,
    /// Changes to calendars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendars: Option<Delta>,
}

impl WriteRequest {
    /// Creates an empty request.
    pub fn new(request_id: impl Into<RequestId>) -> Self {
        Self {
            request_id: Some(request_id.into()),
            ..Self::default()
        }
    }

    /// Sets the delta of `collection`.
    pub fn with_delta(mut self, collection: Collection, delta: Delta) -> Self {
        *self.slot(collection) = Some(delta);
        self
    }

    fn slot(&mut self, collection: Collection) -> &mut Option<Delta> {
        match collection {
            Collection::Resources => &mut self.resources,
            Collection::Events => &mut self.events,
            Collection::Assignments => &mut self.assignments,
            Collection::Dependencies => &mut self.dependencies,
            Collection::Calendars => &mut self.calendars,
        }
    }

    /// Returns the delta of `collection`, if present.
    pub fn delta(&self, collection: Collection) -> Option<&Delta> {
        match collection {
            Collection::Resources => self.resources.as_ref(),
            Collection::Events => self.events.as_ref(),
            Collection::Assignments => self.assignments.as_ref(),
            Collection::Dependencies => self.dependencies.as_ref(),
            Collection::Calendars => self.calendars.as_ref(),
        }
    }

    /// Removes and returns the delta of `collection`.
    pub fn take_delta(&mut self, collection: Collection) -> Option<Delta> {
        self.slot(collection).take()
    }

    /// Returns the collections present in the request, in canonical order.
    pub fn collections(&self) -> Vec<Collection> {
        Collection::ALL
            .into_iter()
            .filter(|c| self.delta(*c).is_some())
            .collect()
    }

    /// Decodes a request from JSON.
    pub fn decode(json: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encodes the request to JSON.
    pub fn encode(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Links a record created in this request to its persistent identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRow {
    /// Phantom identifier the client sent.
    pub phantom_id: String,
    /// Persistent identifier the server assigned.
    pub id: RowId,
}

impl CreatedRow {
    /// Pairs a phantom identifier with its persistent identifier.
    pub fn new(phantom_id: impl Into<String>, id: RowId) -> Self {
        Self {
            phantom_id: phantom_id.into(),
            id,
        }
    }
}

/// A `{ rows: [...] }` wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowsPayload<T> {
    /// The rows.
    pub rows: Vec<T>,
}

impl<T> RowsPayload<T> {
    /// Wraps `rows`.
    pub fn new(rows: Vec<T>) -> Self {
        Self { rows }
    }
}

/// Outcome of a write request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResponse {
    /// The request id echoed back.
    pub request_id: Option<RequestId>,
    /// Whether the change set was applied.
    pub success: bool,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Created resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<RowsPayload<CreatedRow>>,
    /// Created events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<RowsPayload<CreatedRow>>,
    /// Created assignments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignments: Option<RowsPayload<CreatedRow>>,
    /// Created dependencies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<RowsPayload<CreatedRow>>,
    /// Created calendars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendars: Option<RowsPayload<CreatedRow>>,
}

impl WriteResponse {
    /// Creates a successful response with no created rows.
    pub fn success(request_id: Option<RequestId>) -> Self {
        Self {
            request_id,
            success: true,
            message: None,
            resources: None,
            events: None,
            assignments: None,
            dependencies: None,
            calendars: None,
        }
    }

    /// Creates a failed response.
    pub fn failure(request_id: Option<RequestId>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Self::success(request_id)
        }
    }

    /// Reports the rows created in `collection`.
    pub fn with_rows(mut self, collection: Collection, rows: Vec<CreatedRow>) -> Self {
        let payload = Some(RowsPayload::new(rows));
        match collection {
            Collection::Resources => self.resources = payload,
            Collection::Events => self.events = payload,
            Collection::Assignments => self.assignments = payload,
            Collection::Dependencies => self.dependencies = payload,
            Collection::Calendars => self.calendars = payload,
        }
        self
    }

    /// Returns the rows created in `collection`, if any were reported.
    pub fn rows(&self, collection: Collection) -> Option<&[CreatedRow]> {
        let payload = match collection {
            Collection::Resources => self.resources.as_ref(),
            Collection::Events => self.events.as_ref(),
            Collection::Assignments => self.assignments.as_ref(),
            Collection::Dependencies => self.dependencies.as_ref(),
            Collection::Calendars => self.calendars.as_ref(),
        };
        payload.map(|p| p.rows.as_slice())
    }

    /// Decodes a response from JSON.
    pub fn decode(json: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encodes the response to JSON.
    pub fn encode(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Rows of every collection, or a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResponse {
    /// Whether the rows could be loaded.
    pub success: bool,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Resource rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<RowsPayload<Record>>,
    /// Event rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<RowsPayload<Record>>,
    /// Assignment rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignments: Option<RowsPayload<Record>>,
    /// Dependency rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<RowsPayload<Record>>,
    /// Calendar rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendars: Option<RowsPayload<Record>>,
}

impl ReadResponse {
    /// Creates a successful response; every collection starts with no rows.
    pub fn success() -> Self {
        let empty = || Some(RowsPayload::new(Vec::new()));
        Self {
            success: true,
            message: None,
            resources: empty(),
            events: empty(),
            assignments: empty(),
            dependencies: empty(),
            calendars: empty(),
        }
    }

    /// Creates a failed response without row data.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            resources: None,
            events: None,
            assignments: None,
            dependencies: None,
            calendars: None,
        }
    }

    /// Sets the rows of `collection`.
    pub fn with_rows(mut self, collection: Collection, rows: Vec<Record>) -> Self {
        let payload = Some(RowsPayload::new(rows));
        match collection {
            Collection::Resources => self.resources = payload,
            Collection::Events => self.events = payload,
            Collection::Assignments => self.assignments = payload,
            Collection::Dependencies => self.dependencies = payload,
            Collection::Calendars => self.calendars = payload,
        }
        self
    }

    /// Returns the rows of `collection`.
    pub fn rows(&self, collection: Collection) -> Option<&[Record]> {
        let payload = match collection {
            Collection::Resources => self.resources.as_ref(),
            Collection::Events => self.events.as_ref(),
            Collection::Assignments => self.assignments.as_ref(),
            Collection::Dependencies => self.dependencies.as_ref(),
            Collection::Calendars => self.calendars.as_ref(),
        };
        payload.map(|p| p.rows.as_slice())
    }

    /// Encodes the response to JSON.
    pub fn encode(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
