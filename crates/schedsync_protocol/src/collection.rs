//! The fixed vocabulary of the scheduler: collections and structured fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the record collections the scheduler client synchronizes.
///
/// The declaration order is the canonical order. It is used to break ties
/// when collections are ordered by their references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// People and machines that events are assigned to.
    Resources,
    /// Scheduled tasks.
    Events,
    /// Event-to-resource links.
    Assignments,
    /// Event-to-event ordering constraints.
    Dependencies,
    /// Working time calendars.
    Calendars,
}

impl Collection {
    /// All collections in canonical order.
    pub const ALL: [Collection; 5] = [
        Collection::Resources,
        Collection::Events,
        Collection::Assignments,
        Collection::Dependencies,
        Collection::Calendars,
    ];

    /// Returns the wire name of the collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Resources => "resources",
            Collection::Events => "events",
            Collection::Assignments => "assignments",
            Collection::Dependencies => "dependencies",
            Collection::Calendars => "calendars",
        }
    }

    /// Columns a freshly initialized scheduler table declares.
    pub fn default_fields(&self) -> &'static [&'static str] {
        match self {
            Collection::Resources => &["name", "calendar", "eventColor", "image"],
            Collection::Events => &[
                "name",
                "startDate",
                "endDate",
                "duration",
                "durationUnit",
                "allDay",
                "calendar",
                "eventColor",
                "iconCls",
                "recurrenceRule",
                "exceptionDates",
                "segments",
            ],
            Collection::Assignments => &["eventId", "resourceId", "units"],
            Collection::Dependencies => &["from", "to", "type", "lag", "lagUnit"],
            Collection::Calendars => &["name", "parentId", "intervals", "unspecifiedTimeIsWorking"],
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown collection: {s}"))
    }
}

/// A field whose logical value is nested but which the store keeps as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuredField {
    /// Calendar availability intervals.
    Intervals,
    /// Recurrence exception dates.
    ExceptionDates,
    /// Split event segments.
    Segments,
}

impl StructuredField {
    /// All structured fields.
    pub const ALL: [StructuredField; 3] = [
        StructuredField::Intervals,
        StructuredField::ExceptionDates,
        StructuredField::Segments,
    ];

    /// Returns the record key of the field.
    pub fn name(&self) -> &'static str {
        match self {
            StructuredField::Intervals => "intervals",
            StructuredField::ExceptionDates => "exceptionDates",
            StructuredField::Segments => "segments",
        }
    }

    /// Looks up a structured field by record key.
    pub fn from_name(name: &str) -> Option<Self> {
        StructuredField::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for StructuredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
