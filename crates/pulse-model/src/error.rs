//! Payload validation errors

/// A provider record that cannot be merged into state.
///
/// Every variant is a "drop the record, keep the stream" condition.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// Event name outside the known schema
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// Body could not be decoded for the named event
    #[error("malformed {event} payload: {source}")]
    Malformed {
        /// Event or record name
        event: String,
        /// Decoder error
        #[source]
        source: serde_json::Error,
    },

    /// Required field present but empty
    #[error("{record} is missing required field `{field}`")]
    MissingField {
        /// Record kind
        record: &'static str,
        /// Field name
        field: &'static str,
    },

    /// Numeric field outside its domain
    #[error("{record}.{field} out of range: {value}")]
    OutOfRange {
        /// Record kind
        record: &'static str,
        /// Field name
        field: &'static str,
        /// Offending value
        value: f64,
    },
}

impl PayloadError {
    /// Wrap a decoder error for the named event
    #[inline]
    pub fn malformed(event: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Malformed {
            event: event.into(),
            source,
        }
    }
}
