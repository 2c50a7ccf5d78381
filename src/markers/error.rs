use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MarkerError {
    #[error("Expected 3 components in the timestamp '{0}'")]
    TimestampComponents(String),

    #[error("Invalid component '{component}' in timestamp '{timestamp}'")]
    TimestampComponent {
        timestamp: String,
        component: String,
    },

    #[error("Timestamp '{0}' is too large")]
    TimestampOverflow(String),

    #[error("Marker record {record} must have at least one field")]
    EmptyRecord { record: u64 },

    #[error("Marker record {record} has an invalid timestamp '{value}'")]
    InvalidTimestamp { record: u64, value: String },

    #[error("Out of chunk ignored marker at {timestamp}")]
    OutOfChunkIgnore { timestamp: i64 },

    #[error(
        "Unclosed chunk starting at {start} detected. Make sure there is an even amount of not ignored markers"
    )]
    UnclosedChunk { start: i64 },

    #[error("Marker {timestamp} in {chunk} lies before the chunk start {start}")]
    NegativeSpan {
        chunk: String,
        start: i64,
        timestamp: i64,
    },

    #[error("Total duration overflows after {chunk}")]
    DurationOverflow { chunk: String },
}
