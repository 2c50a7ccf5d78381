use serde::Serialize;

use super::error::MarkerError;

/// A closed interval of the recording between two regular markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub start: i64,
    pub end: i64,
    /// Ignore markers seen while the chunk was open, in input order. They are
    /// call-outs only and do not shorten the chunk.
    pub ignored: Vec<i64>,
    pub name: String,
}

impl Chunk {
    pub fn name_for_index(index: usize) -> String {
        format!("chunk-{index:02}")
    }

    /// Seconds from the chunk start to `timestamp`.
    pub fn offset_of(&self, timestamp: i64) -> Result<u64, MarkerError> {
        timestamp
            .checked_sub(self.start)
            .and_then(|delta| u64::try_from(delta).ok())
            .ok_or_else(|| MarkerError::NegativeSpan {
                chunk: self.name.clone(),
                start: self.start,
                timestamp,
            })
    }

    pub fn duration(&self) -> Result<u64, MarkerError> {
        self.offset_of(self.end)
    }

    pub fn file_name(&self, extension: &str) -> String {
        if extension.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, extension.trim_start_matches('.'))
        }
    }
}
