use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use super::chunk::Chunk;
use super::error::MarkerError;
use super::timestamp;

pub const IGNORE_FLAG: &str = "ignore";

/// One row of the marker log after the delay has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerRecord {
    pub timestamp: i64,
    pub ignore: bool,
}

impl MarkerRecord {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            ignore: false,
        }
    }

    pub fn ignored(timestamp: i64) -> Self {
        Self {
            timestamp,
            ignore: true,
        }
    }

    /// Build a record from raw fields. The first field is whole seconds or
    /// `HH:MM:SS`; a second field equal to `ignore` marks an ignore marker.
    /// Any further fields are ignored.
    pub fn from_fields(record: u64, fields: &[&str], delay: i64) -> Result<Self, MarkerError> {
        let raw = fields
            .first()
            .map(|field| field.trim())
            .ok_or(MarkerError::EmptyRecord { record })?;

        let invalid = || MarkerError::InvalidTimestamp {
            record,
            value: raw.to_string(),
        };

        let timestamp = if raw.contains(':') {
            let secs = timestamp::decode(raw).map_err(|_| invalid())?;
            i64::try_from(secs).map_err(|_| invalid())?
        } else {
            raw.parse::<i64>().map_err(|_| invalid())?
        };
        let timestamp = timestamp.checked_add(delay).ok_or_else(invalid)?;

        let ignore = fields
            .get(1)
            .is_some_and(|flag| flag.trim() == IGNORE_FLAG);

        Ok(if ignore {
            Self::ignored(timestamp)
        } else {
            Self::new(timestamp)
        })
    }
}

#[derive(Debug)]
struct OpenChunk {
    start: i64,
    ignored: Vec<i64>,
}

/// Two-state marker machine: idle while `open` is `None`, otherwise a chunk
/// is being built. Regular markers alternate between opening and closing a
/// chunk; ignore markers are only valid while one is open.
#[derive(Debug, Default)]
pub struct ChunkParser {
    chunks: Vec<Chunk>,
    open: Option<OpenChunk>,
}

impl ChunkParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: MarkerRecord) -> Result<(), MarkerError> {
        match (self.open.take(), record.ignore) {
            (None, true) => {
                return Err(MarkerError::OutOfChunkIgnore {
                    timestamp: record.timestamp,
                });
            }
            (None, false) => {
                self.open = Some(OpenChunk {
                    start: record.timestamp,
                    ignored: Vec::new(),
                });
            }
            (Some(mut open), true) => {
                open.ignored.push(record.timestamp);
                self.open = Some(open);
            }
            (Some(open), false) => {
                self.chunks.push(Chunk {
                    start: open.start,
                    end: record.timestamp,
                    ignored: open.ignored,
                    name: Chunk::name_for_index(self.chunks.len()),
                });
            }
        }
        Ok(())
    }

    pub fn finish(self) -> Result<Vec<Chunk>, MarkerError> {
        match self.open {
            Some(open) => Err(MarkerError::UnclosedChunk { start: open.start }),
            None => Ok(self.chunks),
        }
    }
}

pub fn parse_markers<I>(records: I) -> Result<Vec<Chunk>, MarkerError>
where
    I: IntoIterator<Item = MarkerRecord>,
{
    let mut parser = ChunkParser::new();
    for record in records {
        parser.push(record)?;
    }
    parser.finish()
}

/// Read comma separated marker rows. Rows may have differing field counts
/// and blank lines are skipped.
pub fn read_records<R: Read>(reader: R, delay: i64) -> Result<Vec<MarkerRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (idx, row) in csv_reader.records().enumerate() {
        let row = row.context("Failed to read marker record")?;
        let line = row
            .position()
            .map(|pos| pos.line())
            .unwrap_or(idx as u64 + 1);
        let fields: Vec<&str> = row.iter().collect();
        records.push(MarkerRecord::from_fields(line, &fields, delay)?);
    }

    Ok(records)
}

pub fn load_chunks_from_reader<R: Read>(reader: R, delay: i64) -> Result<Vec<Chunk>> {
    let records = read_records(reader, delay)?;
    Ok(parse_markers(records)?)
}

pub fn load_chunks_from_file(path: &Path, delay: i64) -> Result<Vec<Chunk>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open marker file {}", path.display()))?;
    load_chunks_from_reader(file, delay)
        .with_context(|| format!("Failed to load markers from {}", path.display()))
}
