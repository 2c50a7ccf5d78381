use serde::Serialize;

use super::chunk::Chunk;
use super::error::MarkerError;
use super::timestamp::encode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    Ignored,
    Cut,
}

impl HighlightKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HighlightKind::Ignored => "ignored",
            HighlightKind::Cut => "cut",
        }
    }
}

/// A point on the timeline of the concatenated output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub timestamp: String,
    pub kind: HighlightKind,
}

impl Highlight {
    fn new(secs: u64, kind: HighlightKind) -> Self {
        Self {
            timestamp: encode(secs),
            kind,
        }
    }
}

/// Walk the chunks in output order. Each chunk contributes its ignore markers
/// (as offsets into the final video) followed by a cut at its end.
pub fn highlight_chunks(chunks: &[Chunk]) -> Result<Vec<Highlight>, MarkerError> {
    let mut secs = 0u64;
    let mut highlights = Vec::new();

    for chunk in chunks {
        for &ignored in &chunk.ignored {
            let at = advance(secs, chunk.offset_of(ignored)?, chunk)?;
            highlights.push(Highlight::new(at, HighlightKind::Ignored));
        }

        secs = advance(secs, chunk.duration()?, chunk)?;
        highlights.push(Highlight::new(secs, HighlightKind::Cut));
    }

    Ok(highlights)
}

/// Summed duration of all chunks, i.e. the length of the concatenated output.
pub fn total_duration(chunks: &[Chunk]) -> Result<u64, MarkerError> {
    chunks
        .iter()
        .try_fold(0u64, |acc, chunk| advance(acc, chunk.duration()?, chunk))
}

fn advance(secs: u64, by: u64, chunk: &Chunk) -> Result<u64, MarkerError> {
    secs.checked_add(by)
        .ok_or_else(|| MarkerError::DurationOverflow {
            chunk: chunk.name.clone(),
        })
}
