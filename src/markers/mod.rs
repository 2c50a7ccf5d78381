//! Marker log parsing: timestamps, chunk building and the highlight report.

pub mod chunk;
pub mod error;
pub mod highlights;
pub mod parser;
pub mod timestamp;

pub use chunk::Chunk;
pub use error::MarkerError;
pub use highlights::{Highlight, highlight_chunks, total_duration};
pub use parser::load_chunks_from_file;
