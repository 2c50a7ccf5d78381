use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::markers::Chunk;

/// Write the concat demuxer list: one `file '<name>'` line per chunk, in
/// chunk order. Every chunk is listed whether or not it was cut.
pub fn write_concat_list(chunks: &[Chunk], extension: &str, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create concat list {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    write_entries(chunks, extension, &mut writer)
        .and_then(|_| writer.flush())
        .with_context(|| format!("Failed to write concat list {}", output_path.display()))
}

fn write_entries<W: Write>(chunks: &[Chunk], extension: &str, out: &mut W) -> std::io::Result<()> {
    for chunk in chunks {
        let name = chunk.file_name(extension).replace('\'', r"'\''");
        writeln!(out, "file '{}'", name)?;
    }
    Ok(())
}
