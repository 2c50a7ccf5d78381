use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::json;

use crate::cli::{ChunkArgs, Commands, CutArgs, FinalArgs, InspectArgs};
use crate::config::MarkutConfig;
use crate::error::UsageError;
use crate::markers::timestamp::encode;
use crate::markers::{Chunk, Highlight, highlight_chunks, load_chunks_from_file, total_duration};
use crate::render::ffmpeg::SystemFfmpegRunner;
use crate::render::{ChunkRenderer, RenderSettings};
use crate::ui::prelude::{Level, emit};

pub fn handle_command(command: Commands, config: &MarkutConfig) -> Result<()> {
    match command {
        Commands::Final(args) => handle_final(args, config),
        Commands::Chunk(args) => handle_chunk(args, config),
        Commands::Inspect(args) => handle_inspect(args),
    }
}

fn require<'a>(
    value: &'a Option<PathBuf>,
    subcommand: &'static str,
    flag: &'static str,
) -> Result<&'a Path, UsageError> {
    value
        .as_deref()
        .filter(|path| !path.as_os_str().is_empty())
        .ok_or(UsageError::MissingFlag { subcommand, flag })
}

fn load_chunks(csv: &Path, delay: i64) -> Result<Vec<Chunk>> {
    let chunks = load_chunks_from_file(csv, delay)?;
    emit(
        Level::Debug,
        "markut.markers.loaded",
        &format!(
            "Loaded {} chunk(s) from {} with delay {}s",
            chunks.len(),
            csv.display(),
            delay
        ),
        None,
    );
    Ok(chunks)
}

fn render_settings(cut: &CutArgs, subcommand: &'static str) -> Result<RenderSettings> {
    let input = require(&cut.input, subcommand, "input")?;
    Ok(RenderSettings {
        input: input.to_path_buf(),
        work_dir: PathBuf::from("."),
        overwrite: cut.overwrite,
        verbose: cut.verbose,
        dry_run: cut.dry_run,
    })
}

fn print_highlights(highlights: &[Highlight]) {
    emit(Level::Info, "markut.highlights", "Highlights:", None);
    for highlight in highlights {
        emit(
            Level::Info,
            "markut.highlight",
            &format!("{} - {}", highlight.timestamp, highlight.kind.as_str()),
            Some(json!(highlight)),
        );
    }
}

pub fn handle_final(args: FinalArgs, config: &MarkutConfig) -> Result<()> {
    let csv = require(&args.markers.csv, "final", "csv")?;
    let settings = render_settings(&args.cut, "final")?;
    let chunks = load_chunks(csv, args.markers.delay)?;
    let highlights = highlight_chunks(&chunks)?;

    let runner = SystemFfmpegRunner::new(config.ffmpeg_path.clone());
    let renderer = ChunkRenderer::new(&settings, config, &runner);
    let report = renderer.render_all(&chunks, args.output.as_deref())?;

    if !report.failed.is_empty() {
        emit(
            Level::Warn,
            "markut.final.partial",
            &format!(
                "{} chunk(s) failed to cut: {}",
                report.failed.len(),
                report.failed.join(", ")
            ),
            None,
        );
    }
    if !settings.dry_run {
        emit(
            Level::Debug,
            "markut.final.manifest",
            &format!("Concat list written to {}", report.manifest.display()),
            None,
        );
        emit(
            Level::Success,
            "markut.final.done",
            &format!("{} is rendered!", report.output.display()),
            None,
        );
    }

    print_highlights(&highlights);
    Ok(())
}

pub fn handle_chunk(args: ChunkArgs, config: &MarkutConfig) -> Result<()> {
    let csv = require(&args.markers.csv, "chunk", "csv")?;
    let settings = render_settings(&args.cut, "chunk")?;
    let chunks = load_chunks(csv, args.markers.delay)?;

    let runner = SystemFfmpegRunner::new(config.ffmpeg_path.clone());
    let renderer = ChunkRenderer::new(&settings, config, &runner);
    let report = renderer.render_one(&chunks, args.index)?;

    if !settings.dry_run {
        emit(
            Level::Success,
            "markut.chunk.done",
            &format!("{} is rendered!", report.chunk.name),
            Some(json!({ "chunk": report.chunk, "output": report.output })),
        );
    }

    if !report.ignored_offsets.is_empty() {
        emit(Level::Info, "markut.chunk.ignored", "Ignored timestamps:", None);
        for offset in &report.ignored_offsets {
            emit(
                Level::Info,
                "markut.chunk.ignored_offset",
                &format!("  {offset}"),
                Some(json!({ "chunk": report.chunk.name, "offset": offset })),
            );
        }
    }

    Ok(())
}

pub fn handle_inspect(args: InspectArgs) -> Result<()> {
    let csv = require(&args.markers.csv, "inspect", "csv")?;
    let chunks = load_chunks(csv, args.markers.delay)?;
    let highlights = highlight_chunks(&chunks)?;
    let total = total_duration(&chunks)?;

    emit(
        Level::Info,
        "markut.inspect.summary",
        &format!(
            "Chunks: {}, output duration: {}",
            chunks.len(),
            encode(total)
        ),
        Some(json!({ "chunks": chunks.len(), "duration_seconds": total })),
    );

    print_highlights(&highlights);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_counts_as_missing() {
        let missing = UsageError::MissingFlag {
            subcommand: "final",
            flag: "csv",
        };
        assert_eq!(require(&None, "final", "csv"), Err(missing.clone()));
        assert_eq!(
            require(&Some(PathBuf::new()), "final", "csv"),
            Err(missing)
        );
        assert_eq!(
            require(&Some(PathBuf::from("m.csv")), "final", "csv"),
            Ok(Path::new("m.csv"))
        );
    }
}
