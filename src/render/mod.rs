pub mod ffmpeg;
mod logging;
pub mod manifest;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;

use crate::config::MarkutConfig;
use crate::error::UsageError;
use crate::markers::timestamp::encode;
use crate::markers::{Chunk, total_duration};
use crate::ui::prelude::Level;

use self::ffmpeg::{FfmpegRunOptions, FfmpegRunner, command_line, concat_args, cut_chunk_args};
use self::logging::{log_event, log_event_with};
use self::manifest::write_concat_list;

#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Recording the markers refer to
    pub input: PathBuf,
    /// Directory receiving chunk files, the concat list and the default output
    pub work_dir: PathBuf,
    /// Let ffmpeg replace existing files
    pub overwrite: bool,
    pub verbose: bool,
    /// Print ffmpeg command lines instead of running them
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalRenderReport {
    /// Chunks whose cut failed; they are still listed in the concat list
    pub failed: Vec<String>,
    pub manifest: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRenderReport {
    pub chunk: Chunk,
    pub output: PathBuf,
    /// Ignore markers as `HH:MM:SS` offsets from the chunk start
    pub ignored_offsets: Vec<String>,
}

/// Cuts chunks out of the input recording and joins them, one ffmpeg
/// invocation at a time.
pub struct ChunkRenderer<'a> {
    settings: &'a RenderSettings,
    config: &'a MarkutConfig,
    runner: &'a dyn FfmpegRunner,
}

impl<'a> ChunkRenderer<'a> {
    pub fn new(
        settings: &'a RenderSettings,
        config: &'a MarkutConfig,
        runner: &'a dyn FfmpegRunner,
    ) -> Self {
        Self {
            settings,
            config,
            runner,
        }
    }

    pub fn chunk_path(&self, chunk: &Chunk) -> PathBuf {
        self.settings
            .work_dir
            .join(chunk.file_name(&self.config.chunk_extension))
    }

    pub fn default_output_path(&self) -> PathBuf {
        self.settings.work_dir.join(&self.config.output_name)
    }

    fn manifest_path(&self) -> PathBuf {
        self.settings.work_dir.join(&self.config.manifest_name)
    }

    fn execute(&self, args: Vec<String>, options: FfmpegRunOptions) -> Result<()> {
        if self.settings.dry_run {
            let line = command_line(&self.config.ffmpeg_path, &args);
            log_event_with(
                Level::Info,
                "markut.render.dry_run",
                line,
                json!({ "program": self.config.ffmpeg_path, "args": args }),
            );
            return Ok(());
        }

        log_event(
            Level::Debug,
            "markut.render.ffmpeg",
            command_line(&self.config.ffmpeg_path, &args),
        );
        self.runner.run(&args, options)
    }

    fn cut(&self, chunk: &Chunk) -> Result<PathBuf> {
        let output = self.chunk_path(chunk);
        let args = cut_chunk_args(&self.settings.input, chunk, &output, self.settings.overwrite)?;
        let options = FfmpegRunOptions::new(
            format!("cutting {}", chunk.name),
            Some(chunk.duration()?),
            self.settings.verbose,
        );
        self.execute(args, options)?;
        Ok(output)
    }

    /// Cut every chunk, then concatenate them into `output`.
    ///
    /// A chunk that fails to cut is reported and skipped; the concat list
    /// still names it so the join fails loudly if the file is missing. A
    /// chunk with a negative span aborts before anything is cut.
    pub fn render_all(
        &self,
        chunks: &[Chunk],
        output: Option<&Path>,
    ) -> Result<FinalRenderReport> {
        let total = total_duration(chunks)?;
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_output_path());

        log_event(
            Level::Info,
            "markut.final.start",
            format!(
                "Cutting {} chunk(s) from {}",
                chunks.len(),
                self.settings.input.display()
            ),
        );

        let mut failed = Vec::new();
        for chunk in chunks {
            match self.cut(chunk) {
                Ok(path) => log_event(
                    Level::Debug,
                    "markut.final.cut",
                    format!("{} written to {}", chunk.name, path.display()),
                ),
                Err(err) => {
                    log_event_with(
                        Level::Warn,
                        "markut.final.cut_failed",
                        format!("WARNING: Failed to cut chunk {}: {err:#}", chunk.name),
                        json!({ "chunk": chunk, "error": format!("{err:#}") }),
                    );
                    failed.push(chunk.name.clone());
                }
            }
        }

        let manifest = self.manifest_path();
        if self.settings.dry_run {
            log_event(
                Level::Info,
                "markut.final.manifest_skipped",
                format!("Dry run: not writing {}", manifest.display()),
            );
        } else {
            write_concat_list(chunks, &self.config.chunk_extension, &manifest)?;
        }

        let args = concat_args(&manifest, &output, self.settings.overwrite);
        let options = FfmpegRunOptions::new("concatenating", Some(total), self.settings.verbose);
        self.execute(args, options)
            .with_context(|| format!("Failed to concatenate chunks into {}", output.display()))?;

        Ok(FinalRenderReport {
            failed,
            manifest,
            output,
        })
    }

    /// Cut the chunk at `index` only. Any failure is fatal here.
    pub fn render_one(&self, chunks: &[Chunk], index: usize) -> Result<ChunkRenderReport> {
        let chunk = chunks.get(index).ok_or(UsageError::ChunkOutOfRange {
            index,
            count: chunks.len(),
        })?;

        let ignored_offsets = chunk
            .ignored
            .iter()
            .map(|&t| chunk.offset_of(t).map(encode))
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .cut(chunk)
            .with_context(|| format!("Failed to cut chunk {}", chunk.name))?;

        Ok(ChunkRenderReport {
            chunk: chunk.clone(),
            output,
            ignored_offsets,
        })
    }
}
