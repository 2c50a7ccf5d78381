use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};

use crate::markers::{Chunk, MarkerError};

pub trait FfmpegRunner {
    fn run(&self, args: &[String], options: FfmpegRunOptions) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct FfmpegRunOptions {
    /// Expected output length in seconds, drives the progress bar
    pub total_duration: Option<u64>,
    pub label: String,
    pub verbose: bool,
}

impl FfmpegRunOptions {
    pub fn new(label: impl Into<String>, total_duration: Option<u64>, verbose: bool) -> Self {
        Self {
            total_duration,
            label: label.into(),
            verbose,
        }
    }
}

/// Runs the real ffmpeg binary, one blocking child process per call.
#[derive(Debug, Clone)]
pub struct SystemFfmpegRunner {
    program: String,
}

impl SystemFfmpegRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl FfmpegRunner for SystemFfmpegRunner {
    fn run(&self, args: &[String], options: FfmpegRunOptions) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.program))?;

        let stderr = child
            .stderr
            .take()
            .context("ffmpeg stderr was not captured")?;

        let pb = if options.verbose {
            None
        } else {
            Some(progress_bar(&options))
        };

        let mut last_line = String::new();
        let mut error_lines: Vec<String> = Vec::new();
        let result = follow_stderr(
            stderr,
            options.verbose,
            pb,
            &mut last_line,
            &mut error_lines,
        );

        let status = child.wait().context("Failed to wait for ffmpeg")?;
        result?;

        if !status.success() {
            let error_msg = if !error_lines.is_empty() {
                error_lines.join("\n")
            } else {
                last_line
            };
            bail!(
                "ffmpeg exited with status {:?}: {}",
                status.code(),
                error_msg.trim()
            );
        }

        Ok(())
    }
}

fn progress_bar(options: &FfmpegRunOptions) -> ProgressBar {
    let pb = match options.total_duration {
        Some(duration) if duration > 0 => {
            let pb = ProgressBar::new(duration.saturating_mul(1000));
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {msg}")
            {
                pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
            }
            pb
        }
        _ => ProgressBar::new_spinner(),
    };
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(options.label.clone());
    pb
}

/// Read stderr to the end, then take the progress bar down whether or not
/// the read succeeded.
fn follow_stderr<R: Read>(
    stderr: R,
    verbose: bool,
    pb: Option<ProgressBar>,
    last_line: &mut String,
    error_lines: &mut Vec<String>,
) -> Result<()> {
    let result = read_ffmpeg_stderr(stderr, verbose, &pb, last_line, error_lines);
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    result
}

fn read_ffmpeg_stderr<R: Read>(
    mut stderr: R,
    verbose: bool,
    pb: &Option<ProgressBar>,
    last_line: &mut String,
    error_lines: &mut Vec<String>,
) -> Result<()> {
    let mut buffer = [0u8; 4096];
    let mut accumulated = String::new();

    loop {
        let bytes_read = stderr
            .read(&mut buffer)
            .context("Failed to read ffmpeg stderr")?;
        if bytes_read == 0 {
            break;
        }

        accumulated.push_str(&String::from_utf8_lossy(&buffer[..bytes_read]));

        while let Some(pos) = accumulated.find(['\r', '\n']) {
            let line = accumulated[..pos].to_string();
            accumulated.drain(..=pos);

            if line.is_empty() {
                continue;
            }

            if verbose {
                eprintln!("{}", line);
            }

            if line.contains("error") || line.contains("Error") || line.contains("exists") {
                error_lines.push(line.clone());
            }

            if let (Some(pb), Some(progress)) = (pb, parse_ffmpeg_progress(&line)) {
                pb.set_position((progress * 1000.0) as u64);
            }

            *last_line = line;
        }
    }

    Ok(())
}

fn parse_ffmpeg_progress(line: &str) -> Option<f64> {
    let time_start = line.find("time=")?;
    let time_str = &line[time_start + 5..];
    let time_end = time_str.find(' ').unwrap_or(time_str.len());
    let parts: Vec<&str> = time_str[..time_end].split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: f64 = parts[0].parse().ok()?;
    let minutes: f64 = parts[1].parse().ok()?;
    let seconds: f64 = parts[2].parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn overwrite_flag(overwrite: bool) -> String {
    // -n: fail on an existing target rather than prompting
    let flag = if overwrite { "-y" } else { "-n" };
    flag.to_string()
}

/// `ffmpeg -ss <start> -i <input> -c copy -t <duration> <output>`
pub fn cut_chunk_args(
    input: &Path,
    chunk: &Chunk,
    output: &Path,
    overwrite: bool,
) -> Result<Vec<String>, MarkerError> {
    let duration = chunk.duration()?;
    Ok(vec![
        overwrite_flag(overwrite),
        "-ss".to_string(),
        chunk.start.to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-c".to_string(),
        "copy".to_string(),
        "-t".to_string(),
        duration.to_string(),
        output.to_string_lossy().into_owned(),
    ])
}

/// `ffmpeg -f concat -safe 0 -i <list> -c copy <output>`
pub fn concat_args(list: &Path, output: &Path, overwrite: bool) -> Vec<String> {
    vec![
        overwrite_flag(overwrite),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list.to_string_lossy().into_owned(),
        "-c".to_string(),
        "copy".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Quote a single argument only when the shell would otherwise split or
/// expand it.
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }

    if s.chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '=' | '/' | '.' | ':' | ','))
    {
        return s.to_string();
    }

    format!("'{}'", s.replace('\'', r"'\''"))
}

pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(shell_quote)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn chunk(start: i64, end: i64) -> Chunk {
        Chunk {
            start,
            end,
            ignored: vec![],
            name: "chunk-01".to_string(),
        }
    }

    #[test]
    fn cut_args_seek_before_input() {
        let args = cut_chunk_args(
            Path::new("talk.mkv"),
            &chunk(20, 30),
            Path::new("chunk-01.mp4"),
            true,
        )
        .unwrap();
        assert_eq!(
            args,
            vec![
                "-y", "-ss", "20", "-i", "talk.mkv", "-c", "copy", "-t", "10", "chunk-01.mp4"
            ]
        );
    }

    #[test]
    fn cut_args_refuse_overwrite_by_default() {
        let args = cut_chunk_args(
            Path::new("in.mp4"),
            &chunk(0, 1),
            Path::new("out.mp4"),
            false,
        )
        .unwrap();
        assert_eq!(args[0], "-n");
    }

    #[test]
    fn cut_args_reject_inverted_chunk() {
        let result = cut_chunk_args(
            Path::new("in.mp4"),
            &chunk(10, 5),
            Path::new("out.mp4"),
            false,
        );
        assert!(matches!(result, Err(MarkerError::NegativeSpan { .. })));
    }

    #[test]
    fn concat_args_use_concat_demuxer() {
        let args = concat_args(
            &PathBuf::from("ourlist.txt"),
            &PathBuf::from("output.mp4"),
            false,
        );
        assert_eq!(
            args,
            vec![
                "-n", "-f", "concat", "-safe", "0", "-i", "ourlist.txt", "-c", "copy",
                "output.mp4"
            ]
        );
    }

    #[test]
    fn progress_is_read_from_time_field() {
        let line = "frame=  120 fps=0.0 q=-1.0 size=    1024kB time=00:01:02.50 bitrate=1.0kbits/s speed=40x";
        assert_eq!(parse_ffmpeg_progress(line), Some(62.5));
        assert_eq!(parse_ffmpeg_progress("Press [q] to stop"), None);
    }

    struct BrokenPipe;

    impl Read for BrokenPipe {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("pipe closed"))
        }
    }

    #[test]
    fn progress_bar_is_cleared_when_stderr_fails() {
        let pb = ProgressBar::hidden();
        let mut last_line = String::new();
        let mut error_lines = Vec::new();
        let result = follow_stderr(
            BrokenPipe,
            false,
            Some(pb.clone()),
            &mut last_line,
            &mut error_lines,
        );
        assert!(result.is_err());
        assert!(pb.is_finished());
    }

    #[test]
    fn stderr_lines_are_collected() {
        let pb = ProgressBar::hidden();
        let mut last_line = String::new();
        let mut error_lines = Vec::new();
        let stderr = "frame=1 time=00:00:02.00 bitrate=1\rFile 'out.mp4' already exists\nbye\n";
        follow_stderr(
            stderr.as_bytes(),
            false,
            Some(pb.clone()),
            &mut last_line,
            &mut error_lines,
        )
        .unwrap();
        assert_eq!(error_lines, vec!["File 'out.mp4' already exists"]);
        assert_eq!(last_line, "bye");
        assert_eq!(pb.position(), 2000);
        assert!(pb.is_finished());
    }

    #[test]
    fn huge_duration_saturates_progress_length() {
        let options = FfmpegRunOptions::new("cutting", Some(u64::MAX / 2), false);
        let pb = progress_bar(&options);
        assert_eq!(pb.length(), Some(u64::MAX));
        pb.finish_and_clear();
    }

    #[test]
    fn command_line_quotes_only_when_needed() {
        let args = vec!["-i".to_string(), "my talk.mp4".to_string()];
        assert_eq!(command_line("ffmpeg", &args), "ffmpeg -i 'my talk.mp4'");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
    }
}
