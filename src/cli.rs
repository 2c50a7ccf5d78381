use std::ffi::OsString;
use std::path::PathBuf;

use clap::builder::{BoolishValueParser, OsStringValueParser, TypedValueParser};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::ui::OutputFormat;

/// Cut a recording into chunks from a marker log
#[derive(Parser, Debug)]
#[command(name = "markut", author, version, about, long_about = None)]
pub struct Cli {
    /// Print debug events, including the ffmpeg command lines
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output format for messages
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render the final video
    Final(FinalArgs),
    /// Render specific chunk of the final video
    Chunk(ChunkArgs),
    /// Inspect markers in the CSV file
    Inspect(InspectArgs),
}

/// Where the markers come from and how they line up with the recording
#[derive(Args, Debug, Clone)]
pub struct MarkerArgs {
    /// Path to the CSV file with markers
    #[arg(long, value_hint = ValueHint::FilePath, value_parser = path_value())]
    pub csv: Option<PathBuf>,

    /// Delay of markers in seconds
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub delay: i64,
}

/// Options shared by the subcommands that run ffmpeg
#[derive(Args, Debug, Clone)]
pub struct CutArgs {
    /// Path to the input video file
    #[arg(long, value_hint = ValueHint::FilePath, value_parser = path_value())]
    pub input: Option<PathBuf>,

    /// Pass -y to ffmpeg (`-y`, `-y=true` or `-y=false`)
    #[arg(
        short = 'y',
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
    )]
    pub overwrite: bool,

    /// Print the ffmpeg commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Show raw ffmpeg output instead of a progress bar
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FinalArgs {
    #[command(flatten)]
    pub markers: MarkerArgs,

    #[command(flatten)]
    pub cut: CutArgs,

    /// Path of the concatenated video (defaults to output_name from the config)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ChunkArgs {
    #[command(flatten)]
    pub markers: MarkerArgs,

    #[command(flatten)]
    pub cut: CutArgs,

    /// Chunk number to render
    #[arg(long = "chunk", default_value_t = 0)]
    pub index: usize,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub markers: MarkerArgs,
}

/// Paths are taken verbatim, empty values included, so an empty `-csv ""`
/// is reported the same way as a missing flag.
fn path_value() -> impl TypedValueParser<Value = PathBuf> {
    OsStringValueParser::new().map(PathBuf::from)
}

/// Long options that may also be spelled with a single dash (`-csv`).
const LONG_FLAGS: &[&str] = &[
    "csv", "input", "delay", "chunk", "output", "dry-run", "verbose", "debug", "format",
    "no-color", "config", "help", "version",
];

/// Rewrite single-dash long options into their `--` form so `-csv markers.csv`
/// and `--csv markers.csv` mean the same thing. Values and anything after a
/// bare `--` are left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
                    if LONG_FLAGS.contains(&name) {
                        OsString::from(format!("-{text}"))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(normalize_args(args.iter().copied()))
    }

    #[test]
    fn single_dash_long_flags_are_rewritten() {
        let args = normalize_args(["markut", "final", "-csv", "m.csv", "-delay=-3", "-y"]);
        assert_eq!(
            args,
            vec!["markut", "final", "--csv", "m.csv", "--delay=-3", "-y"]
        );
    }

    #[test]
    fn values_and_passthrough_are_untouched() {
        let args = normalize_args(["markut", "inspect", "-delay", "-5", "--", "-csv"]);
        assert_eq!(args, vec!["markut", "inspect", "--delay", "-5", "--", "-csv"]);
    }

    #[test]
    fn parses_final_subcommand() {
        let cli = parse(&[
            "markut", "final", "-csv", "m.csv", "-input", "in.mkv", "-delay", "-5", "-y",
        ])
        .unwrap();
        let Some(Commands::Final(args)) = cli.command else {
            panic!("expected final subcommand");
        };
        assert_eq!(args.markers.csv, Some(PathBuf::from("m.csv")));
        assert_eq!(args.cut.input, Some(PathBuf::from("in.mkv")));
        assert_eq!(args.markers.delay, -5);
        assert!(args.cut.overwrite);
        assert!(!args.cut.dry_run);
        assert_eq!(args.output, None);
    }

    #[test]
    fn parses_chunk_subcommand_defaults() {
        let cli = parse(&["markut", "chunk", "--csv", "m.csv"]).unwrap();
        let Some(Commands::Chunk(args)) = cli.command else {
            panic!("expected chunk subcommand");
        };
        assert_eq!(args.index, 0);
        assert_eq!(args.markers.delay, 0);
        assert_eq!(args.cut.input, None);
        assert!(!args.cut.overwrite);

        let cli = parse(&["markut", "chunk", "-chunk", "4"]).unwrap();
        let Some(Commands::Chunk(args)) = cli.command else {
            panic!("expected chunk subcommand");
        };
        assert_eq!(args.index, 4);
    }

    #[test]
    fn overwrite_accepts_explicit_values() {
        let overwrite = |extra: &[&str]| {
            let mut args = vec!["markut", "final", "-csv", "m.csv"];
            args.extend_from_slice(extra);
            let Some(Commands::Final(args)) = parse(&args).unwrap().command else {
                panic!("expected final subcommand");
            };
            args.cut.overwrite
        };
        assert!(!overwrite(&[]));
        assert!(overwrite(&["-y"]));
        assert!(overwrite(&["-y=true"]));
        assert!(!overwrite(&["-y=false"]));
        assert!(overwrite(&["-y", "-input", "in.mkv"]));
        assert!(parse(&["markut", "final", "-y=maybe"]).is_err());
    }

    #[test]
    fn empty_path_values_are_kept() {
        let cli = parse(&["markut", "inspect", "-csv", ""]).unwrap();
        let Some(Commands::Inspect(args)) = cli.command else {
            panic!("expected inspect subcommand");
        };
        assert_eq!(args.markers.csv, Some(PathBuf::new()));
    }

    #[test]
    fn missing_subcommand_parses_to_none() {
        let cli = parse(&["markut"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(parse(&["markut", "explode"]).is_err());
    }

    #[test]
    fn inspect_does_not_accept_input() {
        assert!(parse(&["markut", "inspect", "-csv", "m.csv", "-input", "x"]).is_err());
    }
}
