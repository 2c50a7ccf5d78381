use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "markut.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkutConfig {
    /// ffmpeg binary used for cutting and concatenation
    pub ffmpeg_path: String,
    /// Extension appended to chunk names to form the chunk file names
    pub chunk_extension: String,
    /// Concatenation list handed to ffmpeg's concat demuxer
    pub manifest_name: String,
    /// Default output of the `final` subcommand
    pub output_name: String,
}

impl Default for MarkutConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            chunk_extension: "mp4".to_string(),
            manifest_name: "ourlist.txt".to_string(),
            output_name: "output.mp4".to_string(),
        }
    }
}

impl MarkutConfig {
    /// Load from `path` if given, otherwise from the default location. A
    /// missing default file yields the defaults; an explicitly requested
    /// file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::load_from_path(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading markut config from {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("parsing markut config {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("invalid TOML")?;
        Ok(config)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("markut").join(CONFIG_FILE_NAME))
}
