use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory the binary runs in. Chunk files, the concat list and
/// a pinned config file all live here.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let env = Self { temp_dir };
        // Keep the user's own config file out of the tests
        env.write_file("markut.toml", "")?;
        Ok(env)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("markut.toml")
    }

    pub fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path().join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Write marker rows, one `(seconds, flag)` pair per line.
    pub fn write_markers(&self, name: &str, rows: &[(i64, &str)]) -> Result<PathBuf> {
        let contents: String = rows
            .iter()
            .map(|(ts, flag)| {
                if flag.is_empty() {
                    format!("{ts}\n")
                } else {
                    format!("{ts},{flag}\n")
                }
            })
            .collect();
        self.write_file(name, &contents)
    }
}
