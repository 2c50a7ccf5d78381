use thiserror::Error;

/// Problems with how markut was invoked, as opposed to what the marker log
/// contains. These exit with status 1 without further diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("No subcommand is provided")]
    MissingSubcommand,

    #[error("No -{flag} file is provided")]
    MissingFlag {
        subcommand: &'static str,
        flag: &'static str,
    },

    #[error("{index} is incorrect chunk number. There is only {count} of them.")]
    ChunkOutOfRange { index: usize, count: usize },
}

impl UsageError {
    /// Subcommand whose usage should be printed alongside the error.
    pub fn usage_for(&self) -> Option<&'static str> {
        match self {
            UsageError::MissingFlag { subcommand, .. } => Some(subcommand),
            UsageError::MissingSubcommand | UsageError::ChunkOutOfRange { .. } => None,
        }
    }
}
