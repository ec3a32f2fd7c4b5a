use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to encode screenshot: {0}")]
    Png(#[from] png::EncodingError),

    #[error(transparent)]
    Core(#[from] dotclock_core::Error),
}
