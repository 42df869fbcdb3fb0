use std::path::PathBuf;

/// Every failure domain named in the pipeline's error-handling design: user input, the
/// filesystem, the database engine, and the compressor. `Io` absorbs the transparent
/// `std::io::Error` conversions that show up at every seek/write/flush boundary.
#[derive(thiserror::Error, Debug)]
pub enum PackError {
    #[error("invalid input {path}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    #[error("filesystem error on {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("inconsistent database state: {0}")]
    Inconsistent(String),

    #[error("compressor error: {0}")]
    Compression(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type PackResult<T> = Result<T, PackError>;

impl PackError {
    pub fn invalid_input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PackError::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PackError::Filesystem {
            path: path.into(),
            source,
        }
    }
}
