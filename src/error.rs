use thiserror::Error;

/// Library error type for fit-and-scale operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied size or factor is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The source reported a zero-sized image, so no scale ratio exists.
    #[error("image has zero dimension ({width}x{height})")]
    ZeroDimension { width: u32, height: u32 },

    /// The source could not be decoded as an image.
    #[error("failed to decode {source_name}: {message}")]
    Decode {
        source_name: String,
        message: String,
    },

    /// Resampling to the final dimensions failed.
    #[error("resize error: {0}")]
    Resize(String),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}

impl Error {
    pub(crate) fn decode(source_name: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            source_name: source_name.into(),
            message: err.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
