use std::error::Error as StdError;

/// Boxed error returned by input handler callbacks.
pub type HandlerError = Box<dyn StdError + Send + Sync + 'static>;

/// Caller-programming errors. These fail loudly instead of truncating.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    #[error("{field} expects {expected} values, got {actual}")]
    BufferSize {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{field} cannot be set on a {mode} cloud")]
    AddressingMode {
        field: &'static str,
        mode: &'static str,
    },
    #[error("palette must hold a positive multiple of 3 values, got {0}")]
    PaletteLength(usize),
    #[error("{binding} binding used before initialize()")]
    Uninitialized { binding: &'static str },
}

/// Errors surfaced by the visualizer core.
#[derive(Debug, thiserror::Error)]
pub enum VizError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ArgumentError),
    #[error("failed to acquire rendering context: {0}")]
    Context(String),
    #[error("{stack} handler failed: {source}")]
    Handler {
        stack: &'static str,
        #[source]
        source: HandlerError,
    },
}

impl VizError {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// Check that a caller slice has exactly `expected` elements.
pub fn check_len(field: &'static str, expected: usize, actual: usize) -> Result<(), VizError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ArgumentError::BufferSize {
            field,
            expected,
            actual,
        }
        .into())
    }
}

/// Check that a caller slice holds `dims[0] * dims[1] * ...` elements.
///
/// A product that overflows `usize` cannot describe any real buffer and is
/// rejected as a size mismatch instead of wrapping or panicking.
pub fn check_dims(field: &'static str, dims: &[usize], actual: usize) -> Result<(), VizError> {
    match dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d)) {
        Some(expected) => check_len(field, expected, actual),
        None => Err(ArgumentError::BufferSize {
            field,
            expected: usize::MAX,
            actual,
        }
        .into()),
    }
}
