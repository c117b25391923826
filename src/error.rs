//! Crate-wide error type. Every precondition and domain failure is rejected
//! at the offending call with one of these variants, never coerced.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `bits` outside `1..=63`.
    InvalidBits(u32),
    /// Zero dimensions.
    InvalidDimensions(usize),
    /// Coordinate or transposed-index vector has the wrong length.
    DimensionMismatch { expected: usize, actual: usize },
    /// A coordinate does not fit in `bits` bits. Out-of-domain values are
    /// rejected, not masked.
    CoordinateOutOfRange {
        dimension: usize,
        value: u64,
        bits: u32,
    },
    /// A linear index has more significant bits than `bits * dims`.
    IndexOutOfRange {
        bits_required: u64,
        bits_available: u64,
    },
    /// Maximum fan-out must be even and at least 4.
    InvalidFanout(usize),
    /// Byte slice shorter than the fixed record width.
    TruncatedRecord { expected: usize, actual: usize },
    /// Config could not be parsed.
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidBits(bits) => {
                write!(f, "bits must be in 1..=63, got {}", bits)
            }
            Error::InvalidDimensions(dims) => {
                write!(f, "dimensions must be at least 1, got {}", dims)
            }
            Error::DimensionMismatch { expected, actual } => {
                write!(f, "expected a vector of {} dimensions, got {}", expected, actual)
            }
            Error::CoordinateOutOfRange { dimension, value, bits } => {
                write!(
                    f,
                    "coordinate {} in dimension {} does not fit in {} bits",
                    value, dimension, bits
                )
            }
            Error::IndexOutOfRange { bits_required, bits_available } => {
                write!(
                    f,
                    "index needs {} bits but the curve holds {}",
                    bits_required, bits_available
                )
            }
            Error::InvalidFanout(m) => {
                write!(f, "maximum fan-out must be even and >= 4, got {}", m)
            }
            Error::TruncatedRecord { expected, actual } => {
                write!(f, "record needs {} bytes, got {}", expected, actual)
            }
            Error::Config(msg) => write!(f, "config error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
