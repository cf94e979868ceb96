use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::sketch::{MAX_PRECISION, MIN_PRECISION};

/// Errors surfaced by sketch construction and mutation.
///
/// All failures are deterministic and reported before any state is touched:
/// a failed operation leaves every involved sketch unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SketchError {
    /// Construction was attempted with a precision outside the supported range.
    InvalidPrecision { precision: u8 },
    /// Merge was attempted between sketches of differing precision.
    IncompatiblePrecision { expected: u8, found: u8 },
    /// A derived rank exceeded its representable bound; indicates a defect in
    /// rank derivation, not a data error.
    InternalInvariantViolation { rank: u8, max_rank: u8 },
}

impl Display for SketchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPrecision { precision } => write!(
                f,
                "precision {precision} is outside the supported range [{MIN_PRECISION}, {MAX_PRECISION}]"
            ),
            Self::IncompatiblePrecision { expected, found } => write!(
                f,
                "cannot merge sketches of differing precision: expected {expected}, found {found}"
            ),
            Self::InternalInvariantViolation { rank, max_rank } => write!(
                f,
                "rank {rank} exceeds the representable bound {max_rank}"
            ),
        }
    }
}

impl Error for SketchError {}
