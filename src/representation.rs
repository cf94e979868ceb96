//! Dispatch over the two storage modes of a sketch.

use enum_dispatch::enum_dispatch;

use crate::dense::DenseRegisters;
use crate::error::SketchError;
use crate::sparse::SparseStore;

/// Operations every storage mode supports. Estimator entry points are
/// read-only: they never force a mode switch or touch stored state.
#[enum_dispatch(Representation)]
pub(crate) trait RepresentationTrait {
    /// Record one mixed hash at the representation's own precision.
    fn insert_hash(&mut self, hash: u64) -> Result<(), SketchError>;
    /// Estimate with empirical bias correction.
    fn estimate_bias_corrected(&self) -> f64;
    /// Estimate by maximizing the register histogram's likelihood.
    fn estimate_maximum_likelihood(&self) -> f64;
    /// Heap memory held by the representation, in bytes.
    fn size_of(&self) -> usize;
}

/// Active representation of a sketch: exactly one of the two at any time.
#[enum_dispatch]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Representation {
    Sparse(SparseStore),
    Dense(DenseRegisters),
}
