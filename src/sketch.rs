//! Sketch orchestration: owns the active representation, decides when to
//! switch representations, and exposes insertion, merge and the estimators.

use std::mem::size_of;

use crate::dense::DenseRegisters;
use crate::error::SketchError;
use crate::mixer::{Mixer, Murmur3Mixer};
use crate::representation::{Representation, RepresentationTrait};
use crate::sparse::{SparseStore, PACKED_ENTRY_BYTES, SPARSE_PRECISION};

/// Smallest supported precision.
pub const MIN_PRECISION: u8 = 4;
/// Largest supported precision; the bias correction data stops here.
pub const MAX_PRECISION: u8 = 18;
/// Precision used by [`CardinalitySketch::default`].
pub const DEFAULT_PRECISION: u8 = 12;

/// Storage mode of a sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Individual bucket/rank observations at sparse precision; exact-ish for
    /// low cardinalities and cheap while the stream stays small.
    Sparse,
    /// Fixed array of `2^p` registers.
    Dense,
}

/// Probabilistic cardinality sketch over 64-bit values.
///
/// Estimates the number of distinct values observed through [`add`] within
/// bounded memory: `2^p` one-byte registers once dense, less while sparse.
/// The expected relative error of the dense estimators is `~1.04 / sqrt(2^p)`.
///
/// The mixer is injected at construction and fixed for the sketch's lifetime;
/// sketches only produce meaningful merges when built over the same mixer.
///
/// # Examples
///
/// ```
/// use cardinality_sketch::CardinalitySketch;
///
/// let mut sketch = CardinalitySketch::new(12)?;
/// sketch.add_all(0..1000)?;
/// let estimate = sketch.estimate_bias_corrected();
/// assert!((estimate as i64 - 1000).abs() < 20);
/// # Ok::<(), cardinality_sketch::SketchError>(())
/// ```
///
/// [`add`]: CardinalitySketch::add
#[derive(Debug, Clone, PartialEq)]
pub struct CardinalitySketch<M: Mixer = Murmur3Mixer> {
    precision: u8,
    initial_mode: Mode,
    items_observed: u64,
    representation: Representation,
    mixer: M,
}

impl CardinalitySketch<Murmur3Mixer> {
    /// Create a sparse sketch with `2^precision` dense buckets and the
    /// default mixer.
    pub fn new(precision: u8) -> Result<Self, SketchError> {
        Self::with_options(precision, Mode::Sparse, Murmur3Mixer)
    }
}

impl<M: Mixer> CardinalitySketch<M> {
    /// Create a sketch with an explicit initial mode and mixer.
    pub fn with_options(precision: u8, initial_mode: Mode, mixer: M) -> Result<Self, SketchError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(SketchError::InvalidPrecision { precision });
        }
        Ok(Self {
            precision,
            initial_mode,
            items_observed: 0,
            representation: empty_representation(precision, initial_mode),
            mixer,
        })
    }

    /// Precision `p` fixed at construction.
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Current storage mode.
    pub fn mode(&self) -> Mode {
        match &self.representation {
            Representation::Sparse(_) => Mode::Sparse,
            Representation::Dense(_) => Mode::Dense,
        }
    }

    /// Total number of observed items, duplicates included.
    pub fn items_observed(&self) -> u64 {
        self.items_observed
    }

    /// Number of dense buckets `m = 2^p`.
    fn buckets(&self) -> usize {
        1 << self.precision
    }

    /// Observe one item.
    pub fn add(&mut self, item: u64) -> Result<(), SketchError> {
        let hash = self.mixer.mix(item);
        self.representation.insert_hash(hash)?;
        self.items_observed += 1;
        self.maybe_switch_to_dense()
    }

    /// Observe every item of `items`; the final state does not depend on the
    /// order of the items.
    pub fn add_all<I: IntoIterator<Item = u64>>(&mut self, items: I) -> Result<(), SketchError> {
        for item in items {
            self.add(item)?;
        }
        Ok(())
    }

    /// Merge `other` into `self` so that `self` estimates the union of both
    /// streams. Fails without modifying either sketch when the precisions
    /// differ.
    pub fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        if self.precision != other.precision {
            return Err(SketchError::IncompatiblePrecision {
                expected: self.precision,
                found: other.precision,
            });
        }

        let converted = match (&mut self.representation, &other.representation) {
            (Representation::Sparse(lhs), Representation::Sparse(rhs)) => {
                lhs.merge_from(rhs);
                None
            }
            (Representation::Dense(lhs), Representation::Dense(rhs)) => {
                lhs.merge_from(rhs);
                None
            }
            (Representation::Dense(lhs), Representation::Sparse(rhs)) => {
                // fold the sparse side transiently; replace registers only
                // once the whole fold went through
                let mut merged = lhs.clone();
                rhs.fold_into(&mut merged)?;
                *lhs = merged;
                None
            }
            (Representation::Sparse(lhs), Representation::Dense(rhs)) => {
                let mut merged = rhs.clone();
                lhs.fold_into(&mut merged)?;
                Some(Representation::Dense(merged))
            }
        };
        if let Some(representation) = converted {
            self.representation = representation;
        }

        self.items_observed += other.items_observed;
        self.maybe_switch_to_dense()
    }

    /// Discard all observed data, returning to the construction-time mode
    /// with the precision unchanged.
    pub fn reset(&mut self) {
        self.items_observed = 0;
        self.representation = empty_representation(self.precision, self.initial_mode);
    }

    /// Estimate the number of distinct values observed, with empirical bias
    /// correction in dense mode. Read-only.
    pub fn estimate_bias_corrected(&self) -> u64 {
        self.finish_estimate(self.representation.estimate_bias_corrected())
    }

    /// Estimate the number of distinct values observed by maximizing the
    /// likelihood of the register histogram; needs no empirical data.
    /// Read-only.
    pub fn estimate_maximum_likelihood(&self) -> u64 {
        self.finish_estimate(self.representation.estimate_maximum_likelihood())
    }

    /// Current memory footprint in bytes.
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + self.representation.size_of()
    }

    fn finish_estimate(&self, estimate: f64) -> u64 {
        // no estimate can exceed the number of items observed
        (estimate.round() as u64).min(self.items_observed)
    }

    /// Convert to the dense representation once the sparse store's footprint
    /// reaches the footprint of a full dense register array. The accounting
    /// uses the packed 4-byte entry size, so the cutover fires
    /// deterministically at `m / 4` entries regardless of merge history.
    fn maybe_switch_to_dense(&mut self) -> Result<(), SketchError> {
        let Representation::Sparse(store) = &self.representation else {
            return Ok(());
        };
        if store.len() * PACKED_ENTRY_BYTES < self.buckets() {
            return Ok(());
        }
        let mut dense = DenseRegisters::new(self.precision);
        store.fold_into(&mut dense)?;
        self.representation = Representation::Dense(dense);
        Ok(())
    }
}

fn empty_representation(precision: u8, mode: Mode) -> Representation {
    match mode {
        Mode::Sparse => Representation::Sparse(SparseStore::new()),
        Mode::Dense => Representation::Dense(DenseRegisters::new(precision)),
    }
}

impl Default for CardinalitySketch<Murmur3Mixer> {
    /// Sparse sketch at [`DEFAULT_PRECISION`] with the default mixer.
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            initial_mode: Mode::Sparse,
            items_observed: 0,
            representation: empty_representation(DEFAULT_PRECISION, Mode::Sparse),
            mixer: Murmur3Mixer,
        }
    }
}

// the sparse precision sits strictly above every supported dense precision,
// so sparse entries can always fold down to the sketch's precision
const _: () = assert!(SPARSE_PRECISION > MAX_PRECISION);
