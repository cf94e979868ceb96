//! `cardinality-sketch` estimates the number of distinct 64-bit values in a
//! stream or dataset within bounded, sub-linear memory.
//!
//! The sketch is a HyperLogLog++ variant with a precision parameter `p` in the
//! `[4, 18]` range defining `m = 2^p` registers, a high-precision sparse
//! representation for low cardinalities, and two independent estimators.
//!
//! # Data-structure design
//!
//! ## Two representations
//!
//! - **Sparse**: while few distinct values have been seen, the sketch keeps
//!   one `(bucket index, rank)` entry per distinct bucket at a fixed sparse
//!   precision of 25 bits, deduplicated with keep-the-maximum-rank semantics.
//!   Low cardinalities are answered by linear counting over `2^25` buckets,
//!   which is near-exact in this regime.
//! - **Dense**: one byte-sized register per bucket at precision `p`, holding
//!   the maximum rank observed for that bucket. The sketch converts as soon
//!   as the sparse store's footprint reaches the dense array's (`m / 4`
//!   entries) and never converts back, except through an explicit reset.
//!
//! ## Two estimators
//!
//! - **Bias-corrected**: the classic harmonic-mean estimate with an empirical
//!   bias correction subtracted for raw estimates up to `5 * m`, and linear
//!   counting while enough registers are still empty. The correction data is
//!   bundled per precision.
//! - **Maximum-likelihood**: maximizes the likelihood of the observed
//!   register histogram with a secant iteration; relies on no empirical data.
//!
//! Expected relative error of either dense estimator is `~1.04 / sqrt(m)`:
//! about 3.2% at `p = 10`, 1.6% at `p = 12`, 0.8% at `p = 14`.
//!
//! # Hashing
//!
//! Items pass through a pluggable [`Mixer`](mixer::Mixer) injected at
//! construction, defaulting to the 64-bit MurmurHash3 finalizer. The top `p`
//! bits of a mixed value select a bucket, the remaining bits supply the rank.
//!
//! The sketch is a single-threaded component: mutating calls require
//! exclusive access, estimator calls are read-only, and no operation blocks.

mod bias;
mod dense;
mod error;
mod estimate;
pub mod mixer;
mod representation;
pub mod sketch;
mod sparse;

pub use error::SketchError;
pub use mixer::{Mixer, Murmur3Mixer, WyMixer};
pub use sketch::{CardinalitySketch, Mode, DEFAULT_PRECISION, MAX_PRECISION, MIN_PRECISION};
