//! Sparse store: a deduplicating map from a high-precision bucket index to the
//! maximum rank observed for that bucket, used while cardinality is low.

use std::mem::size_of;

use hashbrown::HashMap;

use crate::dense::{self, DenseRegisters};
use crate::error::SketchError;
use crate::estimate;
use crate::representation::RepresentationTrait;

/// Precision of the sparse representation, fixed at 25: a 25-bit bucket index,
/// a 6-bit rank and a flag bit fit one 32-bit word in encodings that pack
/// entries. The store keeps the pair explicit and preserves only that
/// contract: dedup by index, retain the maximum rank.
pub(crate) const SPARSE_PRECISION: u8 = 25;
/// Number of sparse buckets, `2^25`.
pub(crate) const SPARSE_BUCKETS: u32 = 1 << SPARSE_PRECISION;
/// Per-entry cost charged by the switch policy, matching the 4-byte packed
/// entry of the reference encoding. Keeping the constant independent of the
/// map's real overhead makes the sparse-to-dense cutover deterministic at
/// `2^precision / 4` entries.
pub(crate) const PACKED_ENTRY_BYTES: usize = 4;

/// Mapping from sparse bucket index to maximum observed rank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SparseStore {
    entries: HashMap<u32, u8>,
}

impl SparseStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of distinct bucket indexes observed.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Record `rank` for `index`, keeping the maximum of the stored and the
    /// observed rank. A lower duplicate neither adds an entry nor overwrites.
    #[inline]
    pub(crate) fn observe(&mut self, index: u32, rank: u8) {
        let stored = self.entries.entry(index).or_insert(0);
        if rank > *stored {
            *stored = rank;
        }
    }

    /// Union with `other`, keeping the maximum rank per index.
    pub(crate) fn merge_from(&mut self, other: &SparseStore) {
        for (&index, &rank) in &other.entries {
            self.observe(index, rank);
        }
    }

    /// Replay every entry into `dense` at the dense array's precision.
    pub(crate) fn fold_into(&self, dense: &mut DenseRegisters) -> Result<(), SketchError> {
        for (&index, &rank) in &self.entries {
            let (dense_index, dense_rank) = fold_entry(index, rank, dense.precision());
            dense.update(dense_index, dense_rank)?;
        }
        Ok(())
    }

    fn linear_count(&self) -> f64 {
        let buckets = f64::from(SPARSE_BUCKETS);
        let zeros = f64::from(SPARSE_BUCKETS - self.entries.len() as u32);
        estimate::linear_counting(buckets, zeros)
    }
}

/// Recompute a sparse entry at a lower target precision: the dense index is
/// the top `precision` bits of the sparse index. When the discarded index bits
/// are non-zero they determine the rank on their own; otherwise the stored
/// rank continues the zero run past the discarded bits.
#[inline]
pub(crate) fn fold_entry(index: u32, rank: u8, precision: u8) -> (usize, u8) {
    let width = SPARSE_PRECISION - precision;
    let dense_index = (index >> width) as usize;
    let discarded = index & ((1u32 << width) - 1);
    let dense_rank = if discarded == 0 {
        width + rank
    } else {
        let bit_len = 32 - discarded.leading_zeros() as u8;
        width - bit_len + 1
    };
    (dense_index, dense_rank)
}

impl RepresentationTrait for SparseStore {
    #[inline]
    fn insert_hash(&mut self, hash: u64) -> Result<(), SketchError> {
        let (index, rank) = dense::split_hash(hash, SPARSE_PRECISION);
        if rank > dense::max_rank(SPARSE_PRECISION) {
            return Err(SketchError::InternalInvariantViolation {
                rank,
                max_rank: dense::max_rank(SPARSE_PRECISION),
            });
        }
        self.observe(index as u32, rank);
        Ok(())
    }

    /// Linear counting at sparse precision; accurate because sparse mode is
    /// only ever active for low cardinalities.
    fn estimate_bias_corrected(&self) -> f64 {
        self.linear_count()
    }

    fn estimate_maximum_likelihood(&self) -> f64 {
        self.linear_count()
    }

    fn size_of(&self) -> usize {
        self.entries.len() * (size_of::<u32>() + size_of::<u8>())
    }
}
