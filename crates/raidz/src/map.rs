//! The column map: per-I/O layout of parity and data columns.
//!
//! A [`RaidzMap`] is created once per logical I/O, at the start of a write
//! to compute parity or of a damaged read to reconstruct, and owns its
//! columns for that lifetime. Parity columns occupy indices `[0, parity)`,
//! data columns `[parity, ncols)`.
//!
//! # Layout
//!
//! The payload is split into sector-granular columns. When the sector count
//! does not divide evenly, the leading ("big") columns carry one extra
//! sector; parity columns are always sized to the largest data column, so a
//! short column's missing tail is treated as zeros by the parity math.

use alloc::vec;
use alloc::vec::Vec;

use crate::dispatch::{self, RaidzBackend};

/// Index of the P (XOR) parity column.
pub const CODE_P: usize = 0;
/// Index of the Q parity column.
pub const CODE_Q: usize = 1;
/// Index of the R parity column.
pub const CODE_R: usize = 2;

/// One data or parity stripe unit.
#[derive(Clone, Debug)]
pub struct Column {
  devidx: usize,
  offset: u64,
  data: Vec<u8>,
}

impl Column {
  /// Child device index this column maps to.
  #[inline]
  #[must_use]
  pub fn devidx(&self) -> usize {
    self.devidx
  }

  /// Device byte offset of this column.
  #[inline]
  #[must_use]
  pub fn offset(&self) -> u64 {
    self.offset
  }

  /// Column size in bytes.
  #[inline]
  #[must_use]
  pub fn size(&self) -> usize {
    self.data.len()
  }

  /// Column contents.
  #[inline]
  #[must_use]
  pub fn data(&self) -> &[u8] {
    &self.data
  }

  /// Mutable column contents.
  #[inline]
  pub fn data_mut(&mut self) -> &mut [u8] {
    &mut self.data
  }
}

/// Per-I/O column map.
///
/// Exclusively owned by the I/O it serves; distinct maps may be processed
/// concurrently on separate threads, sharing only the read-only backend
/// registry.
pub struct RaidzMap {
  cols: Vec<Column>,
  parity: usize,
  bigcols: usize,
  asize: usize,
  nskip: usize,
  skipstart: usize,
  missing_data: usize,
  missing_parity: usize,
  ops: &'static RaidzBackend,
}

impl RaidzMap {
  /// Build the column map for one logical I/O.
  ///
  /// `ncols` counts parity plus data columns; `parity` must be in `[1, 3]`;
  /// `ashift` is the sector shift (`9..=16`); `offset` is the base device
  /// offset of the I/O; `payload` is the data to stripe, and must be a
  /// non-empty whole number of sectors.
  ///
  /// The backend active at construction is cached on the map and used for
  /// every operation on it; selection never changes mid-I/O.
  ///
  /// # Panics
  ///
  /// Panics on any contract violation above. These are caller bugs, not
  /// runtime conditions.
  #[must_use]
  pub fn new(ncols: usize, parity: usize, ashift: usize, offset: u64, payload: &[u8]) -> Self {
    Self::new_with_backend(ncols, parity, ashift, offset, payload, dispatch::current())
  }

  pub(crate) fn new_with_backend(
    ncols: usize,
    parity: usize,
    ashift: usize,
    offset: u64,
    payload: &[u8],
    ops: &'static RaidzBackend,
  ) -> Self {
    assert!((1..=3).contains(&parity), "parity count {parity} out of [1, 3]");
    assert!(ncols > parity, "need at least one data column");
    let dcols = ncols - parity;
    assert!(dcols <= 255, "too many data columns: {dcols}");
    assert!((9..=16).contains(&ashift), "ashift {ashift} out of [9, 16]");
    let sector = 1usize << ashift;
    assert!(!payload.is_empty() && payload.len() % sector == 0, "payload must be a whole number of sectors");

    let s = payload.len() >> ashift;
    let q = s / dcols;
    let r = s % dcols;
    let bigcols = if r == 0 { 0 } else { r + parity };
    let csects = q + usize::from(r != 0);

    let devoff = ((offset >> ashift) / dcols as u64) << ashift;

    let mut cols = Vec::with_capacity(ncols);
    let mut asize = 0;
    let mut consumed = 0;
    for c in 0..ncols {
      let sects = q + usize::from(c < bigcols);
      let size = sects << ashift;
      asize += size;
      let data = if c < parity {
        debug_assert_eq!(sects, csects);
        vec![0u8; size]
      } else {
        let slice = &payload[consumed..consumed + size];
        consumed += size;
        slice.to_vec()
      };
      cols.push(Column {
        devidx: c,
        offset: devoff,
        data,
      });
    }
    debug_assert_eq!(consumed, payload.len());

    let tot = s + parity * csects;
    let nskip = tot.next_multiple_of(parity + 1) - tot;

    Self {
      cols,
      parity,
      bigcols,
      asize,
      nskip,
      skipstart: bigcols,
      missing_data: 0,
      missing_parity: 0,
      ops,
    }
  }

  /// Number of parity columns (also the first data column index).
  #[inline]
  #[must_use]
  pub fn parity(&self) -> usize {
    self.parity
  }

  /// Total column count.
  #[inline]
  #[must_use]
  pub fn ncols(&self) -> usize {
    self.cols.len()
  }

  /// Number of oversized columns, counted from column 0.
  #[inline]
  #[must_use]
  pub fn bigcols(&self) -> usize {
    self.bigcols
  }

  /// Actual total I/O size across all columns.
  #[inline]
  #[must_use]
  pub fn asize(&self) -> usize {
    self.asize
  }

  /// Skip sectors padding the stripe.
  #[inline]
  #[must_use]
  pub fn nskip(&self) -> usize {
    self.nskip
  }

  /// Column index where skip padding starts.
  #[inline]
  #[must_use]
  pub fn skipstart(&self) -> usize {
    self.skipstart
  }

  /// Count of data columns missing in the in-flight I/O.
  #[inline]
  #[must_use]
  pub fn missing_data(&self) -> usize {
    self.missing_data
  }

  /// Count of parity columns missing in the in-flight I/O.
  #[inline]
  #[must_use]
  pub fn missing_parity(&self) -> usize {
    self.missing_parity
  }

  /// The column at `c`.
  #[inline]
  #[must_use]
  pub fn col(&self, c: usize) -> &Column {
    &self.cols[c]
  }

  /// The column at `c`, mutable.
  #[inline]
  pub fn col_mut(&mut self, c: usize) -> &mut Column {
    &mut self.cols[c]
  }

  /// Size in bytes of the column at `c`.
  #[inline]
  #[must_use]
  pub fn col_size(&self, c: usize) -> usize {
    self.cols[c].data.len()
  }

  /// Name of the backend cached on this map.
  #[inline]
  #[must_use]
  pub fn backend_name(&self) -> &'static str {
    self.ops.name
  }

  #[inline]
  pub(crate) fn ops(&self) -> &'static RaidzBackend {
    self.ops
  }

  /// Split into mutable parity columns and shared data columns.
  #[inline]
  pub(crate) fn split_parity_mut(&mut self) -> (&mut [Column], &[Column]) {
    let (p, d) = self.cols.split_at_mut(self.parity);
    (p, d)
  }

  pub(crate) fn set_missing(&mut self, data: usize, parity: usize) {
    self.missing_data = data;
    self.missing_parity = parity;
  }

  /// Compute the parity columns for this map's parity level, in place.
  ///
  /// Data columns are read-only; parity buffers are overwritten. This path
  /// has no recoverable error.
  pub fn generate_parity(&mut self) {
    let f = self.ops.gen[self.parity - 1];
    f(self);
  }

  /// Reconstruct a damaged set of 1-3 columns, parity and/or data.
  ///
  /// Data columns are recovered from the surviving columns and parity, then
  /// any damaged parity columns are regenerated from the recovered data.
  /// Returns the bitmask of parity codes used for data recovery
  /// (`1 << CODE_P` etc.), 0 if only parity was damaged.
  ///
  /// # Panics
  ///
  /// Panics if the damaged set exceeds the parity level, contains an
  /// out-of-range index, or leaves too little surviving parity to solve.
  pub fn reconstruct(&mut self, targets: &[usize]) -> u8 {
    crate::rec::reconstruct(self, targets)
  }

  /// Reconstruct damaged *data* columns given which parities are usable.
  ///
  /// Selects one of the seven solve procedures by damaged count and parity
  /// validity. See [`RaidzMap::reconstruct`] for the panic contract.
  pub fn reconstruct_data(&mut self, parity_valid: [bool; 3], targets: &[usize]) -> u8 {
    crate::rec::reconstruct_data(self, parity_valid, targets)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn even_split_has_no_big_columns() {
    let payload = vec![0xabu8; 4 * 512];
    let rm = RaidzMap::new(6, 2, 9, 0, &payload);
    assert_eq!(rm.ncols(), 6);
    assert_eq!(rm.parity(), 2);
    assert_eq!(rm.bigcols(), 0);
    for c in 0..6 {
      assert_eq!(rm.col_size(c), 512);
    }
    assert_eq!(rm.asize(), 6 * 512);
  }

  #[test]
  fn uneven_split_grows_leading_columns() {
    // 5 sectors over 3 data columns: q=1, r=2, so columns 0..4 are big.
    let payload = vec![1u8; 5 * 512];
    let rm = RaidzMap::new(4, 1, 9, 0, &payload);
    assert_eq!(rm.bigcols(), 3);
    assert_eq!(rm.col_size(CODE_P), 2 * 512);
    assert_eq!(rm.col_size(1), 2 * 512);
    assert_eq!(rm.col_size(2), 2 * 512);
    assert_eq!(rm.col_size(3), 512);
    assert_eq!(rm.skipstart(), 3);
  }

  #[test]
  fn parity_sized_to_largest_data_column() {
    let payload = vec![7u8; 7 * 512];
    let rm = RaidzMap::new(6, 3, 9, 0, &payload);
    let largest = (rm.parity()..rm.ncols()).map(|c| rm.col_size(c)).max().unwrap();
    for c in 0..rm.parity() {
      assert_eq!(rm.col_size(c), largest);
    }
  }

  #[test]
  fn payload_round_trips_into_data_columns() {
    let payload: Vec<u8> = (0..3 * 512).map(|i| i as u8).collect();
    let rm = RaidzMap::new(5, 2, 9, 0, &payload);
    let mut collected = Vec::new();
    for c in rm.parity()..rm.ncols() {
      collected.extend_from_slice(rm.col(c).data());
    }
    assert_eq!(collected, payload);
  }

  #[test]
  fn single_data_column() {
    let payload = vec![0x55u8; 2 * 512];
    let rm = RaidzMap::new(2, 1, 9, 0, &payload);
    assert_eq!(rm.col_size(0), rm.col_size(1));
    assert_eq!(rm.bigcols(), 0);
  }

  #[test]
  #[should_panic(expected = "parity count")]
  fn rejects_parity_out_of_range() {
    let payload = vec![0u8; 512];
    let _ = RaidzMap::new(5, 4, 9, 0, &payload);
  }

  #[test]
  #[should_panic(expected = "data column")]
  fn rejects_all_parity_map() {
    let payload = vec![0u8; 512];
    let _ = RaidzMap::new(3, 3, 9, 0, &payload);
  }

  #[test]
  #[should_panic(expected = "whole number of sectors")]
  fn rejects_ragged_payload() {
    let payload = vec![0u8; 700];
    let _ = RaidzMap::new(4, 1, 9, 0, &payload);
  }
}
