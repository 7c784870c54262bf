//! Lane kernels: the per-backend primitive layer.
//!
//! Every generation and reconstruction algorithm in this crate is written
//! once, generically, against [`Lane`]. A backend contributes only the
//! primitives (native-width load/store, XOR, the in-field doublings, and
//! multiply by a per-call constant), so adding an ISA variant never
//! duplicates the algorithms.
//!
//! # The multiply-constant duality
//!
//! Coefficient derivation produces *logarithms* of the desired multipliers,
//! because logs are what fall out of solving the syndrome equations. Each
//! backend turns a log into whatever its multiply primitive wants via
//! [`Lane::fix_mul_exp`]:
//!
//! - the scalar kernel keeps the log and uses it as a row index into the
//!   direct product table;
//! - the shuffle kernels expand it through `POW2` so the constant can select
//!   pre-built nibble tables.
//!
//! A [`MulConst`] is therefore meaningful only to the backend that produced
//! it and never crosses backends.

use core::marker::PhantomData;

pub(crate) mod scalar;

#[cfg(target_arch = "x86_64")]
pub(crate) mod avx2;

#[cfg(target_arch = "aarch64")]
pub(crate) mod neon;

/// A backend-specific multiply constant; see the module docs for the
/// log-vs-expanded duality.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MulConst(pub(crate) u8);

/// One native-width vector of field elements.
///
/// Implementations process `WIDTH` bytes per operation. Buffers handed to
/// the generic layer are always sector-granular, so `WIDTH` divides every
/// column size.
pub(crate) trait Lane: Copy {
  /// Bytes processed per lane operation.
  const WIDTH: usize;

  /// Load one lane. `src.len()` must be at least `WIDTH`.
  fn load(src: &[u8]) -> Self;

  /// Store one lane. `dst.len()` must be at least `WIDTH`.
  fn store(self, dst: &mut [u8]);

  fn xor(self, other: Self) -> Self;

  /// Multiply every byte by 2 in the field: shift left, fold the modulus
  /// into lanes whose high bit was set. Branch-free across the whole lane.
  fn mul2(self) -> Self;

  /// Multiply every byte by 4.
  #[inline(always)]
  fn mul4(self) -> Self {
    self.mul2().mul2()
  }

  /// Multiply every byte by the constant prepared by [`Self::fix_mul_exp`].
  fn mul(self, c: MulConst) -> Self;

  /// Normalize a log-domain exponent into this backend's multiply form.
  fn fix_mul_exp(e: usize) -> MulConst;

  /// Enter the vector-math critical section (pair with [`Self::end`]).
  #[inline(always)]
  fn begin() {}

  /// Leave the vector-math critical section.
  #[inline(always)]
  fn end() {}
}

/// Scoped guard for the vector-register critical section.
///
/// In-kernel ports must save and restore wide register state around vector
/// math and may not block in between; modeling the begin/end pair as a guard
/// closes the section on every exit path. Userspace backends make both hooks
/// no-ops.
pub(crate) struct MathScope<V: Lane> {
  _marker: PhantomData<V>,
}

impl<V: Lane> MathScope<V> {
  #[inline(always)]
  pub(crate) fn enter() -> Self {
    V::begin();
    Self { _marker: PhantomData }
  }
}

impl<V: Lane> Drop for MathScope<V> {
  #[inline(always)]
  fn drop(&mut self) {
    V::end();
  }
}

/// `dst ^= src`, lane at a time. Lengths must match and be lane-granular.
#[inline(always)]
pub(crate) fn xor_into<V: Lane>(dst: &mut [u8], src: &[u8]) {
  debug_assert_eq!(dst.len(), src.len());
  debug_assert_eq!(dst.len() % V::WIDTH, 0);
  for (d, s) in dst.chunks_exact_mut(V::WIDTH).zip(src.chunks_exact(V::WIDTH)) {
    V::load(d).xor(V::load(s)).store(d);
  }
}

/// `dst *= c`, lane at a time.
#[inline(always)]
pub(crate) fn mul_into<V: Lane>(dst: &mut [u8], c: MulConst) {
  debug_assert_eq!(dst.len() % V::WIDTH, 0);
  for d in dst.chunks_exact_mut(V::WIDTH) {
    V::load(d).mul(c).store(d);
  }
}
