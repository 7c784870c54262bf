//! CPU capability representation.
//!
//! [`Caps`] is a 64-bit feature bitset. Each bit corresponds to one ISA
//! extension; the bits are architecture-specific but the API is uniform.
//!
//! # Bit layout
//!
//! - Bits 0-31: x86/x86_64 features
//! - Bits 32-47: aarch64 features
//! - Bits 48-63: reserved

/// CPU capabilities: a 64-bit feature bitset.
///
/// This is the core type for capability-based dispatch. Use
/// [`has()`](Caps::has) to check whether required features are available.
///
/// `Caps` is `Copy`, `Send`, and `Sync`; it can be freely shared across
/// threads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Caps(u64);

impl Caps {
  /// Empty capability set (no features).
  pub const NONE: Self = Self(0);

  /// Create a capability set from raw bits.
  #[inline]
  #[must_use]
  pub const fn from_raw(bits: u64) -> Self {
    Self(bits)
  }

  /// Access the raw underlying bits.
  #[inline]
  #[must_use]
  pub const fn as_raw(self) -> u64 {
    self.0
  }

  /// Check if all features in `required` are present.
  ///
  /// This is the core dispatch check.
  #[inline(always)]
  #[must_use]
  pub const fn has(self, required: Self) -> bool {
    (self.0 & required.0) == required.0
  }

  /// Union of two capability sets.
  #[inline]
  #[must_use]
  pub const fn union(self, other: Self) -> Self {
    Self(self.0 | other.0)
  }

  /// Intersection of two capability sets.
  #[inline]
  #[must_use]
  pub const fn intersection(self, other: Self) -> Self {
    Self(self.0 & other.0)
  }

  /// Check if the capability set is empty.
  #[inline]
  #[must_use]
  pub const fn is_empty(self) -> bool {
    self.0 == 0
  }

  /// Create a capability set with a single bit set.
  #[inline]
  #[must_use]
  pub const fn bit(bit: u8) -> Self {
    Self(1u64 << (bit as u64 % 64))
  }
}

impl core::ops::BitOr for Caps {
  type Output = Self;

  #[inline]
  fn bitor(self, rhs: Self) -> Self::Output {
    self.union(rhs)
  }
}

impl core::ops::BitAnd for Caps {
  type Output = Self;

  #[inline]
  fn bitand(self, rhs: Self) -> Self::Output {
    self.intersection(rhs)
  }
}

impl core::ops::BitOrAssign for Caps {
  #[inline]
  fn bitor_assign(&mut self, rhs: Self) {
    *self = self.union(rhs);
  }
}

/// x86/x86_64 feature bits.
pub mod x86 {
  use super::Caps;

  /// SSSE3 (byte shuffles).
  pub const SSSE3: Caps = Caps::bit(0);
  /// AVX2 (256-bit integer ops).
  pub const AVX2: Caps = Caps::bit(1);
  /// AVX-512BW (512-bit byte/word ops).
  pub const AVX512BW: Caps = Caps::bit(2);
}

/// aarch64 feature bits.
pub mod aarch64 {
  use super::Caps;

  /// Advanced SIMD. Baseline on AArch64; the bit exists so candidate lists
  /// stay uniform across architectures.
  pub const NEON: Caps = Caps::bit(32);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn none_is_empty() {
    assert!(Caps::NONE.is_empty());
    assert_eq!(Caps::NONE.as_raw(), 0);
  }

  #[test]
  fn has_requires_all_bits() {
    let both = x86::SSSE3 | x86::AVX2;
    assert!(both.has(x86::SSSE3));
    assert!(both.has(x86::AVX2));
    assert!(both.has(both));
    assert!(!x86::SSSE3.has(both));
  }

  #[test]
  fn every_set_has_none() {
    assert!(Caps::NONE.has(Caps::NONE));
    assert!(x86::AVX2.has(Caps::NONE));
  }

  #[test]
  fn union_and_intersection() {
    let a = x86::SSSE3 | x86::AVX2;
    let b = x86::AVX2 | x86::AVX512BW;
    assert_eq!(a & b, x86::AVX2);
    assert!((a | b).has(x86::SSSE3 | x86::AVX512BW));
  }

  #[test]
  fn arch_bit_ranges_disjoint() {
    assert!((x86::SSSE3 | x86::AVX2 | x86::AVX512BW)
      .intersection(aarch64::NEON)
      .is_empty());
  }
}
