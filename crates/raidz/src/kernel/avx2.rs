//! AVX2 kernel: 32-byte lanes.
//!
//! Doubling uses a sign-compare to build the per-byte modulus mask; constant
//! multiply is the split-nibble `vpshufb` construction over the pre-expanded
//! product tables.
//!
//! # Safety
//!
//! Every entry point is compiled with `#[target_feature(enable = "avx2")]`
//! and is only reachable through the dispatch registry, which lists this
//! backend behind the AVX2 capability bit. The lane methods themselves are
//! `#[inline(always)]` so they inline into the feature-enabled frames.

#![allow(unsafe_code)]

use core::arch::x86_64::*;

use super::{Lane, MulConst};
use crate::dispatch::RaidzBackend;
use crate::gf;
use crate::map::RaidzMap;
use crate::{gen, rec};

#[derive(Clone, Copy)]
pub(crate) struct Avx2(__m256i);

impl Lane for Avx2 {
  const WIDTH: usize = 32;

  #[inline(always)]
  fn load(src: &[u8]) -> Self {
    debug_assert!(src.len() >= Self::WIDTH);
    // SAFETY: bounds checked above; unaligned load is explicit.
    Self(unsafe { _mm256_loadu_si256(src.as_ptr() as *const __m256i) })
  }

  #[inline(always)]
  fn store(self, dst: &mut [u8]) {
    debug_assert!(dst.len() >= Self::WIDTH);
    // SAFETY: bounds checked above; unaligned store is explicit.
    unsafe { _mm256_storeu_si256(dst.as_mut_ptr() as *mut __m256i, self.0) }
  }

  #[inline(always)]
  fn xor(self, other: Self) -> Self {
    // SAFETY: module contract.
    Self(unsafe { _mm256_xor_si256(self.0, other.0) })
  }

  #[inline(always)]
  fn mul2(self) -> Self {
    // SAFETY: module contract.
    unsafe {
      // Bytes with the high bit set compare negative; the resulting
      // all-ones lanes select the modulus after the shift.
      let mask = _mm256_cmpgt_epi8(_mm256_setzero_si256(), self.0);
      let dbl = _mm256_add_epi8(self.0, self.0);
      Self(_mm256_xor_si256(dbl, _mm256_and_si256(mask, _mm256_set1_epi8(gf::FIELD_MOD as i8))))
    }
  }

  #[inline(always)]
  fn mul(self, c: MulConst) -> Self {
    // SAFETY: module contract; the nibble tables are 16 bytes, exactly one
    // 128-bit load each.
    unsafe {
      let lo = _mm_loadu_si128(gf::nib_lo(c.0).as_ptr() as *const __m128i);
      let hi = _mm_loadu_si128(gf::nib_hi(c.0).as_ptr() as *const __m128i);
      let tbl_lo = _mm256_broadcastsi128_si256(lo);
      let tbl_hi = _mm256_broadcastsi128_si256(hi);
      let nib = _mm256_set1_epi8(0x0f);

      let lo_prod = _mm256_shuffle_epi8(tbl_lo, _mm256_and_si256(self.0, nib));
      let hi_prod = _mm256_shuffle_epi8(tbl_hi, _mm256_and_si256(_mm256_srli_epi64::<4>(self.0), nib));
      Self(_mm256_xor_si256(lo_prod, hi_prod))
    }
  }

  /// Expand the log through the antilog table; the shuffle multiply is
  /// indexed by the constant itself.
  #[inline(always)]
  fn fix_mul_exp(e: usize) -> MulConst {
    MulConst(gf::pow2(e))
  }
}

#[target_feature(enable = "avx2")]
unsafe fn gen_p_impl(rm: &mut RaidzMap) {
  gen::generate_p::<Avx2>(rm);
}

#[target_feature(enable = "avx2")]
unsafe fn gen_pq_impl(rm: &mut RaidzMap) {
  gen::generate_pq::<Avx2>(rm);
}

#[target_feature(enable = "avx2")]
unsafe fn gen_pqr_impl(rm: &mut RaidzMap) {
  gen::generate_pqr::<Avx2>(rm);
}

#[target_feature(enable = "avx2")]
unsafe fn rec_p_impl(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_p::<Avx2>(rm, tgt)
}

#[target_feature(enable = "avx2")]
unsafe fn rec_q_impl(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_q::<Avx2>(rm, tgt)
}

#[target_feature(enable = "avx2")]
unsafe fn rec_r_impl(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_r::<Avx2>(rm, tgt)
}

#[target_feature(enable = "avx2")]
unsafe fn rec_pq_impl(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_pq::<Avx2>(rm, tgt)
}

#[target_feature(enable = "avx2")]
unsafe fn rec_pr_impl(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_pr::<Avx2>(rm, tgt)
}

#[target_feature(enable = "avx2")]
unsafe fn rec_qr_impl(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_qr::<Avx2>(rm, tgt)
}

#[target_feature(enable = "avx2")]
unsafe fn rec_pqr_impl(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_pqr::<Avx2>(rm, tgt)
}

// Safe shims with the registry's function-pointer signatures. The registry
// only offers this backend when the AVX2 bit is present, which is the safety
// contract for the target_feature calls.

fn gen_p(rm: &mut RaidzMap) {
  unsafe { gen_p_impl(rm) }
}

fn gen_pq(rm: &mut RaidzMap) {
  unsafe { gen_pq_impl(rm) }
}

fn gen_pqr(rm: &mut RaidzMap) {
  unsafe { gen_pqr_impl(rm) }
}

fn rec_p(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  unsafe { rec_p_impl(rm, tgt) }
}

fn rec_q(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  unsafe { rec_q_impl(rm, tgt) }
}

fn rec_r(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  unsafe { rec_r_impl(rm, tgt) }
}

fn rec_pq(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  unsafe { rec_pq_impl(rm, tgt) }
}

fn rec_pr(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  unsafe { rec_pr_impl(rm, tgt) }
}

fn rec_qr(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  unsafe { rec_qr_impl(rm, tgt) }
}

fn rec_pqr(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  unsafe { rec_pqr_impl(rm, tgt) }
}

/// The AVX2 backend table.
pub(crate) static OPS: RaidzBackend = RaidzBackend {
  name: "x86_64/avx2",
  gen: [gen_p, gen_pq, gen_pqr],
  rec: [rec_p, rec_q, rec_r, rec_pq, rec_pr, rec_qr, rec_pqr],
};
