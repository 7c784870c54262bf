//! NEON kernel: 16-byte lanes.
//!
//! Same construction as the AVX2 kernel with `vqtbl1q_u8` as the nibble
//! shuffle. Advanced SIMD is baseline on AArch64, so the feature gate is a
//! formality kept for candidate-list uniformity.

#![allow(unsafe_code)]

use core::arch::aarch64::*;

use super::{Lane, MulConst};
use crate::dispatch::RaidzBackend;
use crate::gf;
use crate::map::RaidzMap;
use crate::{gen, rec};

#[derive(Clone, Copy)]
pub(crate) struct Neon(uint8x16_t);

impl Lane for Neon {
  const WIDTH: usize = 16;

  #[inline(always)]
  fn load(src: &[u8]) -> Self {
    debug_assert!(src.len() >= Self::WIDTH);
    // SAFETY: bounds checked above.
    Self(unsafe { vld1q_u8(src.as_ptr()) })
  }

  #[inline(always)]
  fn store(self, dst: &mut [u8]) {
    debug_assert!(dst.len() >= Self::WIDTH);
    // SAFETY: bounds checked above.
    unsafe { vst1q_u8(dst.as_mut_ptr(), self.0) }
  }

  #[inline(always)]
  fn xor(self, other: Self) -> Self {
    // SAFETY: NEON baseline.
    Self(unsafe { veorq_u8(self.0, other.0) })
  }

  #[inline(always)]
  fn mul2(self) -> Self {
    // SAFETY: NEON baseline.
    unsafe {
      // Arithmetic shift of the sign bit yields the all-ones mask for bytes
      // whose high bit was set.
      let mask = vreinterpretq_u8_s8(vshrq_n_s8::<7>(vreinterpretq_s8_u8(self.0)));
      let dbl = vshlq_n_u8::<1>(self.0);
      Self(veorq_u8(dbl, vandq_u8(mask, vdupq_n_u8(gf::FIELD_MOD))))
    }
  }

  #[inline(always)]
  fn mul(self, c: MulConst) -> Self {
    // SAFETY: NEON baseline; nibble tables are exactly 16 bytes.
    unsafe {
      let tbl_lo = vld1q_u8(gf::nib_lo(c.0).as_ptr());
      let tbl_hi = vld1q_u8(gf::nib_hi(c.0).as_ptr());
      let nib = vdupq_n_u8(0x0f);

      let lo_prod = vqtbl1q_u8(tbl_lo, vandq_u8(self.0, nib));
      let hi_prod = vqtbl1q_u8(tbl_hi, vandq_u8(vshrq_n_u8::<4>(self.0), nib));
      Self(veorq_u8(lo_prod, hi_prod))
    }
  }

  /// Expand the log through the antilog table, as for AVX2.
  #[inline(always)]
  fn fix_mul_exp(e: usize) -> MulConst {
    MulConst(gf::pow2(e))
  }
}

fn gen_p(rm: &mut RaidzMap) {
  gen::generate_p::<Neon>(rm);
}

fn gen_pq(rm: &mut RaidzMap) {
  gen::generate_pq::<Neon>(rm);
}

fn gen_pqr(rm: &mut RaidzMap) {
  gen::generate_pqr::<Neon>(rm);
}

fn rec_p(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_p::<Neon>(rm, tgt)
}

fn rec_q(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_q::<Neon>(rm, tgt)
}

fn rec_r(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_r::<Neon>(rm, tgt)
}

fn rec_pq(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_pq::<Neon>(rm, tgt)
}

fn rec_pr(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_pr::<Neon>(rm, tgt)
}

fn rec_qr(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_qr::<Neon>(rm, tgt)
}

fn rec_pqr(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_pqr::<Neon>(rm, tgt)
}

/// The NEON backend table.
pub(crate) static OPS: RaidzBackend = RaidzBackend {
  name: "aarch64/neon",
  gen: [gen_p, gen_pq, gen_pqr],
  rec: [rec_p, rec_q, rec_r, rec_pq, rec_pr, rec_qr, rec_pqr],
};
