//! Portable scalar kernel.
//!
//! Lanes are two native 64-bit words (16 bytes). Addition is XOR on whole
//! words; the doubling works on all 8 bytes of a word at once with a
//! branch-free mask trick; constant multiply walks the direct product table
//! one byte at a time.

use super::{Lane, MulConst};
use crate::dispatch::RaidzBackend;
use crate::gf;
use crate::map::RaidzMap;
use crate::{gen, rec};

/// Per-byte constants replicated across a 64-bit word.
const MOD: u64 = 0x1d1d_1d1d_1d1d_1d1d;
const MASK: u64 = 0xfefe_fefe_fefe_fefe;
const MSB: u64 = 0x8080_8080_8080_8080;

#[inline(always)]
fn word_mul2(a: u64) -> u64 {
  // Build a per-byte 0x00/0xff mask from the high bits. The shifts cross
  // byte boundaries, but the borrow arithmetic cancels exactly so each byte
  // ends up 0xff iff its own msb was set.
  let cmp = a & MSB;
  let mask = (cmp << 1).wrapping_sub(cmp >> 7);
  let dbl = (a << 1) & MASK;
  dbl ^ (mask & MOD)
}

#[inline(always)]
fn load_word(src: &[u8]) -> u64 {
  let mut w = [0u8; 8];
  w.copy_from_slice(&src[..8]);
  u64::from_le_bytes(w)
}

/// Native-word scalar lane: 2 x u64.
#[derive(Clone, Copy)]
pub(crate) struct Scalar([u64; 2]);

impl Lane for Scalar {
  const WIDTH: usize = 16;

  #[inline(always)]
  fn load(src: &[u8]) -> Self {
    debug_assert!(src.len() >= Self::WIDTH);
    Self([load_word(&src[..8]), load_word(&src[8..16])])
  }

  #[inline(always)]
  fn store(self, dst: &mut [u8]) {
    debug_assert!(dst.len() >= Self::WIDTH);
    dst[..8].copy_from_slice(&self.0[0].to_le_bytes());
    dst[8..16].copy_from_slice(&self.0[1].to_le_bytes());
  }

  #[inline(always)]
  fn xor(self, other: Self) -> Self {
    Self([self.0[0] ^ other.0[0], self.0[1] ^ other.0[1]])
  }

  #[inline(always)]
  fn mul2(self) -> Self {
    Self([word_mul2(self.0[0]), word_mul2(self.0[1])])
  }

  #[inline(always)]
  fn mul(self, c: MulConst) -> Self {
    let row = &gf::MUL_LT[c.0 as usize];
    let mut out = [0u64; 2];
    for (o, w) in out.iter_mut().zip(self.0.iter()) {
      let mut bytes = w.to_le_bytes();
      for b in &mut bytes {
        *b = row[*b as usize];
      }
      *o = u64::from_le_bytes(bytes);
    }
    Self(out)
  }

  /// Keep the multiplier in log form; the product table is indexed by logs.
  #[inline(always)]
  fn fix_mul_exp(e: usize) -> MulConst {
    MulConst((e % 255) as u8)
  }
}

fn gen_p(rm: &mut RaidzMap) {
  gen::generate_p::<Scalar>(rm);
}

fn gen_pq(rm: &mut RaidzMap) {
  gen::generate_pq::<Scalar>(rm);
}

fn gen_pqr(rm: &mut RaidzMap) {
  gen::generate_pqr::<Scalar>(rm);
}

fn rec_p(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_p::<Scalar>(rm, tgt)
}

fn rec_q(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_q::<Scalar>(rm, tgt)
}

fn rec_r(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_r::<Scalar>(rm, tgt)
}

fn rec_pq(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_pq::<Scalar>(rm, tgt)
}

fn rec_pr(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_pr::<Scalar>(rm, tgt)
}

fn rec_qr(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_qr::<Scalar>(rm, tgt)
}

fn rec_pqr(rm: &mut RaidzMap, tgt: &[usize]) -> u8 {
  rec::reconstruct_pqr::<Scalar>(rm, tgt)
}

/// The always-available scalar backend.
pub(crate) static OPS: RaidzBackend = RaidzBackend {
  name: "scalar",
  gen: [gen_p, gen_pq, gen_pqr],
  rec: [rec_p, rec_q, rec_r, rec_pq, rec_pr, rec_qr, rec_pqr],
};
