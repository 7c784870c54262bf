//! Generation and reconstruction throughput.
//!
//! Mirrors the original harness's benchmark mode: one group per generation
//! op, one per reconstruction case, across the available backends.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use raidz::RaidzMap;

const ASHIFT: usize = 12;
const DCOLS: usize = 8;

fn payload(sectors: usize) -> Vec<u8> {
  let mut state = 0x1234_5678_9abc_def0u64;
  (0..sectors << ASHIFT)
    .map(|_| {
      state ^= state << 13;
      state ^= state >> 7;
      state ^= state << 17;
      state as u8
    })
    .collect()
}

fn backends() -> Vec<&'static str> {
  raidz::backend_names()
    .filter(|name| raidz::set_backend(name).is_ok())
    .collect()
}

fn bench_generate(c: &mut Criterion) {
  let data = payload(DCOLS);
  let mut group = c.benchmark_group("generate");
  group.throughput(Throughput::Bytes(data.len() as u64));

  for parity in 1..=3 {
    for name in backends() {
      raidz::set_backend(name).unwrap();
      let mut rm = RaidzMap::new(DCOLS + parity, parity, ASHIFT, 0, &data);
      group.bench_with_input(BenchmarkId::new(format!("p{parity}"), name), &(), |b, _| {
        b.iter(|| rm.generate_parity());
      });
    }
  }
  group.finish();
}

fn bench_reconstruct(c: &mut Criterion) {
  let data = payload(DCOLS);
  let cases: &[(&str, usize, &[usize])] = &[
    ("p", 1, &[4]),
    ("q", 2, &[4]),
    ("r", 3, &[4]),
    ("pq", 2, &[3, 6]),
    ("pr", 3, &[3, 6]),
    ("qr", 3, &[3, 6]),
    ("pqr", 3, &[3, 6, 9]),
  ];

  let mut group = c.benchmark_group("reconstruct");
  group.throughput(Throughput::Bytes(data.len() as u64));

  for &(case, parity, targets) in cases {
    let parity_valid = match case {
      "p" | "pq" => [true, true, false],
      "q" | "qr" => [false, true, true],
      "r" => [false, false, true],
      "pr" => [true, false, true],
      _ => [true, true, true],
    };
    for name in backends() {
      raidz::set_backend(name).unwrap();
      let mut rm = RaidzMap::new(DCOLS + parity, parity, ASHIFT, 0, &data);
      rm.generate_parity();
      group.bench_with_input(BenchmarkId::new(case, name), &(), |b, _| {
        b.iter(|| rm.reconstruct_data(parity_valid, targets));
      });
    }
  }
  group.finish();
}

criterion_group!(benches, bench_generate, bench_reconstruct);
criterion_main!(benches);
