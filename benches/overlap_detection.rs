use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use readjoin::io::ReadSet;
use readjoin::ovlfind::kmp::FailureTable;
use readjoin::ovlfind::{brute_force, dp, kmp, OverlapMode};
use readjoin::pairwise::NoProgress;
use readjoin::{find_all_pairs, Backend, PairwiseConfig};

/// Generate reads where each one starts with the suffix of the previous read
fn generate_overlapping_reads(
    num_reads: usize,
    read_len: usize,
    overlap_len: usize,
) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(42);
    let bases = b"acgt";
    let mut random =
        |len: usize| -> Vec<u8> { (0..len).map(|_| bases[rng.gen_range(0..4)]).collect() };

    let mut reads = Vec::with_capacity(num_reads);
    reads.push(random(read_len));
    for i in 1..num_reads {
        let prev: &Vec<u8> = &reads[i - 1];
        let mut read = prev[prev.len() - overlap_len..].to_vec();
        read.extend(random(read_len - overlap_len));
        reads.push(read);
    }
    reads
}

/// Single pair, all three matchers
fn bench_matchers(c: &mut Criterion) {
    let mut group = c.benchmark_group("matchers");

    for read_len in [100, 400, 1000] {
        let reads = generate_overlapping_reads(2, read_len, read_len / 3);
        let (u, v) = (reads[0].as_slice(), reads[1].as_slice());
        let (u_table, v_table) = (FailureTable::new(u).unwrap(), FailureTable::new(v).unwrap());
        group.throughput(Throughput::Bytes((u.len() + v.len()) as u64));

        group.bench_with_input(BenchmarkId::new("brute_force", read_len), &read_len, |b, _| {
            b.iter(|| {
                brute_force::find(black_box(u), Some(v), OverlapMode::All, 20, false, |o| {
                    black_box(o);
                })
            })
        });
        group.bench_with_input(BenchmarkId::new("kmp", read_len), &read_len, |b, _| {
            b.iter(|| {
                let other = Some((v, &v_table));
                kmp::find(black_box(u), &u_table, other, OverlapMode::All, 20, false, |o| {
                    black_box(o);
                })
            })
        });
        group.bench_with_input(BenchmarkId::new("edit_distance", read_len), &read_len, |b, _| {
            let mut scratch = dp::DpScratch::new();
            b.iter(|| {
                dp::find_with_scratch(
                    &mut scratch,
                    black_box(u),
                    Some(v),
                    0.05,
                    OverlapMode::All,
                    20,
                    false,
                    |o| {
                        black_box(o);
                    },
                )
            })
        });
    }

    group.finish();
}

/// All-pairs sweep over both strands
fn bench_all_pairs(c: &mut Criterion) {
    let mut group = c.benchmark_group("all_pairs");
    group.sample_size(10);

    for num_reads in [10, 50, 100] {
        let set = ReadSet::with_reverse_complements(generate_overlapping_reads(num_reads, 150, 50));
        let config = PairwiseConfig { min_length: 20, ..Default::default() };

        for backend in [Backend::BruteForce, Backend::Kmp] {
            group.bench_with_input(BenchmarkId::new(backend.name(), num_reads), &set, |b, set| {
                b.iter(|| {
                    let mut found = 0usize;
                    find_all_pairs(set, backend, &config, None, &NoProgress, |_| found += 1)
                        .unwrap();
                    black_box(found)
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_matchers, bench_all_pairs);
criterion_main!(benches);
