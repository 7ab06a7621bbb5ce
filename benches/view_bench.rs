use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndview::{CoordIter, NdArray};

fn bench_slice_composition(c: &mut Criterion) {
    let x = NdArray::from_fn(&[64, 64], |coord| (coord[0] * 64 + coord[1]) as i64);
    c.bench_function("slice_chain_64x64", |b| {
        b.iter(|| {
            let v = x
                .slice_expr("1:, ::2")
                .unwrap()
                .slice_expr("::-1, 3:")
                .unwrap();
            black_box(v.dims().len())
        })
    });
}

fn bench_coord_iteration(c: &mut Criterion) {
    c.bench_function("coord_iter_64x64", |b| {
        b.iter(|| {
            let mut it = CoordIter::new(&[64, 64]);
            let mut acc = 0usize;
            while let Some(coord) = it.advance() {
                acc += coord[1];
            }
            black_box(acc)
        })
    });
}

fn bench_gather(c: &mut Criterion) {
    let x = NdArray::from_fn(&[4096], |coord| coord[0] as i64);
    let idx = NdArray::from_fn(&[1024], |coord| ((coord[0] * 37) % 4096) as i64);
    c.bench_function("gather_1k_of_4k", |b| {
        b.iter(|| black_box(x.gather(&idx).unwrap().len()))
    });
}

criterion_group!(
    benches,
    bench_slice_composition,
    bench_coord_iteration,
    bench_gather
);
criterion_main!(benches);
