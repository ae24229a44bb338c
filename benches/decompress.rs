use std::collections::BTreeMap;

use bumpalo::Bump;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use colpack::{decompress, ColumnBuilder, Path, Request, Value};

fn row(i: u64) -> Value {
    let mut pos = BTreeMap::new();
    pos.insert("x".to_string(), Value::from((i % 100) as i64));
    pos.insert("y".to_string(), Value::from(-((i % 7) as i64)));
    let mut map = BTreeMap::new();
    map.insert("id".to_string(), Value::from(i));
    map.insert("live".to_string(), Value::from(i % 2 == 0));
    map.insert("pos".to_string(), Value::Map(pos));
    Value::Map(map)
}

fn build_region(rows: u64) -> Vec<u8> {
    let mut builder = ColumnBuilder::new();
    for i in 0..rows {
        builder.append(&row(i)).unwrap();
    }
    builder.finish().unwrap()
}

fn bench_decompress(c: &mut Criterion) {
    let rows = 10_000;
    let bytes = build_region(rows);

    let mut group = c.benchmark_group("decompress");
    group.throughput(Throughput::Elements(rows));

    group.bench_function("one_scalar_path", |b| {
        b.iter(|| {
            let arena = Bump::new();
            let mut requests = [Request::new("id")];
            decompress(&arena, black_box(&bytes), &mut requests).unwrap();
            black_box(requests[0].buffer().len())
        })
    });

    group.bench_function("three_scalar_paths", |b| {
        b.iter(|| {
            let arena = Bump::new();
            let mut requests = [
                Request::new("id"),
                Request::new("live"),
                Request::new("pos.x"),
            ];
            decompress(&arena, black_box(&bytes), &mut requests).unwrap();
            black_box(requests[0].buffer().len())
        })
    });

    group.bench_function("whole_rows", |b| {
        b.iter(|| {
            let arena = Bump::new();
            let mut requests = [Request::new(Path::root())];
            decompress(&arena, black_box(&bytes), &mut requests).unwrap();
            black_box(requests[0].buffer().len())
        })
    });

    group.finish();
}

fn bench_compress(c: &mut Criterion) {
    let rows: Vec<Value> = (0..10_000).map(row).collect();
    let mut group = c.benchmark_group("compress");
    group.throughput(Throughput::Elements(rows.len() as u64));
    group.bench_function("build_region", |b| {
        b.iter(|| {
            let mut builder = ColumnBuilder::new();
            for row in &rows {
                builder.append(row).unwrap();
            }
            black_box(builder.finish().unwrap())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_decompress, bench_compress);
criterion_main!(benches);
