use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kvtree::{from_slice, to_string, Branch, Format, Index, Kv, Options, Tree};

fn service_tree(size: usize) -> Tree {
    let mut tree = Tree::new();
    let mut servers = Branch::new();
    for i in 0..size {
        servers.push(kvtree::tree!({
            "name": (format!("server-{}", i)),
            "port": (8000 + i as i64),
            "weight": (0.5 + i as f64),
            "enabled": (i % 2 == 0),
            "tags": ["primary", "eu-west"]
        }));
    }
    tree.insert("servers", servers);
    tree.insert("db", kvtree::tree!({"host": "db.local", "port": 5432, "pool": {"min": 1, "max": 16}}));
    tree
}

fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for size in [10, 100, 500].iter() {
        let tree = service_tree(*size);
        let json = to_string(&tree, &Options::json().with_indent(0)).unwrap();
        let yaml = to_string(&tree, &Options::yaml()).unwrap();

        group.bench_with_input(BenchmarkId::new("json", size), &json, |b, json| {
            b.iter(|| from_slice(Format::Json, black_box(json.as_bytes())))
        });
        group.bench_with_input(BenchmarkId::new("yaml", size), &yaml, |b, yaml| {
            b.iter(|| from_slice(Format::Yaml, black_box(yaml.as_bytes())))
        });
    }
    group.finish();
}

fn benchmark_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for size in [10, 100, 500].iter() {
        let tree = service_tree(*size);

        group.bench_with_input(BenchmarkId::new("json", size), &tree, |b, tree| {
            b.iter(|| to_string(black_box(tree), &Options::json()))
        });
        group.bench_with_input(BenchmarkId::new("yaml", size), &tree, |b, tree| {
            b.iter(|| to_string(black_box(tree), &Options::yaml()))
        });
    }
    group.finish();
}

fn benchmark_lookup(c: &mut Criterion) {
    let tree = service_tree(500);
    let index = Index::build(&tree);
    let key = "servers/499/tags/1";

    c.bench_function("get_by_full_key", |b| {
        b.iter(|| tree.get_by_full_key(black_box(key)))
    });

    c.bench_function("get_by_index", |b| {
        b.iter(|| {
            let path = index.get(black_box(key)).unwrap();
            tree.get(path)
        })
    });

    c.bench_function("build_index", |b| b.iter(|| Index::build(black_box(&tree))));
}

fn benchmark_export(c: &mut Criterion) {
    let mut kv = Kv::new(service_tree(100));
    kv.add_prefix("svc");

    c.bench_function("export_pairs", |b| b.iter(|| black_box(&kv).pairs()));
}

criterion_group!(
    benches,
    benchmark_decode,
    benchmark_encode,
    benchmark_lookup,
    benchmark_export
);
criterion_main!(benches);
