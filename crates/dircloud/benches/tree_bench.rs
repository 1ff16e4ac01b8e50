use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dircloud::loader::{load_reader, LoadOptions};
use dircloud::scanner::{ScanOptions, Scanner};
use dircloud::tree::TreeOptions;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A synthetic `du` report with `breadth_1 * breadth_2 * leaves` deepest
/// directories, written in post-order like `du` prints it.
fn generate_report(breadth_1: usize, breadth_2: usize, leaves: usize) -> String {
    let mut report = String::new();
    for i in 0..breadth_1 {
        for j in 0..breadth_2 {
            for k in 0..leaves {
                writeln!(report, "{}\t./dir1_{:03}/dir2_{:03}/leaf_{:03}", k + 4, i, j, k).unwrap();
            }
            writeln!(report, "{}\t./dir1_{:03}/dir2_{:03}", j * 10 + 8, i, j).unwrap();
        }
        writeln!(report, "{}\t./dir1_{:03}", i * 100 + 16, i).unwrap();
    }
    report.push_str("100000\t.\n");
    report
}

/// Directories on disk for the scanner: `breadth_1` top-level
/// directories, `breadth_2` below each, `files_per_dir` files in each of
/// those.
fn create_benchmark_tree(root: &Path, breadth_1: usize, breadth_2: usize, files_per_dir: usize) {
    fs::create_dir_all(root).unwrap();
    for i in 0..breadth_1 {
        for j in 0..breadth_2 {
            let dir = root.join(format!("dir1_{:03}", i)).join(format!("dir2_{:03}", j));
            fs::create_dir_all(&dir).unwrap();
            for k in 0..files_per_dir {
                fs::write(dir.join(format!("file_{:03}.txt", k)), "x".repeat(100)).unwrap();
            }
        }
    }
}

fn bench_load_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_report");

    for (label, shape) in [("small", (5, 10, 20)), ("large", (20, 50, 40))] {
        let report = generate_report(shape.0, shape.1, shape.2);
        for aggregate in [false, true] {
            let options = LoadOptions {
                unit: 1024,
                tree: TreeOptions {
                    aggregate,
                    ..TreeOptions::default()
                },
            };
            let id = BenchmarkId::new(label, if aggregate { "aggregate" } else { "plain" });
            group.bench_with_input(id, &report, |b, report| {
                b.iter(|| load_reader(black_box(report.as_bytes()), options).unwrap())
            });
        }
    }

    group.finish();
}

fn bench_lookups(c: &mut Criterion) {
    let report = generate_report(20, 50, 40);
    let (tree, _) = load_reader(report.as_bytes(), LoadOptions::default()).unwrap();

    c.bench_function("get_branch", |b| {
        b.iter(|| tree.get_branch(black_box("/dir1_010/dir2_025/leaf_020")))
    });
    c.bench_function("children", |b| {
        b.iter(|| tree.children(black_box("/dir1_010/dir2_025/")).len())
    });
    c.bench_function("branch_names", |b| {
        b.iter(|| tree.branch_names(black_box("/dir1_010/"), true))
    });
    c.bench_function("last_descendant_branch", |b| {
        b.iter(|| tree.last_descendant_branch(black_box("/dir1_010/")))
    });
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");

    let temp = TempDir::new().unwrap();
    create_benchmark_tree(temp.path(), 5, 10, 20);

    for all in [false, true] {
        let options = ScanOptions {
            all,
            ..ScanOptions::default()
        };
        group.bench_with_input(
            BenchmarkId::new("5x10x20", if all { "all" } else { "dirs" }),
            &temp.path(),
            |b, path| b.iter(|| Scanner::new(black_box(path), options).scan().unwrap()),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_load_report, bench_lookups, bench_scan);
criterion_main!(benches);
