use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use encoding_rs::UTF_8;
use sheetflow::analysis::{analyze, prepare};
use sheetflow::io_utils;
use sheetflow::overlap::detect_overlaps;
use sheetflow::profile::ColumnProfile;
use tempfile::TempDir;

fn generate_lots(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("lots.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(file, "codes,lotno,Testdate,shipdate,serialst,serialsp,testedqty,goodqty").expect("header");
    for i in 0..rows {
        let code = format!("P{:02}", i % 40);
        let start = (i / 40) * 100 + 1;
        // every seventh lot reaches into the next range
        let end = if i % 7 == 0 { start + 120 } else { start + 99 };
        let day = (i % 28) + 1;
        let tested = 1000 + (i % 500);
        let good = tested - (i % 37);
        writeln!(
            file,
            "{code},L{i:06},2024-01-{day:02},2024-02-{day:02},{start},{end},{tested},{good}"
        )
        .expect("row");
    }
    (temp_dir, csv_path)
}

fn bench_overlap_detection(c: &mut Criterion) {
    let (temp_dir, csv_path) = generate_lots(50_000);
    let raw = io_utils::read_table(&csv_path, b',', UTF_8).expect("read lots");
    let config = ColumnProfile::default()
        .pipeline_config(&[])
        .expect("pipeline config");
    let prepared = prepare(&raw, &config).expect("prepare lots");

    let mut group = c.benchmark_group("lot_analysis");

    group.bench_function("detect_overlaps", |b| {
        b.iter(|| detect_overlaps(&prepared.table).expect("detect overlaps"));
    });

    group.bench_function("full_pipeline", |b| {
        b.iter_batched(
            || (),
            |_| {
                analyze(&raw, &config).expect("analyze lots");
            },
            BatchSize::SmallInput,
        );
    });

    drop(temp_dir);
    group.finish();
}

criterion_group!(benches, bench_overlap_detection);
criterion_main!(benches);
