use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_validator::{SensorBatch, SensorRow};
use feature_engine::{FeatureEngineer, FeatureMatrix};

fn batch(rows: usize) -> SensorBatch {
    let rows = (0..rows)
        .map(|i| SensorRow {
            timestamp: None,
            rotational_speed_rpm: 1500.0 + (i % 50) as f64,
            torque_nm: 40.0,
            vibration_x_mm_s: 2.0,
            vibration_y_mm_s: 2.2,
            vibration_z_mm_s: 1.9,
            temperature_c: 70.0,
            pressure_bar: 5.0,
            flow_rate_lpm: 200.0,
        })
        .collect();
    SensorBatch {
        rows,
        report: Default::default(),
        synthetic_timestamps: true,
    }
}

fn bench_engineer(c: &mut Criterion) {
    let engineer = FeatureEngineer::default();
    let input = batch(10_000);
    c.bench_function("engineer_10k_rows", |b| b.iter(|| engineer.engineer(black_box(&input))));

    let table = engineer.engineer(&input);
    let required: Vec<String> = table.column_names().into_iter().rev().map(String::from).collect();
    c.bench_function("assemble_10k_rows", |b| {
        b.iter(|| FeatureMatrix::assemble(black_box(&table), &required))
    });
}

criterion_group!(benches, bench_engineer);
criterion_main!(benches);
