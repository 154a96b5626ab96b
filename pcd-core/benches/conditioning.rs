use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pcd_core::pointcloud::{
    decimation::decimator::voxel_downsample,
    filter::outlier::{remove_outliers, OutlierParams},
    normal::estimator::{estimate_normals, NormalParams},
    point::{Point, PointCloud},
};

fn room_floor(n: usize) -> PointCloud {
    let points = (0..n)
        .flat_map(|i| {
            (0..n).map(move |j| {
                let jitter = ((i * 31 + j * 17) % 13) as f64;
                Point::new(i as f64 * 40.0 + jitter, j as f64 * 40.0, jitter * 0.5)
            })
        })
        .collect();
    PointCloud::new("bench", points, "synthetic", HashMap::new())
}

fn conditioning(c: &mut Criterion) {
    let cloud = room_floor(60);

    c.bench_function("voxel_downsample 3600", |b| {
        b.iter(|| voxel_downsample(black_box(&cloud), 50.0))
    });
    c.bench_function("remove_outliers 3600", |b| {
        b.iter(|| remove_outliers(black_box(&cloud), &OutlierParams::default()))
    });
    c.bench_function("estimate_normals 3600", |b| {
        b.iter(|| estimate_normals(black_box(&cloud), &NormalParams::default()))
    });
}

criterion_group!(benches, conditioning);
criterion_main!(benches);
