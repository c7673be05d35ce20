use criterion::{criterion_group, criterion_main, Criterion};
use image::{Rgba, RgbaImage};
use watermark::position::Placement;
use watermark::{stamp, Canvas, OutputFormat};

// Run with:
//    cargo bench --bench compose_bench

fn sample(width: u32, height: u32, px: [u8; 4]) -> Canvas {
    Canvas::from_rgba(RgbaImage::from_pixel(width, height, Rgba(px)))
}

/// Bench: stamping a semi-transparent mark
fn bench_stamp(c: &mut Criterion) {
    let target = sample(1024, 768, [255, 255, 255, 255]);
    let mark = sample(200, 80, [0, 0, 0, 128]);
    let draw = stamp::image(Placement::LowerRight, 0.5);

    c.bench_function("stamp_lower_right", |b| {
        b.iter(|| draw(target.clone(), mark.clone()))
    });
}

/// Bench: PNG data URL encoding
fn bench_data_url(c: &mut Criterion) {
    let canvas = sample(512, 512, [10, 120, 200, 255]);
    c.bench_function("data_url_png", |b| {
        b.iter(|| watermark::convert::data_url(&canvas, OutputFormat::Png).unwrap())
    });
}

/// Bench: whole pipeline from in-memory resources
fn bench_pipeline(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let target = watermark::convert::encode(&sample(640, 480, [255, 255, 255, 255]), OutputFormat::Png).unwrap();
    let mark = watermark::convert::encode(&sample(64, 64, [255, 0, 0, 200]), OutputFormat::Png).unwrap();

    c.bench_function("pipeline_data_url", |b| {
        b.iter(|| {
            rt.block_on(async {
                watermark::watermark([target.clone(), mark.clone()])
                    .data_url(stamp::image(Placement::Center, 0.7))
                    .await
                    .unwrap()
            })
        })
    });
}

criterion_group!(benches, bench_stamp, bench_data_url, bench_pipeline);
criterion_main!(benches);
