//! Benchmarks for pixfx kernels and whole-frame renders.
//!
//! Run with: `cargo bench`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use pixfx_core::{Channel, ChannelLayout, ChannelSet, Color3, Format, Frame, LuminanceMode};
use pixfx_ops::keyer::{self, Compensation, KeyerParams, KeyerSettings};
use pixfx_ops::prelude::*;
use pixfx_ops::radial::RaysSettings;
use pixfx_ops::{contrast, render_frame, vibrance, RenderContext, RowDriver};

fn gradient_frame(size: u32) -> Frame {
    let mut frame = Frame::new(size, size, ChannelLayout::rgba()).unwrap();
    let scale = 1.0 / size as f32;
    for y in 0..size {
        for x in 0..size {
            frame.set(x, y, Channel::RED, x as f32 * scale);
            frame.set(x, y, Channel::GREEN, y as f32 * scale);
            frame.set(x, y, Channel::BLUE, 0.5);
            frame.set(x, y, Channel::ALPHA, 1.0);
        }
    }
    frame
}

/// Benchmark the per-pixel color kernels.
fn bench_pixel_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("pixel_kernels");

    for size in [1000, 10000, 100000].iter() {
        let colors: Vec<Color3> = (0..*size)
            .map(|i| {
                let t = i as f32 / *size as f32;
                Color3::new(t, 1.0 - t, 0.5 * t)
            })
            .collect();

        group.throughput(Throughput::Elements(*size as u64));

        let params = KeyerParams::new(
            Color3::new(0.1, 0.6, 0.2),
            LuminanceMode::Rec709,
            0.5,
            2.0,
        )
        .with_shadow(1.0)
        .with_compensation(Compensation::default());
        group.bench_with_input(BenchmarkId::new("keyer", size), &colors, |b, v| {
            b.iter(|| {
                v.iter()
                    .map(|&c| keyer::compose(black_box(c), c, &params))
                    .collect::<Vec<_>>()
            })
        });

        group.bench_with_input(BenchmarkId::new("vibrance", size), &colors, |b, v| {
            b.iter(|| {
                v.iter()
                    .map(|&c| vibrance::apply(black_box(c), 2.0, LuminanceMode::Rec709))
                    .collect::<Vec<_>>()
            })
        });

        group.bench_with_input(BenchmarkId::new("contrast", size), &colors, |b, v| {
            b.iter(|| {
                v.iter()
                    .map(|c| contrast::apply(black_box(c.r), 1.4, contrast::DEFAULT_PIVOT))
                    .collect::<Vec<_>>()
            })
        });
    }

    group.finish();
}

/// Benchmark whole-frame renders through the row driver.
fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(20);

    for size in [128u32, 512].iter() {
        let bg = gradient_frame(*size);
        let screen = gradient_frame(*size);
        let format = Format::new(*size, *size);
        group.throughput(Throughput::Elements(format.area() as u64));

        let keyer = RowDriver::<Keyer>::new(
            &KeyerSettings {
                reference_color: [0.1, 0.6, 0.2],
                highlights: 2.0,
                ..Default::default()
            },
            format,
        )
        .unwrap();
        let ctx = RenderContext::from_source(&bg).with_input(&screen);
        group.bench_with_input(BenchmarkId::new("keyer", size), &ctx, |b, ctx| {
            b.iter(|| render_frame(&keyer, black_box(ctx), ChannelSet::RGB).unwrap())
        });

        let toon = RowDriver::<Toon>::new(&ToonSettings::default(), format).unwrap();
        let ctx = RenderContext::from_source(&bg);
        group.bench_with_input(BenchmarkId::new("toon_gaussian", size), &ctx, |b, ctx| {
            b.iter(|| render_frame(&toon, black_box(ctx), ChannelSet::RGB).unwrap())
        });

        let rays = RowDriver::<CircularRays>::new(&RaysSettings::default(), format).unwrap();
        let ctx = RenderContext::new(format, ChannelLayout::rgba());
        group.bench_with_input(BenchmarkId::new("circular_rays", size), &ctx, |b, ctx| {
            b.iter(|| render_frame(&rays, black_box(ctx), ChannelSet::RGBA).unwrap())
        });
    }

    group.finish();
}

/// Benchmark separable filter weight generation.
fn bench_toon_weights(c: &mut Criterion) {
    let mut group = c.benchmark_group("toon_weights");

    for filter in [ToonFilter::Box, ToonFilter::Triangle, ToonFilter::Quadratic, ToonFilter::Gaussian] {
        group.bench_with_input(
            BenchmarkId::new(format!("{filter:?}"), 64),
            &filter,
            |b, f| b.iter(|| f.weights(black_box(64.0))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_pixel_kernels, bench_render, bench_toon_weights);

criterion_main!(benches);
