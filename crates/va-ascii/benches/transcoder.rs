use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use va_ascii::FrameTranscoder;
use va_core::config::{EffectConfig, Quality, RenderConfig};
use va_core::frame::FrameBuffer;

fn noise_frame(width: u32, height: u32) -> FrameBuffer {
    let mut frame = FrameBuffer::new(width, height);
    let mut seed = 0x2545_f491_u32;
    for px in frame.data.chunks_exact_mut(4) {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let v = (seed & 0xff) as u8;
        px.copy_from_slice(&[v, v, v, 255]);
    }
    frame
}

fn bench_transcode(c: &mut Criterion) {
    let frame = noise_frame(1280, 720);

    for quality in [Quality::Low, Quality::Medium, Quality::High] {
        let config = RenderConfig {
            quality,
            ..RenderConfig::default()
        };
        let mut transcoder = FrameTranscoder::new(&config);
        c.bench_function(&format!("transcode_720p_{quality}"), |b| {
            b.iter(|| transcoder.transcode(black_box(&frame)));
        });
    }

    let config = RenderConfig {
        effects: EffectConfig {
            blur: 0.6,
            edge_detection: true,
            depth_effect: true,
            ..EffectConfig::default()
        },
        ..RenderConfig::default()
    };
    let mut transcoder = FrameTranscoder::new(&config);
    c.bench_function("transcode_720p_all_effects", |b| {
        b.iter(|| transcoder.transcode(black_box(&frame)));
    });
}

criterion_group!(benches, bench_transcode);
criterion_main!(benches);
