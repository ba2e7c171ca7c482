use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use crtv_core::{make_engine, BroadcastTag, ColourTag, FrameData, ACTIVE_WIDTH};

fn grey_frame(width: usize, height: usize) -> FrameData {
    let mut frame = FrameData::new(width, height);
    for p in frame.pixels.iter_mut() {
        *p = 0xFF80_8080;
    }
    frame
}

fn benchmark_process_frame_by_colour_system(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_frame");

    for &(colour, broadcast, label) in &[
        (ColourTag::Pal, BroadcastTag::I, "pal_i"),
        (ColourTag::Ntsc, BroadcastTag::M, "ntsc_m"),
        (ColourTag::Secam, BroadcastTag::L, "secam_l"),
    ] {
        let mut engine = make_engine(broadcast, colour, 5.0, 0.7, 0.0, 0.0, 1.0).expect("engine builds");
        let height = broadcast.standard().video_scanlines as usize;
        let input = grey_frame(ACTIVE_WIDTH, height);

        group.bench_with_input(BenchmarkId::from_parameter(label), label, |b, _| {
            b.iter(|| engine.process_frame(black_box(&input), black_box(0.02), black_box(0.1)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_process_frame_by_colour_system);
criterion_main!(benches);
