use criterion::{criterion_group, criterion_main, Criterion, black_box};

use voxray::core::byte_buffer::ByteBuffer;
use voxray::scene::{Rgba8, Scene, VoxModel};

/// Hollow shell with a checkerboard of palette indices
fn shell_model(size: u32) -> VoxModel {
    let mut model = VoxModel::empty([size, size, size]);
    for (i, c) in model.palette.iter_mut().enumerate() {
        *c = Rgba8::new(i as u8, 255 - i as u8, 128, 255);
    }
    let s = size as usize;
    for z in 0..s {
        for y in 0..s {
            for x in 0..s {
                let edge = x == 0 || y == 0 || z == 0 || x == s - 1 || y == s - 1 || z == s - 1;
                if edge {
                    model.voxel_data[x + y * s + z * s * s] = 1 + ((x + y + z) % 2) as u8;
                }
            }
        }
    }
    model
}

fn bench_scene_from_model_128(c: &mut Criterion) {
    let model = shell_model(128);

    c.bench_function("scene_from_model_128", |b| {
        b.iter(|| Scene::from_model(black_box(&model)))
    });
}

fn bench_scene_pack_64(c: &mut Criterion) {
    let scene = Scene::from_model(&shell_model(64)).expect("valid model");

    c.bench_function("scene_pack_64", |b| {
        b.iter(|| black_box(&scene).pack())
    });
}

fn bench_scene_pack_256(c: &mut Criterion) {
    let scene = Scene::from_model(&shell_model(256)).expect("valid model");

    c.bench_function("scene_pack_256", |b| {
        b.iter(|| black_box(&scene).pack())
    });
}

fn bench_byte_buffer_add(c: &mut Criterion) {
    let values: Vec<[f32; 4]> = (0..4096).map(|i| [i as f32; 4]).collect();

    c.bench_function("byte_buffer_add_4096", |b| {
        b.iter(|| {
            let mut buffer = ByteBuffer::new();
            for v in black_box(&values) {
                buffer.add(v);
            }
            buffer.into_vec()
        })
    });
}

criterion_group!(
    benches,
    bench_scene_from_model_128,
    bench_scene_pack_64,
    bench_scene_pack_256,
    bench_byte_buffer_add,
);
criterion_main!(benches);
