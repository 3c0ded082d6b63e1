use std::hint::black_box;
use std::time::Instant;

use surfview_mesh::{HeightField, build_mesh_buffers, dedup_edges, demo_height};

fn bench_dedup(resolution: u32, iterations: usize) {
    let mesh = HeightField::with_resolution(resolution, resolution)
        .tessellate(demo_height)
        .expect("bench grid fits u32 indices");

    let start = Instant::now();
    let mut edges = 0;
    for _ in 0..iterations {
        edges = dedup_edges(black_box(&mesh.faces)).len();
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;

    println!(
        "dedup_edges: {} faces -> {} edges, {:?}/iter ({} iters)",
        mesh.face_count(),
        edges,
        per_iter,
        iterations
    );
}

fn bench_buffers(resolution: u32, iterations: usize) {
    let mesh = HeightField::with_resolution(resolution, resolution)
        .tessellate(demo_height)
        .expect("bench grid fits u32 indices");

    let start = Instant::now();
    for _ in 0..iterations {
        let buffers = build_mesh_buffers(black_box(&mesh)).expect("valid grid mesh");
        black_box(buffers);
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;

    println!(
        "build_mesh_buffers: {} vertices, {:?}/iter ({} iters)",
        mesh.vertex_count(),
        per_iter,
        iterations
    );
}

fn main() {
    println!("=== Mesh Pipeline Benchmarks ===\n");

    for resolution in [30, 100, 300] {
        bench_dedup(resolution, 50);
    }
    println!();
    for resolution in [30, 100, 300] {
        bench_buffers(resolution, 50);
    }
}
