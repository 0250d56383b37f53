use std::hint::black_box;
use std::time::Instant;

use anvil_chunk::Chunk;
use anvil_format::ChunkCodec;

fn make_chunk(filled_sections: usize) -> Chunk {
    let mut chunk = Chunk::new(0, 0);
    for y in 0..filled_sections {
        let section = chunk.section_mut(y);
        for (i, b) in section.block_ids_mut().iter_mut().enumerate() {
            *b = (i % 7) as u8 + 1;
        }
        section.sky_light_mut().fill(0xff);
    }
    chunk.set_populated(true);
    chunk
}

fn bench_serialize(filled_sections: usize, iterations: usize) {
    let chunk = make_chunk(filled_sections);
    let codec = ChunkCodec::default();

    let start = Instant::now();
    let mut size = 0;
    for _ in 0..iterations {
        size = codec.serialize(black_box(&chunk)).expect("serialize").len();
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  serialize ({filled_sections} sections, {iterations} iters): {per_iter:?}/iter, {size} bytes"
    );
}

fn bench_deserialize(filled_sections: usize, iterations: usize) {
    let codec = ChunkCodec::default();
    let bytes = codec
        .serialize(&make_chunk(filled_sections))
        .expect("serialize");

    let start = Instant::now();
    for _ in 0..iterations {
        black_box(codec.deserialize(black_box(&bytes)).expect("deserialize"));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  deserialize ({filled_sections} sections, {iterations} iters): {per_iter:?}/iter");
}

fn main() {
    println!("chunk codec benchmarks");
    for sections in [1, 8, 16] {
        bench_serialize(sections, 200);
        bench_deserialize(sections, 200);
    }
}
