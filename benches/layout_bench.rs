use std::hint::black_box;
use std::time::Instant;

use memoir_press::{BookAssembler, PaginationConfig, Story};

const ITERATIONS: u32 = 50;

const SENTENCES: &[&str] = &[
    "The river ran high that spring, and the whole town came out to watch it.",
    "My father kept a ledger of every harvest from the year he bought the farm.",
    "We drove the old truck to the coast with the windows down the entire way.",
    "Nobody believed her at first, but the photograph settled the argument.",
    "The kitchen always smelled of cardamom on Sunday mornings.",
];

fn synthetic_stories(count: usize) -> Vec<Story> {
    (0..count)
        .map(|i| {
            let sentence_count = 20 + (i * 13) % 240;
            let body = (0..sentence_count)
                .map(|j| SENTENCES[(i + j) % SENTENCES.len()])
                .collect::<Vec<_>>()
                .join(" ");
            Story {
                id: format!("story-{i:03}"),
                title: format!("Story {i}"),
                body,
                photos: Vec::new(),
                year: 1940 + (i as i32 % 60),
                decade: None,
                audio: None,
            }
        })
        .collect()
}

fn bench_case(label: &str, story_count: usize, cfg: PaginationConfig) {
    let stories = synthetic_stories(story_count);
    let assembler = BookAssembler::new(cfg);

    // Warm-up pass also reports the page count for the case.
    let pages = assembler.assemble(&stories).pages.len();

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        let layout = assembler.assemble(black_box(&stories));
        black_box(layout.pages.len());
    }
    let elapsed = start.elapsed();
    let per_iter_ms = elapsed.as_secs_f64() * 1000.0 / ITERATIONS as f64;
    println!("{label}: {story_count} stories -> {pages} pages, {per_iter_ms:.2} ms/assembly");
}

fn main() {
    bench_case("desktop", 25, PaginationConfig::for_viewport(1280, 900));
    bench_case("desktop", 150, PaginationConfig::for_viewport(1280, 900));
    bench_case("mobile", 150, PaginationConfig::for_viewport(390, 844));
}
