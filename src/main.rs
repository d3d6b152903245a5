use rand::Rng;
use std::convert::TryInto;
use std::hint::black_box;
use std::time::{Duration, Instant};
use wasm_pixel_paint::{Cell, Color, Grid, Pcg};

/// Time flood fills over grids seeded with random painted obstructions.
fn bench_fill(size: usize, wall_density: f64, num_iters: u128) {
    println!(
        "filling {}x{} grids at {:.0}% obstruction...",
        size,
        size,
        wall_density * 100.0
    );
    let mut rng = Pcg::new(0, 0);
    let ink = Cell::Painted(Color::rgb(0x28, 0x1e, 0xff));
    let wall = Cell::Painted(Color::BLACK);
    let mut total_time = 0u128;
    let mut total_painted = 0usize;
    for _ in 0..num_iters {
        let mut grid = Grid::new(size, size);
        for y in 0..size {
            for x in 0..size {
                if rng.gen_bool(wall_density) {
                    grid.set(x, y, wall).unwrap();
                }
            }
        }
        // keep the seed cell blank so every iteration actually fills
        grid.set(0, 0, Cell::Blank).unwrap();

        let start = Instant::now();
        let recolored = black_box(grid.flood_fill(0, 0, ink).unwrap());
        total_time += start.elapsed().as_nanos();
        total_painted += recolored.len();
    }
    println!(
        "average of {:?}/iter, {} cells painted per fill",
        Duration::from_nanos((total_time / num_iters).try_into().unwrap()),
        total_painted as u128 / num_iters
    );
}

fn main() {
    bench_fill(256, 0.0, 100);
    bench_fill(256, 0.35, 100);
    bench_fill(1024, 0.1, 10);
}
