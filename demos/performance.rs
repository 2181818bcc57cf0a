//! Timing driver for the sequential and parallel matrix paths.
//!
//! Runs a quick functional check, then times addition, multiplication and
//! transpose on random square matrices of growing size plus one rectangular
//! product, checking every parallel result against forced-sequential
//! execution. Settings come from the `PARMAT_*` environment variables;
//! `RUST_LOG=debug` shows each dispatch decision.

use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use parmat::config;
use parmat::prelude::*;

const SQUARE_SIZES: [usize; 5] = [50, 100, 200, 400, 800];
const TOLERANCE: f64 = 1e-9;

fn random_matrix(rng: &mut ChaCha8Rng, rows: usize, cols: usize) -> Result<Matrix> {
    let values = (0..rows * cols).map(|_| rng.gen_range(-10.0..10.0)).collect();
    Matrix::from_vec(rows, cols, values).with_context(|| format!("building {rows}x{cols} matrix"))
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn check(name: &str, parallel: &Matrix, sequential: &Matrix) -> Result<()> {
    ensure!(
        parallel.approx_eq(sequential, TOLERANCE),
        "{name}: parallel result differs from sequential"
    );
    Ok(())
}

fn smoke_test() -> Result<()> {
    let a = Matrix::try_from([[1.0, 2.0], [3.0, 4.0]])?;
    let b = Matrix::try_from([[5.0, 6.0], [7.0, 8.0]])?;

    ensure!(a.add(&b)? == Matrix::try_from([[6.0, 8.0], [10.0, 12.0]])?, "addition");
    ensure!(a.multiply(&b)? == Matrix::try_from([[19.0, 22.0], [43.0, 50.0]])?, "multiplication");
    ensure!(a.transpose() == Matrix::try_from([[1.0, 3.0], [2.0, 4.0]])?, "transpose");
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let settings = ParallelConfig::from_env().context("reading PARMAT_* settings")?;
    config::install(settings.clone()).context("installing parallel settings")?;
    let sequential = settings.clone().with_dispatch(DispatchMode::Sequential);

    println!("Running basic functionality tests...");
    smoke_test()?;
    println!("Basic tests passed!\n");

    println!("=== Matrix Performance Test ===\n");
    println!("Hardware threads available: {}", config::available_parallelism());
    println!(
        "Worker ceiling: {}, threshold: {}, executor: {:?}\n",
        settings.max_workers, settings.parallel_threshold, settings.executor
    );

    let mut rng = ChaCha8Rng::from_entropy();

    for size in SQUARE_SIZES {
        println!("Testing {size}x{size} matrices:");
        let m1 = random_matrix(&mut rng, size, size)?;
        let m2 = random_matrix(&mut rng, size, size)?;

        let (sum, add_time) = timed(|| m1.add(&m2));
        let (product, mult_time) = timed(|| m1.multiply(&m2));
        let (transposed, transpose_time) = timed(|| m1.transpose());
        let (sum, product) = (sum?, product?);

        let (seq_product, seq_mult_time) = timed(|| m1.multiply_with(&m2, &sequential));
        check("add", &sum, &m1.add_with(&m2, &sequential)?)?;
        check("multiply", &product, &seq_product?)?;
        check("transpose", &transposed, &m1.transpose_with(&sequential))?;

        let total = add_time + mult_time + transpose_time;
        println!("  Addition:       {:.3} ms", ms(add_time));
        println!("  Multiplication: {:.3} ms", ms(mult_time));
        println!("  Transpose:      {:.3} ms", ms(transpose_time));
        println!("  Total:          {:.3} ms", ms(total));
        println!(
            "  Sequential multiplication: {:.3} ms ({:.2}x)\n",
            ms(seq_mult_time),
            seq_mult_time.as_secs_f64() / mult_time.as_secs_f64().max(f64::EPSILON)
        );
    }

    println!("Testing rectangular matrices (500x200 * 200x300):");
    let rect1 = random_matrix(&mut rng, 500, 200)?;
    let rect2 = random_matrix(&mut rng, 200, 300)?;
    let (rect_product, rect_time) = timed(|| rect1.multiply(&rect2));
    check("rectangular multiply", &rect_product?, &rect1.multiply_with(&rect2, &sequential)?)?;
    println!("  Rectangular multiplication: {:.3} ms\n", ms(rect_time));

    println!("=== Performance Test Complete ===");
    Ok(())
}
