use amorphgen::analysis::validation;
use amorphgen::core::composition::CompositionSpec;
use amorphgen::core::domain::Cell;
use amorphgen::engine::generator::{generate, GeneratorParams};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

fn main() {
    let composition = CompositionSpec::new().with("Si", 1.0 / 3.0).with("O", 2.0 / 3.0);
    let box_size = 20.0;
    let min_distance = 1.6;

    for total_atoms in [100, 200, 400, 600, 800] {
        let params = GeneratorParams {
            total_atoms,
            box_size,
            min_distance,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let start = Instant::now();
        let result = generate(&composition, &params, &mut rng);
        let duration = start.elapsed();

        let density = total_atoms as f64 / Cell::cubic(box_size).volume();
        match result {
            Ok(atoms) => {
                let closest = validation::closest_pair(&atoms).map_or(f64::NAN, |p| p.distance);
                println!(
                    "{total_atoms:>4} atoms ({density:.4}/A^3): {duration:?}, closest pair {closest:.3} A"
                );
            }
            Err(e) => println!("{total_atoms:>4} atoms ({density:.4}/A^3): failed after {duration:?}: {e}"),
        }
    }
}
