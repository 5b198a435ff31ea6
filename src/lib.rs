pub mod canonical;
pub mod config;
pub mod enumerate;
pub mod lattice;
pub mod region;
pub mod schedule;
pub mod serialization;

use {
    canonical::Classifier,
    config::{Config, Dimension},
    enumerate::ElementCount,
    lattice::LatticeGraph,
    schedule::Schedule,
    serialization::Results,
};

/// Enumerates every `D`-dimensional shape of up to `max_size` cells.
pub fn count<const D: usize>(max_size: usize, fork_depth: usize) -> ElementCount {
    let graph = LatticeGraph::<D>::from_region(max_size);
    tracing::debug!(dimension = D, cells = graph.len(), "built candidate lattice");

    let classifier = Classifier::<D>::new();

    schedule::enumerate(
        &graph,
        &classifier,
        Schedule {
            max_size,
            fork_depth,
        },
    )
}

pub fn run(config: &Config) -> Results {
    let counts = match config.dimension {
        Dimension::Two => count::<2>(config.max_size, config.fork_depth),
        Dimension::Three => count::<3>(config.max_size, config.fork_depth),
    };

    Results::from_counts(config.dimension.rank(), &counts)
}

#[test]
fn test_run() {
    let mut config = Config::new(5);
    config.dimension = Dimension::Two;
    config.fork_depth = 1;

    let results = run(&config);

    assert_eq!(results.dimension, 2);
    let free: Vec<u64> = results.counts.iter().map(|c| c.free_reflection).collect();
    assert_eq!(free, vec![1, 1, 2, 5, 12]);
    assert_eq!(results.total_fixed(), 1 + 2 + 6 + 19 + 63);
}
