use {
    crate::{
        canonical::Classifier,
        enumerate::{Branch, ElementCount, Enumerator, Inline, SearchState},
        lattice::{Coord, LatticeGraph},
    },
    std::sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc::{self, Sender},
    },
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Schedule {
    pub max_size: usize,
    /// Shapes grown past this depth are counted in their own task.
    pub fork_depth: usize,
}

/// Hands expansions below `fork_depth` to a rayon scope, each with its own
/// copy of the search state, and recurses inline everywhere else.
struct Fork<'a, 'scope> {
    scope: &'a rayon::Scope<'scope>,
    fork_depth: usize,
    merge: Sender<ElementCount>,
    forked: &'a AtomicUsize,
}

impl<'a, 'scope, const D: usize> Branch<'scope, D> for Fork<'a, 'scope> {
    fn branch(
        &self,
        enumerator: &Enumerator<'scope, D>,
        search: &mut SearchState<D>,
        untried: Vec<Coord<D>>,
        depth: usize,
        counts: &mut ElementCount,
    ) {
        if depth != self.fork_depth + 1 {
            *counts += enumerator.count_level(search, untried, depth, self);
            return;
        }

        let enumerator = *enumerator;
        let mut search = search.clone();
        let merge = self.merge.clone();

        self.forked.fetch_add(1, Ordering::Relaxed);
        self.scope.spawn(move |_| {
            // nothing below the fork depth forks again
            let partial = enumerator.count_level(&mut search, untried, depth, &Inline);

            merge
                .send(partial)
                .expect("merge queue is drained only after the scope joins");
        });
    }
}

/// Counts every shape of up to `schedule.max_size` cells, forking the search
/// at `schedule.fork_depth`.
///
/// The result does not depend on `fork_depth` or on the order tasks finish in.
pub fn enumerate<const D: usize>(
    graph: &LatticeGraph<D>,
    classifier: &Classifier<D>,
    schedule: Schedule,
) -> ElementCount {
    let Schedule {
        max_size,
        fork_depth,
    } = schedule;

    if max_size == 0 {
        return ElementCount::new(0);
    }

    let (merge, merged) = mpsc::channel();
    let forked = AtomicUsize::new(0);

    let mut counts = rayon::scope(|scope| {
        let enumerator = Enumerator::new(graph, classifier, max_size);
        let fork = Fork {
            scope,
            fork_depth,
            merge,
            forked: &forked,
        };
        enumerator.count_from_origin(&fork)
    });

    let forked = forked.into_inner();
    let mut received = 0;
    for partial in merged.try_iter() {
        counts += partial;
        received += 1;
    }
    debug_assert_eq!(forked, received);

    tracing::debug!(max_size, fork_depth, forked, "merged forked branches");

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count<const D: usize>(max_size: usize, fork_depth: usize) -> ElementCount {
        let graph = LatticeGraph::<D>::from_region(max_size);
        let classifier = Classifier::<D>::new();
        enumerate(
            &graph,
            &classifier,
            Schedule {
                max_size,
                fork_depth,
            },
        )
    }

    #[test]
    fn test_small_n() {
        let counts = count::<3>(7, 2);

        assert_eq!(counts.fixed(), vec![1, 3, 15, 86, 534, 3481, 23502]);
        assert_eq!(counts.free_rotation(), vec![1, 1, 2, 8, 29, 166, 1023]);
        assert_eq!(counts.free_reflection(), vec![1, 1, 2, 7, 23, 112, 607]);
    }

    #[test]
    fn test_small_n_2d() {
        let counts = count::<2>(10, 4);

        assert_eq!(
            counts.fixed(),
            vec![1, 2, 6, 19, 63, 216, 760, 2725, 9910, 36446]
        );
        assert_eq!(
            counts.free_reflection(),
            vec![1, 1, 2, 5, 12, 35, 108, 369, 1285, 4655]
        );
    }

    #[test]
    fn test_fork_depth_does_not_change_counts() {
        for n in 1..=6 {
            let sequential = count::<3>(n, n.saturating_sub(1));
            for fork_depth in [0, 1, n / 2, n.saturating_sub(1), n + 3] {
                assert_eq!(count::<3>(n, fork_depth), sequential, "n: {n}, fork_depth: {fork_depth}");
            }
        }

        let n = 8;
        let sequential = count::<2>(n, n - 1);
        for fork_depth in [0, 1, 3, n - 1] {
            assert_eq!(count::<2>(n, fork_depth), sequential);
        }
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(count::<3>(6, 3), count::<3>(6, 3));
    }

    #[test]
    fn test_zero_and_one() {
        let zero = count::<3>(0, 0);
        assert!(zero.is_zero());

        let one = count::<3>(1, 0);
        assert_eq!(one.fixed(), vec![1]);
        assert_eq!(one.free_rotation(), vec![1]);
        assert_eq!(one.free_reflection(), vec![1]);
    }

    #[test]
    fn test_in_custom_pool() {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(3)
            .build()
            .unwrap();
        let counts = pool.install(|| count::<3>(6, 1));
        assert_eq!(counts.fixed()[5], 3481);
    }
}
