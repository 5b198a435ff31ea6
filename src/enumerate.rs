use {
    crate::{
        canonical::{Classifier, Verdict},
        lattice::{Coord, LatticeGraph},
    },
    rustc_hash::FxHashMap,
    std::{
        collections::hash_map::Entry,
        iter::Sum,
        ops::{AddAssign, Deref, DerefMut},
    },
};

/// Shapes found at one size.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Tally {
    pub fixed: u64,
    pub rotation: u64,
    pub reflection: u64,
}

impl AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        self.fixed += other.fixed;
        self.rotation += other.rotation;
        self.reflection += other.reflection;
    }
}

/// Per-size tallies, index `k` holding shapes of `k + 1` cells.
///
/// Purely additive, so partial counts from any branches merge in any order.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct ElementCount {
    tallies: Vec<Tally>,
}

impl ElementCount {
    pub fn new(max_size: usize) -> Self {
        Self {
            tallies: vec![Tally::default(); max_size],
        }
    }

    pub fn record(&mut self, depth: usize, verdict: Verdict) {
        let tally = &mut self.tallies[depth];
        tally.fixed += 1;
        if verdict.is_rotation_canonical() {
            tally.rotation += 1;
        }
        if verdict.is_reflection_canonical() {
            tally.reflection += 1;
        }
    }

    pub fn max_size(&self) -> usize {
        self.tallies.len()
    }

    pub fn tallies(&self) -> &[Tally] {
        &self.tallies
    }

    /// Tally for shapes of `size` cells, zero outside `1..=max_size`.
    pub fn get(&self, size: usize) -> Tally {
        size.checked_sub(1)
            .and_then(|i| self.tallies.get(i))
            .copied()
            .unwrap_or_default()
    }

    pub fn fixed(&self) -> Vec<u64> {
        self.tallies.iter().map(|t| t.fixed).collect()
    }

    pub fn free_rotation(&self) -> Vec<u64> {
        self.tallies.iter().map(|t| t.rotation).collect()
    }

    pub fn free_reflection(&self) -> Vec<u64> {
        self.tallies.iter().map(|t| t.reflection).collect()
    }

    pub fn is_zero(&self) -> bool {
        self.tallies.iter().all(|t| *t == Tally::default())
    }
}

impl AddAssign<&ElementCount> for ElementCount {
    fn add_assign(&mut self, other: &ElementCount) {
        if self.tallies.len() < other.tallies.len() {
            self.tallies.resize(other.tallies.len(), Tally::default());
        }
        for (t, o) in self.tallies.iter_mut().zip(&other.tallies) {
            *t += *o;
        }
    }
}

impl AddAssign for ElementCount {
    fn add_assign(&mut self, other: ElementCount) {
        *self += &other;
    }
}

impl Sum for ElementCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut acc, c| {
            acc += c;
            acc
        })
    }
}

/// Mutable state of one backtracking branch. Cloning it is the deep copy
/// handed to a forked task.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchState<const D: usize> {
    cells_added: Vec<Coord<D>>,
    // how many added cells touch each coordinate, zero entries are dropped
    neighbour_ref_count: FxHashMap<Coord<D>, u32>,
}

impl<const D: usize> SearchState<D> {
    /// Empty shape with `seed` already considered, so it never re-enters
    /// the frontier.
    pub fn seeded(seed: Coord<D>) -> Self {
        let mut state = Self::default();
        state.neighbour_ref_count.insert(seed, 1);
        state
    }

    pub fn cells_added(&self) -> &[Coord<D>] {
        &self.cells_added
    }

    /// Already adjacent to the shape (or the seed), never offered again as
    /// a new frontier cell.
    pub fn is_old(&self, c: &Coord<D>) -> bool {
        self.neighbour_ref_count.get(c).is_some_and(|&r| r > 0)
    }

    #[cfg(test)]
    pub fn ref_count(&self, c: &Coord<D>) -> u32 {
        self.neighbour_ref_count.get(c).copied().unwrap_or(0)
    }

    /// Adds `cell` to the shape and marks `neighbours` as adjacent to it,
    /// until the returned guard drops.
    pub fn step<'n>(&mut self, cell: Coord<D>, neighbours: &'n [Coord<D>]) -> Step<'_, 'n, D> {
        self.cells_added.push(cell);
        self.increment(neighbours);
        Step {
            search: self,
            neighbours,
        }
    }

    fn increment(&mut self, cells: &[Coord<D>]) {
        for &c in cells {
            *self.neighbour_ref_count.entry(c).or_insert(0) += 1;
        }
    }

    fn decrement(&mut self, cells: &[Coord<D>]) {
        for &c in cells {
            if let Entry::Occupied(mut entry) = self.neighbour_ref_count.entry(c) {
                *entry.get_mut() -= 1;
                if *entry.get() == 0 {
                    entry.remove();
                }
            }
        }
    }
}

/// One cell added to a [`SearchState`]. Dropping it removes the cell and
/// releases the neighbour marks, on every exit path.
pub struct Step<'s, 'n, const D: usize> {
    search: &'s mut SearchState<D>,
    neighbours: &'n [Coord<D>],
}

impl<'s, 'n, const D: usize> Deref for Step<'s, 'n, D> {
    type Target = SearchState<D>;

    fn deref(&self) -> &SearchState<D> {
        self.search
    }
}

impl<'s, 'n, const D: usize> DerefMut for Step<'s, 'n, D> {
    fn deref_mut(&mut self) -> &mut SearchState<D> {
        self.search
    }
}

impl<'s, 'n, const D: usize> Drop for Step<'s, 'n, D> {
    fn drop(&mut self) {
        self.search.decrement(self.neighbours);
        self.search.cells_added.pop();
    }
}

/// Decides how the enumerator descends into a grown shape.
pub trait Branch<'g, const D: usize> {
    fn branch(
        &self,
        enumerator: &Enumerator<'g, D>,
        search: &mut SearchState<D>,
        untried: Vec<Coord<D>>,
        depth: usize,
        counts: &mut ElementCount,
    );
}

/// Plain recursion in the current thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct Inline;

impl<'g, const D: usize> Branch<'g, D> for Inline {
    fn branch(
        &self,
        enumerator: &Enumerator<'g, D>,
        search: &mut SearchState<D>,
        untried: Vec<Coord<D>>,
        depth: usize,
        counts: &mut ElementCount,
    ) {
        *counts += enumerator.count_level(search, untried, depth, self);
    }
}

/// Redelmeier's enumeration over a lattice graph.
#[derive(Clone, Copy, Debug)]
pub struct Enumerator<'g, const D: usize> {
    graph: &'g LatticeGraph<D>,
    classifier: &'g Classifier<D>,
    max_size: usize,
}

impl<'g, const D: usize> Enumerator<'g, D> {
    pub fn new(graph: &'g LatticeGraph<D>, classifier: &'g Classifier<D>, max_size: usize) -> Self {
        Self {
            graph,
            classifier,
            max_size,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Counts every shape grown from the origin.
    pub fn count_from_origin(&self, branch: &impl Branch<'g, D>) -> ElementCount {
        if self.max_size == 0 {
            return ElementCount::new(0);
        }

        let origin = Coord::origin();
        let mut search = SearchState::seeded(origin);
        self.count_level(&mut search, vec![origin], 0, branch)
    }

    /// Tries each cell of `untried` as the next cell of the shape, counting
    /// the grown shape at `depth` and handing its expansion to `branch`.
    ///
    /// `search` is left exactly as it was passed in.
    pub fn count_level(
        &self,
        search: &mut SearchState<D>,
        mut untried: Vec<Coord<D>>,
        depth: usize,
        branch: &impl Branch<'g, D>,
    ) -> ElementCount {
        let mut counts = ElementCount::new(self.max_size);

        while let Some(cell) = untried.pop() {
            let expand = depth + 1 < self.max_size;

            // fresh frontier cells are picked before the new cell's marks land
            let (neighbours, next) = if expand {
                let neighbours = self.graph.neighbours(cell);

                let mut next = Vec::with_capacity(untried.len() + neighbours.len());
                next.extend_from_slice(&untried);
                next.extend(neighbours.iter().copied().filter(|n| !search.is_old(n)));

                (neighbours, next)
            } else {
                (&[][..], Vec::new())
            };

            let mut step = search.step(cell, neighbours);
            counts.record(depth, self.classifier.classify(step.cells_added()));

            if expand {
                branch.branch(self, &mut step, next, depth + 1, &mut counts);
            }
        }

        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequential<const D: usize>(n: usize) -> ElementCount {
        let graph = LatticeGraph::<D>::from_region(n);
        let classifier = Classifier::<D>::new();
        Enumerator::new(&graph, &classifier, n).count_from_origin(&Inline)
    }

    #[test]
    fn test_small_n_2d() {
        let counts = sequential::<2>(8);

        assert_eq!(counts.fixed(), vec![1, 2, 6, 19, 63, 216, 760, 2725]);
        assert_eq!(counts.free_rotation(), vec![1, 1, 2, 7, 18, 60, 196, 704]);
        assert_eq!(counts.free_reflection(), vec![1, 1, 2, 5, 12, 35, 108, 369]);
    }

    #[test]
    fn test_small_n_3d() {
        let counts = sequential::<3>(6);

        assert_eq!(counts.fixed(), vec![1, 3, 15, 86, 534, 3481]);
        assert_eq!(counts.free_rotation(), vec![1, 1, 2, 8, 29, 166]);
        assert_eq!(counts.free_reflection(), vec![1, 1, 2, 7, 23, 112]);
    }

    #[test]
    fn test_free_never_exceeds_fixed() {
        let counts = sequential::<3>(5);
        for t in counts.tallies() {
            assert!(t.reflection <= t.rotation);
            assert!(t.rotation <= t.fixed);
        }
    }

    #[test]
    fn test_zero_and_one() {
        assert!(sequential::<3>(0).is_zero());
        assert_eq!(sequential::<3>(0).max_size(), 0);

        let one = sequential::<2>(1);
        assert_eq!(
            one.tallies(),
            &[Tally {
                fixed: 1,
                rotation: 1,
                reflection: 1
            }]
        );
    }

    #[test]
    fn test_count_level_restores_state() {
        let n = 5;
        let graph = LatticeGraph::<3>::from_region(n);
        let classifier = Classifier::<3>::new();
        let enumerator = Enumerator::new(&graph, &classifier, n);

        let origin = Coord::origin();
        let mut search = SearchState::seeded(origin);
        let before = search.clone();

        enumerator.count_level(&mut search, vec![origin], 0, &Inline);

        assert_eq!(search, before);
        assert!(search.cells_added().is_empty());
        assert_eq!(search.ref_count(&origin), 1);
    }

    #[test]
    fn test_step_rolls_back_on_drop() {
        let graph = LatticeGraph::<2>::from_region(4);
        let mut search = SearchState::seeded(Coord::origin());
        let before = search.clone();

        {
            let mut step = search.step(Coord::origin(), graph.neighbours(Coord::origin()));
            assert_eq!(step.cells_added(), &[Coord::origin()]);
            assert!(step.is_old(&Coord([1, 0])));
            assert!(step.is_old(&Coord([0, 1])));
            assert_eq!(step.ref_count(&Coord::origin()), 1);

            {
                let inner = step.step(Coord([1, 0]), graph.neighbours(Coord([1, 0])));
                assert_eq!(inner.ref_count(&Coord::origin()), 2);
            }

            assert_eq!(step.ref_count(&Coord::origin()), 1);
            assert_eq!(step.cells_added().len(), 1);
        }

        assert_eq!(search, before);
    }

    #[test]
    fn test_element_count_merge() {
        let mut a = ElementCount::new(2);
        a.record(0, Verdict::Reflection);
        a.record(1, Verdict::NotCanonical);

        let mut b = ElementCount::new(3);
        b.record(1, Verdict::Rotation);
        b.record(2, Verdict::Reflection);

        let total: ElementCount = [a.clone(), b.clone()].into_iter().sum();
        assert_eq!(total.fixed(), vec![1, 2, 1]);
        assert_eq!(total.free_rotation(), vec![1, 1, 1]);
        assert_eq!(total.free_reflection(), vec![1, 0, 1]);

        let mut reversed = b;
        reversed += a;
        assert_eq!(reversed, total);
        assert_eq!(total.get(0), Tally::default());
        assert_eq!(total.get(4), Tally::default());
        assert_eq!(total.get(3).fixed, 1);
    }
}
