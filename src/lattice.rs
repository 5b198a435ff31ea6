use {
    rustc_hash::FxHashMap,
    std::{fmt, ops::Index},
};

// a cell never has more than 2 * 3 axis neighbours
pub const MAX_NEIGHBOURS: usize = 6;

pub type Neighbours<const D: usize> = heapless::Vec<Coord<D>, MAX_NEIGHBOURS>;

/// A lattice cell, compared and hashed purely by its components.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord<const D: usize>(pub [i32; D]);

impl<const D: usize> Coord<D> {
    pub fn origin() -> Self {
        Self([0; D])
    }

    pub fn offset(self, axis: usize, delta: i32) -> Self {
        let mut c = self;
        c.0[axis] += delta;
        c
    }

    /// The 2 * D unit-offset cells, +1 and -1 along each axis in turn.
    pub fn axis_neighbours(self) -> impl Iterator<Item = Self> {
        (0..D).flat_map(move |axis| [self.offset(axis, 1), self.offset(axis, -1)])
    }

    pub fn l1_norm(&self) -> u32 {
        self.0.iter().map(|v| v.unsigned_abs()).sum()
    }
}

impl<const D: usize> Index<usize> for Coord<D> {
    type Output = i32;

    fn index(&self, axis: usize) -> &i32 {
        &self.0[axis]
    }
}

impl<const D: usize> fmt::Debug for Coord<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl<const D: usize> From<[i32; D]> for Coord<D> {
    fn from(c: [i32; D]) -> Self {
        Self(c)
    }
}

/// Candidate cells and their lattice adjacency. Read-only once connected.
#[derive(Clone, Debug, Default)]
pub struct LatticeGraph<const D: usize> {
    vertices: FxHashMap<Coord<D>, Neighbours<D>>,
}

impl<const D: usize> LatticeGraph<D> {
    const FITS_NEIGHBOURS: () = assert!(
        2 * D <= MAX_NEIGHBOURS,
        "lattices above three dimensions are not supported"
    );

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::FITS_NEIGHBOURS;

        Self {
            vertices: FxHashMap::default(),
        }
    }

    /// Every cell of the candidate region for shapes up to `n` cells, connected.
    pub fn from_region(n: usize) -> Self {
        let mut graph = Self::new();
        for c in crate::region::candidate_region::<D>(n) {
            graph.add_vertex(c);
        }
        graph.connect_all();
        graph
    }

    pub fn add_vertex(&mut self, c: Coord<D>) {
        self.vertices.insert(c, Neighbours::new());
    }

    pub fn connect_all(&mut self) {
        let adjacency: Vec<(Coord<D>, Neighbours<D>)> = self
            .vertices
            .keys()
            .map(|&c| {
                let mut adjacent = Neighbours::new();
                for n in c.axis_neighbours().filter(|n| self.vertices.contains_key(n)) {
                    // capacity is checked against D at compile time
                    let pushed = adjacent.push(n);
                    debug_assert!(pushed.is_ok());
                }
                (c, adjacent)
            })
            .collect();

        self.vertices.extend(adjacency);
    }

    pub fn neighbours(&self, c: Coord<D>) -> &[Coord<D>] {
        self.vertices
            .get(&c)
            .map(|n| n.as_slice())
            .unwrap_or_default()
    }

    pub fn contains(&self, c: Coord<D>) -> bool {
        self.vertices.contains_key(&c)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[test]
fn test_connect_all() {
    let mut graph = LatticeGraph::<2>::new();
    for c in [[0, 0], [1, 0], [0, 1], [5, 5]] {
        graph.add_vertex(c.into());
    }

    // nothing is adjacent before connecting
    assert!(graph.neighbours([0, 0].into()).is_empty());

    graph.connect_all();

    let mut origin = graph.neighbours([0, 0].into()).to_vec();
    origin.sort();
    assert_eq!(origin, vec![Coord([0, 1]), Coord([1, 0])]);
    assert_eq!(graph.neighbours([1, 0].into()), &[Coord([0, 0])]);
    assert!(graph.neighbours([5, 5].into()).is_empty());
    assert!(graph.neighbours([9, 9].into()).is_empty());
    assert!(graph.contains([5, 5].into()));
    assert!(!graph.contains([9, 9].into()));
    assert_eq!(graph.len(), 4);
}

#[test]
fn test_adjacency_is_symmetric() {
    let graph = LatticeGraph::<3>::from_region(5);

    for x in -5..=5 {
        for y in -5..=5 {
            for z in -5..=5 {
                let c = Coord([x, y, z]);
                for &n in graph.neighbours(c) {
                    assert!(graph.contains(n));
                    assert_eq!(n.l1_norm().abs_diff(c.l1_norm()), 1);
                    assert!(graph.neighbours(n).contains(&c));
                }
            }
        }
    }
}

#[test]
fn test_interior_cell_has_all_neighbours() {
    let graph = LatticeGraph::<3>::from_region(6);
    assert_eq!(graph.neighbours([0, 0, 2].into()).len(), 6);

    let graph = LatticeGraph::<2>::from_region(6);
    assert_eq!(graph.neighbours([0, 2].into()).len(), 4);
}
