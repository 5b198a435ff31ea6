use {
    crate::lattice::Coord,
    ndarray::{ArrayD, IxDyn},
    std::cmp::Ordering,
};

pub use {bb::*, code::*, transform::*};

/// Where a shape stands relative to the rest of its symmetry orbit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Verdict {
    /// some rotation of the shape encodes smaller
    NotCanonical,
    /// minimal among rotations, but a mirror image encodes smaller
    Rotation,
    /// minimal among rotations and reflections
    Reflection,
}

impl Verdict {
    pub fn is_rotation_canonical(self) -> bool {
        matches!(self, Verdict::Rotation | Verdict::Reflection)
    }

    pub fn is_reflection_canonical(self) -> bool {
        self == Verdict::Reflection
    }
}

/// Decides whether a cell set is the representative of its free shape.
///
/// The representative is the orientation whose [`CanonicalCode`] is smallest.
/// Every orientation is encoded in the same `side^D` cube, so codes of a
/// single orbit are comparable without re-normalizing.
#[derive(Clone, Debug)]
pub struct Classifier<const D: usize> {
    group: SymmetryGroup<D>,
}

impl<const D: usize> Classifier<D> {
    pub fn new() -> Self {
        Self {
            group: SymmetryGroup::generate(),
        }
    }

    pub fn group(&self) -> &SymmetryGroup<D> {
        &self.group
    }

    pub fn classify(&self, cells: &[Coord<D>]) -> Verdict {
        // single cell is its own orbit
        if cells.len() <= 1 {
            return Verdict::Reflection;
        }

        let bb = BoundingBox::of(cells);
        let side = bb.side();

        let code = CanonicalCode::encode(cells.iter().copied(), &bb, side);
        let mut scratch = CanonicalCode::blank(side, D);

        if Self::any_smaller(&code, &mut scratch, cells, &bb, self.group.rotations()) {
            return Verdict::NotCanonical;
        }

        if Self::any_smaller(&code, &mut scratch, cells, &bb, self.group.reflections()) {
            return Verdict::Rotation;
        }

        Verdict::Reflection
    }

    // strictly smaller only, ties come from the shape's own symmetries
    fn any_smaller(
        code: &CanonicalCode,
        scratch: &mut CanonicalCode,
        cells: &[Coord<D>],
        bb: &BoundingBox<D>,
        transforms: &[Transform<D>],
    ) -> bool {
        transforms.iter().any(|t| {
            let t_bb = t.apply_bounds(bb);
            scratch.fill_from(cells.iter().map(|&c| t.apply(c)), &t_bb);
            (*scratch).cmp(code) == Ordering::Less
        })
    }
}

impl<const D: usize> Default for Classifier<D> {
    fn default() -> Self {
        Self::new()
    }
}

mod transform {
    use super::*;

    /// Signed axis permutation: output axis `i` reads input axis `axes[i]`,
    /// negated when `flips[i]` is set.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct Transform<const D: usize> {
        axes: [usize; D],
        flips: [bool; D],
    }

    impl<const D: usize> Transform<D> {
        pub fn identity() -> Self {
            Self {
                axes: std::array::from_fn(|i| i),
                flips: [false; D],
            }
        }

        /// 90 degrees in the `p`-`q` plane: `(p, q) -> (q, -p)`.
        pub fn quarter_turn(p: usize, q: usize) -> Self {
            let mut t = Self::identity();
            t.axes[p] = q;
            t.axes[q] = p;
            t.flips[q] = true;
            t
        }

        pub fn mirror(axis: usize) -> Self {
            let mut t = Self::identity();
            t.flips[axis] = true;
            t
        }

        /// `self` after `inner`.
        pub fn compose(&self, inner: &Self) -> Self {
            Self {
                axes: std::array::from_fn(|i| inner.axes[self.axes[i]]),
                flips: std::array::from_fn(|i| self.flips[i] ^ inner.flips[self.axes[i]]),
            }
        }

        pub fn apply(&self, c: Coord<D>) -> Coord<D> {
            Coord(std::array::from_fn(|i| {
                let v = c[self.axes[i]];
                if self.flips[i] {
                    -v
                } else {
                    v
                }
            }))
        }

        // closed form, no need to rescan the cells
        pub fn apply_bounds(&self, bb: &BoundingBox<D>) -> BoundingBox<D> {
            let mut min = [0; D];
            let mut max = [0; D];

            for i in 0..D {
                let from = self.axes[i];
                if self.flips[i] {
                    min[i] = -bb.max()[from];
                    max[i] = -bb.min()[from];
                } else {
                    min[i] = bb.min()[from];
                    max[i] = bb.max()[from];
                }
            }

            BoundingBox::new_min_max(min, max)
        }

        pub fn is_reflection(&self) -> bool {
            let flips = self.flips.iter().filter(|&&f| f).count();

            // parity of the permutation by counting cycle lengths
            let mut seen = [false; D];
            let mut transpositions = 0usize;
            for start in 0..D {
                let mut i = start;
                let mut len = 0usize;
                while !seen[i] {
                    seen[i] = true;
                    i = self.axes[i];
                    len += 1;
                }
                transpositions += len.max(1) - 1;
            }

            (flips + transpositions) % 2 == 1
        }
    }

    /// Proper rotations of the lattice and the coset reached through one
    /// mirror.
    #[derive(Clone, Debug)]
    pub struct SymmetryGroup<const D: usize> {
        rotations: Vec<Transform<D>>,
        reflections: Vec<Transform<D>>,
    }

    impl<const D: usize> SymmetryGroup<D> {
        /// Closes the elementary quarter turns under composition, then
        /// mirrors the x axis of every rotation.
        pub fn generate() -> Self {
            let generators: Vec<Transform<D>> = (0..D)
                .flat_map(|p| (p + 1..D).map(move |q| Transform::quarter_turn(p, q)))
                .collect();

            let mut rotations = vec![Transform::identity()];
            let mut to_see = vec![Transform::identity()];

            while let Some(t) = to_see.pop() {
                for g in &generators {
                    let next = g.compose(&t);
                    if !rotations.contains(&next) {
                        rotations.push(next);
                        to_see.push(next);
                    }
                }
            }

            let mirror = Transform::mirror(0);
            let reflections: Vec<_> = rotations.iter().map(|r| r.compose(&mirror)).collect();

            debug_assert!(rotations.iter().all(|t| !t.is_reflection()));
            debug_assert!(reflections.iter().all(Transform::is_reflection));

            Self {
                rotations,
                reflections,
            }
        }

        pub fn rotations(&self) -> &[Transform<D>] {
            &self.rotations
        }

        pub fn reflections(&self) -> &[Transform<D>] {
            &self.reflections
        }

        #[cfg(test)]
        pub fn all(&self) -> impl Iterator<Item = &Transform<D>> {
            self.rotations.iter().chain(&self.reflections)
        }
    }
}

mod bb {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct BoundingBox<const D: usize> {
        min: [i32; D],
        max: [i32; D],
    }

    impl<const D: usize> BoundingBox<D> {
        pub fn new(c: Coord<D>) -> Self {
            Self { min: c.0, max: c.0 }
        }

        pub fn new_min_max(min: [i32; D], max: [i32; D]) -> Self {
            Self { min, max }
        }

        /// Callers guarantee at least one cell.
        pub fn of(cells: &[Coord<D>]) -> Self {
            let mut iter = cells.iter();
            let mut bb = Self::new(iter.next().copied().unwrap_or_else(Coord::origin));
            for &c in iter {
                bb.insert(c);
            }
            bb
        }

        pub fn insert(&mut self, c: Coord<D>) {
            for i in 0..D {
                self.min[i] = self.min[i].min(c[i]);
                self.max[i] = self.max[i].max(c[i]);
            }
        }

        pub fn min(&self) -> [i32; D] {
            self.min
        }

        pub fn max(&self) -> [i32; D] {
            self.max
        }

        pub fn extents(&self) -> [usize; D] {
            std::array::from_fn(|i| self.max[i].abs_diff(self.min[i]) as usize + 1)
        }

        /// Edge of the cube that holds the shape in every orientation.
        pub fn side(&self) -> usize {
            self.extents().into_iter().max().unwrap_or(1)
        }
    }
}

mod code {
    use super::*;

    /// Occupancy bitmap of a shape inside a `side^D` cube.
    ///
    /// Array axes run from the highest lattice axis down to x, so in memory
    /// order x varies fastest, then -y, then -z. Compared as a bit sequence
    /// with the first bit most significant.
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct CanonicalCode {
        bits: ArrayD<bool>,
    }

    impl CanonicalCode {
        pub fn blank(side: usize, rank: usize) -> Self {
            Self {
                bits: ArrayD::from_elem(IxDyn(&vec![side; rank]), false),
            }
        }

        pub fn encode<const D: usize>(
            cells: impl Iterator<Item = Coord<D>>,
            bb: &BoundingBox<D>,
            side: usize,
        ) -> Self {
            let mut code = Self::blank(side, D);
            code.fill_from(cells, bb);
            code
        }

        /// Rewrites the bitmap for `cells`, positioned relative to `bb`.
        pub fn fill_from<const D: usize>(
            &mut self,
            cells: impl Iterator<Item = Coord<D>>,
            bb: &BoundingBox<D>,
        ) {
            self.bits.fill(false);

            let (min, max) = (bb.min(), bb.max());
            let mut ix = [0; D];

            for c in cells {
                // x counts up from the low edge, every other axis down from the high edge
                ix[D - 1] = c[0].abs_diff(min[0]) as usize;
                for axis in 1..D {
                    ix[D - 1 - axis] = max[axis].abs_diff(c[axis]) as usize;
                }
                self.bits[&ix[..]] = true;
            }
        }

        #[cfg(test)]
        pub fn side(&self) -> usize {
            self.bits.shape().first().copied().unwrap_or(0)
        }

        #[cfg(test)]
        pub fn count_ones(&self) -> usize {
            self.bits.iter().filter(|&&b| b).count()
        }
    }

    impl PartialOrd for CanonicalCode {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    impl Ord for CanonicalCode {
        fn cmp(&self, other: &Self) -> Ordering {
            self.bits.iter().cmp(other.bits.iter())
        }
    }
}
