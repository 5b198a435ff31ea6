//! The half-diamond of lattice cells a shape of up to `n` cells can reach
//! from the origin.
//!
//! Every fixed shape has exactly one translate whose first cell, ordered by
//! the highest axis first, sits on the origin. All other cells of that
//! translate lie within L1 distance `n - 1` and are lexicographically above
//! the origin, so the region never clips a shape of size `n`.

use crate::lattice::Coord;

pub fn candidate_region<const D: usize>(n: usize) -> Vec<Coord<D>> {
    if n == 0 {
        return Vec::new();
    }

    let reach = i32::try_from(n - 1).unwrap_or(i32::MAX);
    let mut out = Vec::new();
    let mut c = Coord([-reach; D]);

    loop {
        if in_region(&c, reach) {
            out.push(c);
        }

        // odometer over the [-reach, reach]^D box, last axis slowest
        let Some(axis) = (0..D).find(|&axis| c[axis] < reach) else {
            break;
        };
        c.0[axis] += 1;
        c.0[..axis].fill(-reach);
    }

    out
}

fn in_region<const D: usize>(c: &Coord<D>, reach: i32) -> bool {
    if c.l1_norm() > reach.unsigned_abs() {
        return false;
    }

    // the highest non-zero axis decides which half a cell belongs to
    match c.0.iter().rev().find(|&&v| v != 0) {
        Some(&v) => v > 0,
        None => true,
    }
}

#[test]
fn test_region_2d_matches_strip_and_triangle() {
    let n = 5;
    let mut region = candidate_region::<2>(n);
    region.sort();

    let reach = n as i32 - 1;
    let mut expected: Vec<Coord<2>> = (0..=reach).map(|x| Coord([x, 0])).collect();
    for y in 1..=reach {
        for x in -(reach - y)..=(reach - y) {
            expected.push(Coord([x, y]));
        }
    }
    expected.sort();

    assert_eq!(region, expected);
}

#[test]
fn test_region_3d_layers() {
    let n = 4;
    let region = candidate_region::<3>(n);
    let base: Vec<_> = candidate_region::<2>(n);

    let floor = region.iter().filter(|c| c[2] == 0).count();
    assert_eq!(floor, base.len());

    assert!(region.iter().all(|c| c[2] >= 0));
    assert!(region.contains(&Coord([0, -2, 1])));
    assert!(!region.contains(&Coord([0, -1, 0])));
    assert!(!region.contains(&Coord([-1, 0, 0])));
    assert!(!region.contains(&Coord([0, 0, 4])));
}

#[test]
fn test_region_degenerate_sizes() {
    assert!(candidate_region::<3>(0).is_empty());
    assert_eq!(candidate_region::<3>(1), vec![Coord::origin()]);
    assert_eq!(candidate_region::<2>(2).len(), 3);
}
