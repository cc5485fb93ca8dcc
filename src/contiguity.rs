//! Contiguity levels: the degradation rule, the convertibility predicate and
//! run-time detection.
//!
//! A contiguity level `C` is attached to a view *type*. `C = k > 0` promises
//! that the innermost `k` dimensions are row-major packed, `C = -k < 0` that
//! the outermost `k` dimensions are column-major packed, and `C = 0` promises
//! nothing. The functions here are `const` so that the layout table in
//! [`crate::Dims`] can be computed from them at compile time.

/// Contiguity of the sub-view obtained by stripping the outermost dimension
/// of a rank-`n` view with contiguity `c`.
///
/// A fully row-major view stays fully row-major; otherwise positive levels
/// survive and negative ones are lost.
pub const fn sub_contiguity(n: usize, c: i32) -> i32 {
    if n as i32 == c {
        c - 1
    } else if c > 0 {
        c
    } else {
        0
    }
}

/// Whether a rank-`n` view of contiguity `from` may stand in where contiguity
/// `to` is required.
///
/// Guarantees may only be weakened toward zero within the same sign, except
/// for rank 1 where row- and column-major contiguity coincide.
pub const fn is_convertible(n: usize, from: i32, to: i32) -> bool {
    (from >= to && to >= 0) || (from <= to && to <= 0) || (n == 1 && to == -from)
}

/// Contiguity after sub-ranging the outermost dimension.
///
/// Row-major guarantees never involve the outermost stride's relation to its
/// own extent, so they survive. A column-major guarantee keeps only the unit
/// stride of the outermost dimension.
pub const fn outer_sliced_contiguity(c: i32) -> i32 {
    if c >= 0 {
        c
    } else {
        -1
    }
}

/// Whether `strides` actually provide contiguity level `c`.
///
/// Dimensions of extent 0 or 1 never constrain the result: their stride is
/// never used to reach a second element.
pub fn satisfies(extents: &[usize], strides: &[isize], c: i32) -> bool {
    let rank = extents.len();
    if c.unsigned_abs() as usize > rank {
        return false;
    }
    if extents.contains(&0) {
        return true;
    }
    let k = c.unsigned_abs() as usize;
    let mut expected = 1isize;
    let mut check = |i: usize| {
        if extents[i] <= 1 {
            return true;
        }
        if strides[i] != expected {
            return false;
        }
        expected *= extents[i] as isize;
        true
    };
    if c > 0 {
        (rank - k..rank).rev().all(&mut check)
    } else {
        (0..k).all(&mut check)
    }
}

/// The strongest contiguity level `strides` provide.
///
/// Full row-major contiguity is reported as `rank`, full column-major as
/// `-rank`; when both hold (e.g. rank 1) the positive level wins. Otherwise the
/// longer of the row-major and column-major runs is reported.
pub fn detect(extents: &[usize], strides: &[isize]) -> i32 {
    let rank = extents.len() as i32;
    let row = (0..=rank).rev().find(|&c| satisfies(extents, strides, c));
    let col = (1..=rank).rev().find(|&c| satisfies(extents, strides, -c));
    match (row, col) {
        (Some(r), Some(c)) if c > r => -c,
        (Some(r), _) => r,
        (None, Some(c)) => -c,
        (None, None) => 0,
    }
}
