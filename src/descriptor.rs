//! Shape descriptors shared by views over the same buffer region.
//!
//! A [`Core`] records the extents and strides of a buffer region together with
//! an optional lifetime [`Anchor`]. Descriptors are immutable once built and
//! are handed around as [`CorePtr`] (`Arc<Core>`), so any number of views,
//! sub-views and iterators can share one descriptor.
//!
//! Dimensions are stored outermost first. A rank-`N` view reads the *last*
//! `N` entries of its descriptor, which is what lets a sub-view obtained by
//! stripping the outermost dimension keep pointing at the same `Core`.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{Result, ViewError};

/// Reference-counted token keeping the backing memory of a descriptor alive.
///
/// The buffer is released when the last descriptor holding the anchor is
/// dropped.
pub type Anchor = Arc<dyn Any + Send + Sync>;

/// Shared handle to an immutable [`Core`].
pub type CorePtr = Arc<Core>;

/// Extents, strides and lifetime anchor of a buffer region.
pub struct Core {
    extents: Box<[usize]>,
    strides: Box<[isize]>,
    anchor: Option<Anchor>,
}

impl Core {
    /// Descriptor for memory whose lifetime is managed elsewhere.
    pub fn new(extents: &[usize], strides: &[isize]) -> Result<CorePtr> {
        Self::build(extents, strides, None)
    }

    /// Descriptor that keeps `anchor` alive for as long as it exists.
    pub fn with_anchor(extents: &[usize], strides: &[isize], anchor: Anchor) -> Result<CorePtr> {
        Self::build(extents, strides, Some(anchor))
    }

    /// New descriptor over the same memory, sharing this descriptor's anchor.
    pub fn restride(&self, extents: &[usize], strides: &[isize]) -> Result<CorePtr> {
        Self::build(extents, strides, self.anchor.clone())
    }

    /// Like [`Core::restride`] for callers that already hold matching lengths.
    pub(crate) fn derive(&self, extents: Vec<usize>, strides: Vec<isize>) -> CorePtr {
        debug_assert_eq!(extents.len(), strides.len());
        Arc::new(Core {
            extents: extents.into_boxed_slice(),
            strides: strides.into_boxed_slice(),
            anchor: self.anchor.clone(),
        })
    }

    /// Descriptor from extents and strides of equal length.
    pub(crate) fn from_validated(
        extents: &[usize],
        strides: &[isize],
        anchor: Option<Anchor>,
    ) -> Core {
        debug_assert_eq!(extents.len(), strides.len());
        Core {
            extents: extents.into(),
            strides: strides.into(),
            anchor,
        }
    }

    fn build(extents: &[usize], strides: &[isize], anchor: Option<Anchor>) -> Result<CorePtr> {
        if extents.len() != strides.len() {
            return Err(ViewError::StrideLengthMismatch);
        }
        Ok(Arc::new(Core {
            extents: extents.into(),
            strides: strides.into(),
            anchor,
        }))
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.extents.len()
    }

    #[inline]
    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn anchor(&self) -> Option<&Anchor> {
        self.anchor.as_ref()
    }

    /// Extents of the innermost `rank` dimensions.
    #[inline]
    pub(crate) fn tail_extents(&self, rank: usize) -> &[usize] {
        &self.extents[self.extents.len() - rank..]
    }

    /// Strides of the innermost `rank` dimensions.
    #[inline]
    pub(crate) fn tail_strides(&self, rank: usize) -> &[isize] {
        &self.strides[self.strides.len() - rank..]
    }
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("extents", &self.extents)
            .field("strides", &self.strides)
            .field("anchored", &self.anchor.is_some())
            .finish()
    }
}

/// Compute row-major strides (last index varies fastest).
pub fn row_major_strides(extents: &[usize]) -> Vec<isize> {
    let rank = extents.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * extents[i + 1] as isize;
    }
    strides
}

/// Compute column-major strides (first index varies fastest).
pub fn col_major_strides(extents: &[usize]) -> Vec<isize> {
    let rank = extents.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in 1..rank {
        strides[i] = strides[i - 1] * extents[i - 1] as isize;
    }
    strides
}

/// Element offset of a multi-index: `Σ index[i] * strides[i]`.
#[inline]
pub(crate) fn linear_offset(strides: &[isize], index: &[usize]) -> isize {
    strides
        .iter()
        .zip(index)
        .map(|(&s, &i)| s * i as isize)
        .sum()
}

/// Multi-index counter over a shape, in row-major or column-major order.
pub(crate) struct Odometer {
    extents: Vec<usize>,
    index: Vec<usize>,
    col_major: bool,
    started: bool,
    done: bool,
}

impl Odometer {
    pub(crate) fn new(extents: &[usize], col_major: bool) -> Self {
        Self {
            extents: extents.to_vec(),
            index: vec![0; extents.len()],
            col_major,
            started: false,
            done: extents.contains(&0),
        }
    }

    /// Next multi-index, or `None` once every index has been produced.
    pub(crate) fn advance(&mut self) -> Option<&[usize]> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(&self.index);
        }
        let rank = self.extents.len();
        for k in 0..rank {
            let d = if self.col_major { k } else { rank - 1 - k };
            self.index[d] += 1;
            if self.index[d] < self.extents[d] {
                return Some(&self.index);
            }
            self.index[d] = 0;
        }
        self.done = true;
        None
    }
}

/// Validate that all reachable offsets stay within `[0, len)`.
pub(crate) fn validate_bounds(
    len: usize,
    extents: &[usize],
    strides: &[isize],
    offset: usize,
) -> Result<()> {
    if extents.len() != strides.len() {
        return Err(ViewError::StrideLengthMismatch);
    }
    if extents.contains(&0) {
        return Ok(());
    }
    let mut min_offset = offset as isize;
    let mut max_offset = offset as isize;
    for (&extent, &stride) in extents.iter().zip(strides) {
        if extent > 1 {
            let end = stride
                .checked_mul(extent as isize - 1)
                .ok_or(ViewError::OffsetOverflow)?;
            if end >= 0 {
                max_offset = max_offset
                    .checked_add(end)
                    .ok_or(ViewError::OffsetOverflow)?;
            } else {
                min_offset = min_offset
                    .checked_add(end)
                    .ok_or(ViewError::OffsetOverflow)?;
            }
        }
    }
    if min_offset < 0 || max_offset < 0 || max_offset as usize >= len {
        return Err(ViewError::OffsetOverflow);
    }
    Ok(())
}

/// Validate that no two multi-indices address the same element.
///
/// Dimensions are ordered by stride magnitude; each stride must step over
/// the whole span covered by the smaller ones.
pub(crate) fn validate_disjoint(extents: &[usize], strides: &[isize]) -> Result<()> {
    if extents.contains(&0) {
        return Ok(());
    }
    let mut dims: Vec<(usize, usize)> = extents
        .iter()
        .zip(strides)
        .filter(|&(&e, _)| e > 1)
        .map(|(&e, &s)| (e, s.unsigned_abs()))
        .collect();
    dims.sort_unstable_by_key(|&(_, s)| s);

    let mut span = 0usize;
    for (extent, stride) in dims {
        if stride <= span {
            return Err(ViewError::OverlappingStrides {
                extents: extents.to_vec(),
                strides: strides.to_vec(),
            });
        }
        span = stride
            .checked_mul(extent - 1)
            .and_then(|s| s.checked_add(span))
            .ok_or(ViewError::OffsetOverflow)?;
    }
    Ok(())
}
