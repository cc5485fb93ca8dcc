//! Rank- and contiguity-typed views.
//!
//! [`ArrayBase`] is a `(pointer, descriptor)` pair typed by its layout marker
//! `L` and its access marker `A`. Indexing and iterating go through the
//! [`ArrayTraits`] factories, so a rank-`N` view yields rank-`N-1` sub-views
//! and a rank-1 view yields scalar references.
//!
//! Re-striding operations (slicing, transposition, permutation) build a new
//! descriptor over the same memory and never copy elements.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{
    Bound, Range, RangeBounds, RangeFrom, RangeFull, RangeInclusive, RangeTo, RangeToInclusive,
};

use tracing::debug;

use crate::access::{Access, Shared, Unique};
use crate::array::Array;
use crate::contiguity::{detect, satisfies};
use crate::descriptor::{
    col_major_strides, linear_offset, row_major_strides, validate_bounds, validate_disjoint, Core,
    CorePtr, Odometer,
};
use crate::expr::Expression;
use crate::iter::Iter;
use crate::traits::{ArrayTraits, AssertConvertible, Dims};
use crate::{Result, ViewError};

/// A view over strided memory with layout `L` and access `A`.
///
/// The view reads the innermost `L::ND` dimensions of its descriptor.
pub struct ArrayBase<'a, T, L, A = Shared> {
    data: *mut T,
    core: CorePtr,
    _marker: PhantomData<(&'a mut T, L, A)>,
}

/// Immutable view of rank `N` and contiguity `C`.
pub type ArrayView<'a, T, const N: usize, const C: i32> = ArrayBase<'a, T, Dims<N, C>, Shared>;

/// Mutable view of rank `N` and contiguity `C`.
pub type ArrayViewMut<'a, T, const N: usize, const C: i32> = ArrayBase<'a, T, Dims<N, C>, Unique>;

/// Pointer, extents and strides of a view, for handing to foreign code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawParts<T> {
    pub data: *mut T,
    pub shape: Vec<usize>,
    pub strides: Vec<isize>,
}

// SAFETY: a shared view hands out `&T` only; a unique view behaves like
// `&mut T` over elements no other view can reach.
unsafe impl<T: Sync, L> Send for ArrayBase<'_, T, L, Shared> {}
unsafe impl<T: Sync, L> Sync for ArrayBase<'_, T, L, Shared> {}
unsafe impl<T: Send, L> Send for ArrayBase<'_, T, L, Unique> {}
unsafe impl<T: Sync, L> Sync for ArrayBase<'_, T, L, Unique> {}

impl<T, L> Clone for ArrayBase<'_, T, L, Shared> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            data: self.data,
            core: self.core.clone(),
            _marker: PhantomData,
        }
    }
}

/// Descriptor for a view of layout `L` over a buffer of `len` elements.
fn checked_core<L: ArrayTraits>(
    len: usize,
    shape: &[usize],
    strides: &[isize],
    offset: usize,
) -> Result<CorePtr> {
    if shape.len() != L::ND {
        return Err(ViewError::RankMismatch(shape.len(), L::ND));
    }
    validate_bounds(len, shape, strides, offset)?;
    if !satisfies(shape, strides, L::RMC) {
        debug!(
            required = L::RMC,
            ?shape,
            ?strides,
            "rejected view construction: contiguity not satisfied"
        );
        return Err(ViewError::ContiguityMismatch {
            required: L::RMC,
            extents: shape.to_vec(),
            strides: strides.to_vec(),
        });
    }
    Core::new(shape, strides)
}

fn bounds_of<R: RangeBounds<usize>>(range: &R, extent: usize) -> Range<usize> {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s + 1,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e + 1,
        Bound::Excluded(&e) => e,
        Bound::Unbounded => extent,
    };
    start..end
}

fn is_permutation(perm: &[usize]) -> Option<usize> {
    let mut seen = vec![false; perm.len()];
    for &p in perm {
        if p >= perm.len() || seen[p] {
            return Some(p);
        }
        seen[p] = true;
    }
    None
}

// ============================================================================
// Construction
// ============================================================================

impl<'a, T: 'a, L: ArrayTraits> ArrayBase<'a, T, L, Shared> {
    /// Create a view over `data`.
    ///
    /// # Errors
    /// Fails when `shape` does not have `L::ND` entries, when a reachable
    /// offset falls outside `data`, or when the strides do not provide the
    /// contiguity level `L::RMC`.
    pub fn from_slice(
        data: &'a [T],
        shape: &[usize],
        strides: &[isize],
        offset: usize,
    ) -> Result<Self> {
        let core = checked_core::<L>(data.len(), shape, strides, offset)?;
        let ptr = data.as_ptr().wrapping_add(offset) as *mut T;
        // SAFETY: every reachable offset lies inside `data`, borrowed for 'a.
        Ok(unsafe { Self::from_raw_parts(ptr, core) })
    }

    /// Row-major view of the leading elements of `data`.
    pub fn from_row_major(data: &'a [T], shape: &[usize]) -> Result<Self> {
        Self::from_slice(data, shape, &row_major_strides(shape), 0)
    }

    /// Column-major view of the leading elements of `data`.
    pub fn from_col_major(data: &'a [T], shape: &[usize]) -> Result<Self> {
        Self::from_slice(data, shape, &col_major_strides(shape), 0)
    }
}

impl<'a, T: 'a, L: ArrayTraits> ArrayBase<'a, T, L, Unique> {
    /// Create a mutable view over `data`.
    ///
    /// # Errors
    /// Same as [`ArrayBase::from_slice`], and additionally fails when two
    /// multi-indices would address the same element.
    pub fn from_slice_mut(
        data: &'a mut [T],
        shape: &[usize],
        strides: &[isize],
        offset: usize,
    ) -> Result<Self> {
        let core = checked_core::<L>(data.len(), shape, strides, offset)?;
        validate_disjoint(shape, strides)?;
        let ptr = data.as_mut_ptr().wrapping_add(offset);
        // SAFETY: in bounds, disjoint, and exclusively borrowed for 'a.
        Ok(unsafe { Self::from_raw_parts(ptr, core) })
    }

    pub fn from_row_major_mut(data: &'a mut [T], shape: &[usize]) -> Result<Self> {
        let strides = row_major_strides(shape);
        Self::from_slice_mut(data, shape, &strides, 0)
    }

    pub fn from_col_major_mut(data: &'a mut [T], shape: &[usize]) -> Result<Self> {
        let strides = col_major_strides(shape);
        Self::from_slice_mut(data, shape, &strides, 0)
    }
}

// ============================================================================
// Queries and dimension recursion
// ============================================================================

impl<'a, T: 'a, L: ArrayTraits, A: Access> ArrayBase<'a, T, L, A> {
    /// Wrap a pointer and descriptor.
    ///
    /// # Safety
    /// - `core` must have at least `L::ND` dimensions.
    /// - Every offset reachable through the innermost `L::ND` extents and
    ///   strides of `core` must be valid for `'a` (for writes too, when
    ///   `A = Unique`), and the strides must satisfy `L::RMC`.
    /// - For `A = Unique`, distinct multi-indices must address distinct
    ///   elements, and no other live reference may reach them.
    #[inline]
    pub unsafe fn from_raw_parts(data: *mut T, core: CorePtr) -> Self {
        debug_assert!(core.rank() >= L::ND);
        Self {
            data,
            core,
            _marker: PhantomData,
        }
    }

    /// Export pointer, extents and strides.
    pub fn raw_parts(&self) -> RawParts<T> {
        RawParts {
            data: self.data,
            shape: self.shape().to_vec(),
            strides: self.strides().to_vec(),
        }
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.core.tail_extents(L::ND)
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.core.tail_strides(L::ND)
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        L::ND
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The shared descriptor. Sub-views may report a descriptor of higher
    /// rank than the view itself.
    #[inline]
    pub fn core(&self) -> &CorePtr {
        &self.core
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.data
    }

    /// Strongest contiguity level the actual strides provide.
    pub fn contiguity(&self) -> i32 {
        detect(self.shape(), self.strides())
    }

    /// Element offset of a multi-index, or `None` when out of bounds.
    pub fn offset_of(&self, index: &[usize]) -> Option<isize> {
        if index.len() != L::ND || index.iter().zip(self.shape()).any(|(&i, &e)| i >= e) {
            return None;
        }
        Some(linear_offset(self.strides(), index))
    }

    /// Element at a full multi-index.
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        let offset = self.offset_of(index)?;
        // SAFETY: the index is in bounds.
        Some(unsafe { &*self.data.offset(offset) })
    }

    #[inline]
    fn outer_ptr(&self, i: usize) -> *mut T {
        self.data.wrapping_offset(self.strides()[0] * i as isize)
    }

    /// Strip the outermost dimension at position `i`.
    ///
    /// Yields a sub-view for rank > 1 and an element reference for rank 1.
    ///
    /// # Panics
    /// If `i` is out of bounds.
    pub fn at(&self, i: usize) -> L::Reference<'_, T, Shared> {
        let extent = self.shape()[0];
        assert!(i < extent, "index {i} out of bounds for extent {extent}");
        // SAFETY: in bounds, and borrowed immutably through `self`.
        unsafe { L::make_reference(self.outer_ptr(i), &self.core) }
    }

    /// Iterate the outermost dimension.
    pub fn iter(&self) -> Iter<L::Iterator<'_, T, Shared>> {
        // SAFETY: `extent` positions spaced by the outer stride are in bounds.
        unsafe {
            Iter::new(
                L::make_iterator(self.data, &self.core, self.strides()[0]),
                self.shape()[0],
            )
        }
    }

    /// Immutable reborrow.
    #[inline]
    pub fn view(&self) -> ArrayBase<'_, T, L, Shared> {
        // SAFETY: same memory, borrowed immutably through `self`.
        unsafe { ArrayBase::from_raw_parts(self.data, self.core.clone()) }
    }

    /// Deep copy into an owning array laid out to satisfy `L`.
    pub fn to_owned(&self) -> Array<T, L>
    where
        T: Clone,
    {
        let strides = self.strides();
        let mut data = Vec::with_capacity(self.len());
        let mut odometer = Odometer::new(self.shape(), L::RMC < 0);
        while let Some(index) = odometer.advance() {
            // SAFETY: the odometer only produces in-bounds indices.
            let x = unsafe { &*self.data.offset(linear_offset(strides, index)) };
            data.push(x.clone());
        }
        Array::from_parts(self.shape(), data)
    }

    /// Deep copy of `at(i)`.
    pub fn get_value(&self, i: usize) -> L::Value<T>
    where
        T: Clone,
    {
        L::to_value(self.at(i))
    }
}

impl<'a, T: 'a, L: ArrayTraits> ArrayBase<'a, T, L, Unique> {
    pub fn get_mut(&mut self, index: &[usize]) -> Option<&mut T> {
        let offset = self.offset_of(index)?;
        // SAFETY: in bounds, and `self` is borrowed mutably.
        Some(unsafe { &mut *self.data.offset(offset) })
    }

    /// Mutable counterpart of [`ArrayBase::at`].
    pub fn at_mut(&mut self, i: usize) -> L::Reference<'_, T, Unique> {
        let extent = self.shape()[0];
        assert!(i < extent, "index {i} out of bounds for extent {extent}");
        // SAFETY: in bounds, and `self` is borrowed mutably.
        unsafe { L::make_reference(self.outer_ptr(i), &self.core) }
    }

    pub fn iter_mut(&mut self) -> Iter<L::Iterator<'_, T, Unique>> {
        // SAFETY: positions are in bounds and, for a unique view, disjoint.
        unsafe {
            Iter::new(
                L::make_iterator(self.data, &self.core, self.strides()[0]),
                self.shape()[0],
            )
        }
    }

    /// Mutable reborrow.
    #[inline]
    pub fn view_mut(&mut self) -> ArrayBase<'_, T, L, Unique> {
        // SAFETY: same memory, borrowed mutably through `self`.
        unsafe { ArrayBase::from_raw_parts(self.data, self.core.clone()) }
    }

    /// Give up write access.
    #[inline]
    pub fn into_view(self) -> ArrayBase<'a, T, L, Shared> {
        // SAFETY: unique access implies shared access.
        unsafe { ArrayBase::from_raw_parts(self.data, self.core) }
    }

    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        let strides = self.strides().to_vec();
        let mut odometer = Odometer::new(self.shape(), false);
        while let Some(index) = odometer.advance() {
            // SAFETY: in bounds, and `self` is borrowed mutably.
            unsafe { *self.data.offset(linear_offset(&strides, index)) = value.clone() };
        }
    }

    /// Evaluate `expr` elementwise into this view.
    ///
    /// # Errors
    /// [`ViewError::ShapeMismatch`] when the shapes differ.
    pub fn assign<E>(&mut self, expr: E) -> Result<()>
    where
        E: Expression<Element = T, Rank = L::Rank>,
    {
        if expr.shape() != self.shape() {
            return Err(ViewError::ShapeMismatch(
                expr.shape().to_vec(),
                self.shape().to_vec(),
            ));
        }
        let data = self.data;
        let strides = self.strides().to_vec();
        let mut odometer = Odometer::new(self.shape(), false);
        expr.for_each_element(&mut |x| {
            if let Some(index) = odometer.advance() {
                // SAFETY: in bounds, and `self` is borrowed mutably.
                unsafe { *data.offset(linear_offset(&strides, index)) = x };
            }
        });
        Ok(())
    }
}

impl<'a, T, L> From<ArrayBase<'a, T, L, Unique>> for ArrayBase<'a, T, L, Shared> {
    #[inline]
    fn from(view: ArrayBase<'a, T, L, Unique>) -> Self {
        Self {
            data: view.data,
            core: view.core,
            _marker: PhantomData,
        }
    }
}

impl<'a, T: 'a, L: ArrayTraits, A: Access> IntoIterator for ArrayBase<'a, T, L, A> {
    type Item = L::Reference<'a, T, A>;
    type IntoIter = Iter<L::Iterator<'a, T, A>>;

    fn into_iter(self) -> Self::IntoIter {
        // SAFETY: the view owns its borrow for 'a; positions are in bounds
        // and, for a unique view, disjoint.
        unsafe {
            Iter::new(
                L::make_iterator(self.data, &self.core, self.strides()[0]),
                self.shape()[0],
            )
        }
    }
}

impl<'a, 'b, T: 'a, L: ArrayTraits, A: Access> IntoIterator for &'b ArrayBase<'a, T, L, A>
where
    T: 'b,
{
    type Item = L::Reference<'b, T, Shared>;
    type IntoIter = Iter<L::Iterator<'b, T, Shared>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, L: ArrayTraits, A: Access> fmt::Debug for ArrayBase<'_, T, L, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayBase")
            .field("ptr", &self.data)
            .field("shape", &self.core.tail_extents(L::ND))
            .field("strides", &self.core.tail_strides(L::ND))
            .field("contiguity", &L::RMC)
            .finish()
    }
}

// ============================================================================
// Layout conversions
// ============================================================================

impl<'a, T: 'a, L: ArrayTraits, A: Access> ArrayBase<'a, T, L, A> {
    /// Weaken the contiguity guarantee.
    ///
    /// Conversions that would strengthen or flip the guarantee fail to build:
    ///
    /// ```compile_fail
    /// use ndview::{ArrayView, Dims};
    ///
    /// let data = [0.0f64; 6];
    /// let a: ArrayView<'_, f64, 2, 1> = ArrayView::from_row_major(&data, &[2, 3]).unwrap();
    /// let _b = a.into_layout::<Dims<2, -1>>();
    /// ```
    #[inline]
    pub fn into_layout<L2: ArrayTraits>(self) -> ArrayBase<'a, T, L2, A> {
        let () = AssertConvertible::<L, L2>::OK;
        // SAFETY: L2 promises no more than L.
        unsafe { ArrayBase::from_raw_parts(self.data, self.core) }
    }

    /// Re-type the view after checking the actual strides.
    ///
    /// # Errors
    /// [`ViewError::RankMismatch`] or [`ViewError::ContiguityMismatch`].
    pub fn try_into_layout<L2: ArrayTraits>(self) -> Result<ArrayBase<'a, T, L2, A>> {
        if L2::ND != L::ND {
            debug!(from = L::ND, to = L2::ND, "rejected layout conversion: rank");
            return Err(ViewError::RankMismatch(L::ND, L2::ND));
        }
        if !satisfies(self.shape(), self.strides(), L2::RMC) {
            debug!(
                from = L::RMC,
                to = L2::RMC,
                shape = ?self.shape(),
                strides = ?self.strides(),
                "rejected layout conversion: contiguity"
            );
            return Err(ViewError::ContiguityMismatch {
                required: L2::RMC,
                extents: self.shape().to_vec(),
                strides: self.strides().to_vec(),
            });
        }
        // SAFETY: the strides satisfy L2.
        Ok(unsafe { ArrayBase::from_raw_parts(self.data, self.core) })
    }

    /// Re-type the view without checking.
    ///
    /// # Safety
    /// `L2` must have rank `L::ND` and its contiguity level must hold for the
    /// actual strides.
    #[inline]
    pub unsafe fn assume_layout<L2: ArrayTraits>(self) -> ArrayBase<'a, T, L2, A> {
        debug_assert_eq!(L2::ND, L::ND);
        ArrayBase::from_raw_parts(self.data, self.core)
    }
}

// ============================================================================
// Re-striding
// ============================================================================

impl<'a, T: 'a, L: ArrayTraits, A: Access> ArrayBase<'a, T, L, A> {
    /// Sub-range of the outermost dimension.
    ///
    /// # Panics
    /// If the range is out of bounds.
    pub fn slice_outer<R: RangeBounds<usize>>(self, range: R) -> ArrayBase<'a, T, L::OuterSliced, A> {
        let extent = self.shape()[0];
        let Range { start, end } = bounds_of(&range, extent);
        assert!(
            start <= end && end <= extent,
            "range {start}..{end} out of bounds for extent {extent}"
        );
        let mut extents = self.shape().to_vec();
        let strides = self.strides().to_vec();
        extents[0] = end - start;
        let data = self.outer_ptr(start);
        let core = self.core.derive(extents, strides);
        // SAFETY: a sub-range of the parent's reachable offsets.
        unsafe { ArrayBase::from_raw_parts(data, core) }
    }

    /// Slice one axis. An [`Idx`] keeps the axis with extent 1.
    ///
    /// # Errors
    /// [`ViewError::InvalidAxis`] for an axis beyond the rank and
    /// [`ViewError::OffsetOverflow`] for a range outside the extent.
    ///
    /// # Panics
    /// If the step is zero.
    pub fn slice_axis<I: SliceIndex>(
        self,
        axis: usize,
        index: I,
    ) -> Result<ArrayBase<'a, T, L::Strided, A>> {
        if axis >= L::ND {
            return Err(ViewError::InvalidAxis { axis, rank: L::ND });
        }
        let extent = self.shape()[axis];
        let range = index.to_range(extent);
        let step = index.step();
        assert!(step != 0, "slice step must be non-zero");

        let len = if step > 0 {
            if range.start > range.end || range.end > extent {
                return Err(ViewError::OffsetOverflow);
            }
            (range.end - range.start).div_ceil(step as usize)
        } else {
            if range.end > range.start || (range.start >= extent && range.start != range.end) {
                return Err(ViewError::OffsetOverflow);
            }
            (range.start - range.end).div_ceil(step.unsigned_abs())
        };

        let mut extents = self.shape().to_vec();
        let mut strides = self.strides().to_vec();
        let data = if len > 0 {
            self.data
                .wrapping_offset(strides[axis] * range.start as isize)
        } else {
            self.data
        };
        extents[axis] = len;
        strides[axis] *= step;
        let core = self.core.derive(extents, strides);
        // SAFETY: every new index maps onto an index of the parent.
        Ok(unsafe { ArrayBase::from_raw_parts(data, core) })
    }

    /// Reverse the dimension order.
    pub fn transpose(self) -> ArrayBase<'a, T, L::Transposed, A> {
        let extents: Vec<usize> = self.shape().iter().rev().copied().collect();
        let strides: Vec<isize> = self.strides().iter().rev().copied().collect();
        let core = self.core.derive(extents, strides);
        // SAFETY: same set of offsets.
        unsafe { ArrayBase::from_raw_parts(self.data, core) }
    }

    /// Reorder dimensions: axis `i` of the result is axis `perm[i]` of `self`.
    ///
    /// # Errors
    /// [`ViewError::RankMismatch`] for a wrong length and
    /// [`ViewError::InvalidAxis`] when `perm` is not a permutation.
    pub fn permute(self, perm: &[usize]) -> Result<ArrayBase<'a, T, L::Strided, A>> {
        if perm.len() != L::ND {
            return Err(ViewError::RankMismatch(perm.len(), L::ND));
        }
        if let Some(axis) = is_permutation(perm) {
            return Err(ViewError::InvalidAxis { axis, rank: L::ND });
        }
        let extents = perm.iter().map(|&p| self.shape()[p]).collect();
        let strides = perm.iter().map(|&p| self.strides()[p]).collect();
        let core = self.core.derive(extents, strides);
        // SAFETY: same set of offsets.
        Ok(unsafe { ArrayBase::from_raw_parts(self.data, core) })
    }
}

// ============================================================================
// Slice indices
// ============================================================================

/// Types usable as an index for [`ArrayBase::slice_axis`].
pub trait SliceIndex {
    /// Convert to a range given the dimension size.
    fn to_range(&self, dim_size: usize) -> Range<usize>;

    /// Step between selected positions.
    fn step(&self) -> isize {
        1
    }
}

impl SliceIndex for RangeFull {
    fn to_range(&self, dim_size: usize) -> Range<usize> {
        0..dim_size
    }
}

impl SliceIndex for Range<usize> {
    fn to_range(&self, _dim_size: usize) -> Range<usize> {
        self.clone()
    }
}

impl SliceIndex for RangeFrom<usize> {
    fn to_range(&self, dim_size: usize) -> Range<usize> {
        self.start..dim_size
    }
}

impl SliceIndex for RangeTo<usize> {
    fn to_range(&self, _dim_size: usize) -> Range<usize> {
        0..self.end
    }
}

/// `start..=end` as a half-open range. An `end` of `usize::MAX` maps to an
/// empty range past any extent.
fn inclusive(start: usize, end: usize) -> Range<usize> {
    match end.checked_add(1) {
        Some(stop) => start..stop,
        None => usize::MAX..usize::MAX,
    }
}

impl SliceIndex for RangeInclusive<usize> {
    fn to_range(&self, _dim_size: usize) -> Range<usize> {
        inclusive(*self.start(), *self.end())
    }
}

impl SliceIndex for RangeToInclusive<usize> {
    fn to_range(&self, _dim_size: usize) -> Range<usize> {
        inclusive(0, self.end)
    }
}

/// A single position.
#[derive(Debug, Clone, Copy)]
pub struct Idx(pub usize);

impl SliceIndex for Idx {
    fn to_range(&self, _dim_size: usize) -> Range<usize> {
        inclusive(self.0, self.0)
    }
}

/// `start..end` with a step. A negative step walks from `start` down to
/// `end` (exclusive).
#[derive(Debug, Clone, Copy)]
pub struct StridedRange {
    pub start: usize,
    pub end: usize,
    pub step: isize,
}

impl StridedRange {
    pub fn new(start: usize, end: usize, step: isize) -> Self {
        Self { start, end, step }
    }
}

impl SliceIndex for StridedRange {
    fn to_range(&self, _dim_size: usize) -> Range<usize> {
        self.start..self.end
    }

    fn step(&self) -> isize {
        self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ArrayTraits, Dims};
    use std::any::TypeId;

    fn layout_of<T, L: 'static, A>(_: &ArrayBase<'_, T, L, A>) -> TypeId {
        TypeId::of::<L>()
    }

    #[test]
    fn test_row_major_visit_order() {
        let data: Vec<i32> = (0..6).collect();
        let a: ArrayView<'_, i32, 2, 2> = ArrayView::from_row_major(&data, &[2, 3]).unwrap();
        let mut visited = Vec::new();
        for row in a.iter() {
            for x in row {
                visited.push(*x);
            }
        }
        assert_eq!(visited, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_col_major_visit_order() {
        let data: Vec<i32> = (0..6).collect();
        let a: ArrayView<'_, i32, 2, -2> = ArrayView::from_col_major(&data, &[2, 3]).unwrap();
        let visited: Vec<i32> = a.iter().flat_map(|row| row.into_iter().copied()).collect();
        assert_eq!(visited, vec![0, 2, 4, 1, 3, 5]);
    }

    #[test]
    fn test_nested_address_matches_offset() {
        let data: Vec<f64> = (0..60).map(|x| x as f64).collect();
        let strides = [20isize, 1, 5];
        let a: ArrayView<'_, f64, 3, 0> = ArrayView::from_slice(&data, &[3, 5, 4], &strides, 0).unwrap();
        let base = a.as_ptr();
        for (i, plane) in a.iter().enumerate() {
            for (j, line) in plane.iter().enumerate() {
                for (k, x) in line.iter().enumerate() {
                    let expected =
                        base.wrapping_offset(i as isize * 20 + j as isize + k as isize * 5);
                    assert_eq!(x as *const f64, expected);
                }
            }
        }
    }

    #[test]
    fn test_at_returns_sub_view() {
        let data: Vec<i32> = (0..24).collect();
        let a: ArrayView<'_, i32, 3, 3> = ArrayView::from_row_major(&data, &[2, 3, 4]).unwrap();
        let plane = a.at(1);
        assert_eq!(plane.shape(), &[3, 4]);
        assert_eq!(plane.strides(), &[4, 1]);
        assert_eq!(*plane.at(2).at(3), 23);
        assert_eq!(layout_of(&plane), TypeId::of::<Dims<2, 2>>());
    }

    #[test]
    fn test_sub_views_share_descriptor() {
        let data: Vec<i32> = (0..6).collect();
        let a: ArrayView<'_, i32, 2, 2> = ArrayView::from_row_major(&data, &[2, 3]).unwrap();
        let row = a.at(0);
        assert!(std::sync::Arc::ptr_eq(a.core(), row.core()));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_at_out_of_bounds() {
        let data = [1, 2, 3];
        let a: ArrayView<'_, i32, 1, 1> = ArrayView::from_row_major(&data, &[3]).unwrap();
        let _ = a.at(3);
    }

    #[test]
    fn test_get_and_offset_of() {
        let data: Vec<i32> = (0..6).collect();
        let a: ArrayView<'_, i32, 2, -2> = ArrayView::from_col_major(&data, &[2, 3]).unwrap();
        assert_eq!(a.offset_of(&[1, 2]), Some(5));
        assert_eq!(a.get(&[1, 1]), Some(&3));
        assert_eq!(a.get(&[2, 0]), None);
        assert_eq!(a.get(&[0]), None);
    }

    #[test]
    fn test_from_slice_rejects_contiguity() {
        let data = [0.0f64; 8];
        let r: Result<ArrayView<'_, f64, 2, 2>> = ArrayView::from_slice(&data, &[2, 3], &[4, 1], 0);
        assert!(matches!(
            r,
            Err(ViewError::ContiguityMismatch { required: 2, .. })
        ));
        let ok: Result<ArrayView<'_, f64, 2, 1>> = ArrayView::from_slice(&data, &[2, 3], &[4, 1], 0);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_from_slice_rejects_rank() {
        let data = [0.0f64; 6];
        let r: Result<ArrayView<'_, f64, 3, 0>> = ArrayView::from_row_major(&data, &[2, 3]);
        assert!(matches!(r, Err(ViewError::RankMismatch(2, 3))));
    }

    #[test]
    fn test_from_slice_rejects_bounds() {
        let data = [0.0f64; 5];
        let r: Result<ArrayView<'_, f64, 2, 2>> = ArrayView::from_row_major(&data, &[2, 3]);
        assert!(matches!(r, Err(ViewError::OffsetOverflow)));
    }

    #[test]
    fn test_from_slice_mut_rejects_overlap() {
        let mut data = [0.0f64; 4];
        let r: Result<ArrayViewMut<'_, f64, 2, 0>> =
            ArrayViewMut::from_slice_mut(&mut data, &[2, 2], &[1, 1], 0);
        assert!(matches!(r, Err(ViewError::OverlappingStrides { .. })));
    }

    #[test]
    fn test_iter_mut_writes() {
        let mut data = vec![0i32; 6];
        {
            let mut a: ArrayViewMut<'_, i32, 2, 2> =
                ArrayViewMut::from_row_major_mut(&mut data, &[2, 3]).unwrap();
            for (i, row) in a.iter_mut().enumerate() {
                for (j, x) in row.into_iter().enumerate() {
                    *x = (10 * i + j) as i32;
                }
            }
            *a.get_mut(&[0, 0]).unwrap() = -1;
            *a.at_mut(1).at_mut(2) = 99;
        }
        assert_eq!(data, vec![-1, 1, 2, 10, 11, 99]);
    }

    #[test]
    fn test_fill() {
        let mut data = vec![0i32; 6];
        let mut a: ArrayViewMut<'_, i32, 2, 0> =
            ArrayViewMut::from_slice_mut(&mut data, &[3, 1], &[2, 1], 0).unwrap();
        a.fill(7);
        assert_eq!(data, vec![7, 0, 7, 0, 7, 0]);
    }

    #[test]
    fn test_slice_outer_keeps_contiguity() {
        let data: Vec<i32> = (0..12).collect();
        let a: ArrayView<'_, i32, 2, 2> = ArrayView::from_row_major(&data, &[4, 3]).unwrap();
        let b = a.slice_outer(1..3);
        assert_eq!(layout_of(&b), TypeId::of::<Dims<2, 2>>());
        assert_eq!(b.shape(), &[2, 3]);
        assert_eq!(*b.at(0).at(0), 3);
        assert_eq!(b.contiguity(), 2);
    }

    #[test]
    fn test_slice_outer_col_major_degrades() {
        let data: Vec<i32> = (0..12).collect();
        let a: ArrayView<'_, i32, 2, -2> = ArrayView::from_col_major(&data, &[4, 3]).unwrap();
        let b = a.slice_outer(1..=2);
        assert_eq!(layout_of(&b), TypeId::of::<Dims<2, -1>>());
        assert_eq!(b.get(&[0, 1]), Some(&5));
        assert_eq!(b.contiguity(), -1);
    }

    #[test]
    fn test_slice_axis_strided() {
        let data: Vec<i32> = (0..10).collect();
        let a: ArrayView<'_, i32, 1, 1> = ArrayView::from_row_major(&data, &[10]).unwrap();
        let b = a.clone().slice_axis(0, StridedRange::new(0, 10, 3)).unwrap();
        let got: Vec<i32> = b.iter().copied().collect();
        assert_eq!(got, vec![0, 3, 6, 9]);

        let rev = a.slice_axis(0, StridedRange::new(9, 0, -4)).unwrap();
        let got: Vec<i32> = rev.iter().copied().collect();
        assert_eq!(got, vec![9, 5, 1]);
    }

    #[test]
    fn test_slice_axis_inner() {
        let data: Vec<i32> = (0..12).collect();
        let a: ArrayView<'_, i32, 2, 2> = ArrayView::from_row_major(&data, &[3, 4]).unwrap();
        let col = a.clone().slice_axis(1, Idx(2)).unwrap();
        assert_eq!(layout_of(&col), TypeId::of::<Dims<2, 0>>());
        assert_eq!(col.shape(), &[3, 1]);
        let got: Vec<i32> = col.iter().map(|r| *r.at(0)).collect();
        assert_eq!(got, vec![2, 6, 10]);

        assert!(matches!(
            a.clone().slice_axis(2, ..),
            Err(ViewError::InvalidAxis { axis: 2, rank: 2 })
        ));
        assert!(matches!(
            a.slice_axis(1, 2..5),
            Err(ViewError::OffsetOverflow)
        ));
    }

    #[test]
    fn test_slice_axis_index_at_usize_max() {
        let data: Vec<i32> = (0..6).collect();
        let a: ArrayView<'_, i32, 2, 2> = ArrayView::from_row_major(&data, &[2, 3]).unwrap();
        assert!(matches!(
            a.clone().slice_axis(0, Idx(usize::MAX)),
            Err(ViewError::OffsetOverflow)
        ));
        assert!(matches!(
            a.clone().slice_axis(1, ..=usize::MAX),
            Err(ViewError::OffsetOverflow)
        ));
        assert!(matches!(
            a.clone().slice_axis(1, 1..=usize::MAX),
            Err(ViewError::OffsetOverflow)
        ));

        // The last position is still reachable through every inclusive form.
        let last = a.clone().slice_axis(1, Idx(2)).unwrap();
        assert_eq!(last.shape(), &[2, 1]);
        assert_eq!(a.clone().slice_axis(1, ..=2).unwrap().shape(), &[2, 3]);
        assert_eq!(a.slice_axis(1, 2..=2).unwrap().shape(), &[2, 1]);
    }

    #[test]
    fn test_transpose() {
        let data: Vec<i32> = (0..6).collect();
        let a: ArrayView<'_, i32, 2, 2> = ArrayView::from_row_major(&data, &[2, 3]).unwrap();
        let t = a.transpose();
        assert_eq!(layout_of(&t), TypeId::of::<Dims<2, -2>>());
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.strides(), &[1, 3]);
        assert_eq!(t.get(&[2, 1]), Some(&5));
        assert_eq!(t.contiguity(), -2);
    }

    #[test]
    fn test_permute() {
        let data: Vec<i32> = (0..24).collect();
        let a: ArrayView<'_, i32, 3, 3> = ArrayView::from_row_major(&data, &[2, 3, 4]).unwrap();
        let p = a.clone().permute(&[2, 0, 1]).unwrap();
        assert_eq!(p.shape(), &[4, 2, 3]);
        assert_eq!(p.strides(), &[1, 12, 4]);
        assert_eq!(p.get(&[3, 1, 2]), a.get(&[1, 2, 3]));
        assert!(matches!(
            a.clone().permute(&[0, 0, 1]),
            Err(ViewError::InvalidAxis { .. })
        ));
        assert!(matches!(a.permute(&[0, 1]), Err(ViewError::RankMismatch(2, 3))));
    }

    #[test]
    fn test_into_layout_weakens() {
        let data: Vec<i32> = (0..6).collect();
        let a: ArrayView<'_, i32, 2, 2> = ArrayView::from_row_major(&data, &[2, 3]).unwrap();
        let b = a.into_layout::<Dims<2, 1>>();
        let c = b.into_layout::<Dims<2, 0>>();
        assert_eq!(c.get(&[1, 2]), Some(&5));
    }

    #[test]
    fn test_into_layout_rank_one_cross() {
        let data = [1, 2, 3];
        let a: ArrayView<'_, i32, 1, 1> = ArrayView::from_row_major(&data, &[3]).unwrap();
        let b = a.into_layout::<Dims<1, -1>>();
        assert_eq!(b.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_try_into_layout() {
        let data: Vec<i32> = (0..6).collect();
        let a: ArrayView<'_, i32, 2, 0> = ArrayView::from_row_major(&data, &[2, 3]).unwrap();
        let b = a.clone().try_into_layout::<Dims<2, 2>>().unwrap();
        assert_eq!(b.shape(), &[2, 3]);
        assert!(matches!(
            a.clone().try_into_layout::<Dims<2, -1>>(),
            Err(ViewError::ContiguityMismatch { required: -1, .. })
        ));
        assert!(matches!(
            a.try_into_layout::<Dims<3, 0>>(),
            Err(ViewError::RankMismatch(2, 3))
        ));
    }

    #[test]
    fn test_unique_into_shared() {
        let mut data = vec![1, 2, 3, 4];
        let a: ArrayViewMut<'_, i32, 2, 2> = ArrayViewMut::from_row_major_mut(&mut data, &[2, 2]).unwrap();
        let b: ArrayView<'_, i32, 2, 2> = a.into();
        let c = b.clone();
        assert_eq!(c.get(&[1, 0]), Some(&3));
    }

    #[test]
    fn test_to_owned_orders() {
        let data: Vec<i32> = (0..6).collect();
        let a: ArrayView<'_, i32, 2, 0> = ArrayView::from_slice(&data, &[2, 3], &[1, 2], 0).unwrap();
        let owned = a.to_owned();
        assert_eq!(owned.as_slice(), &[0, 2, 4, 1, 3, 5]);

        let c = a.into_layout::<Dims<2, 0>>();
        let t = c.transpose().try_into_layout::<Dims<2, 2>>().unwrap();
        assert_eq!(t.to_owned().as_slice(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_col_major_to_owned_keeps_layout() {
        let data: Vec<i32> = (0..6).collect();
        let a: ArrayView<'_, i32, 2, -2> = ArrayView::from_col_major(&data, &[2, 3]).unwrap();
        let owned = a.to_owned();
        assert_eq!(owned.as_slice(), &data[..]);
        assert_eq!(owned.strides(), &[1, 2]);
    }

    #[test]
    fn test_get_value() {
        let data: Vec<i32> = (0..6).collect();
        let a: ArrayView<'_, i32, 2, 2> = ArrayView::from_row_major(&data, &[2, 3]).unwrap();
        let row = a.get_value(1);
        assert_eq!(row.as_slice(), &[3, 4, 5]);
        let x: i32 = a.at(0).get_value(2);
        assert_eq!(x, 2);
    }

    #[test]
    fn test_raw_parts() {
        let data: Vec<i32> = (0..6).collect();
        let a: ArrayView<'_, i32, 2, 2> = ArrayView::from_row_major(&data, &[2, 3]).unwrap();
        let parts = a.raw_parts();
        assert_eq!(parts.data as *const i32, data.as_ptr());
        assert_eq!(parts.shape, vec![2, 3]);
        assert_eq!(parts.strides, vec![3, 1]);
        let core = Core::new(&parts.shape, &parts.strides).unwrap();
        let back: ArrayView<'_, i32, 2, 2> = unsafe { ArrayView::from_raw_parts(parts.data, core) };
        assert_eq!(back.get(&[1, 1]), Some(&4));
    }

    #[test]
    fn test_empty_view() {
        let data: [f64; 0] = [];
        let a: ArrayView<'_, f64, 2, 2> = ArrayView::from_row_major(&data, &[0, 3]).unwrap();
        assert!(a.is_empty());
        assert_eq!(a.iter().count(), 0);
    }

    #[test]
    fn test_views_are_send_sync() {
        fn assert_send_sync<V: Send + Sync>() {}
        assert_send_sync::<ArrayView<'static, f64, 3, 1>>();
        assert_send_sync::<ArrayViewMut<'static, f64, 2, -2>>();
        assert_eq!(<Dims<3, 1> as ArrayTraits>::ND, 3);
    }
}
