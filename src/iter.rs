//! Random-access cursors and the iterator adaptor built on top of them.
//!
//! A [`Cursor`] is a position in one dimension of a view: it can be read,
//! moved by any signed number of steps, and measured against another cursor
//! of the same kind. Cursors never check bounds; [`Iter`] pairs two of them
//! with a length to give a safe `Iterator`.
//!
//! Cursor equality compares addresses only. Two cursors built with different
//! strides compare equal when they happen to sit on the same element.

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem;
use std::ops::Sub;

use crate::access::{Access, Shared, Unique};
use crate::descriptor::CorePtr;
use crate::traits::ArrayTraits;

/// Random-access position within one dimension.
pub trait Cursor: Clone {
    type Item;

    /// Produce the item at the current position.
    ///
    /// # Safety
    /// The position must lie inside the dimension the cursor was built for,
    /// and for unique access no other live item may alias it.
    unsafe fn read(&self) -> Self::Item;

    /// Move by `n` steps (negative moves backwards).
    fn advance(&mut self, n: isize);

    #[inline]
    fn increment(&mut self) {
        self.advance(1);
    }

    #[inline]
    fn decrement(&mut self) {
        self.advance(-1);
    }

    /// Number of steps from `self` to `other`.
    fn distance_to(&self, other: &Self) -> isize;
}

#[inline(always)]
fn element_delta<T>(from: *const T, to: *const T) -> isize {
    let bytes = (to as usize).wrapping_sub(from as usize) as isize;
    bytes / mem::size_of::<T>().max(1) as isize
}

// ============================================================================
// StridedIter
// ============================================================================

/// Cursor over rank-1 data with a run-time stride.
pub struct StridedIter<'a, T, A = Shared> {
    ptr: *mut T,
    stride: isize,
    _marker: PhantomData<(&'a mut T, A)>,
}

impl<'a, T, A> StridedIter<'a, T, A> {
    #[inline]
    pub(crate) fn new(ptr: *mut T, stride: isize) -> Self {
        Self {
            ptr,
            stride,
            _marker: PhantomData,
        }
    }

    /// Current element address.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    #[inline]
    pub fn stride(&self) -> isize {
        self.stride
    }
}

impl<T, A> Clone for StridedIter<'_, T, A> {
    #[inline]
    fn clone(&self) -> Self {
        Self::new(self.ptr, self.stride)
    }
}

impl<'a, T: 'a, A: Access> Cursor for StridedIter<'a, T, A> {
    type Item = A::Ref<'a, T>;

    #[inline(always)]
    unsafe fn read(&self) -> Self::Item {
        A::deref(self.ptr)
    }

    #[inline(always)]
    fn advance(&mut self, n: isize) {
        self.ptr = self.ptr.wrapping_offset(self.stride.wrapping_mul(n));
    }

    /// Address delta divided by this cursor's stride. Meaningless when the
    /// two cursors were built with different strides; zero for stride 0.
    #[inline]
    fn distance_to(&self, other: &Self) -> isize {
        element_delta(self.ptr, other.ptr)
            .checked_div(self.stride)
            .unwrap_or(0)
    }
}

impl<'a, 'b, T, A, B> PartialEq<StridedIter<'b, T, B>> for StridedIter<'a, T, A> {
    #[inline]
    fn eq(&self, other: &StridedIter<'b, T, B>) -> bool {
        self.ptr == other.ptr
    }
}

impl<T, A> Eq for StridedIter<'_, T, A> {}

impl<'a, T: 'a, A: Access> Sub for StridedIter<'a, T, A> {
    type Output = isize;

    #[inline]
    fn sub(self, rhs: Self) -> isize {
        rhs.distance_to(&self)
    }
}

impl<'a, T> From<StridedIter<'a, T, Unique>> for StridedIter<'a, T, Shared> {
    #[inline]
    fn from(it: StridedIter<'a, T, Unique>) -> Self {
        Self::new(it.ptr, it.stride)
    }
}

impl<T, A> fmt::Debug for StridedIter<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StridedIter")
            .field("ptr", &self.ptr)
            .field("stride", &self.stride)
            .finish()
    }
}

// ============================================================================
// ContiguousIter
// ============================================================================

/// Cursor over unit-stride rank-1 data.
pub struct ContiguousIter<'a, T, A = Shared> {
    ptr: *mut T,
    _marker: PhantomData<(&'a mut T, A)>,
}

impl<'a, T, A> ContiguousIter<'a, T, A> {
    #[inline]
    pub(crate) fn new(ptr: *mut T) -> Self {
        Self {
            ptr,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }
}

impl<T, A> Clone for ContiguousIter<'_, T, A> {
    #[inline]
    fn clone(&self) -> Self {
        Self::new(self.ptr)
    }
}

impl<'a, T: 'a, A: Access> Cursor for ContiguousIter<'a, T, A> {
    type Item = A::Ref<'a, T>;

    #[inline(always)]
    unsafe fn read(&self) -> Self::Item {
        A::deref(self.ptr)
    }

    #[inline(always)]
    fn advance(&mut self, n: isize) {
        self.ptr = self.ptr.wrapping_offset(n);
    }

    #[inline]
    fn distance_to(&self, other: &Self) -> isize {
        element_delta(self.ptr, other.ptr)
    }
}

impl<'a, 'b, T, A, B> PartialEq<ContiguousIter<'b, T, B>> for ContiguousIter<'a, T, A> {
    #[inline]
    fn eq(&self, other: &ContiguousIter<'b, T, B>) -> bool {
        self.ptr == other.ptr
    }
}

impl<T, A> Eq for ContiguousIter<'_, T, A> {}

impl<'a, T: 'a, A: Access> Sub for ContiguousIter<'a, T, A> {
    type Output = isize;

    #[inline]
    fn sub(self, rhs: Self) -> isize {
        rhs.distance_to(&self)
    }
}

impl<'a, T> From<ContiguousIter<'a, T, Unique>> for ContiguousIter<'a, T, Shared> {
    #[inline]
    fn from(it: ContiguousIter<'a, T, Unique>) -> Self {
        Self::new(it.ptr)
    }
}

impl<T, A> fmt::Debug for ContiguousIter<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContiguousIter")
            .field("ptr", &self.ptr)
            .finish()
    }
}

// ============================================================================
// NestedIter
// ============================================================================

/// Cursor over the outermost dimension of a rank > 1 view of layout `L`.
///
/// Reading goes through `L::make_reference`, which builds the rank `N-1`
/// sub-view at the current position over the parent's descriptor.
pub struct NestedIter<'a, T, L, A = Shared> {
    ptr: *mut T,
    core: CorePtr,
    stride: isize,
    _marker: PhantomData<(&'a mut T, L, A)>,
}

impl<'a, T, L, A> NestedIter<'a, T, L, A> {
    #[inline]
    pub(crate) fn new(ptr: *mut T, core: CorePtr, stride: isize) -> Self {
        Self {
            ptr,
            core,
            stride,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    #[inline]
    pub fn stride(&self) -> isize {
        self.stride
    }
}

impl<T, L, A> Clone for NestedIter<'_, T, L, A> {
    #[inline]
    fn clone(&self) -> Self {
        Self::new(self.ptr, self.core.clone(), self.stride)
    }
}

impl<'a, T: 'a, L: ArrayTraits, A: Access> Cursor for NestedIter<'a, T, L, A> {
    type Item = L::Reference<'a, T, A>;

    #[inline]
    unsafe fn read(&self) -> Self::Item {
        L::make_reference(self.ptr, &self.core)
    }

    #[inline(always)]
    fn advance(&mut self, n: isize) {
        self.ptr = self.ptr.wrapping_offset(self.stride.wrapping_mul(n));
    }

    #[inline]
    fn distance_to(&self, other: &Self) -> isize {
        element_delta(self.ptr, other.ptr)
            .checked_div(self.stride)
            .unwrap_or(0)
    }
}

impl<'a, 'b, T, L, A, B> PartialEq<NestedIter<'b, T, L, B>> for NestedIter<'a, T, L, A> {
    #[inline]
    fn eq(&self, other: &NestedIter<'b, T, L, B>) -> bool {
        self.ptr == other.ptr
    }
}

impl<T, L, A> Eq for NestedIter<'_, T, L, A> {}

impl<'a, T: 'a, L: ArrayTraits, A: Access> Sub for NestedIter<'a, T, L, A> {
    type Output = isize;

    #[inline]
    fn sub(self, rhs: Self) -> isize {
        rhs.distance_to(&self)
    }
}

impl<'a, T, L> From<NestedIter<'a, T, L, Unique>> for NestedIter<'a, T, L, Shared> {
    #[inline]
    fn from(it: NestedIter<'a, T, L, Unique>) -> Self {
        Self::new(it.ptr, it.core, it.stride)
    }
}

impl<T, L, A> fmt::Debug for NestedIter<'_, T, L, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedIter")
            .field("ptr", &self.ptr)
            .field("stride", &self.stride)
            .field("core", &self.core)
            .finish()
    }
}

// ============================================================================
// Iter
// ============================================================================

/// Bounded iterator over one dimension, driven by a pair of cursors.
///
/// Only iterators over shared data are `Clone`. A clone of a mutable
/// iterator would hand out a second `&mut` to every element:
///
/// ```compile_fail
/// use ndview::ArrayViewMut;
///
/// let mut data = [0.0f64; 3];
/// let mut a: ArrayViewMut<'_, f64, 1, 1> =
///     ArrayViewMut::from_row_major_mut(&mut data, &[3]).unwrap();
/// let it = a.iter_mut();
/// let _again = it.clone();
/// ```
pub struct Iter<C> {
    front: C,
    back: C,
    len: usize,
}

impl<C: Cursor> Iter<C> {
    /// Iterate `len` positions starting at `front`.
    ///
    /// # Safety
    /// All `len` positions must be readable, and for unique access they must
    /// be pairwise disjoint.
    #[inline]
    pub(crate) unsafe fn new(front: C, len: usize) -> Self {
        let mut back = front.clone();
        back.advance(len as isize);
        Self { front, back, len }
    }

    /// Cursor at the next front position.
    #[inline]
    pub fn cursor(&self) -> &C {
        &self.front
    }
}

macro_rules! impl_shared_iter_clone {
    ($([$($g:tt)*] $cursor:ty;)*) => {
        $(
            impl<$($g)*> Clone for Iter<$cursor> {
                #[inline]
                fn clone(&self) -> Self {
                    Self {
                        front: self.front.clone(),
                        back: self.back.clone(),
                        len: self.len,
                    }
                }
            }
        )*
    };
}

impl_shared_iter_clone! {
    ['a, T] StridedIter<'a, T, Shared>;
    ['a, T] ContiguousIter<'a, T, Shared>;
    ['a, T, L] NestedIter<'a, T, L, Shared>;
}

impl<C: Cursor> Iterator for Iter<C> {
    type Item = C::Item;

    #[inline]
    fn next(&mut self) -> Option<C::Item> {
        if self.len == 0 {
            return None;
        }
        // SAFETY: the position is one of the `len` readable positions handed
        // to `new`, and each one is yielded at most once.
        let item = unsafe { self.front.read() };
        self.front.increment();
        self.len -= 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }

    fn nth(&mut self, n: usize) -> Option<C::Item> {
        if n >= self.len {
            self.front = self.back.clone();
            self.len = 0;
            return None;
        }
        self.front.advance(n as isize);
        self.len -= n;
        self.next()
    }
}

impl<C: Cursor> DoubleEndedIterator for Iter<C> {
    #[inline]
    fn next_back(&mut self) -> Option<C::Item> {
        if self.len == 0 {
            return None;
        }
        self.back.decrement();
        self.len -= 1;
        // SAFETY: see `next`.
        Some(unsafe { self.back.read() })
    }
}

impl<C: Cursor> ExactSizeIterator for Iter<C> {}

impl<C: Cursor> FusedIterator for Iter<C> {}

impl<C: fmt::Debug> fmt::Debug for Iter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("front", &self.front)
            .field("len", &self.len)
            .finish()
    }
}
