//! Compile-time dispatch over `(element, rank, contiguity)`.
//!
//! Every supported `(N, C)` pair is a distinct zero-sized [`Dims`] type, and
//! [`ArrayTraits`] maps it to the reference, iterator and value types a view
//! of that layout produces. Nothing here branches at run time: the table is
//! generated by macros and resolved during monomorphisation.
//!
//! | layout            | `Reference`               | `Iterator`         |
//! |-------------------|---------------------------|--------------------|
//! | `N > 1`, any `C`  | view of `(N-1, C')`       | [`NestedIter`]     |
//! | `N = 1`, `C = 0`  | `&T` / `&mut T`           | [`StridedIter`]    |
//! | `N = 1`, `C = ±1` | `&T` / `&mut T`           | [`ContiguousIter`] |
//!
//! where `C' = sub_contiguity(N, C)`.

use std::fmt::Debug;
use std::marker::PhantomData;

use crate::access::{Access, Shared};
use crate::array::Array;
use crate::contiguity::{is_convertible, outer_sliced_contiguity, sub_contiguity};
use crate::descriptor::CorePtr;
use crate::iter::{ContiguousIter, Cursor, NestedIter, StridedIter};
use crate::view::ArrayBase;

/// Highest rank with generated layouts.
pub const MAX_RANK: usize = 6;

/// Layout marker for rank `N` and contiguity level `C`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dims<const N: usize, const C: i32>;

/// Rank marker shared by views and expressions of the same rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rank<const N: usize>;

/// Type-level rank.
pub trait RankTag: Copy + Default + Debug + Send + Sync + 'static {
    const N: usize;

    /// Fully row-major layout of this rank, used for materialised results.
    type Contiguous: ArrayTraits<Rank = Self>;
}

/// Rank- and contiguity-specialised traits shared by all views.
pub trait ArrayTraits: Copy + Default + Debug + Send + Sync + 'static {
    /// Number of dimensions.
    const ND: usize;

    /// Static contiguity level.
    const RMC: i32;

    type Rank: RankTag;

    /// Layout after reversing the dimension order.
    type Transposed: ArrayTraits<Rank = Self::Rank>;

    /// Layout after sub-ranging the outermost dimension.
    type OuterSliced: ArrayTraits<Rank = Self::Rank>;

    /// Same rank without any contiguity guarantee.
    type Strided: ArrayTraits<Rank = Self::Rank>;

    /// What one step of dimension recursion yields.
    type Reference<'a, T: 'a, A: Access>;

    /// Random-access cursor over the outermost dimension.
    type Iterator<'a, T: 'a, A: Access>: Cursor<Item = Self::Reference<'a, T, A>> + Clone;

    /// Owning counterpart of `Reference`.
    type Value<T>;

    /// Build the reference for the element or sub-view at `data`.
    ///
    /// # Safety
    /// `data` and `core` must describe memory valid for `'a` under the
    /// access rules of `A`.
    unsafe fn make_reference<'a, T: 'a, A: Access>(
        data: *mut T,
        core: &CorePtr,
    ) -> Self::Reference<'a, T, A>;

    /// Build a cursor starting at `data` that steps by `stride` elements.
    ///
    /// # Safety
    /// Same as [`ArrayTraits::make_reference`] for every position the cursor
    /// is dereferenced at.
    unsafe fn make_iterator<'a, T: 'a, A: Access>(
        data: *mut T,
        core: &CorePtr,
        stride: isize,
    ) -> Self::Iterator<'a, T, A>;

    /// Deep-copy a shared reference into its owning value.
    fn to_value<'a, T: Clone + 'a>(reference: Self::Reference<'a, T, Shared>) -> Self::Value<T>;
}

/// Layouts of rank 2 and above, whose references are sub-views.
pub trait NestedTraits: ArrayTraits {
    /// Layout of the sub-view obtained by stripping the outermost dimension.
    type Sub: ArrayTraits;
}

/// Post-monomorphisation check of the convertibility predicate.
pub(crate) struct AssertConvertible<From, To>(PhantomData<(From, To)>);

impl<From: ArrayTraits, To: ArrayTraits> AssertConvertible<From, To> {
    pub(crate) const OK: () = assert!(
        From::ND == To::ND && is_convertible(From::ND, From::RMC, To::RMC),
        "view layouts are not convertible"
    );
}

// ============================================================================
// Rank 1
// ============================================================================

impl ArrayTraits for Dims<1, 0> {
    const ND: usize = 1;
    const RMC: i32 = 0;

    type Rank = Rank<1>;
    type Transposed = Dims<1, 0>;
    type OuterSliced = Dims<1, 0>;
    type Strided = Dims<1, 0>;
    type Reference<'a, T: 'a, A: Access> = A::Ref<'a, T>;
    type Iterator<'a, T: 'a, A: Access> = StridedIter<'a, T, A>;
    type Value<T> = T;

    #[inline(always)]
    unsafe fn make_reference<'a, T: 'a, A: Access>(
        data: *mut T,
        _core: &CorePtr,
    ) -> Self::Reference<'a, T, A> {
        A::deref(data)
    }

    #[inline(always)]
    unsafe fn make_iterator<'a, T: 'a, A: Access>(
        data: *mut T,
        _core: &CorePtr,
        stride: isize,
    ) -> Self::Iterator<'a, T, A> {
        StridedIter::new(data, stride)
    }

    #[inline]
    fn to_value<'a, T: Clone + 'a>(reference: Self::Reference<'a, T, Shared>) -> T {
        T::clone(reference)
    }
}

macro_rules! impl_contiguous_rank_one {
    ($c:literal, $t:literal) => {
        impl ArrayTraits for Dims<1, { $c }> {
            const ND: usize = 1;
            const RMC: i32 = $c;

            type Rank = Rank<1>;
            type Transposed = Dims<1, { $t }>;
            type OuterSliced = Dims<1, { $c }>;
            type Strided = Dims<1, 0>;
            type Reference<'a, T: 'a, A: Access> = A::Ref<'a, T>;
            type Iterator<'a, T: 'a, A: Access> = ContiguousIter<'a, T, A>;
            type Value<T> = T;

            #[inline(always)]
            unsafe fn make_reference<'a, T: 'a, A: Access>(
                data: *mut T,
                _core: &CorePtr,
            ) -> Self::Reference<'a, T, A> {
                A::deref(data)
            }

            #[inline(always)]
            unsafe fn make_iterator<'a, T: 'a, A: Access>(
                data: *mut T,
                _core: &CorePtr,
                _stride: isize,
            ) -> Self::Iterator<'a, T, A> {
                ContiguousIter::new(data)
            }

            #[inline]
            fn to_value<'a, T: Clone + 'a>(reference: Self::Reference<'a, T, Shared>) -> T {
                T::clone(reference)
            }
        }
    };
}

impl_contiguous_rank_one!(1, -1);
impl_contiguous_rank_one!(-1, 1);

// ============================================================================
// Rank > 1
// ============================================================================

macro_rules! impl_nested_traits {
    ($n:literal => $($c:literal),+) => {
        $(
            impl NestedTraits for Dims<{ $n }, { $c }> {
                type Sub = Dims<{ $n - 1 }, { sub_contiguity($n, $c) }>;
            }

            impl ArrayTraits for Dims<{ $n }, { $c }> {
                const ND: usize = $n;
                const RMC: i32 = $c;

                type Rank = Rank<{ $n }>;
                type Transposed = Dims<{ $n }, { -($c) }>;
                type OuterSliced = Dims<{ $n }, { outer_sliced_contiguity($c) }>;
                type Strided = Dims<{ $n }, 0>;
                type Reference<'a, T: 'a, A: Access> =
                    ArrayBase<'a, T, <Self as NestedTraits>::Sub, A>;
                type Iterator<'a, T: 'a, A: Access> =
                    NestedIter<'a, T, Self, A>;
                type Value<T> = Array<T, <Self as NestedTraits>::Sub>;

                #[inline]
                unsafe fn make_reference<'a, T: 'a, A: Access>(
                    data: *mut T,
                    core: &CorePtr,
                ) -> Self::Reference<'a, T, A> {
                    ArrayBase::from_raw_parts(data, core.clone())
                }

                #[inline]
                unsafe fn make_iterator<'a, T: 'a, A: Access>(
                    data: *mut T,
                    core: &CorePtr,
                    stride: isize,
                ) -> Self::Iterator<'a, T, A> {
                    NestedIter::new(data, core.clone(), stride)
                }

                fn to_value<'a, T: Clone + 'a>(
                    reference: Self::Reference<'a, T, Shared>,
                ) -> Self::Value<T> {
                    reference.to_owned()
                }
            }
        )+
    };
}

impl_nested_traits!(2 => -2, -1, 0, 1, 2);
impl_nested_traits!(3 => -3, -2, -1, 0, 1, 2, 3);
impl_nested_traits!(4 => -4, -3, -2, -1, 0, 1, 2, 3, 4);
impl_nested_traits!(5 => -5, -4, -3, -2, -1, 0, 1, 2, 3, 4, 5);
impl_nested_traits!(6 => -6, -5, -4, -3, -2, -1, 0, 1, 2, 3, 4, 5, 6);

macro_rules! impl_rank {
    ($($n:literal),+) => {
        $(
            impl RankTag for Rank<{ $n }> {
                const N: usize = $n;
                type Contiguous = Dims<{ $n }, { $n }>;
            }
        )+
    };
}

impl_rank!(1, 2, 3, 4, 5, 6);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Unique;
    use std::any::TypeId;

    fn assert_same<A: 'static, B: 'static>() {
        assert_eq!(
            TypeId::of::<A>(),
            TypeId::of::<B>(),
            "types should be the same"
        );
    }

    #[test]
    fn test_rank_one_references_are_scalars() {
        assert_same::<<Dims<1, 0> as ArrayTraits>::Reference<'static, f64, Shared>, &'static f64>();
        assert_same::<<Dims<1, 1> as ArrayTraits>::Reference<'static, f64, Shared>, &'static f64>();
        assert_same::<
            <Dims<1, -1> as ArrayTraits>::Reference<'static, f64, Unique>,
            &'static mut f64,
        >();
    }

    #[test]
    fn test_rank_one_iterators() {
        assert_same::<
            <Dims<1, 0> as ArrayTraits>::Iterator<'static, f64, Shared>,
            StridedIter<'static, f64, Shared>,
        >();
        assert_same::<
            <Dims<1, 1> as ArrayTraits>::Iterator<'static, f64, Shared>,
            ContiguousIter<'static, f64, Shared>,
        >();
        assert_same::<
            <Dims<1, -1> as ArrayTraits>::Iterator<'static, f64, Shared>,
            ContiguousIter<'static, f64, Shared>,
        >();
    }

    #[test]
    fn test_nested_reference_is_sub_view() {
        assert_same::<
            <Dims<3, 3> as ArrayTraits>::Reference<'static, f64, Shared>,
            ArrayBase<'static, f64, Dims<2, 2>, Shared>,
        >();
        assert_same::<
            <Dims<2, -2> as ArrayTraits>::Reference<'static, f64, Unique>,
            ArrayBase<'static, f64, Dims<1, 0>, Unique>,
        >();
        assert_same::<
            <Dims<2, 2> as ArrayTraits>::Iterator<'static, f64, Shared>,
            NestedIter<'static, f64, Dims<2, 2>, Shared>,
        >();
    }

    #[test]
    fn test_values() {
        assert_same::<<Dims<1, 0> as ArrayTraits>::Value<f64>, f64>();
        assert_same::<<Dims<3, 1> as ArrayTraits>::Value<f64>, Array<f64, Dims<2, 1>>>();
    }

    #[test]
    fn test_transposed_flips_sign() {
        assert_same::<<Dims<1, 1> as ArrayTraits>::Transposed, Dims<1, -1>>();
        assert_same::<<Dims<3, 2> as ArrayTraits>::Transposed, Dims<3, -2>>();
        assert_same::<<Dims<3, 0> as ArrayTraits>::Transposed, Dims<3, 0>>();
    }

    #[test]
    fn test_outer_sliced() {
        assert_same::<<Dims<3, 3> as ArrayTraits>::OuterSliced, Dims<3, 3>>();
        assert_same::<<Dims<3, -3> as ArrayTraits>::OuterSliced, Dims<3, -1>>();
        assert_same::<<Dims<1, -1> as ArrayTraits>::OuterSliced, Dims<1, -1>>();
    }

    #[test]
    fn test_rank_tags() {
        assert_eq!(<Rank<4> as RankTag>::N, 4);
        assert_same::<<Rank<3> as RankTag>::Contiguous, Dims<3, 3>>();
        assert_same::<<Dims<5, -2> as ArrayTraits>::Rank, Rank<5>>();
    }

    #[test]
    fn test_layout_constants() {
        assert_eq!(<Dims<6, -6> as ArrayTraits>::ND, MAX_RANK);
        assert_eq!(<Dims<6, -6> as ArrayTraits>::RMC, -6);
        assert_eq!(<Dims<1, -1> as ArrayTraits>::RMC, -1);
    }
}
