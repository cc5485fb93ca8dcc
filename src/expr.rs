//! Lazy elementwise expressions.
//!
//! An [`Expression`] is anything that can be walked one dimension at a time:
//! shared views and the two node types, [`UnaryOpExpression`] and
//! [`BinaryOpExpression`]. Iterating a rank-`N` node yields rank-`N-1` nodes
//! over the operands' sub-views; iterating a rank-1 node applies the function
//! and yields values. Nothing is computed until the tree is iterated,
//! [`evaluated`](Expression::evaluate) or assigned into a mutable view.
//!
//! The per-rank behaviour lives in [`UnaryStep`] and [`BinaryStep`], which are
//! implemented on the rank markers: `Rank<1>` applies the function, every
//! higher rank wraps the operands' sub-expressions in a new node.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::access::Shared;
use crate::array::Array;
use crate::descriptor::{linear_offset, Odometer};
use crate::element_op::{
    AddOp, Adjoint, BinaryFunction, Compose, Conj, DivOp, ElementOp, MulOp, NegOp, SubOp,
    Transpose, UnaryFunction,
};
use crate::iter::Iter;
use crate::traits::{ArrayTraits, Dims, Rank, RankTag};
use crate::view::ArrayBase;
use crate::{Result, ViewError};

/// A value that can be walked dimension by dimension.
pub trait Expression: Sized {
    /// Scalar produced at the leaves.
    type Element;

    type Rank: RankTag;

    /// What one step of iteration yields.
    type Reference;

    /// Owned counterpart of [`Reference`](Expression::Reference).
    type Value;

    /// Iterator over the outermost dimension.
    type Iter: Iterator<Item = Self::Reference> + ExactSizeIterator;

    /// Extents, outermost first.
    fn shape(&self) -> &[usize];

    fn into_expr_iter(self) -> Self::Iter;

    /// Call `g` on every element in row-major order.
    fn for_each_element<G: FnMut(Self::Element)>(self, g: &mut G);

    #[inline]
    fn ndim(&self) -> usize {
        <Self::Rank as RankTag>::N
    }

    /// Materialise into a row-major array.
    fn evaluate(self) -> Array<Self::Element, <Self::Rank as RankTag>::Contiguous> {
        let shape = self.shape().to_vec();
        let mut data = Vec::with_capacity(shape.iter().product());
        self.for_each_element(&mut |x| data.push(x));
        Array::from_parts(&shape, data)
    }
}

/// Rank-1 expression whose iteration items can be turned into elements.
pub trait ScalarExpression: Expression<Rank = Rank<1>> {
    fn load(reference: Self::Reference) -> Self::Element;
}

// ============================================================================
// Views as expressions
// ============================================================================

impl<'a, T: Copy + 'a, L: ArrayTraits> Expression for ArrayBase<'a, T, L, Shared> {
    type Element = T;
    type Rank = L::Rank;
    type Reference = L::Reference<'a, T, Shared>;
    type Value = L::Value<T>;
    type Iter = Iter<L::Iterator<'a, T, Shared>>;

    #[inline]
    fn shape(&self) -> &[usize] {
        self.core().tail_extents(L::ND)
    }

    #[inline]
    fn into_expr_iter(self) -> Self::Iter {
        self.into_iter()
    }

    fn for_each_element<G: FnMut(Self::Element)>(self, g: &mut G) {
        let data = self.as_ptr();
        let strides = self.strides();
        let mut odometer = Odometer::new(self.core().tail_extents(L::ND), false);
        while let Some(index) = odometer.advance() {
            // SAFETY: the odometer only produces in-bounds indices.
            g(unsafe { *data.offset(linear_offset(strides, index)) });
        }
    }
}

macro_rules! impl_scalar_view {
    ($($c:literal),*) => {
        $(
            impl<'a, T: Copy + 'a> ScalarExpression for ArrayBase<'a, T, Dims<1, { $c }>, Shared> {
                #[inline(always)]
                fn load(reference: Self::Reference) -> Self::Element {
                    *reference
                }
            }
        )*
    };
}

impl_scalar_view!(-1, 0, 1);

// ============================================================================
// Per-rank dispatch
// ============================================================================

/// Rank-specific behaviour of a unary node over `E`.
pub trait UnaryStep<E: Expression, F> {
    type Element;
    type Reference;
    type Value;

    /// Map one item of the operand's iteration.
    fn step(function: &F, item: E::Reference) -> Self::Reference;

    /// Visit every element of `function` applied to `operand`.
    fn visit<G: FnMut(Self::Element)>(operand: E, function: &F, g: &mut G);
}

/// Rank-specific behaviour of a binary node over `E1` and `E2`.
pub trait BinaryStep<E1: Expression, E2: Expression, F> {
    type Element;
    type Reference;
    type Value;

    fn step(function: &F, lhs: E1::Reference, rhs: E2::Reference) -> Self::Reference;

    fn visit<G: FnMut(Self::Element)>(lhs: E1, rhs: E2, function: &F, g: &mut G);
}

impl<E, F> UnaryStep<E, F> for Rank<1>
where
    E: ScalarExpression,
    F: UnaryFunction<E::Element>,
{
    type Element = F::Output;
    type Reference = F::Output;
    type Value = F::Output;

    #[inline(always)]
    fn step(function: &F, item: E::Reference) -> F::Output {
        function.call(E::load(item))
    }

    fn visit<G: FnMut(Self::Element)>(operand: E, function: &F, g: &mut G) {
        for item in operand.into_expr_iter() {
            g(function.call(E::load(item)));
        }
    }
}

impl<E1, E2, F> BinaryStep<E1, E2, F> for Rank<1>
where
    E1: ScalarExpression,
    E2: ScalarExpression,
    F: BinaryFunction<E1::Element, E2::Element>,
{
    type Element = F::Output;
    type Reference = F::Output;
    type Value = F::Output;

    #[inline(always)]
    fn step(function: &F, lhs: E1::Reference, rhs: E2::Reference) -> F::Output {
        function.call(E1::load(lhs), E2::load(rhs))
    }

    fn visit<G: FnMut(Self::Element)>(lhs: E1, rhs: E2, function: &F, g: &mut G) {
        for (a, b) in lhs.into_expr_iter().zip(rhs.into_expr_iter()) {
            g(function.call(E1::load(a), E2::load(b)));
        }
    }
}

macro_rules! impl_nested_steps {
    ($($n:literal),*) => {
        $(
            impl<E, F> UnaryStep<E, F> for Rank<{ $n }>
            where
                E: Expression,
                E::Reference: Expression<Rank = Rank<{ $n - 1 }>>,
                Rank<{ $n - 1 }>: UnaryStep<E::Reference, F>,
                F: Clone,
            {
                type Element = <Rank<{ $n - 1 }> as UnaryStep<E::Reference, F>>::Element;
                type Reference = UnaryOpExpression<E::Reference, F>;
                type Value = UnaryOpExpression<E::Reference, F>;

                #[inline]
                fn step(function: &F, item: E::Reference) -> Self::Reference {
                    UnaryOpExpression::new(item, function.clone())
                }

                fn visit<G: FnMut(Self::Element)>(operand: E, function: &F, g: &mut G) {
                    for item in operand.into_expr_iter() {
                        <Rank<{ $n - 1 }> as UnaryStep<E::Reference, F>>::visit(item, function, g);
                    }
                }
            }

            impl<E1, E2, F> BinaryStep<E1, E2, F> for Rank<{ $n }>
            where
                E1: Expression,
                E2: Expression,
                E1::Reference: Expression<Rank = Rank<{ $n - 1 }>>,
                E2::Reference: Expression<Rank = Rank<{ $n - 1 }>>,
                Rank<{ $n - 1 }>: BinaryStep<E1::Reference, E2::Reference, F>,
                F: Clone,
            {
                type Element =
                    <Rank<{ $n - 1 }> as BinaryStep<E1::Reference, E2::Reference, F>>::Element;
                type Reference = BinaryOpExpression<E1::Reference, E2::Reference, F>;
                type Value = BinaryOpExpression<E1::Reference, E2::Reference, F>;

                #[inline]
                fn step(function: &F, lhs: E1::Reference, rhs: E2::Reference) -> Self::Reference {
                    BinaryOpExpression::new_unchecked(lhs, rhs, function.clone())
                }

                fn visit<G: FnMut(Self::Element)>(lhs: E1, rhs: E2, function: &F, g: &mut G) {
                    for (a, b) in lhs.into_expr_iter().zip(rhs.into_expr_iter()) {
                        <Rank<{ $n - 1 }> as BinaryStep<E1::Reference, E2::Reference, F>>::visit(
                            a, b, function, g,
                        );
                    }
                }
            }
        )*
    };
}

impl_nested_steps!(2, 3, 4, 5, 6);

// ============================================================================
// Unary nodes
// ============================================================================

/// `function` applied lazily to every element of `operand`.
#[derive(Clone)]
pub struct UnaryOpExpression<E, F> {
    operand: E,
    function: F,
}

impl<E, F> UnaryOpExpression<E, F> {
    #[inline]
    pub fn new(operand: E, function: F) -> Self {
        Self { operand, function }
    }

    #[inline]
    pub fn operand(&self) -> &E {
        &self.operand
    }

    #[inline]
    pub fn function(&self) -> &F {
        &self.function
    }
}

impl<E, F> Expression for UnaryOpExpression<E, F>
where
    E: Expression,
    E::Rank: UnaryStep<E, F>,
{
    type Element = <E::Rank as UnaryStep<E, F>>::Element;
    type Rank = E::Rank;
    type Reference = <E::Rank as UnaryStep<E, F>>::Reference;
    type Value = <E::Rank as UnaryStep<E, F>>::Value;
    type Iter = UnaryOpIter<E, F>;

    #[inline]
    fn shape(&self) -> &[usize] {
        self.operand.shape()
    }

    fn into_expr_iter(self) -> UnaryOpIter<E, F> {
        UnaryOpIter {
            inner: self.operand.into_expr_iter(),
            function: self.function,
        }
    }

    fn for_each_element<G: FnMut(Self::Element)>(self, g: &mut G) {
        <E::Rank as UnaryStep<E, F>>::visit(self.operand, &self.function, g);
    }
}

impl<E, F> ScalarExpression for UnaryOpExpression<E, F>
where
    E: ScalarExpression,
    F: UnaryFunction<E::Element>,
{
    #[inline(always)]
    fn load(reference: Self::Reference) -> Self::Element {
        reference
    }
}

impl<E: fmt::Debug, F> fmt::Debug for UnaryOpExpression<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnaryOpExpression")
            .field("operand", &self.operand)
            .field("function", &std::any::type_name::<F>())
            .finish()
    }
}

/// Iterator of a [`UnaryOpExpression`].
pub struct UnaryOpIter<E: Expression, F> {
    inner: E::Iter,
    function: F,
}

impl<E, F> Iterator for UnaryOpIter<E, F>
where
    E: Expression,
    E::Rank: UnaryStep<E, F>,
{
    type Item = <E::Rank as UnaryStep<E, F>>::Reference;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        Some(<E::Rank as UnaryStep<E, F>>::step(&self.function, item))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<E, F> DoubleEndedIterator for UnaryOpIter<E, F>
where
    E: Expression,
    E::Rank: UnaryStep<E, F>,
    E::Iter: DoubleEndedIterator,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let item = self.inner.next_back()?;
        Some(<E::Rank as UnaryStep<E, F>>::step(&self.function, item))
    }
}

impl<E, F> ExactSizeIterator for UnaryOpIter<E, F>
where
    E: Expression,
    E::Rank: UnaryStep<E, F>,
{
}

impl<E: Expression, F: Clone> Clone for UnaryOpIter<E, F>
where
    E::Iter: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            function: self.function.clone(),
        }
    }
}

// ============================================================================
// Binary nodes
// ============================================================================

/// `function` applied lazily to corresponding elements of `lhs` and `rhs`.
///
/// Both operands have the same rank; combining expressions of different rank
/// does not build.
#[derive(Clone)]
pub struct BinaryOpExpression<E1, E2, F> {
    lhs: E1,
    rhs: E2,
    function: F,
}

impl<E1: Expression, E2: Expression, F> BinaryOpExpression<E1, E2, F> {
    /// # Errors
    /// [`ViewError::ShapeMismatch`] when the operand shapes differ.
    pub fn new(lhs: E1, rhs: E2, function: F) -> Result<Self> {
        if lhs.shape() != rhs.shape() {
            return Err(ViewError::ShapeMismatch(
                lhs.shape().to_vec(),
                rhs.shape().to_vec(),
            ));
        }
        Ok(Self::new_unchecked(lhs, rhs, function))
    }

    #[inline]
    pub(crate) fn new_unchecked(lhs: E1, rhs: E2, function: F) -> Self {
        debug_assert_eq!(lhs.shape(), rhs.shape());
        Self { lhs, rhs, function }
    }
}

impl<E1, E2, F> BinaryOpExpression<E1, E2, F> {
    #[inline]
    pub fn lhs(&self) -> &E1 {
        &self.lhs
    }

    #[inline]
    pub fn rhs(&self) -> &E2 {
        &self.rhs
    }

    #[inline]
    pub fn function(&self) -> &F {
        &self.function
    }
}

impl<E1, E2, F> Expression for BinaryOpExpression<E1, E2, F>
where
    E1: Expression,
    E2: Expression<Rank = E1::Rank>,
    E1::Rank: BinaryStep<E1, E2, F>,
{
    type Element = <E1::Rank as BinaryStep<E1, E2, F>>::Element;
    type Rank = E1::Rank;
    type Reference = <E1::Rank as BinaryStep<E1, E2, F>>::Reference;
    type Value = <E1::Rank as BinaryStep<E1, E2, F>>::Value;
    type Iter = BinaryOpIter<E1, E2, F>;

    #[inline]
    fn shape(&self) -> &[usize] {
        self.lhs.shape()
    }

    fn into_expr_iter(self) -> BinaryOpIter<E1, E2, F> {
        BinaryOpIter {
            lhs: self.lhs.into_expr_iter(),
            rhs: self.rhs.into_expr_iter(),
            function: self.function,
        }
    }

    fn for_each_element<G: FnMut(Self::Element)>(self, g: &mut G) {
        <E1::Rank as BinaryStep<E1, E2, F>>::visit(self.lhs, self.rhs, &self.function, g);
    }
}

impl<E1, E2, F> ScalarExpression for BinaryOpExpression<E1, E2, F>
where
    E1: ScalarExpression,
    E2: ScalarExpression,
    F: BinaryFunction<E1::Element, E2::Element>,
{
    #[inline(always)]
    fn load(reference: Self::Reference) -> Self::Element {
        reference
    }
}

impl<E1: fmt::Debug, E2: fmt::Debug, F> fmt::Debug for BinaryOpExpression<E1, E2, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryOpExpression")
            .field("lhs", &self.lhs)
            .field("rhs", &self.rhs)
            .field("function", &std::any::type_name::<F>())
            .finish()
    }
}

/// Iterator of a [`BinaryOpExpression`], walking both operands in lock-step.
pub struct BinaryOpIter<E1: Expression, E2: Expression, F> {
    lhs: E1::Iter,
    rhs: E2::Iter,
    function: F,
}

impl<E1, E2, F> Iterator for BinaryOpIter<E1, E2, F>
where
    E1: Expression,
    E2: Expression,
    E1::Rank: BinaryStep<E1, E2, F>,
{
    type Item = <E1::Rank as BinaryStep<E1, E2, F>>::Reference;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let a = self.lhs.next()?;
        let b = self.rhs.next()?;
        Some(<E1::Rank as BinaryStep<E1, E2, F>>::step(&self.function, a, b))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.lhs.len().min(self.rhs.len());
        (n, Some(n))
    }
}

impl<E1, E2, F> DoubleEndedIterator for BinaryOpIter<E1, E2, F>
where
    E1: Expression,
    E2: Expression,
    E1::Rank: BinaryStep<E1, E2, F>,
    E1::Iter: DoubleEndedIterator,
    E2::Iter: DoubleEndedIterator,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let a = self.lhs.next_back()?;
        let b = self.rhs.next_back()?;
        Some(<E1::Rank as BinaryStep<E1, E2, F>>::step(&self.function, a, b))
    }
}

impl<E1, E2, F> ExactSizeIterator for BinaryOpIter<E1, E2, F>
where
    E1: Expression,
    E2: Expression,
    E1::Rank: BinaryStep<E1, E2, F>,
{
}

impl<E1: Expression, E2: Expression, F: Clone> Clone for BinaryOpIter<E1, E2, F>
where
    E1::Iter: Clone,
    E2::Iter: Clone,
{
    fn clone(&self) -> Self {
        Self {
            lhs: self.lhs.clone(),
            rhs: self.rhs.clone(),
            function: self.function.clone(),
        }
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Lazily apply `function` to every element of `expr`.
#[inline]
pub fn map<E: Expression, F>(expr: E, function: F) -> UnaryOpExpression<E, F> {
    UnaryOpExpression::new(expr, function)
}

/// Lazily combine corresponding elements of `lhs` and `rhs`.
///
/// # Errors
/// [`ViewError::ShapeMismatch`] when the shapes differ.
#[inline]
pub fn zip_with<E1, E2, F>(lhs: E1, rhs: E2, function: F) -> Result<BinaryOpExpression<E1, E2, F>>
where
    E1: Expression,
    E2: Expression<Rank = E1::Rank>,
{
    BinaryOpExpression::new(lhs, rhs, function)
}

fn combine<E1: Expression, E2: Expression, F>(
    lhs: E1,
    rhs: E2,
    function: F,
) -> BinaryOpExpression<E1, E2, F> {
    assert_eq!(lhs.shape(), rhs.shape(), "operand shapes differ");
    BinaryOpExpression::new_unchecked(lhs, rhs, function)
}

impl<'a, T: Copy + 'a, L: ArrayTraits> ArrayBase<'a, T, L, Shared> {
    /// Lazy elementwise complex conjugate.
    #[inline]
    pub fn conj(self) -> UnaryOpExpression<Self, Conj> {
        UnaryOpExpression::new(self, Conj)
    }

    /// Lazy elementwise transpose.
    #[inline]
    pub fn transpose_elements(self) -> UnaryOpExpression<Self, Transpose> {
        UnaryOpExpression::new(self, Transpose)
    }

    /// Lazy elementwise adjoint.
    #[inline]
    pub fn adjoint_elements(self) -> UnaryOpExpression<Self, Adjoint> {
        UnaryOpExpression::new(self, Adjoint)
    }
}

impl<E, Op: ElementOp> UnaryOpExpression<E, Op> {
    /// Compose with `Conj` without adding a node.
    #[inline]
    pub fn conj(self) -> UnaryOpExpression<E, <Op as Compose<Conj>>::Result>
    where
        Op: Compose<Conj>,
    {
        UnaryOpExpression::new(self.operand, Default::default())
    }

    #[inline]
    pub fn transpose_elements(self) -> UnaryOpExpression<E, <Op as Compose<Transpose>>::Result>
    where
        Op: Compose<Transpose>,
    {
        UnaryOpExpression::new(self.operand, Default::default())
    }

    #[inline]
    pub fn adjoint_elements(self) -> UnaryOpExpression<E, <Op as Compose<Adjoint>>::Result>
    where
        Op: Compose<Adjoint>,
    {
        UnaryOpExpression::new(self.operand, Default::default())
    }
}

// ============================================================================
// Operators
// ============================================================================

macro_rules! impl_operators {
    ([$($g:tt)*] $ty:ty, [$($w:tt)*]) => {
        impl_operators!(@binary [$($g)*] $ty, [$($w)*], Add, add, AddOp);
        impl_operators!(@binary [$($g)*] $ty, [$($w)*], Sub, sub, SubOp);
        impl_operators!(@binary [$($g)*] $ty, [$($w)*], Mul, mul, MulOp);
        impl_operators!(@binary [$($g)*] $ty, [$($w)*], Div, div, DivOp);

        impl<$($g)*> Neg for $ty
        where
            $($w)*
        {
            type Output = UnaryOpExpression<$ty, NegOp>;

            #[inline]
            fn neg(self) -> Self::Output {
                UnaryOpExpression::new(self, NegOp)
            }
        }
    };
    (@binary [$($g:tt)*] $ty:ty, [$($w:tt)*], $trait:ident, $method:ident, $op:ident) => {
        impl<$($g)*, Rhs> $trait<Rhs> for $ty
        where
            $($w)*
            Rhs: Expression<Rank = <$ty as Expression>::Rank>,
        {
            type Output = BinaryOpExpression<$ty, Rhs, $op>;

            /// # Panics
            /// If the operand shapes differ.
            #[inline]
            fn $method(self, rhs: Rhs) -> Self::Output {
                combine(self, rhs, $op)
            }
        }
    };
}

impl_operators!(['a, T, L] ArrayBase<'a, T, L, Shared>, [T: Copy + 'a, L: ArrayTraits,]);
impl_operators!([E, F] UnaryOpExpression<E, F>, [UnaryOpExpression<E, F>: Expression,]);
impl_operators!(
    [E1, E2, F] BinaryOpExpression<E1, E2, F>,
    [BinaryOpExpression<E1, E2, F>: Expression,]
);
