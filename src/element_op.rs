//! Function objects carried by expression nodes.
//!
//! Nodes store their function by value and call it through [`UnaryFunction`]
//! or [`BinaryFunction`], so closures and the zero-sized operator types below
//! are interchangeable.
//!
//! The element operations `Identity`, `Conj`, `Transpose` and `Adjoint` form a
//! group. Composition is resolved at the type level, so chaining them on an
//! expression never adds a node.

use std::ops::{Add, Div, Mul, Neg, Sub};

use num_complex::Complex;
use num_traits::Num;

/// A function of one argument.
pub trait UnaryFunction<A> {
    type Output;

    fn call(&self, a: A) -> Self::Output;
}

/// A function of two arguments.
pub trait BinaryFunction<A, B> {
    type Output;

    fn call(&self, a: A, b: B) -> Self::Output;
}

impl<A, R, F> UnaryFunction<A> for F
where
    F: Fn(A) -> R,
{
    type Output = R;

    #[inline(always)]
    fn call(&self, a: A) -> R {
        self(a)
    }
}

impl<A, B, R, F> BinaryFunction<A, B> for F
where
    F: Fn(A, B) -> R,
{
    type Output = R;

    #[inline(always)]
    fn call(&self, a: A, b: B) -> R {
        self(a, b)
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

macro_rules! binary_op {
    ($(#[$doc:meta])* $name:ident, $trait:ident, $method:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl<A: $trait<B>, B> BinaryFunction<A, B> for $name {
            type Output = <A as $trait<B>>::Output;

            #[inline(always)]
            fn call(&self, a: A, b: B) -> Self::Output {
                a.$method(b)
            }
        }
    };
}

binary_op!(
    /// `a + b`
    AddOp, Add, add
);
binary_op!(
    /// `a - b`
    SubOp, Sub, sub
);
binary_op!(
    /// `a * b`
    MulOp, Mul, mul
);
binary_op!(
    /// `a / b`
    DivOp, Div, div
);

/// `-a`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NegOp;

impl<A: Neg> UnaryFunction<A> for NegOp {
    type Output = A::Output;

    #[inline(always)]
    fn call(&self, a: A) -> A::Output {
        -a
    }
}

// ============================================================================
// Element operations
// ============================================================================

/// Element operation from the `{Identity, Conj, Transpose, Adjoint}` group.
///
/// Every operation is its own inverse, and composing any two distinct
/// non-identity operations gives the third. See [`Compose`].
pub trait ElementOp: Copy + Default + 'static {
    fn apply<T: ElementOpApply>(value: T) -> T;
}

/// Scalars that element operations act on.
///
/// Scalars are 1x1, so `transpose` is the identity and `adjoint` reduces to
/// `conj`. Only `conj` has to be provided.
pub trait ElementOpApply: Copy {
    fn conj(self) -> Self;

    #[inline(always)]
    fn transpose(self) -> Self {
        self
    }

    #[inline(always)]
    fn adjoint(self) -> Self {
        self.transpose().conj()
    }
}

macro_rules! real_scalars {
    ($($t:ty)*) => {
        $(impl ElementOpApply for $t {
            #[inline(always)]
            fn conj(self) -> $t { self }
        })*
    };
}

real_scalars!(f32 f64 i8 i16 i32 i64 i128 isize u8 u16 u32 u64 u128 usize);

impl<T: Num + Copy + Neg<Output = T>> ElementOpApply for Complex<T> {
    #[inline(always)]
    fn conj(self) -> Self {
        Complex::new(self.re, -self.im)
    }
}

/// f(x) = x
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

/// f(x) = conj(x)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Conj;

/// f(x) = transpose(x)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transpose;

/// f(x) = conj(transpose(x))
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Adjoint;

macro_rules! impl_element_op {
    ($($op:ident => $method:ident),*) => {
        $(
            impl ElementOp for $op {
                #[inline(always)]
                fn apply<T: ElementOpApply>(value: T) -> T {
                    value.$method()
                }
            }

            impl<T: ElementOpApply> UnaryFunction<T> for $op {
                type Output = T;

                #[inline(always)]
                fn call(&self, a: T) -> T {
                    <$op as ElementOp>::apply(a)
                }
            }
        )*
    };
}

impl_element_op!(Conj => conj, Transpose => transpose, Adjoint => adjoint);

impl ElementOp for Identity {
    #[inline(always)]
    fn apply<T: ElementOpApply>(value: T) -> T {
        value
    }
}

impl<T: ElementOpApply> UnaryFunction<T> for Identity {
    type Output = T;

    #[inline(always)]
    fn call(&self, a: T) -> T {
        a
    }
}

/// `Self ∘ Other` as a type.
pub trait Compose<Other: ElementOp>: ElementOp {
    type Result: ElementOp;
}

macro_rules! compose_table {
    ($($lhs:ident, $rhs:ident => $out:ident;)*) => {
        $(
            impl Compose<$rhs> for $lhs {
                type Result = $out;
            }
        )*
    };
}

impl<Op: ElementOp> Compose<Identity> for Op {
    type Result = Op;
}

compose_table! {
    Identity, Conj => Conj;
    Conj, Conj => Identity;
    Transpose, Conj => Adjoint;
    Adjoint, Conj => Transpose;
    Identity, Transpose => Transpose;
    Conj, Transpose => Adjoint;
    Transpose, Transpose => Identity;
    Adjoint, Transpose => Conj;
    Identity, Adjoint => Adjoint;
    Conj, Adjoint => Transpose;
    Transpose, Adjoint => Conj;
    Adjoint, Adjoint => Identity;
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use std::any::TypeId;

    fn assert_same<A: 'static, B: 'static>() {
        assert_eq!(TypeId::of::<A>(), TypeId::of::<B>());
    }

    #[test]
    fn test_arithmetic_ops() {
        assert_eq!(AddOp.call(2i32, 3i32), 5);
        assert_eq!(SubOp.call(2.5f64, 0.5f64), 2.0);
        assert_eq!(MulOp.call(4u8, 3u8), 12);
        assert_eq!(DivOp.call(9.0f64, 3.0f64), 3.0);
        assert_eq!(NegOp.call(7i64), -7);
    }

    #[test]
    fn test_closures() {
        let scale = 3.0;
        let f = |x: f64| x * scale;
        assert_eq!(UnaryFunction::call(&f, 2.0), 6.0);
        let g = |a: i32, b: i32| a.max(b);
        assert_eq!(BinaryFunction::call(&g, 2, 9), 9);
    }

    #[test]
    fn test_conj() {
        let x = Complex64::new(3.0, 4.0);
        assert_eq!(Conj::apply(x), Complex64::new(3.0, -4.0));
        assert_eq!(Conj.call(x), Complex64::new(3.0, -4.0));
        assert_eq!(Conj::apply(3.0f64), 3.0);
    }

    #[test]
    fn test_adjoint_and_transpose() {
        let x = Complex64::new(1.0, -2.0);
        assert_eq!(Adjoint.call(x), Complex64::new(1.0, 2.0));
        assert_eq!(Transpose.call(x), x);
        assert_eq!(Identity.call(x), x);
    }

    #[test]
    fn test_composition_types() {
        assert_same::<<Identity as Compose<Conj>>::Result, Conj>();
        assert_same::<<Conj as Compose<Conj>>::Result, Identity>();
        assert_same::<<Transpose as Compose<Conj>>::Result, Adjoint>();
        assert_same::<<Adjoint as Compose<Adjoint>>::Result, Identity>();
        assert_same::<<Conj as Compose<Identity>>::Result, Conj>();
    }
}
