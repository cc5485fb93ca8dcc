//! Owning arrays, the deep-copy counterpart of views.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use num_traits::Zero;
use tracing::trace;

use crate::access::{Shared, Unique};
use crate::descriptor::{col_major_strides, row_major_strides, Anchor, Core, CorePtr, Odometer};
use crate::traits::ArrayTraits;
use crate::view::ArrayBase;
use crate::{Result, ViewError};

/// Owned buffer laid out to satisfy layout `L`.
///
/// Storage is row-major when `L::RMC >= 0` and column-major otherwise, so a
/// view of layout `L` over it is always valid.
pub struct Array<T, L> {
    data: Vec<T>,
    core: CorePtr,
    _layout: PhantomData<L>,
}

fn storage_strides<L: ArrayTraits>(shape: &[usize]) -> Vec<isize> {
    if L::RMC >= 0 {
        row_major_strides(shape)
    } else {
        col_major_strides(shape)
    }
}

impl<T, L: ArrayTraits> Array<T, L> {
    /// Wrap `data`, already in storage order for `L`.
    ///
    /// # Errors
    /// Fails when `shape` does not have `L::ND` entries or its product is not
    /// `data.len()`.
    pub fn from_shape_vec(shape: &[usize], data: Vec<T>) -> Result<Self> {
        if shape.len() != L::ND {
            return Err(ViewError::RankMismatch(shape.len(), L::ND));
        }
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ViewError::ShapeMismatch(shape.to_vec(), vec![data.len()]));
        }
        Ok(Self::from_parts(shape, data))
    }

    /// Build an array by evaluating `f` at every multi-index.
    pub fn from_shape_fn<F>(shape: &[usize], mut f: F) -> Result<Self>
    where
        F: FnMut(&[usize]) -> T,
    {
        if shape.len() != L::ND {
            return Err(ViewError::RankMismatch(shape.len(), L::ND));
        }
        let mut data = Vec::with_capacity(shape.iter().product());
        let mut odometer = Odometer::new(shape, L::RMC < 0);
        while let Some(index) = odometer.advance() {
            data.push(f(index));
        }
        Ok(Self::from_parts(shape, data))
    }

    pub fn filled(shape: &[usize], value: T) -> Result<Self>
    where
        T: Clone,
    {
        let len = shape.iter().product();
        Self::from_shape_vec(shape, vec![value; len])
    }

    pub fn zeros(shape: &[usize]) -> Result<Self>
    where
        T: Zero + Clone,
    {
        Self::filled(shape, T::zero())
    }

    /// Caller guarantees `shape.len() == L::ND` and matching length.
    pub(crate) fn from_parts(shape: &[usize], data: Vec<T>) -> Self {
        debug_assert_eq!(shape.len(), L::ND);
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        let strides = storage_strides::<L>(shape);
        let core = Arc::new(Core::from_validated(shape, &strides, None));
        Self {
            data,
            core,
            _layout: PhantomData,
        }
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.core.extents()
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.core.strides()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Elements in storage order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn view(&self) -> ArrayBase<'_, T, L, Shared> {
        // SAFETY: the descriptor describes exactly `data`, borrowed for '_.
        unsafe { ArrayBase::from_raw_parts(self.data.as_ptr() as *mut T, self.core.clone()) }
    }

    pub fn view_mut(&mut self) -> ArrayBase<'_, T, L, Unique> {
        // SAFETY: as for `view`, and packed strides never overlap.
        unsafe { ArrayBase::from_raw_parts(self.data.as_mut_ptr(), self.core.clone()) }
    }

    /// Hand the buffer over to its descriptor.
    ///
    /// The returned descriptor anchors the buffer: it is released when the
    /// last clone of the `CorePtr` is dropped. The pointer stays valid while
    /// any clone is alive.
    pub fn into_raw_parts(self) -> (*mut T, CorePtr)
    where
        T: Send + Sync + 'static,
    {
        let mut data = self.data;
        let ptr = data.as_mut_ptr();
        let len = data.len();
        let anchor: Anchor = Arc::new(data);
        trace!(len, shape = ?self.core.extents(), "moving buffer into descriptor anchor");
        let core = Arc::new(Core::from_validated(
            self.core.extents(),
            self.core.strides(),
            Some(anchor),
        ));
        (ptr, core)
    }
}

impl<T: Clone, L> Clone for Array<T, L> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            core: self.core.clone(),
            _layout: PhantomData,
        }
    }
}

impl<T: PartialEq, L> PartialEq for Array<T, L> {
    fn eq(&self, other: &Self) -> bool {
        self.core.extents() == other.core.extents() && self.data == other.data
    }
}

impl<T: fmt::Debug, L: ArrayTraits> fmt::Debug for Array<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("shape", &self.shape())
            .field("contiguity", &L::RMC)
            .field("data", &self.data)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Dims;

    #[test]
    fn test_from_shape_vec() {
        let a: Array<f64, Dims<2, 2>> = Array::from_shape_vec(&[2, 3], vec![0.0; 6]).unwrap();
        assert_eq!(a.strides(), &[3, 1]);
        assert!(matches!(
            Array::<f64, Dims<2, 2>>::from_shape_vec(&[2, 3], vec![0.0; 5]),
            Err(ViewError::ShapeMismatch(..))
        ));
        assert!(matches!(
            Array::<f64, Dims<2, 2>>::from_shape_vec(&[6], vec![0.0; 6]),
            Err(ViewError::RankMismatch(1, 2))
        ));
    }

    #[test]
    fn test_from_shape_fn_row_major() {
        let a: Array<usize, Dims<2, 1>> = Array::from_shape_fn(&[2, 3], |i| 10 * i[0] + i[1]).unwrap();
        assert_eq!(a.as_slice(), &[0, 1, 2, 10, 11, 12]);
    }

    #[test]
    fn test_from_shape_fn_col_major() {
        let a: Array<usize, Dims<2, -2>> = Array::from_shape_fn(&[2, 3], |i| 10 * i[0] + i[1]).unwrap();
        assert_eq!(a.strides(), &[1, 2]);
        assert_eq!(a.as_slice(), &[0, 10, 1, 11, 2, 12]);
        assert_eq!(a.view().get(&[1, 2]), Some(&12));
    }

    #[test]
    fn test_zeros_and_view_mut() {
        let mut a: Array<i32, Dims<2, 2>> = Array::zeros(&[2, 2]).unwrap();
        *a.view_mut().get_mut(&[1, 0]).unwrap() = 4;
        assert_eq!(a.as_slice(), &[0, 0, 4, 0]);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn test_into_raw_parts_anchor() {
        let a: Array<f64, Dims<1, 1>> = Array::from_shape_vec(&[3], vec![1.0, 2.0, 3.0]).unwrap();
        let (ptr, core) = a.into_raw_parts();
        let anchor = core.anchor().unwrap().clone();
        assert_eq!(Arc::strong_count(&anchor), 2);
        {
            let view: ArrayBase<'_, f64, Dims<1, 1>, Shared> =
                unsafe { ArrayBase::from_raw_parts(ptr, core.clone()) };
            assert_eq!(view.get(&[2]), Some(&3.0));
        }
        drop(core);
        assert_eq!(Arc::strong_count(&anchor), 1);
        assert_eq!(anchor.downcast_ref::<Vec<f64>>().unwrap(), &vec![1.0, 2.0, 3.0]);
    }
}
