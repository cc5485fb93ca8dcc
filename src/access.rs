//! Access markers distinguishing shared and unique views.
//!
//! The same view, iterator and layout machinery serves both immutable and
//! mutable handles; the marker decides what a scalar dereference produces.

mod private {
    pub trait Sealed {}
    impl Sealed for super::Shared {}
    impl Sealed for super::Unique {}
}

/// How elements reached through a view may be accessed.
pub trait Access: private::Sealed + Copy + Default + Send + Sync + 'static {
    /// Scalar reference produced by a full dereference.
    type Ref<'a, T: 'a>;

    /// Turn an element pointer into a scalar reference.
    ///
    /// # Safety
    /// `ptr` must be valid for reads (and writes, for [`Unique`]) for `'a`,
    /// and no conflicting reference to the element may exist for `'a`.
    unsafe fn deref<'a, T: 'a>(ptr: *mut T) -> Self::Ref<'a, T>;
}

/// Immutable access: dereferences to `&'a T`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shared;

/// Mutable access: dereferences to `&'a mut T`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unique;

impl Access for Shared {
    type Ref<'a, T: 'a> = &'a T;

    #[inline(always)]
    unsafe fn deref<'a, T: 'a>(ptr: *mut T) -> &'a T {
        &*ptr
    }
}

impl Access for Unique {
    type Ref<'a, T: 'a> = &'a mut T;

    #[inline(always)]
    unsafe fn deref<'a, T: 'a>(ptr: *mut T) -> &'a mut T {
        &mut *ptr
    }
}
