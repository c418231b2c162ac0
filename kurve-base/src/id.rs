//! Pointer-identity id, used to compare topological entities without comparing their contents.

use std::fmt::Debug;
use std::hash::{Hash, Hasher};

/// An id with `Copy`, `Hash` and `Eq`, backed by a raw pointer into the shared allocation `T`.
///
/// Two ids compare equal iff they were derived from the same allocation, regardless of the
/// current contents of that allocation.
pub struct Id<T>(*const T);

impl<T> Id<T> {
    /// Creates an id from a raw pointer. The pointer is never dereferenced.
    #[inline(always)]
    pub fn new(ptr: *const T) -> Id<T> { Id(ptr) }
}

impl<T> Clone for Id<T> {
    #[inline(always)]
    fn clone(&self) -> Id<T> { Id(self.0) }
}

impl<T> Copy for Id<T> {}

impl<T> Hash for Id<T> {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) { std::ptr::hash(self.0, state); }
}

impl<T> PartialEq for Id<T> {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool { std::ptr::eq(self.0, other.0) }
}

impl<T> Eq for Id<T> {}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{:p}", self.0))
    }
}
