//! A small join/meet lattice abstraction over sparse cell values.
//!
//! Sparse matrices in this crate store either `bool` (does any transition
//! exist) or [`EventSet`](crate::events::EventSet) (which transitions exist).
//! Both form a lattice under or/and, and the sparse layer only relies on that
//! structure: duplicate triplets are merged with `join`, and cells equal to
//! `bottom` are considered absent.

/// An ordered structure with least and greatest elements and binary
/// join/meet. For the value types used here, `join` is set union and `meet`
/// is set intersection.
pub trait Lattice: Copy + Eq {
    /// The least element; sparse cells holding it are not stored.
    fn bottom() -> Self;
    /// The greatest element.
    fn top() -> Self;
    /// Least upper bound of `self` and `other`.
    fn join(&self, other: &Self) -> Self;
    /// Greatest lower bound of `self` and `other`.
    fn meet(&self, other: &Self) -> Self;
    /// Joins `other` into `self`.
    fn join_assign(&mut self, other: &Self) {
        *self = self.join(other);
    }
    /// True if `self` is the least element.
    fn is_bottom(&self) -> bool {
        *self == Self::bottom()
    }
}

impl Lattice for bool {
    fn bottom() -> Self {
        false
    }
    fn top() -> Self {
        true
    }
    fn join(&self, other: &Self) -> Self {
        *self || *other
    }
    fn meet(&self, other: &Self) -> Self {
        *self && *other
    }
}

impl<const W: usize> Lattice for crate::events::EventSet<W> {
    fn bottom() -> Self {
        Self::new()
    }
    fn top() -> Self {
        Self::all()
    }
    fn join(&self, other: &Self) -> Self {
        *self | *other
    }
    fn meet(&self, other: &Self) -> Self {
        *self & *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventSet;

    #[test]
    fn bool_lattice() {
        assert!(true.join(&false));
        assert!(!false.join(&false));
        assert!(!true.meet(&false));
        assert!(true.meet(&true));
        assert!(bool::bottom().is_bottom());
    }

    #[test]
    fn event_set_lattice() {
        let a: EventSet = [0, 3].into_iter().collect();
        let b: EventSet = [3, 5].into_iter().collect();
        assert_eq!(a.join(&b), [0, 3, 5].into_iter().collect());
        assert_eq!(a.meet(&b), EventSet::singleton(3));
        assert!(EventSet::<4>::bottom().is_empty());
    }
}
