use std::fmt::{Display, Formatter};
use std::ops::Neg;

/// A handle to a BDD node, potentially complemented.
///
/// Uses a 32-bit representation where the least significant bit indicates negation
/// and the remaining bits store the node id. Node 0 is the single terminal, so
/// [`Ref::ONE`] and [`Ref::ZERO`] are the same node seen through both polarities.
///
/// Handles are plain indices into the manager's arena: they are `Copy` and are
/// compared by identity. Two handles from the same manager are equal iff they
/// denote the same Boolean function.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Ref(u32);

impl Ref {
    /// The constant true function.
    pub const ONE: Self = Self(0);
    /// The constant false function.
    pub const ZERO: Self = Self(1);

    /// Creates a new reference with the given node id and negation flag.
    pub const fn new(id: u32, negated: bool) -> Self {
        Self((id << 1) | (negated as u32))
    }

    /// Creates a positive (non-negated) reference.
    pub const fn positive(id: u32) -> Self {
        Self::new(id, false)
    }

    /// Returns the id of the referenced node.
    pub const fn id(self) -> u32 {
        self.0 >> 1
    }

    /// Returns the id as an arena index.
    pub const fn index(self) -> usize {
        (self.0 >> 1) as usize
    }

    pub const fn is_negated(self) -> bool {
        self.0 & 1 != 0
    }

    /// Returns the same node without the complement bit.
    pub const fn regular(self) -> Self {
        Self(self.0 & !1)
    }

    pub const fn is_terminal(self) -> bool {
        self.id() == 0
    }

    /// Return the internal representation of the reference.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Conditionally negate the reference.
    pub const fn negate_if(self, negate: bool) -> Self {
        Self(self.0 ^ (negate as u32))
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0 ^ 1)
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", if self.is_negated() { "~" } else { "" }, self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminals() {
        assert_eq!(-Ref::ONE, Ref::ZERO);
        assert_eq!(-Ref::ZERO, Ref::ONE);
        assert!(Ref::ONE.is_terminal());
        assert!(Ref::ZERO.is_terminal());
        assert!(Ref::ZERO.is_negated());
        assert_eq!(Ref::ZERO.regular(), Ref::ONE);
    }

    #[test]
    fn test_negation() {
        let r = Ref::positive(7);
        assert_eq!(r.id(), 7);
        assert!(!r.is_negated());
        assert!((-r).is_negated());
        assert_eq!((-r).id(), 7);
        assert_eq!(-(-r), r);
        assert_eq!(r.negate_if(true), -r);
        assert_eq!(r.negate_if(false), r);
        assert_eq!((-r).to_string(), "~@7");
    }
}
