//! Value kinds and the most-specific-kind resolution rule.
//!
//! A [`Kind`] identifies a register class (general-purpose vs floating-point)
//! together with the set of host literals convertible to it. The integer
//! kinds form a small hierarchy rooted at [`Kind::Bits`]; the float kinds are
//! each the sole member of their own hierarchy. Operator dispatch uses the
//! subkind relation both to decide operand acceptance and, through
//! [`most_specific`], to pick the result kind of mixed-kind operations.

use std::fmt;

use super::stream::RegClass;

/// A value's register class plus its accepted literal types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Generic bit pattern in a general-purpose register.
    Bits,
    /// Unsigned 32-bit word.
    UnsignedWord,
    /// Signed 32-bit word.
    SignedWord,
    /// Single-precision float.
    SingleFloat,
    /// Double-precision float.
    DoubleFloat,
}

/// Number of registered kinds; sizes the kind registry table.
pub const KIND_COUNT: usize = 5;

/// Host literal classes a kind can be initialized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralClass {
    Integer,
    Float,
}

/// A host literal operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
}

impl Literal {
    pub fn class(&self) -> LiteralClass {
        match self {
            Literal::Int(_) => LiteralClass::Integer,
            Literal::Float(_) => LiteralClass::Float,
        }
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Int(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Literal::Int(v as i64)
    }
}

impl From<u32> for Literal {
    fn from(v: u32) -> Self {
        Literal::Int(v as i64)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Float(v)
    }
}

impl From<f32> for Literal {
    fn from(v: f32) -> Self {
        Literal::Float(v as f64)
    }
}

impl Kind {
    /// Table index for registry lookups.
    pub fn index(self) -> usize {
        match self {
            Kind::Bits => 0,
            Kind::UnsignedWord => 1,
            Kind::SignedWord => 2,
            Kind::SingleFloat => 3,
            Kind::DoubleFloat => 4,
        }
    }

    /// The register bank values of this kind live in.
    pub fn register_class(self) -> RegClass {
        match self {
            Kind::Bits | Kind::UnsignedWord | Kind::SignedWord => RegClass::Gp,
            Kind::SingleFloat | Kind::DoubleFloat => RegClass::Fp,
        }
    }

    /// The host literal class this kind accepts at construction/assignment.
    pub fn literal_class(self) -> LiteralClass {
        match self.register_class() {
            RegClass::Gp => LiteralClass::Integer,
            RegClass::Fp => LiteralClass::Float,
        }
    }

    /// Whether `self` is the same kind as `other` or a more specific one.
    ///
    /// The integer kinds specialize `Bits`; the float kinds only relate to
    /// themselves. The relation is reflexive.
    pub fn is_subkind_of(self, other: Kind) -> bool {
        if self == other {
            return true;
        }
        matches!(
            (self, other),
            (Kind::UnsignedWord, Kind::Bits) | (Kind::SignedWord, Kind::Bits)
        )
    }

    /// Whether `self` and `other` belong to the same kind hierarchy.
    pub fn same_hierarchy(self, other: Kind) -> bool {
        self.is_subkind_of(other) || other.is_subkind_of(self)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(crate::core::registry::registry().storage(*self).name())
    }
}

/// Pick the more specific of two related kinds, or a fallback.
///
/// If both kinds are present and one is a subkind of the other, the more
/// specific kind wins; unrelated kinds resolve to `default`. With no default,
/// a single present kind is returned as-is, and two absent kinds resolve to
/// `None` (the caller must supply the result kind). A present kind wins over
/// an explicit default when the other side is absent: the default arbitrates
/// conflicts, it does not override knowledge.
pub fn most_specific(a: Option<Kind>, b: Option<Kind>, default: Option<Kind>) -> Option<Kind> {
    match (a, b) {
        (Some(ka), Some(kb)) => {
            if kb.is_subkind_of(ka) {
                Some(kb)
            } else if ka.is_subkind_of(kb) {
                Some(ka)
            } else {
                default
            }
        }
        (Some(ka), None) => Some(ka),
        (None, Some(kb)) => Some(kb),
        (None, None) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subkind_relation() {
        assert!(Kind::UnsignedWord.is_subkind_of(Kind::Bits));
        assert!(Kind::SignedWord.is_subkind_of(Kind::Bits));
        assert!(Kind::Bits.is_subkind_of(Kind::Bits));
        assert!(!Kind::Bits.is_subkind_of(Kind::SignedWord));
        assert!(!Kind::SignedWord.is_subkind_of(Kind::UnsignedWord));
        assert!(!Kind::SingleFloat.is_subkind_of(Kind::DoubleFloat));
        assert!(Kind::SingleFloat.is_subkind_of(Kind::SingleFloat));
    }

    #[test]
    fn resolver_prefers_more_specific() {
        assert_eq!(
            most_specific(Some(Kind::Bits), Some(Kind::SignedWord), None),
            Some(Kind::SignedWord)
        );
        assert_eq!(
            most_specific(Some(Kind::UnsignedWord), Some(Kind::Bits), None),
            Some(Kind::UnsignedWord)
        );
        assert_eq!(
            most_specific(Some(Kind::Bits), Some(Kind::Bits), None),
            Some(Kind::Bits)
        );
    }

    #[test]
    fn resolver_unrelated_takes_default() {
        assert_eq!(
            most_specific(Some(Kind::SignedWord), Some(Kind::SingleFloat), Some(Kind::Bits)),
            Some(Kind::Bits)
        );
        assert_eq!(
            most_specific(Some(Kind::SingleFloat), Some(Kind::DoubleFloat), None),
            None
        );
    }

    #[test]
    fn resolver_one_sided() {
        assert_eq!(most_specific(Some(Kind::SignedWord), None, None), Some(Kind::SignedWord));
        assert_eq!(most_specific(None, Some(Kind::Bits), None), Some(Kind::Bits));
        assert_eq!(
            most_specific(Some(Kind::SignedWord), None, Some(Kind::Bits)),
            Some(Kind::SignedWord)
        );
    }

    #[test]
    fn resolver_empty() {
        assert_eq!(most_specific(None, None, None), None);
        assert_eq!(most_specific(None, None, Some(Kind::Bits)), Some(Kind::Bits));
    }

    #[test]
    fn literal_classes() {
        assert_eq!(Kind::Bits.literal_class(), LiteralClass::Integer);
        assert_eq!(Kind::SignedWord.literal_class(), LiteralClass::Integer);
        assert_eq!(Kind::DoubleFloat.literal_class(), LiteralClass::Float);
        assert_eq!(Literal::from(3).class(), LiteralClass::Integer);
        assert_eq!(Literal::from(1.5).class(), LiteralClass::Float);
    }
}
