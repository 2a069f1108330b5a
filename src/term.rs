//! Mutable, reusable term values.
//!
//! A term is one distinct key within a field: either a 64-bit integer or an
//! owned byte string. Terms sit on the hot emit path, one per frame, so
//! string updates reuse the existing allocation whenever its capacity
//! suffices instead of reallocating per term.
//!
//! # Invariants
//! - A `Str` term holds exactly its logical contents; spare capacity kept
//!   from earlier updates is invisible to readers.
//! - Updates never lose data: after `assign`, reading the term back yields
//!   exactly the assigned bytes, regardless of prior growth or shrinkage.

use std::fmt;

/// Term type tag carried by streams and providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TermType {
    /// 64-bit integer terms.
    Int,
    /// Byte-string terms.
    Str,
}

/// Borrowed view of a term, used on write paths to avoid copies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermRef<'a> {
    Int(i64),
    Str(&'a [u8]),
}

impl TermRef<'_> {
    /// Type tag of the viewed term.
    #[inline]
    pub fn term_type(&self) -> TermType {
        match self {
            TermRef::Int(_) => TermType::Int,
            TermRef::Str(_) => TermType::Str,
        }
    }

    /// Materializes an owned term with a buffer sized to the contents.
    pub fn to_term(self) -> Term {
        match self {
            TermRef::Int(value) => Term::Int(value),
            TermRef::Str(bytes) => Term::Str(bytes.to_vec()),
        }
    }
}

/// Owned term value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Term {
    Int(i64),
    Str(Vec<u8>),
}

impl Term {
    /// Type tag of this term.
    #[inline]
    pub fn term_type(&self) -> TermType {
        match self {
            Term::Int(_) => TermType::Int,
            Term::Str(_) => TermType::Str,
        }
    }

    /// Borrows this term as a [`TermRef`].
    #[inline]
    pub fn as_term_ref(&self) -> TermRef<'_> {
        match self {
            Term::Int(value) => TermRef::Int(*value),
            Term::Str(bytes) => TermRef::Str(bytes),
        }
    }

    /// Updates this term in place from `src`.
    ///
    /// A `Str` → `Str` update reuses the existing buffer when its capacity
    /// suffices (a shrink followed by moderate regrowth stays on the same
    /// allocation); growth past capacity reallocates. An update that changes
    /// the variant replaces the value outright, releasing any old buffer.
    pub fn assign(&mut self, src: TermRef<'_>) {
        match src {
            TermRef::Int(value) => match self {
                Term::Int(slot) => *slot = value,
                other => *other = Term::Int(value),
            },
            TermRef::Str(bytes) => match self {
                Term::Str(buf) => {
                    buf.clear();
                    buf.extend_from_slice(bytes);
                }
                other => *other = Term::Str(bytes.to_vec()),
            },
        }
    }
}

impl From<TermRef<'_>> for Term {
    fn from(src: TermRef<'_>) -> Self {
        src.to_term()
    }
}

impl fmt::Display for TermType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermType::Int => f.write_str("int"),
            TermType::Str => f.write_str("str"),
        }
    }
}
