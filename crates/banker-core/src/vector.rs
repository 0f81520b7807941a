//! Resource vectors and customer identifiers
//!
//! Every quantity in the ledger is a vector with one non-negative entry per
//! resource type. Entries are unsigned, and subtraction is checked, so a
//! negative count can never be represented.

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

/// Index of a customer in the fixed population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(pub usize);

impl CustomerId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for CustomerId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// One count per resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceVector(Vec<u32>);

impl ResourceVector {
    pub fn new(counts: Vec<u32>) -> Self {
        Self(counts)
    }

    /// A vector of `len` zeros
    pub fn zeros(len: usize) -> Self {
        Self(vec![0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &u32> + '_ {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// True if every entry of `self` is at least the matching entry of `other`.
    /// Vectors of different lengths never cover each other.
    pub fn covers(&self, other: &ResourceVector) -> bool {
        self.len() == other.len() && self.0.iter().zip(&other.0).all(|(a, b)| a >= b)
    }

    /// Index of the first entry where `other` exceeds `self`
    pub fn first_shortfall(&self, other: &ResourceVector) -> Option<usize> {
        self.0.iter().zip(&other.0).position(|(a, b)| b > a)
    }

    /// Component-wise `self - other`, or `None` if any entry would go negative
    pub fn checked_sub(&self, other: &ResourceVector) -> Option<ResourceVector> {
        if self.len() != other.len() {
            return None;
        }
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.checked_sub(*b))
            .collect::<Option<Vec<_>>>()
            .map(ResourceVector)
    }

    /// Component-wise `self + other`, or `None` on overflow or length mismatch
    pub fn checked_add(&self, other: &ResourceVector) -> Option<ResourceVector> {
        if self.len() != other.len() {
            return None;
        }
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.checked_add(*b))
            .collect::<Option<Vec<_>>>()
            .map(ResourceVector)
    }

    /// In-place component-wise addition, saturating at `u32::MAX`.
    pub(crate) fn saturating_add_assign(&mut self, other: &ResourceVector) {
        debug_assert_eq!(self.len(), other.len());
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a = a.saturating_add(*b);
        }
    }
}

impl From<Vec<u32>> for ResourceVector {
    fn from(counts: Vec<u32>) -> Self {
        Self(counts)
    }
}

impl<const N: usize> From<[u32; N]> for ResourceVector {
    fn from(counts: [u32; N]) -> Self {
        Self(counts.to_vec())
    }
}

impl FromIterator<u32> for ResourceVector {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Index<usize> for ResourceVector {
    type Output = u32;

    fn index(&self, index: usize) -> &u32 {
        &self.0[index]
    }
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, count) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", count)?;
        }
        write!(f, "]")
    }
}
