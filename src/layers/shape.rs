//! Tensor shapes flowing between layers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Shape of the tensor flowing between two layers
///
/// Rank 3 (`[channels, height, width]`) while spatial structure exists,
/// rank 1 (`[features]`) after a reducing layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a shape from raw dimensions
    pub fn new(dims: Vec<usize>) -> Self {
        Self(dims)
    }

    /// `[channels, height, width]`
    pub fn spatial(channels: usize, height: usize, width: usize) -> Self {
        Self(vec![channels, height, width])
    }

    /// `[features]`
    pub fn flat(features: usize) -> Self {
        Self(vec![features])
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// First dimension (channels or features)
    pub fn channels(&self) -> Option<usize> {
        self.0.first().copied()
    }

    /// `(C, H, W)` if this is a rank-3 shape
    pub fn as_spatial(&self) -> Option<(usize, usize, usize)> {
        match self.0.as_slice() {
            [c, h, w] => Some((*c, *h, *w)),
            _ => None,
        }
    }

    /// Product of all dimensions, `None` on overflow
    pub fn element_count(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Usable as an architecture input: rank 1 or 3, all dimensions positive
    pub fn is_valid_input(&self) -> bool {
        matches!(self.rank(), 1 | 3) && self.0.iter().all(|&d| d > 0)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self(dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Shape::spatial(1, 28, 28).to_string(), "[1, 28, 28]");
        assert_eq!(Shape::flat(10).to_string(), "[10]");
    }

    #[test]
    fn test_element_count() {
        assert_eq!(Shape::spatial(32, 7, 7).element_count(), Some(1568));
        assert_eq!(Shape::new(vec![usize::MAX, 2]).element_count(), None);
    }

    #[test]
    fn test_valid_input() {
        assert!(Shape::spatial(3, 32, 32).is_valid_input());
        assert!(Shape::flat(784).is_valid_input());
        assert!(!Shape::new(vec![1, 28]).is_valid_input());
        assert!(!Shape::spatial(1, 0, 28).is_valid_input());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let json = serde_json::to_string(&Shape::spatial(1, 28, 28)).unwrap();
        assert_eq!(json, "[1,28,28]");
    }
}
