//! Hierarchical test identifiers such as `2.1.3`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dot-separated test number. Ordering is lexicographic over the parts, so
/// `1.2` sorts before `1.10` and a parent sorts before its children.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TestNumber {
    parts: Vec<u32>,
}

impl TestNumber {
    /// The empty number held by the root of a tree.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(parts: Vec<u32>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[u32] {
        &self.parts
    }

    pub fn depth(&self) -> usize {
        self.parts.len()
    }

    pub fn is_root(&self) -> bool {
        self.parts.is_empty()
    }

    /// Number of the `index`-th child (1-based) under this number.
    pub fn child(&self, index: u32) -> Self {
        let mut parts = Vec::with_capacity(self.parts.len() + 1);
        parts.extend_from_slice(&self.parts);
        parts.push(index);
        Self { parts }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.parts.is_empty() {
            return None;
        }
        Some(Self {
            parts: self.parts[..self.parts.len() - 1].to_vec(),
        })
    }
}

impl fmt::Display for TestNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

impl FromStr for TestNumber {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let parts = s
            .split('.')
            .map(str::parse::<u32>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { parts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_dot_separated() {
        assert_eq!(TestNumber::new(vec![2, 1, 3]).to_string(), "2.1.3");
        assert_eq!(TestNumber::root().to_string(), "");
    }

    #[test]
    fn orders_numerically_not_textually() {
        let a: TestNumber = "1.2".parse().unwrap();
        let b: TestNumber = "1.10".parse().unwrap();
        let parent: TestNumber = "1".parse().unwrap();
        assert!(a < b);
        assert!(parent < a);
    }

    #[test]
    fn child_and_parent_are_inverse() {
        let n = TestNumber::new(vec![4]);
        let c = n.child(7);
        assert_eq!(c.to_string(), "4.7");
        assert_eq!(c.parent(), Some(n));
        assert_eq!(TestNumber::root().parent(), None);
    }

    #[test]
    fn rejects_garbage() {
        assert!("1.x".parse::<TestNumber>().is_err());
    }
}
