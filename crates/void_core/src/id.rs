//! Editor-assigned identifiers
//!
//! Scene objects carry a string id that is written into documents and
//! compared across sessions. Ids are produced by a counter owned by the
//! scene, so two identical editing sessions yield identical ids.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe generator of string ids of the form `<prefix>-<n>`
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Create a new ID generator
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Create a generator that continues after `start`
    pub const fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Generate the next unique id with the given prefix
    pub fn next(&self, prefix: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", prefix, n)
    }

    /// Peek at the counter without advancing it
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for IdGenerator {
    fn clone(&self) -> Self {
        Self::starting_at(self.peek())
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdGenerator(next={})", self.peek())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generator() {
        let gen = IdGenerator::new();
        let id1 = gen.next("mesh");
        let id2 = gen.next("light");
        assert_ne!(id1, id2);
        assert_eq!(id1, "mesh-1");
        assert_eq!(id2, "light-2");
    }

    #[test]
    fn test_clone_continues_sequence() {
        let gen = IdGenerator::new();
        gen.next("a");
        let copy = gen.clone();
        assert_eq!(gen.next("a"), copy.next("a"));
    }
}
