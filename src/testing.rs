//! Utilities for the test suite.

use std::cell::RefCell;
use std::rc::Rc;

/// A shared log of labels, for asserting evaluation order.
#[derive(Clone, Default)]
pub struct Trace {
    entries: Rc<RefCell<Vec<String>>>,
}

impl Trace {
    /// An empty trace.
    pub fn new() -> Trace {
        Trace::default()
    }

    /// Append one entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    /// All entries so far, in order.
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }
}

/// The 16 least significant bits of `n`, least significant first.
pub fn encode(n: u32) -> Vec<u8> {
    (0..16).map(|i| ((n >> i) & 1) as u8).collect()
}

/// Inverse of [`encode`] for any number of bits.
pub fn decode(bits: &[u8]) -> u32 {
    bits.iter()
        .enumerate()
        .fold(0, |acc, (i, &bit)| acc | ((bit as u32) << i))
}
