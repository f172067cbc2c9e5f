//! Analogy Solver
//!
//! Resolves `a - b + c = ?` by ranking the vocabulary against the
//! normalized combination of the three word vectors.

use std::fmt;

use super::similarity::normalize_vector;
use super::store::{Neighbor, VectorStore};
use crate::error::Result;

/// Analogy `a - b + c`: `a` and `c` are positive, `b` is negative
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalogyQuery {
    pub a: String,
    pub b: String,
    pub c: String,
}

impl AnalogyQuery {
    pub fn new(a: impl Into<String>, b: impl Into<String>, c: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            c: c.into(),
        }
    }
}

impl fmt::Display for AnalogyQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} + {}", self.a, self.b, self.c)
    }
}

/// Vector arithmetic over a loaded `VectorStore`
#[derive(Debug, Clone, Copy)]
pub struct AnalogySolver<'a> {
    store: &'a VectorStore,
}

impl<'a> AnalogySolver<'a> {
    pub fn new(store: &'a VectorStore) -> Self {
        Self { store }
    }

    /// Rank the vocabulary against `normalize(a - b + c)`.
    ///
    /// The three input words never appear in the results.
    pub fn solve(&self, a: &str, b: &str, c: &str, top_n: usize) -> Result<Vec<Neighbor>> {
        let ia = self.store.lookup(a)?;
        let ib = self.store.lookup(b)?;
        let ic = self.store.lookup(c)?;

        let mut target: Vec<f32> = self
            .store
            .row(ia)
            .iter()
            .zip(self.store.row(ib))
            .zip(self.store.row(ic))
            .map(|((va, vb), vc)| va - vb + vc)
            .collect();
        normalize_vector(&mut target);

        Ok(self.store.rank(&target, top_n, &[ia, ib, ic]))
    }

    pub fn solve_query(&self, query: &AnalogyQuery, top_n: usize) -> Result<Vec<Neighbor>> {
        self.solve(&query.a, &query.b, &query.c, top_n)
    }
}
