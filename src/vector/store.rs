//! Vector Store
//!
//! Read-only word vector table. Rows are unit-normalized on construction so
//! every similarity is a plain dot product, and neighbor search is an
//! exhaustive scan over the whole vocabulary.

use hashbrown::HashMap;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::Path;
use tracing::{debug, warn};

use super::format::{self, LoadStage, INDEX_PERCENT, NORMALIZE_PERCENT};
use super::similarity::{magnitude, normalize_vector, unit_similarity};
use crate::error::{LoadError, Result, WordVecError};

/// Largest length error for a stored row to count as already unit length
const UNIT_TOLERANCE: f32 = 1e-5;

/// A vocabulary word ranked against a query vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    pub word: String,
    pub similarity: f32,
}

/// Accumulates rows until the table is sealed into a `VectorStore`
#[derive(Debug, Default)]
pub struct VectorTableBuilder {
    dimension: Option<usize>,
    words: Vec<String>,
    index: HashMap<String, usize>,
    vectors: Vec<f32>,
    duplicates: usize,
}

impl VectorTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder that only accepts rows of `dimension` components
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            ..Self::default()
        }
    }

    /// Pre-size for `rows` rows of `dimension` components
    pub fn with_capacity(rows: usize, dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            words: Vec::with_capacity(rows),
            index: HashMap::with_capacity(rows),
            vectors: Vec::with_capacity(rows * dimension),
            duplicates: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Append a row, lowercasing the word.
    ///
    /// Returns `Ok(false)` when the lowercased word already has a row; the
    /// earlier row is kept. The error is a human-readable reason that the
    /// caller attaches to a line or row number.
    pub fn push(&mut self, word: &str, values: &[f32]) -> std::result::Result<bool, String> {
        if values.is_empty() {
            return Err(format!("word '{}' has no vector components", word));
        }

        match self.dimension {
            Some(dim) if dim != values.len() => {
                return Err(format!(
                    "expected {} components, found {}",
                    dim,
                    values.len()
                ));
            }
            Some(_) => {}
            None => self.dimension = Some(values.len()),
        }

        if values.iter().any(|v| !v.is_finite()) {
            return Err(format!("word '{}' has a non-finite component", word));
        }
        if magnitude(values) == 0.0 {
            return Err(format!("word '{}' has a zero-length vector", word));
        }

        let word = word.to_lowercase();
        if self.index.contains_key(&word) {
            self.duplicates += 1;
            debug!(word = %word, "Skipping duplicate vocabulary entry");
            return Ok(false);
        }

        self.index.insert(word.clone(), self.words.len());
        self.words.push(word);
        self.vectors.extend_from_slice(values);
        Ok(true)
    }

    /// Normalize every row and seal the table
    pub fn build(
        self,
        progress: &mut dyn FnMut(u8, LoadStage),
    ) -> std::result::Result<VectorStore, LoadError> {
        self.seal(progress, normalize_vector)
    }

    /// Seal a table whose rows were written unit length.
    ///
    /// Rows within `UNIT_TOLERANCE` of length 1 are kept bit-for-bit; any
    /// other row is normalized.
    pub fn build_normalized(
        self,
        progress: &mut dyn FnMut(u8, LoadStage),
    ) -> std::result::Result<VectorStore, LoadError> {
        self.seal(progress, |row| {
            if (magnitude(row) - 1.0).abs() > UNIT_TOLERANCE {
                normalize_vector(row);
            }
        })
    }

    fn seal(
        mut self,
        progress: &mut dyn FnMut(u8, LoadStage),
        normalize: impl Fn(&mut [f32]),
    ) -> std::result::Result<VectorStore, LoadError> {
        let dimension = match self.dimension {
            Some(dim) if !self.words.is_empty() => dim,
            _ => return Err(LoadError::Empty),
        };

        progress(NORMALIZE_PERCENT, LoadStage::Normalizing);
        for row in self.vectors.chunks_exact_mut(dimension) {
            normalize(row);
        }

        progress(INDEX_PERCENT, LoadStage::Indexing);
        self.words.shrink_to_fit();
        self.vectors.shrink_to_fit();
        self.index.shrink_to_fit();

        if self.duplicates > 0 {
            warn!(
                duplicates = self.duplicates,
                "Skipped duplicate words while loading vectors"
            );
        }

        Ok(VectorStore {
            words: self.words,
            index: self.index,
            vectors: self.vectors,
            dimension,
        })
    }
}

/// Immutable, unit-normalized word vector table
#[derive(Debug)]
pub struct VectorStore {
    /// Vocabulary in file order
    words: Vec<String>,
    /// Word -> row index
    index: HashMap<String, usize>,
    /// Row-major `words.len() * dimension` matrix
    vectors: Vec<f32>,
    dimension: usize,
}

impl VectorStore {
    /// Load a text or binary vector file
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, LoadError> {
        Self::load_with_progress(path, &mut |_, _| {})
    }

    /// Load a vector file, reporting `(percent, stage)` milestones
    pub fn load_with_progress(
        path: impl AsRef<Path>,
        progress: &mut dyn FnMut(u8, LoadStage),
    ) -> std::result::Result<Self, LoadError> {
        format::read_vectors(path.as_ref(), progress)
    }

    /// Build a store from in-memory `(word, vector)` pairs
    pub fn from_entries<I, S>(entries: I) -> std::result::Result<Self, LoadError>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: AsRef<str>,
    {
        let mut builder = VectorTableBuilder::new();
        for (i, (word, values)) in entries.into_iter().enumerate() {
            builder
                .push(word.as_ref(), &values)
                .map_err(|reason| LoadError::malformed(i + 1, reason))?;
        }
        builder.build(&mut |_, _| {})
    }

    /// Number of words in the vocabulary
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// Unit-normalized vector for `word`
    pub fn vector(&self, word: &str) -> Option<&[f32]> {
        self.index.get(word).map(|&i| self.row(i))
    }

    /// Vocabulary in file order
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    /// First `n` words in vocabulary order
    pub fn sample_words(&self, n: usize) -> Vec<&str> {
        self.words().take(n).collect()
    }

    /// `(word, vector)` rows in vocabulary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.words
            .iter()
            .map(String::as_str)
            .zip(self.vectors.chunks_exact(self.dimension))
    }

    /// Cosine similarity between two vocabulary words, in [-1, 1]
    pub fn similarity(&self, word1: &str, word2: &str) -> Result<f32> {
        let a = self.lookup(word1)?;
        let b = self.lookup(word2)?;
        Ok(unit_similarity(self.row(a), self.row(b)))
    }

    /// The `top_n` words closest to `word`, excluding `word` itself
    pub fn neighbors(&self, word: &str, top_n: usize) -> Result<Vec<Neighbor>> {
        let idx = self.lookup(word)?;
        Ok(self.rank(self.row(idx), top_n, &[idx]))
    }

    /// Row index for `word`
    pub(crate) fn lookup(&self, word: &str) -> Result<usize> {
        self.index
            .get(word)
            .copied()
            .ok_or_else(|| WordVecError::WordNotFound(word.to_string()))
    }

    pub(crate) fn row(&self, idx: usize) -> &[f32] {
        let start = idx * self.dimension;
        &self.vectors[start..start + self.dimension]
    }

    /// Rank every row not in `exclude` against a unit-length `query`.
    ///
    /// Sorted by descending similarity, ties in vocabulary order.
    pub(crate) fn rank(&self, query: &[f32], top_n: usize, exclude: &[usize]) -> Vec<Neighbor> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .filter(|(i, _)| !exclude.contains(i))
            .map(|(i, row)| (i, unit_similarity(query, row)))
            .collect();

        let k = top_n.min(scored.len());
        if k == 0 {
            return Vec::new();
        }

        // Partial sort to get top-k, then order the prefix
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank_order);
            scored.truncate(k);
        }
        scored.sort_unstable_by(rank_order);

        scored
            .into_iter()
            .map(|(i, score)| Neighbor {
                word: self.words[i].clone(),
                similarity: score,
            })
            .collect()
    }
}

fn rank_order(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.cmp(&b.0))
}
